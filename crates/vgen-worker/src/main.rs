//! Video generation worker binary.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vgen_worker::{load_test_input, run_local, AppContext, JobExecutor, RuntimeConfig, WorkerConfig};

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vgen_worker=info".parse()?)
        .add_directive("vgen_media=info".parse()?)
        .add_directive("vgen_storage=info".parse()?)
        .add_directive("vgen_inference=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Required before any HTTPS client is built
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing()?;

    info!("Starting vgen-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    if let Some(port) = config.metrics_port {
        vgen_worker::metrics::install_exporter(port)?;
    }

    let args: Vec<String> = std::env::args().collect();
    let test_input = load_test_input(&args, Path::new("test_input.json")).await?;

    let ctx = match AppContext::from_env(config).await {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            error!("Failed to initialize worker: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(input) = test_input {
        let output = run_local(&ctx, input).await;
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let executor = JobExecutor::new(ctx, RuntimeConfig::from_env())?;
    let shutdown = executor.shutdown_sender();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown.send(true).ok();
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
    Ok(())
}
