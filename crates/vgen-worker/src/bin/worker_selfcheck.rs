use std::path::Path;
use std::process::Command;

use vgen_inference::InferenceClient;
use vgen_media::check_ffmpeg;
use vgen_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env();

    println!(
        "worker-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_ffmpeg(&config.ffmpeg_binary)?;
    ensure_env_present(&["SUPABASE_URL", "SUPABASE_SERVICE_ROLE_KEY"])?;
    ensure_inference().await?;

    println!("worker-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

fn ensure_ffmpeg(binary: &Path) -> anyhow::Result<()> {
    let resolved = check_ffmpeg(binary)
        .map_err(|e| anyhow::anyhow!("{}: {}", binary.display(), e))?;

    let output = Command::new(&resolved)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("ffmpeg not available at {}: {}", resolved.display(), e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "ffmpeg -version failed: {:?}",
            output.status
        ));
    }
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => {}
            _ => return Err(anyhow::anyhow!("missing required env var {}", var)),
        }
    }
    Ok(())
}

async fn ensure_inference() -> anyhow::Result<()> {
    let client = InferenceClient::from_env()?;
    if !client.health_check().await? {
        return Err(anyhow::anyhow!(
            "inference service at {} is not healthy",
            client.config().base_url
        ));
    }
    Ok(())
}
