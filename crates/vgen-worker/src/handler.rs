//! Job handler: validate, generate, upscale, upload, respond.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::Instrument;
use vgen_media::upscale_video;
use vgen_models::{GenerationMode, GenerationRequest, JobId, JobInput, JobOutput};

use crate::context::AppContext;
use crate::error::WorkerResult;
use crate::generation;
use crate::logging::JobLogger;
use crate::metrics::{self as job_metrics, stages};

/// Name of the uploaded object: `{mode}_{unix_seconds}_{job id prefix}.mp4`.
pub fn upload_file_name(mode: GenerationMode, job_id: &JobId, now: DateTime<Utc>) -> String {
    format!("{}_{}_{}.mp4", mode, now.timestamp(), job_id.short())
}

/// Run one job end to end.
///
/// Never fails: every error becomes `{"error": message}`. The job's scratch
/// directory is removed before returning.
pub async fn handle_job(ctx: &AppContext, job_id: &JobId, input: serde_json::Value) -> JobOutput {
    let started = Instant::now();
    let logger = JobLogger::new(job_id, "video_generation");
    let span = logger.create_span();

    async move {
        let request = match JobInput::from_value(input)
            .and_then(|input| GenerationRequest::from_input(&input))
        {
            Ok(request) => request,
            Err(e) => {
                logger.log_warning(&format!("rejected: {}", e));
                job_metrics::record_job("unknown", "rejected", started.elapsed());
                return JobOutput::error(e.to_string());
            }
        };

        let logger = logger.with_mode(request.mode);
        if request.mode_adjusted {
            logger.log_warning("unrecognized mode, falling back to t2v");
        }
        if request.quality_adjusted {
            logger.log_warning("unsupported quality, falling back to 540p");
        }
        logger.log_start(&format!(
            "{}s at {}fps ({} frames), quality {}",
            request.seconds, request.fps, request.frames.num_frames, request.quality
        ));

        let job_dir = ctx.job_dir(job_id);
        let result = run_request(ctx, job_id, &request, &job_dir, &logger).await;
        remove_job_dir(&job_dir, &logger).await;

        let mode = request.mode.as_str();
        match result {
            Ok(output) => {
                logger.log_completion(output.video_url().unwrap_or_default());
                job_metrics::record_job(mode, "success", started.elapsed());
                output
            }
            Err(e) => {
                logger.log_error(&format!("{} failed: {}", e.kind(), e));
                job_metrics::record_job(mode, "failed", started.elapsed());
                JobOutput::error(e.to_string())
            }
        }
    }
    .instrument(span)
    .await
}

async fn run_request(
    ctx: &AppContext,
    job_id: &JobId,
    request: &GenerationRequest,
    job_dir: &Path,
    logger: &JobLogger,
) -> WorkerResult<JobOutput> {
    let mode = request.mode.as_str();
    tokio::fs::create_dir_all(job_dir).await?;

    let stage_start = Instant::now();
    let rendered = generation::generate(ctx, request, job_dir).await?;
    finish_stage(logger, mode, stages::GENERATE, stage_start);

    let stage_start = Instant::now();
    let video = upscale_video(ctx.runner.as_ref(), &rendered, request.quality).await?;
    finish_stage(logger, mode, stages::UPSCALE, stage_start);

    let stage_start = Instant::now();
    let file_name = upload_file_name(request.mode, job_id, Utc::now());
    let uploaded = ctx.uploader.upload(&video.path, &file_name).await?;
    finish_stage(logger, mode, stages::UPLOAD, stage_start);

    Ok(JobOutput::Success {
        mode: request.mode,
        seconds: request.seconds,
        fps: request.fps,
        quality: request.quality,
        video_url: uploaded.public_url,
    })
}

fn finish_stage(logger: &JobLogger, mode: &str, stage: &str, started: Instant) {
    let elapsed = started.elapsed();
    logger.log_stage(stage, elapsed);
    job_metrics::record_stage(mode, stage, elapsed);
}

async fn remove_job_dir(job_dir: &Path, logger: &JobLogger) {
    match tokio::fs::remove_dir_all(job_dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => logger.log_warning(&format!(
            "failed to remove {}: {}",
            job_dir.display(),
            e
        )),
    }
}
