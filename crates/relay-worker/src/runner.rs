//! Per-job execution with bounded retry

use std::time::Duration;

use relay_common::AppError;
use relay_ingest::{IngestContext, IngestPipeline, IngestReport, WebhookJob};
use serde::Serialize;
use tracing::{error, instrument, warn};

const BASE_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Parse one stdin line into a job
pub fn parse_job(line: &str) -> Result<WebhookJob, AppError> {
    serde_json::from_str(line).map_err(AppError::invalid_job)
}

/// Delay before retry number `attempt` (1-based): doubling, capped
pub fn backoff(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    BASE_BACKOFF
        .saturating_mul(1 << exponent)
        .min(MAX_BACKOFF)
}

/// One line of worker output
#[derive(Debug, Serialize)]
pub struct JobOutput {
    /// 1-based stdin line the job came from
    pub line: usize,
    /// Pipeline runs spent on the job, zero when it never parsed
    pub attempts: u32,
    #[serde(flatten)]
    pub result: JobResult,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobResult {
    Completed { report: IngestReport },
    Failed { code: &'static str, error: String },
}

impl JobOutput {
    fn failed(line: usize, attempts: u32, err: &AppError) -> Self {
        Self {
            line,
            attempts,
            result: JobResult::Failed {
                code: err.error_code(),
                error: err.to_string(),
            },
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.result, JobResult::Completed { .. })
    }
}

/// Runs jobs against one shared [`IngestContext`]
#[derive(Debug)]
pub struct JobRunner {
    ctx: IngestContext,
    max_attempts: u32,
}

impl JobRunner {
    pub fn new(ctx: IngestContext, max_attempts: u32) -> Self {
        Self {
            ctx,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Parse and run one input line
    pub async fn run_line(&self, line: usize, raw: &str) -> JobOutput {
        match parse_job(raw) {
            Ok(job) => self.run(line, &job).await,
            Err(e) => {
                warn!(line, error = %e, "Skipping invalid job line");
                JobOutput::failed(line, 0, &e)
            }
        }
    }

    /// Run `job`, retrying store failures up to `max_attempts` runs in total.
    ///
    /// A failed run leaves no claim behind, so a retry sees the same state a
    /// fresh delivery would.
    #[instrument(skip(self, job))]
    pub async fn run(&self, line: usize, job: &WebhookJob) -> JobOutput {
        let mut attempt = 1;
        loop {
            let err = match IngestPipeline::new(&self.ctx).perform(job).await {
                Ok(report) => {
                    return JobOutput {
                        line,
                        attempts: attempt,
                        result: JobResult::Completed { report },
                    }
                }
                Err(e) => AppError::from(e),
            };

            if !err.is_retryable() || attempt >= self.max_attempts {
                error!(attempt, code = err.error_code(), error = %err, "Job failed");
                return JobOutput::failed(line, attempt, &err);
            }

            let delay = backoff(attempt);
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying job"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
