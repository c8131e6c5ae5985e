//! # relay-worker
//!
//! Local stand-in for the job dispatcher. Reads newline-delimited
//! [`WebhookJob`](relay_ingest::WebhookJob)s from stdin, runs each through the
//! ingestion pipeline with bounded parallelism and writes one JSON result
//! line per job to stdout.

mod runner;

pub use runner::{backoff, parse_job, JobOutput, JobResult, JobRunner};

use std::sync::Arc;

use anyhow::Context as _;
use relay_common::AppConfig;
use relay_ingest::IngestContext;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info};

/// Totals logged when stdin is exhausted
#[derive(Debug, Default)]
struct Summary {
    completed: usize,
    failed: usize,
}

impl Summary {
    fn emit(&mut self, joined: Result<JobOutput, JoinError>) {
        let output = match joined {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "Job task panicked");
                self.failed += 1;
                return;
            }
        };

        if output.is_completed() {
            self.completed += 1;
        } else {
            self.failed += 1;
        }

        match serde_json::to_string(&output) {
            Ok(line) => println!("{line}"),
            Err(e) => error!(line = output.line, error = %e, "Failed to serialize job result"),
        }
    }
}

/// Connect the store, then drain stdin through the pipeline
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!("Connecting to PostgreSQL...");
    let pool = relay_db::create_pool(&relay_db::DatabaseConfig::from(&config.database))
        .await
        .context("failed to connect to PostgreSQL")?;
    relay_db::run_migrations(&pool)
        .await
        .context("failed to apply migrations")?;
    info!("PostgreSQL connection established");

    let ctx = IngestContext::from_config(&config, pool).context("failed to build ingest context")?;
    let runner = Arc::new(JobRunner::new(ctx, config.worker.max_attempts));
    let semaphore = Arc::new(Semaphore::new(config.worker.concurrency));

    let mut tasks = JoinSet::new();
    let mut summary = Summary::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_number = 0usize;

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("job semaphore closed")?;
        let runner = runner.clone();
        tasks.spawn(async move {
            let output = runner.run_line(line_number, &line).await;
            drop(permit);
            output
        });

        while let Some(joined) = tasks.try_join_next() {
            summary.emit(joined);
        }
    }

    while let Some(joined) = tasks.join_next().await {
        summary.emit(joined);
    }

    info!(
        completed = summary.completed,
        failed = summary.failed,
        "Input exhausted, worker stopping"
    );
    Ok(())
}
