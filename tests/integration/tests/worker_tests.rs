//! Worker job runner tests
//!
//! Retry and reporting behavior of the stdin runner over the in-memory store.
//!
//! Run with: cargo test -p integration-tests --test worker_tests

use integration_tests::*;
use relay_core::{Provider, ProviderConfig};
use relay_ingest::EventOutcome;
use relay_worker::{JobResult, JobRunner};

fn seed(harness: &TestHarness) {
    harness.store.seed_channel(
        Provider::Cloud,
        CLOUD_PHONE,
        ProviderConfig::default().with(ProviderConfig::PHONE_NUMBER_ID, CLOUD_PHONE_NUMBER_ID),
    );
}

fn job_line(id: &str) -> String {
    serde_json::json!({"payload": cloud_text(id, "hi")}).to_string()
}

#[tokio::test(start_paused = true)]
async fn test_store_failures_are_retried() {
    let harness = TestHarness::new();
    seed(&harness);
    harness.store.fail_channel_lookups(2);

    let runner = JobRunner::new(harness.ctx.clone(), 3);
    let output = runner.run_line(1, &job_line("wamid.M1")).await;

    assert_eq!(output.attempts, 3);
    let JobResult::Completed { report } = &output.result else {
        panic!("expected completion, got {:?}", output.result);
    };
    assert!(matches!(report.outcomes[0], EventOutcome::MessageCreated { .. }));
    assert_eq!(harness.store.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retries_stop_at_max_attempts() {
    let harness = TestHarness::new();
    seed(&harness);
    harness.store.fail_channel_lookups(5);

    let runner = JobRunner::new(harness.ctx.clone(), 2);
    let output = runner.run_line(7, &job_line("wamid.M1")).await;

    assert_eq!(output.line, 7);
    assert_eq!(output.attempts, 2);
    assert!(matches!(
        output.result,
        JobResult::Failed { code: "DATABASE_ERROR", .. }
    ));
    assert!(harness.store.messages().is_empty());
}

#[tokio::test]
async fn test_invalid_line_is_reported_not_run() {
    let harness = TestHarness::new();
    seed(&harness);

    let runner = JobRunner::new(harness.ctx.clone(), 3);
    let output = runner.run_line(2, "{\"no_payload\": true}").await;

    assert_eq!(output.attempts, 0);
    assert!(matches!(
        output.result,
        JobResult::Failed { code: "INVALID_JOB", .. }
    ));
    assert_eq!(harness.guard.claims(), 0);
}
