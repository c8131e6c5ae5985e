//! Relay worker entry point
//!
//! Run with:
//! ```bash
//! cargo run -p relay-worker < jobs.ndjson
//! ```
//!
//! Configuration is loaded from environment variables (`.env` supported).

use relay_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        concurrency = config.worker.concurrency,
        max_attempts = config.worker.max_attempts,
        "Starting relay worker"
    );

    if let Err(e) = relay_worker::run(config).await {
        error!(error = %e, "Worker failed");
        std::process::exit(1);
    }
}
