//! Headless stitch worker.
//!
//! Reads one `find_matches` message from stdin and writes every event as a
//! JSON line to stdout. Logs go to stderr.

use std::io::Write;

use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use stitch_worker::{WorkerConfig, WorkerEvent, WorkerRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match WorkerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            emit(&WorkerEvent::error(&e))?;
            return Err(e.into());
        }
    };

    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;

    let request: WorkerRequest = match serde_json::from_str(&input) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %e, "Malformed start message");
            emit(&WorkerEvent::error(format!("Malformed start message: {e}")))?;
            return Ok(());
        }
    };

    let mut job = stitch_worker::start(request, &config);
    while let Some(event) = job.recv().await {
        emit(&event)?;
    }

    tracing::debug!("Stitch worker exiting");
    Ok(())
}

fn emit(event: &WorkerEvent) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", serde_json::to_string(event)?)?;
    out.flush()?;
    Ok(())
}
