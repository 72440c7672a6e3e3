//! Background stitching task.
//!
//! The search is CPU-bound, so it runs on tokio's blocking pool while a
//! lightweight supervisor task owns the terminal event. All communication
//! with the caller goes through one bounded mpsc channel.

use std::ops::ControlFlow;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use stitch_core::{Stage, StitchError, StitchOptions, StitchOutcome, stitch_with_control};

use crate::config::WorkerConfig;
use crate::messages::{WorkerEvent, WorkerRequest, decode_images};
use crate::{Result, WorkerError};

/// Handle to one running stitch job.
///
/// There is no cancel operation: a caller that loses interest drops the
/// handle. The search stops at its next progress point and nothing more is
/// delivered.
pub struct StitchJob {
    events: mpsc::Receiver<WorkerEvent>,
    handle: JoinHandle<()>,
}

impl StitchJob {
    /// Next event, or `None` once the terminal event has been delivered.
    pub async fn recv(&mut self) -> Option<WorkerEvent> {
        self.events.recv().await
    }

    /// Drain every remaining event and wait for the task to exit.
    pub async fn collect(mut self) -> Vec<WorkerEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Stitch supervisor did not exit cleanly");
        }
        events
    }
}

/// Spawn a stitch job for `request`. Must be called inside a tokio runtime.
pub fn start(request: WorkerRequest, config: &WorkerConfig) -> StitchJob {
    let (tx, rx) = mpsc::channel::<WorkerEvent>(config.event_capacity.max(1));
    let options = config.options.clone();

    let handle = tokio::spawn(supervise(request, options, tx));
    StitchJob { events: rx, handle }
}

/// Run the blocking job and send exactly one terminal event.
async fn supervise(request: WorkerRequest, options: StitchOptions, tx: mpsc::Sender<WorkerEvent>) {
    let progress_tx = tx.clone();
    let joined = tokio::task::spawn_blocking(move || run(request, &options, &progress_tx)).await;

    let terminal = match joined {
        Ok(Ok(outcome)) => {
            let unplaced = outcome.unplaced();
            if !unplaced.is_empty() {
                tracing::warn!(?unplaced, "Stitch finished with unplaced images");
            }
            tracing::info!(
                width = outcome.canvas.width,
                height = outcome.canvas.height,
                "Stitch job completed"
            );
            WorkerEvent::from(&outcome)
        }
        Ok(Err(WorkerError::Core(StitchError::Cancelled))) => {
            tracing::debug!(stage = %Stage::Error, "Stitch job discarded by caller");
            return;
        }
        Ok(Err(e)) => {
            tracing::error!(stage = %Stage::Error, error = %e, "Stitch job failed");
            WorkerEvent::error(e)
        }
        Err(join_err) => {
            let e = WorkerError::Panicked(join_err.to_string());
            tracing::error!(stage = %Stage::Error, error = %e, "Stitch job aborted");
            WorkerEvent::error(e)
        }
    };

    if tx.send(terminal).await.is_err() {
        tracing::debug!("Stitch caller went away before the result was delivered");
    }
}

/// Blocking body: decode, stitch, stream progress.
fn run(
    request: WorkerRequest,
    options: &StitchOptions,
    progress_tx: &mpsc::Sender<WorkerEvent>,
) -> Result<StitchOutcome> {
    let WorkerRequest::FindMatches { images } = request;
    tracing::info!(images = images.len(), "Stitch job started");

    let images = decode_images(&images)?;
    let outcome = stitch_with_control(&images, options, |progress| {
        // A closed channel means the caller discarded the job.
        match progress_tx.blocking_send(WorkerEvent::from(progress)) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    })?;
    Ok(outcome)
}
