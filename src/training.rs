//! Fine-tuning status monitor
//!
//! The platform exposes training progress only through `GET /ml/status`, so
//! [`TrainingMonitor`] polls it on a fixed interval from a background task
//! and publishes the latest value through a `watch` channel. The task stops
//! when the monitor is stopped or dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::api::{TrainAck, TrainRequest, TrainingStatus, Transport};
use crate::config::TrainingConfig;
use crate::error::Result;

/// Background poller of the training status endpoint
#[derive(Debug)]
pub struct TrainingMonitor {
    status_rx: watch::Receiver<Option<TrainingStatus>>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TrainingMonitor {
    /// Start polling every `interval`; the first poll happens immediately
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(transport: Arc<dyn Transport>, interval: Duration) -> Self {
        let (status_tx, status_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(transport, interval, status_tx, cancel.clone()));
        tracing::debug!(interval_ms = interval.as_millis() as u64, "Training monitor started");
        Self {
            status_rx,
            cancel,
            handle,
        }
    }

    /// Start polling at the configured interval
    pub fn from_config(transport: Arc<dyn Transport>, config: &TrainingConfig) -> Self {
        Self::spawn(transport, Duration::from_millis(config.poll_interval_ms))
    }

    /// Most recent status, or `None` before the first successful poll
    pub fn latest(&self) -> Option<TrainingStatus> {
        self.status_rx.borrow().clone()
    }

    /// A receiver that observes every published status
    pub fn subscribe(&self) -> watch::Receiver<Option<TrainingStatus>> {
        self.status_rx.clone()
    }

    /// Wait for the next published status
    ///
    /// Returns `None` once the monitor has stopped.
    pub async fn changed(&mut self) -> Option<TrainingStatus> {
        self.status_rx.changed().await.ok()?;
        self.status_rx.borrow_and_update().clone()
    }

    /// Stop polling
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the polling task has exited
    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TrainingMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop(
    transport: Arc<dyn Transport>,
    interval: Duration,
    status_tx: watch::Sender<Option<TrainingStatus>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = transport.training_status() => result,
        };

        match result {
            Ok(status) => {
                tracing::trace!(status = %status.status, step = ?status.step, "Training status");
                status_tx.send_replace(Some(status));
            }
            Err(e) => tracing::warn!("Training status poll failed: {:#}", e),
        }
    }

    tracing::debug!("Training monitor stopped");
}

/// Kick off a training run
///
/// # Errors
///
/// Returns error if the request fails or the server rejects it
pub async fn start_training(transport: &dyn Transport, request: &TrainRequest) -> Result<TrainAck> {
    tracing::info!(
        epochs = request.epochs,
        model = %request.model_name,
        mock = request.mock,
        "Starting training run"
    );
    transport.start_training(request).await
}
