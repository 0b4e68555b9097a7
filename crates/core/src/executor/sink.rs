//! Stock progress sinks.

use tokio::sync::mpsc;
use tracing::info;

use super::traits::ProgressSink;
use super::types::ProgressUpdate;

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _update: &ProgressUpdate) {}
}

/// Forwards updates to a channel without waiting.
///
/// Updates are dropped when the channel is full or closed; execution never
/// waits on a slow consumer.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressUpdate>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ProgressUpdate>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn report(&self, update: &ProgressUpdate) {
        // Non-blocking send
        let _ = self.tx.try_send(update.clone());
    }
}

/// Logs updates through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn report(&self, update: &ProgressUpdate) {
        info!(
            job_id = %update.job_id,
            percent = %format!("{:.1}", update.percent),
            eta_secs = ?update.eta_secs.map(|s| s.round()),
            status = %update.status,
            "Conversion progress"
        );
    }
}
