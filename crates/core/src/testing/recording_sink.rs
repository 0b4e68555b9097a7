//! Progress sink that keeps everything it receives.

use std::sync::Mutex;

use crate::executor::{ProgressSink, ProgressUpdate};

/// Records every update for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates received so far, in order.
    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates
            .lock()
            .map(|updates| updates.clone())
            .unwrap_or_default()
    }

    pub fn percents(&self) -> Vec<f64> {
        self.updates().iter().map(|u| u.percent).collect()
    }

    /// Last reported percentage, if any.
    pub fn last_percent(&self) -> Option<f64> {
        self.percents().last().copied()
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, update: &ProgressUpdate) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(update.clone());
        }
    }
}
