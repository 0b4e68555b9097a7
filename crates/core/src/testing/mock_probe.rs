//! Mock probe for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::MediaDescriptor;
use crate::probe::MediaProbe;

/// Mock implementation of the MediaProbe trait.
///
/// Returns pre-configured descriptors by path, then the default descriptor
/// (re-pointed at the probed path), then an unknown descriptor. Every probed
/// path is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    descriptors: Arc<RwLock<HashMap<PathBuf, MediaDescriptor>>>,
    default_descriptor: Arc<RwLock<Option<MediaDescriptor>>>,
    calls: Arc<RwLock<Vec<PathBuf>>>,
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the descriptor returned for a specific path.
    pub async fn set_descriptor(&self, path: impl AsRef<Path>, descriptor: MediaDescriptor) {
        self.descriptors
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), descriptor);
    }

    /// Set the descriptor returned for paths without a specific one.
    pub async fn set_default_descriptor(&self, descriptor: MediaDescriptor) {
        *self.default_descriptor.write().await = Some(descriptor);
    }

    /// Paths probed so far, in call order.
    pub async fn calls(&self) -> Vec<PathBuf> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl MediaProbe for MockProbe {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> MediaDescriptor {
        self.calls.write().await.push(path.to_path_buf());

        if let Some(descriptor) = self.descriptors.read().await.get(path) {
            return descriptor.clone();
        }

        if let Some(descriptor) = self.default_descriptor.read().await.as_ref() {
            let mut descriptor = descriptor.clone();
            descriptor.path = path.to_path_buf();
            return descriptor;
        }

        let size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
        MediaDescriptor::unknown(path, size)
    }
}
