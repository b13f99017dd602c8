//! Session configuration.

use crate::command::DEFAULT_BLOCK_TYPE;
use crate::dispatch::image_url::DEFAULT_IMAGE_EXTENSIONS;
use crate::model::node::BlockType;
use crate::schema::MAX_NORMALIZE_PASSES;
use crate::service::persistence_gateway::STORAGE_KEY;
use std::time::Duration;

/// Upper bound on waiting for in-flight image decodes to land.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for one `EditorSession`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Storage key the snapshot is saved under.
    pub storage_key: String,
    /// Type restored when a block type or list is toggled off.
    pub default_block: BlockType,
    /// Extensions that make a dropped/pasted URL an image.
    pub image_extensions: Vec<String>,
    /// How long `settle_decodes` waits for one completion.
    pub settle_timeout: Duration,
    /// Repair pass limit of the schema normalizer.
    pub max_normalize_passes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
            default_block: DEFAULT_BLOCK_TYPE,
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
            max_normalize_passes: MAX_NORMALIZE_PASSES,
        }
    }
}

impl SessionConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }
}
