pub mod local;
pub mod memory;
pub mod traits;

pub use local::LocalDirectoryStorage;
pub use memory::MemoryImageStorage;
pub use traits::{ImageStorage, SavedImage};

use crate::config::StudioConfig;
use std::sync::Arc;

/// Storage backend the CLI uses: the configured output directory.
pub fn from_config(config: &StudioConfig) -> Arc<dyn ImageStorage> {
    Arc::new(LocalDirectoryStorage::new(config.output_dir.clone()))
}
