use crate::{
    error::{Result, StudioError},
    storage::traits::{ImageStorage, SavedImage},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Writes images into a directory, creating it on first use.
pub struct LocalDirectoryStorage {
    dir: PathBuf,
}

impl LocalDirectoryStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn target(&self, filename: &str) -> Result<PathBuf> {
        let plain = !filename.is_empty()
            && !filename.starts_with('.')
            && !filename.contains(['/', '\\'])
            && Path::new(filename).file_name().is_some();
        if !plain {
            return Err(StudioError::StorageError(format!(
                "refusing to write outside the output directory: {:?}",
                filename
            )));
        }
        Ok(self.dir.join(filename))
    }
}

#[async_trait]
impl ImageStorage for LocalDirectoryStorage {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<SavedImage> {
        let target = self.target(filename)?;
        fs::create_dir_all(&self.dir).await?;

        // Write next to the target and rename, so a failed write never
        // leaves a truncated image under the final name.
        let partial = self.dir.join(format!(".{}.part", filename));
        if let Err(e) = fs::write(&partial, bytes).await {
            let _ = fs::remove_file(&partial).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&partial, &target).await {
            let _ = fs::remove_file(&partial).await;
            return Err(e.into());
        }

        log::debug!("Wrote {} bytes to {}", bytes.len(), target.display());
        Ok(SavedImage {
            filename: filename.to_string(),
            location: target.display().to_string(),
            bytes_written: bytes.len(),
        })
    }

    async fn exists(&self, filename: &str) -> Result<bool> {
        let target = self.target(filename)?;
        Ok(fs::try_exists(&target).await?)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}
