use crate::error::Result;
use async_trait::async_trait;

/// Destination for downloaded images.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Stores `bytes` under `filename`. Either the whole file is stored or
    /// nothing is.
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<SavedImage>;

    async fn exists(&self, filename: &str) -> Result<bool>;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SavedImage {
    pub filename: String,
    pub location: String,
    pub bytes_written: usize,
}
