use crate::{
    error::Result,
    storage::traits::{ImageStorage, SavedImage},
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keeps saved images in memory. Handy for embedding the client where
/// nothing should touch disk.
#[derive(Default)]
pub struct MemoryImageStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryImageStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, filename: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(filename).cloned()
    }

    pub async fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl ImageStorage for MemoryImageStorage {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<SavedImage> {
        self.files
            .write()
            .await
            .insert(filename.to_string(), bytes.to_vec());
        Ok(SavedImage {
            filename: filename.to_string(),
            location: format!("memory://{}", filename),
            bytes_written: bytes.len(),
        })
    }

    async fn exists(&self, filename: &str) -> Result<bool> {
        Ok(self.files.read().await.contains_key(filename))
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}
