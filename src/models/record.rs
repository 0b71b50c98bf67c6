use serde::{Deserialize, Serialize};

use super::{GenerationParameters, ImageSize, Style};

/// One finished generation. Built once and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: String,
    pub url: String,
    /// Final prompt including the style suffix.
    pub prompt: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub style: Style,
    pub size: ImageSize,
    pub params: GenerationParameters,
}

impl GenerationRecord {
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
    }
}
