// pollgen - prompt, size and style selection for Pollinations-style image APIs
// Builds request URLs, keeps an in-session history and saves images.

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod session;
pub mod state;
pub mod storage;
pub mod studio;

pub use config::{ImageEndpoint, StudioConfig};
pub use error::{Result, StudioError};
pub use models::{
    AspectRatio, GenerationParameters, GenerationRecord, ImageSize, Sampler, Style, PRESET_SIZES,
};
pub use state::{build_request_url, compose_prompt, HistoryStore, RequestStatus, StudioState};
pub use storage::{ImageStorage, LocalDirectoryStorage, MemoryImageStorage, SavedImage};
pub use studio::{ImageClient, Studio};
