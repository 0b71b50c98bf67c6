use crate::error::{Result, StudioError};
use crate::logger::LogLevel;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://image.pollinations.ai";
pub const DEFAULT_MODEL: &str = "flux";
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Where generation requests are sent and the fixed query values that go
/// with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEndpoint {
    pub base_url: String,
    pub model: String,
    pub nologo: bool,
}

impl Default for ImageEndpoint {
    fn default() -> Self {
        ImageEndpoint {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            nologo: true,
        }
    }
}

impl ImageEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_nologo(mut self, nologo: bool) -> Self {
        self.nologo = nologo;
        self
    }

    /// `<base>/prompt/` with any trailing slash on the base collapsed.
    pub fn prompt_root(&self) -> String {
        format!("{}/prompt/", self.base_url.trim_end_matches('/'))
    }

    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StudioError::ConfigError(format!(
                "base URL must use http or https, got {}",
                parsed.scheme()
            )));
        }
        if parsed.query().is_some() {
            return Err(StudioError::ConfigError(
                "base URL must not carry a query string".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(StudioError::ConfigError("model must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub endpoint: ImageEndpoint,
    pub output_dir: PathBuf,
    pub history_capacity: usize,
    pub request_timeout_secs: Option<u64>,
    pub log_level: LogLevel,
}

impl Default for StudioConfig {
    fn default() -> Self {
        StudioConfig {
            endpoint: ImageEndpoint::default(),
            output_dir: PathBuf::from("."),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            request_timeout_secs: None,
            log_level: LogLevel::Info,
        }
    }
}

impl StudioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = env::var("POLLGEN_BASE_URL").unwrap_or(defaults.endpoint.base_url);
        let model = env::var("POLLGEN_MODEL").unwrap_or(defaults.endpoint.model);
        let nologo = env::var("POLLGEN_NOLOGO")
            .ok()
            .map_or(defaults.endpoint.nologo, |val| val != "false");
        let output_dir = env::var("POLLGEN_OUTPUT_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);
        let history_capacity = env::var("POLLGEN_HISTORY_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.history_capacity);
        let request_timeout_secs = env::var("POLLGEN_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok());
        let log_level = env::var("POLLGEN_LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.log_level);

        StudioConfig {
            endpoint: ImageEndpoint {
                base_url,
                model,
                nologo,
            },
            output_dir,
            history_capacity,
            request_timeout_secs,
            log_level,
        }
    }

    pub fn with_endpoint(mut self, endpoint: ImageEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.endpoint.base_url = base_url.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        self.endpoint.validate()?;
        if !(1..=DEFAULT_HISTORY_CAPACITY).contains(&self.history_capacity) {
            return Err(StudioError::ConfigError(format!(
                "history capacity must be between 1 and {}, got {}",
                DEFAULT_HISTORY_CAPACITY, self.history_capacity
            )));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(StudioError::ConfigError(
                "request timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}
