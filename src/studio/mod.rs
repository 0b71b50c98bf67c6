pub mod download;
pub mod image_client;

pub use download::{derive_filename, download_image, sanitize_prompt, save_image};
pub use image_client::{FetchedImage, ImageClient};

use crate::{
    config::StudioConfig,
    error::{Result, StudioError},
    logger,
    models::{GenerationRecord, Sampler, Style},
    state::StudioState,
    storage::{self, ImageStorage, SavedImage},
};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

/// Session front door: owns the selections, the history, the HTTP client
/// and the storage backend.
///
/// State lives behind a mutex that is never held across I/O, so edits,
/// reads and downloads can run while a generation is in flight. Only one
/// generation may be in flight at a time.
///
/// The bytes of the most recent successful generation are kept, so saving
/// that image does not fetch it again. Older history entries are fetched
/// on download.
pub struct Studio {
    config: StudioConfig,
    image_client: ImageClient,
    storage: Arc<dyn ImageStorage>,
    state: Mutex<StudioState>,
    last_image: Mutex<Option<(String, FetchedImage)>>,
}

impl Studio {
    pub fn new(config: StudioConfig) -> Result<Self> {
        let storage = storage::from_config(&config);
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: StudioConfig, storage: Arc<dyn ImageStorage>) -> Result<Self> {
        config.validate()?;
        let image_client = ImageClient::new(config.request_timeout())?;
        let state = StudioState::new(config.history_capacity);

        Ok(Self {
            config,
            image_client,
            storage,
            state: Mutex::new(state),
            last_image: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn ImageStorage> {
        &self.storage
    }

    fn lock(&self) -> MutexGuard<'_, StudioState> {
        // The guarded value is only ever replaced whole, so a poisoned lock
        // still holds a consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> StudioState {
        self.lock().clone()
    }

    /// Replaces the state with `transition(current)` and returns it.
    pub fn apply<F>(&self, transition: F) -> StudioState
    where
        F: FnOnce(&StudioState) -> StudioState,
    {
        let mut state = self.lock();
        *state = transition(&state);
        state.clone()
    }

    /// Like [`Studio::apply`] for transitions that can reject their input;
    /// on error the state is left as it was.
    pub fn try_apply<F>(&self, transition: F) -> Result<StudioState>
    where
        F: FnOnce(&StudioState) -> Result<StudioState>,
    {
        let mut state = self.lock();
        *state = transition(&state)?;
        Ok(state.clone())
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) -> StudioState {
        let prompt = prompt.into();
        self.apply(|state| state.with_prompt(prompt))
    }

    pub fn set_style(&self, style: Style) -> StudioState {
        self.apply(|state| state.with_style(style))
    }

    pub fn select_size(&self, selection: &str) -> StudioState {
        self.apply(|state| state.select_size(selection))
    }

    pub fn set_width(&self, width: u32) -> StudioState {
        self.apply(|state| state.with_width(width))
    }

    pub fn set_height(&self, height: u32) -> StudioState {
        self.apply(|state| state.with_height(height))
    }

    pub fn set_seed(&self, seed: u64) -> StudioState {
        self.apply(|state| state.with_seed(seed))
    }

    pub fn set_steps(&self, steps: u32) -> StudioState {
        self.apply(|state| state.with_steps(steps))
    }

    pub fn set_cfg_scale(&self, cfg_scale: f64) -> Result<StudioState> {
        self.try_apply(|state| state.with_cfg_scale(cfg_scale))
    }

    pub fn set_sampler(&self, sampler: Sampler) -> StudioState {
        self.apply(|state| state.with_sampler(sampler))
    }

    /// URL for the current selections without generating anything.
    pub fn request_url(&self) -> Result<Url> {
        self.lock().request_url(&self.config.endpoint)
    }

    pub fn history(&self) -> Vec<GenerationRecord> {
        self.lock().history.to_vec()
    }

    pub fn reuse(&self, record_id: &str) -> Result<GenerationRecord> {
        let mut state = self.lock();
        let (record, next) = state.reuse(record_id)?;
        *state = next;
        Ok(record)
    }

    /// Abandons the request in flight, if any.
    pub fn cancel(&self) -> StudioState {
        self.apply(StudioState::cancel_generation)
    }

    /// Builds the request for the current selections, waits for the image
    /// to resolve and records it. On failure history and seed are left
    /// alone and the status becomes `Failed`.
    pub async fn generate(&self) -> Result<GenerationRecord> {
        let pending = {
            let mut state = self.lock();
            let (pending, next) =
                state.begin_generation(&self.config.endpoint, Utc::now().timestamp_millis())?;
            *state = next;
            pending
        };

        let tag = short_id(&pending.request_id);
        log::info!(
            "🎨 [{}] Generating \"{}\" at {} with seed {}",
            tag,
            pending.record.prompt,
            pending.record.size,
            pending.record.params.seed
        );
        log::debug!("[{}] {}", tag, pending.record.url);

        let mut in_flight = InFlight {
            studio: self,
            request_id: Some(pending.request_id.clone()),
        };
        let mut timer = logger::timer(&format!("Generation {}", tag));
        let outcome = self.image_client.fetch(&pending.record.url).await;
        timer.stop();
        in_flight.disarm();

        match outcome {
            Ok(image) => {
                let record = pending.record.clone();
                let state = self.apply(|state| state.complete_generation(pending));
                log::info!(
                    "✅ [{}] Image ready ({} bytes), next seed {}",
                    tag,
                    image.bytes.len(),
                    state.params.seed
                );
                *self
                    .last_image
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some((record.url.clone(), image));
                Ok(record)
            }
            Err(e) => {
                log::error!("❌ [{}] Generation failed: {}", tag, e);
                self.apply(|state| state.fail_generation(&pending, e.to_string()));
                Err(e)
            }
        }
    }

    /// Saves the image currently on display, named after the current prompt.
    pub async fn download_current(&self) -> Result<SavedImage> {
        let (url, prompt) = {
            let state = self.lock();
            let url = state
                .displayed_url()
                .map(str::to_string)
                .ok_or_else(|| StudioError::InvalidInput("no image is displayed".into()))?;
            (url, state.prompt.clone())
        };
        self.download_url(&url, &prompt).await
    }

    /// Saves a history entry, named after its prompt.
    pub async fn download_record(&self, record_id: &str) -> Result<SavedImage> {
        let record = self
            .lock()
            .history
            .get(record_id)
            .cloned()
            .ok_or_else(|| StudioError::UnknownRecord(record_id.to_string()))?;
        self.download_url(&record.url, &record.prompt).await
    }

    fn cached_image(&self, url: &str) -> Option<FetchedImage> {
        match &*self.last_image.lock().unwrap_or_else(PoisonError::into_inner) {
            Some((cached_url, image)) if cached_url == url => Some(image.clone()),
            _ => None,
        }
    }

    async fn download_url(&self, url: &str, prompt: &str) -> Result<SavedImage> {
        let now_ms = Utc::now().timestamp_millis();
        if let Some(image) = self.cached_image(url) {
            log::debug!("Saving cached bytes for {}", url);
            return save_image(self.storage.as_ref(), &image, prompt, now_ms).await;
        }
        download_image(
            &self.image_client,
            self.storage.as_ref(),
            url,
            prompt,
            now_ms,
        )
        .await
    }
}

fn short_id(request_id: &str) -> String {
    request_id.chars().take(8).collect()
}

// Returns the studio to Idle if a generation future is dropped before its
// image resolves.
struct InFlight<'a> {
    studio: &'a Studio,
    request_id: Option<String>,
}

impl InFlight<'_> {
    fn disarm(&mut self) {
        self.request_id = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(request_id) = self.request_id.take() {
            log::warn!("[{}] Generation abandoned", short_id(&request_id));
            self.studio.apply(|state| {
                if state.is_requesting(&request_id) {
                    state.cancel_generation()
                } else {
                    state.clone()
                }
            });
        }
    }
}
