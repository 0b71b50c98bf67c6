pub mod composer;
pub mod history;
pub mod resolver;

pub use composer::{build_request_url, compose_prompt, compose_prompt_for_key, STYLE_SEPARATOR};
pub use history::HistoryStore;

use crate::{
    config::ImageEndpoint,
    error::{Result, StudioError},
    models::{GenerationParameters, GenerationRecord, ImageSize, Sampler, Style},
};
use serde::Serialize;
use url::Url;
use uuid::Uuid;

/// Lifecycle of a single generation request.
///
/// `Failed` accepts a new submit exactly like `Idle`; only `Requesting`
/// blocks one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RequestStatus {
    Idle,
    Requesting { request_id: String, url: String },
    Displayed { record_id: String, url: String },
    Failed { message: String },
}

/// A request that has been built but whose image has not resolved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingGeneration {
    pub request_id: String,
    pub record: GenerationRecord,
}

/// Everything the user has picked plus the session history.
///
/// Transitions never mutate `self`; each returns the next state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudioState {
    pub prompt: String,
    pub style: Style,
    pub size: ImageSize,
    pub params: GenerationParameters,
    pub history: HistoryStore,
    pub status: RequestStatus,
}

impl Default for StudioState {
    fn default() -> Self {
        Self::new(HistoryStore::default().capacity())
    }
}

impl StudioState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            prompt: String::new(),
            style: Style::default(),
            size: ImageSize::default(),
            params: GenerationParameters::default(),
            history: HistoryStore::new(history_capacity),
            status: RequestStatus::Idle,
        }
    }

    pub fn with_prompt(&self, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..self.clone()
        }
    }

    pub fn with_style(&self, style: Style) -> Self {
        Self {
            style,
            ..self.clone()
        }
    }

    pub fn with_size(&self, size: ImageSize) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    /// `custom` or a preset label such as `16:9`.
    pub fn select_size(&self, selection: &str) -> Self {
        self.with_size(resolver::select_size(&self.size, selection))
    }

    pub fn with_width(&self, width: u32) -> Self {
        self.with_size(resolver::set_width(&self.size, width))
    }

    pub fn with_height(&self, height: u32) -> Self {
        self.with_size(resolver::set_height(&self.size, height))
    }

    pub fn with_params(&self, params: GenerationParameters) -> Self {
        Self {
            params,
            ..self.clone()
        }
    }

    pub fn with_seed(&self, seed: u64) -> Self {
        self.with_params(self.params.with_seed(seed))
    }

    pub fn with_steps(&self, steps: u32) -> Self {
        self.with_params(self.params.with_steps(steps))
    }

    pub fn with_cfg_scale(&self, cfg_scale: f64) -> Result<Self> {
        Ok(self.with_params(self.params.with_cfg_scale(cfg_scale)?))
    }

    pub fn with_sampler(&self, sampler: Sampler) -> Self {
        self.with_params(self.params.with_sampler(sampler))
    }

    pub fn composed_prompt(&self) -> String {
        compose_prompt(&self.prompt, self.style)
    }

    /// URL the current selections would request. Touches neither history
    /// nor seed.
    pub fn request_url(&self, endpoint: &ImageEndpoint) -> Result<Url> {
        build_request_url(&self.composed_prompt(), &self.size, &self.params, endpoint)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.status, RequestStatus::Requesting { .. })
    }

    /// URL of the image currently on display, if any.
    pub fn displayed_url(&self) -> Option<&str> {
        match &self.status {
            RequestStatus::Displayed { url, .. } => Some(url.as_str()),
            _ => None,
        }
    }

    /// Idle/Displayed/Failed → Requesting. Builds the record that will be
    /// committed once the image resolves.
    pub fn begin_generation(
        &self,
        endpoint: &ImageEndpoint,
        now_ms: i64,
    ) -> Result<(PendingGeneration, Self)> {
        if self.is_busy() {
            return Err(StudioError::GenerationInFlight);
        }
        if self.prompt.trim().is_empty() {
            return Err(StudioError::EmptyPrompt);
        }

        let prompt = self.composed_prompt();
        let url = build_request_url(&prompt, &self.size, &self.params, endpoint)?;
        let timestamp = self.history.next_timestamp(now_ms);
        let request_id = Uuid::new_v4().to_string();

        let record = GenerationRecord {
            id: timestamp.to_string(),
            url: url.to_string(),
            prompt,
            timestamp,
            style: self.style,
            size: self.size.clone(),
            params: self.params,
        };

        let next = Self {
            status: RequestStatus::Requesting {
                request_id: request_id.clone(),
                url: record.url.clone(),
            },
            ..self.clone()
        };

        Ok((PendingGeneration { request_id, record }, next))
    }

    /// True while the request with this id is the one in flight.
    pub fn is_requesting(&self, id: &str) -> bool {
        matches!(
            &self.status,
            RequestStatus::Requesting { request_id, .. } if request_id == id
        )
    }

    fn is_pending(&self, pending: &PendingGeneration) -> bool {
        self.is_requesting(&pending.request_id)
    }

    /// Requesting → Displayed: records the generation and moves the seed
    /// one past the seed that was used.
    pub fn complete_generation(&self, pending: PendingGeneration) -> Self {
        if !self.is_pending(&pending) {
            log::warn!(
                "Ignoring completion of stale request {}",
                pending.request_id
            );
            return self.clone();
        }

        let next_seed = pending.record.params.next().seed;
        Self {
            status: RequestStatus::Displayed {
                record_id: pending.record.id.clone(),
                url: pending.record.url.clone(),
            },
            params: self.params.with_seed(next_seed),
            history: self.history.with_record(pending.record),
            ..self.clone()
        }
    }

    /// Requesting → Failed. History and seed stay as they were.
    pub fn fail_generation(&self, pending: &PendingGeneration, message: impl Into<String>) -> Self {
        if !self.is_pending(pending) {
            log::warn!("Ignoring failure of stale request {}", pending.request_id);
            return self.clone();
        }
        Self {
            status: RequestStatus::Failed {
                message: message.into(),
            },
            ..self.clone()
        }
    }

    /// Requesting → Idle. A completion that arrives afterwards is stale and
    /// gets ignored.
    pub fn cancel_generation(&self) -> Self {
        if !self.is_busy() {
            return self.clone();
        }
        Self {
            status: RequestStatus::Idle,
            ..self.clone()
        }
    }

    /// Puts a history entry back on display.
    pub fn reuse(&self, record_id: &str) -> Result<(GenerationRecord, Self)> {
        if self.is_busy() {
            return Err(StudioError::GenerationInFlight);
        }
        let record = self
            .history
            .get(record_id)
            .cloned()
            .ok_or_else(|| StudioError::UnknownRecord(record_id.to_string()))?;

        let next = Self {
            status: RequestStatus::Displayed {
                record_id: record.id.clone(),
                url: record.url.clone(),
            },
            ..self.clone()
        };
        Ok((record, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> ImageEndpoint {
        ImageEndpoint::default()
    }

    fn generate(state: &StudioState, now_ms: i64) -> StudioState {
        let (pending, requesting) = state.begin_generation(&endpoint(), now_ms).unwrap();
        requesting.complete_generation(pending)
    }

    #[test]
    fn empty_prompt_is_rejected() {
        let state = StudioState::default().with_prompt("   ");
        assert!(matches!(
            state.begin_generation(&endpoint(), 1),
            Err(StudioError::EmptyPrompt)
        ));
    }

    #[test]
    fn successful_generation_records_and_bumps_seed() {
        let state = StudioState::default()
            .with_prompt("cat")
            .with_style(Style::Anime);

        let (pending, requesting) = state.begin_generation(&endpoint(), 1_000).unwrap();
        assert!(requesting.is_busy());
        assert!(state.history.is_empty());
        assert_eq!(pending.record.prompt, "cat，动漫风格，二次元插画效果");
        assert_eq!(pending.record.id, "1000");
        assert!(pending.record.url.contains("seed=100"));

        let done = requesting.complete_generation(pending);
        assert_eq!(done.params.seed, 101);
        assert_eq!(done.history.len(), 1);
        assert!(!done.is_busy());
        assert_eq!(done.displayed_url(), Some(done.history.newest().unwrap().url.as_str()));
    }

    #[test]
    fn second_submit_while_requesting_is_rejected() {
        let state = StudioState::default().with_prompt("cat");
        let (_, requesting) = state.begin_generation(&endpoint(), 1).unwrap();
        assert!(matches!(
            requesting.begin_generation(&endpoint(), 2),
            Err(StudioError::GenerationInFlight)
        ));
    }

    #[test]
    fn failure_keeps_history_and_seed() {
        let state = generate(&StudioState::default().with_prompt("cat"), 1);
        let (pending, requesting) = state.begin_generation(&endpoint(), 2).unwrap();
        let failed = requesting.fail_generation(&pending, "HTTP 500");

        assert_eq!(failed.history, state.history);
        assert_eq!(failed.params.seed, state.params.seed);
        assert_eq!(
            failed.status,
            RequestStatus::Failed {
                message: "HTTP 500".into()
            }
        );

        // Failed behaves like Idle for the next submit.
        assert!(failed.begin_generation(&endpoint(), 3).is_ok());
    }

    #[test]
    fn eleven_generations_keep_ten_newest() {
        let mut state = StudioState::default().with_prompt("cat");
        for i in 0..11 {
            state = generate(&state, 1_000 + i);
        }

        assert_eq!(state.history.len(), 10);
        assert!(state.history.get("1000").is_none());
        assert_eq!(state.params.seed, 111);

        let timestamps: Vec<i64> = state.history.iter().map(|r| r.timestamp).collect();
        assert!(timestamps.windows(2).all(|pair| pair[0] > pair[1]));

        let seeds: Vec<u64> = state.history.iter().map(|r| r.params.seed).collect();
        assert_eq!(seeds.first(), Some(&110));
        assert_eq!(seeds.last(), Some(&101));
    }

    #[test]
    fn same_millisecond_generations_get_distinct_ids() {
        let state = StudioState::default().with_prompt("cat");
        let state = generate(&state, 5);
        let state = generate(&state, 5);
        let ids: Vec<&str> = state.history.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["6", "5"]);
    }

    #[test]
    fn other_parameters_persist_across_generations() {
        let state = StudioState::default()
            .with_prompt("cat")
            .with_steps(12)
            .with_sampler(Sampler::Lms)
            .select_size("2:3");
        let state = generate(&state, 1);
        assert_eq!(state.params.steps, 12);
        assert_eq!(state.params.sampler, Sampler::Lms);
        assert_eq!(state.size.label, "2:3");
    }

    #[test]
    fn stale_completion_is_ignored() {
        let state = StudioState::default().with_prompt("cat");
        let (pending, _) = state.begin_generation(&endpoint(), 1).unwrap();
        let unchanged = state.complete_generation(pending);
        assert_eq!(unchanged, state);
    }

    #[test]
    fn completion_after_cancel_is_ignored() {
        let state = StudioState::default().with_prompt("cat");
        let (pending, requesting) = state.begin_generation(&endpoint(), 1).unwrap();
        let cancelled = requesting.cancel_generation();
        assert_eq!(cancelled.status, RequestStatus::Idle);

        let after = cancelled.complete_generation(pending);
        assert!(after.history.is_empty());
        assert_eq!(after.params.seed, 100);
    }

    #[test]
    fn reuse_redisplays_history_entry() {
        let state = generate(&StudioState::default().with_prompt("cat"), 1);
        let state = generate(&state.with_prompt("dog"), 2);

        let (record, state) = state.reuse("1").unwrap();
        assert!(record.prompt.starts_with("cat"));
        assert_eq!(state.displayed_url(), Some(record.url.as_str()));
        assert!(matches!(
            state.reuse("404"),
            Err(StudioError::UnknownRecord(_))
        ));
    }

    #[test]
    fn request_url_has_no_side_effects() {
        let state = StudioState::default().with_prompt("cat");
        let first = state.request_url(&endpoint()).unwrap();
        let second = state.request_url(&endpoint()).unwrap();
        assert_eq!(first, second);
        assert_eq!(state.params.seed, 100);
        assert!(state.history.is_empty());
    }
}
