use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SEED: u64 = 100;
pub const DEFAULT_STEPS: u32 = 30;
pub const DEFAULT_CFG_SCALE: f64 = 7.5;

pub const MIN_STEPS: u32 = 1;
pub const MAX_STEPS: u32 = 150;
pub const MIN_CFG_SCALE: f64 = 1.0;
pub const MAX_CFG_SCALE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sampler {
    #[default]
    #[serde(rename = "euler_a")]
    EulerAncestral,
    #[serde(rename = "euler")]
    Euler,
    #[serde(rename = "lms")]
    Lms,
    #[serde(rename = "heun")]
    Heun,
    #[serde(rename = "dpm2")]
    Dpm2,
    #[serde(rename = "dpm2_a")]
    Dpm2Ancestral,
}

impl Sampler {
    pub const ALL: [Sampler; 6] = [
        Sampler::EulerAncestral,
        Sampler::Euler,
        Sampler::Lms,
        Sampler::Heun,
        Sampler::Dpm2,
        Sampler::Dpm2Ancestral,
    ];

    /// Wire value of the `sampler` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sampler::EulerAncestral => "euler_a",
            Sampler::Euler => "euler",
            Sampler::Lms => "lms",
            Sampler::Heun => "heun",
            Sampler::Dpm2 => "dpm2",
            Sampler::Dpm2Ancestral => "dpm2_a",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Sampler::EulerAncestral => "Euler Ancestral",
            Sampler::Euler => "Euler",
            Sampler::Lms => "LMS",
            Sampler::Heun => "Heun",
            Sampler::Dpm2 => "DPM2",
            Sampler::Dpm2Ancestral => "DPM2 Ancestral",
        }
    }
}

impl fmt::Display for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sampler {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        Sampler::ALL
            .iter()
            .copied()
            .find(|sampler| sampler.as_str() == key)
            .ok_or_else(|| StudioError::UnknownSampler(s.to_string()))
    }
}

/// Knobs forwarded to the image API. Setters clamp into the accepted
/// ranges; the seed is unsigned so it can never go negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub seed: u64,
    pub steps: u32,
    pub cfg_scale: f64,
    pub sampler: Sampler,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            steps: DEFAULT_STEPS,
            cfg_scale: DEFAULT_CFG_SCALE,
            sampler: Sampler::default(),
        }
    }
}

impl GenerationParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps.clamp(MIN_STEPS, MAX_STEPS);
        self
    }

    pub fn with_cfg_scale(mut self, cfg_scale: f64) -> Result<Self> {
        if !cfg_scale.is_finite() {
            return Err(StudioError::InvalidInput(format!(
                "cfg scale must be a finite number, got {}",
                cfg_scale
            )));
        }
        self.cfg_scale = cfg_scale.clamp(MIN_CFG_SCALE, MAX_CFG_SCALE);
        Ok(self)
    }

    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// Parameters for the generation after this one.
    pub fn next(self) -> Self {
        Self {
            seed: self.seed.wrapping_add(1),
            ..self
        }
    }
}

/// Parses a numeric field typed by the user, naming the field on failure.
pub fn parse_number<T: FromStr>(field: &str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        StudioError::InvalidInput(format!("{} must be a number, got '{}'", field, raw.trim()))
    })
}
