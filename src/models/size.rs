use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_DIMENSION: u32 = 64;
/// Above the 1024 the width/height inputs suggest, because the portrait
/// presets already reach 1820.
pub const MAX_DIMENSION: u32 = 2048;

pub const CUSTOM_LABEL: &str = "custom";

/// `W:H` aspect ratio with both terms positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `round(width * h / w)`, halves rounded up.
    pub fn height_for(&self, width: u32) -> u32 {
        round_div(width as u64 * self.height as u64, self.width as u64)
    }

    /// `round(height * w / h)`, halves rounded up.
    pub fn width_for(&self, height: u32) -> u32 {
        round_div(height as u64 * self.width as u64, self.height as u64)
    }

    /// Widths whose derived height stays inside the dimension bounds.
    pub fn width_range(&self) -> (u32, u32) {
        feasible_range(self.width, self.height)
    }

    /// Heights whose derived width stays inside the dimension bounds.
    pub fn height_range(&self) -> (u32, u32) {
        feasible_range(self.height, self.width)
    }
}

fn round_div(numerator: u64, denominator: u64) -> u32 {
    let denominator = denominator.max(1);
    let rounded = (2 * numerator + denominator) / (2 * denominator);
    rounded.min(u32::MAX as u64) as u32
}

// Values `v` in [MIN, MAX] such that v * other / own also lands in [MIN, MAX].
fn feasible_range(own: u32, other: u32) -> (u32, u32) {
    let (own, other) = (own.max(1) as u64, other.max(1) as u64);
    let min = (MIN_DIMENSION as u64 * own).div_ceil(other);
    let max = MAX_DIMENSION as u64 * own / other;
    let low = min.clamp(MIN_DIMENSION as u64, MAX_DIMENSION as u64) as u32;
    let high = max.clamp(MIN_DIMENSION as u64, MAX_DIMENSION as u64) as u32;
    (low, high.max(low))
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || StudioError::InvalidInput(format!("invalid aspect ratio: {}", s));
        let (w, h) = s.trim().split_once(':').ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(AspectRatio::new(width, height))
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = StudioError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(ratio: AspectRatio) -> Self {
        ratio.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetSize {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub ratio: AspectRatio,
}

pub const PRESET_SIZES: [PresetSize; 5] = [
    PresetSize {
        label: "1:1",
        width: 1024,
        height: 1024,
        ratio: AspectRatio::new(1, 1),
    },
    PresetSize {
        label: "3:2",
        width: 1024,
        height: 683,
        ratio: AspectRatio::new(3, 2),
    },
    PresetSize {
        label: "2:3",
        width: 1024,
        height: 1536,
        ratio: AspectRatio::new(2, 3),
    },
    PresetSize {
        label: "16:9",
        width: 1024,
        height: 576,
        ratio: AspectRatio::new(16, 9),
    },
    PresetSize {
        label: "9:16",
        width: 1024,
        height: 1820,
        ratio: AspectRatio::new(9, 16),
    },
];

pub fn find_preset(ratio_id: &str) -> Option<&'static PresetSize> {
    let ratio_id = ratio_id.trim();
    PRESET_SIZES.iter().find(|preset| preset.label == ratio_id)
}

pub fn clamp_dimension(value: u32) -> u32 {
    value.clamp(MIN_DIMENSION, MAX_DIMENSION)
}

/// The currently selected output size. `ratio` is set for presets and
/// locks width and height together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
    pub label: String,
    pub ratio: Option<AspectRatio>,
}

impl ImageSize {
    pub fn custom(width: u32, height: u32) -> Self {
        Self {
            width: clamp_dimension(width),
            height: clamp_dimension(height),
            label: CUSTOM_LABEL.to_string(),
            ratio: None,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.ratio.is_none()
    }

    /// Value shown in a ratio picker: the preset label, or `custom`.
    pub fn selection_id(&self) -> String {
        match self.ratio {
            Some(ratio) => ratio.to_string(),
            None => CUSTOM_LABEL.to_string(),
        }
    }
}

impl From<&PresetSize> for ImageSize {
    fn from(preset: &PresetSize) -> Self {
        Self {
            width: preset.width,
            height: preset.height,
            label: preset.label.to_string(),
            ratio: Some(preset.ratio),
        }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        ImageSize::from(&PRESET_SIZES[0])
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} ({})", self.width, self.height, self.label)
    }
}
