use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visual style appended to the user's prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Realistic,
    Anime,
    Oil,
    Watercolor,
}

impl Style {
    pub const ALL: [Style; 4] = [Style::Realistic, Style::Anime, Style::Oil, Style::Watercolor];

    pub fn key(&self) -> &'static str {
        match self {
            Style::Realistic => "realistic",
            Style::Anime => "anime",
            Style::Oil => "oil",
            Style::Watercolor => "watercolor",
        }
    }

    /// Descriptive text the image API sees after the user's prompt.
    pub fn suffix(&self) -> &'static str {
        match self {
            Style::Realistic => "写实风格，真实照片效果",
            Style::Anime => "动漫风格，二次元插画效果",
            Style::Oil => "油画风格，厚重笔触效果",
            Style::Watercolor => "水彩风格，清新淡雅效果",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Style::Realistic => "写实风格",
            Style::Anime => "动漫风格",
            Style::Oil => "油画风格",
            Style::Watercolor => "水彩风格",
        }
    }

    /// Lenient lookup: unknown keys fall back to the default style.
    pub fn from_key_or_default(key: &str) -> Style {
        key.parse().unwrap_or_else(|_| {
            log::warn!(
                "Unknown style '{}', falling back to {}",
                key,
                Style::default().key()
            );
            Style::default()
        })
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Style {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        Style::ALL
            .iter()
            .copied()
            .find(|style| style.key() == key)
            .ok_or_else(|| StudioError::UnknownStyle(s.to_string()))
    }
}
