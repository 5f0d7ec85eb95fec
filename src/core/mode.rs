//! Effect modes and the "mode of the day" resolver.
//!
//! Renderers only understand concrete [`EffectMode`]s. Users may instead pick
//! [`ModeSelection::Random`], which resolves to a different concrete mode each
//! calendar day and stays stable within that day, across restarts included.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Concrete visual effect identifier consumed by renderers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectMode {
    #[default]
    Blur,
    PixelFreeze,
    PixelBlackout,
    SleepyEmoji,
    Distortion,
    Messages,
    SideSwipe,
}

impl EffectMode {
    /// Fixed, ordered pool used by the random resolver.
    pub const ALL: [EffectMode; 7] = [
        EffectMode::Blur,
        EffectMode::PixelFreeze,
        EffectMode::PixelBlackout,
        EffectMode::SleepyEmoji,
        EffectMode::Distortion,
        EffectMode::Messages,
        EffectMode::SideSwipe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectMode::Blur => "blur",
            EffectMode::PixelFreeze => "pixel-freeze",
            EffectMode::PixelBlackout => "pixel-blackout",
            EffectMode::SleepyEmoji => "sleepy-emoji",
            EffectMode::Distortion => "distortion",
            EffectMode::Messages => "messages",
            EffectMode::SideSwipe => "side-swipe",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EffectMode::Blur => "Blur",
            EffectMode::PixelFreeze => "Pixel Freeze",
            EffectMode::PixelBlackout => "Pixel Blackout",
            EffectMode::SleepyEmoji => "Sleepy Emoji",
            EffectMode::Distortion => "Distortion",
            EffectMode::Messages => "Messages",
            EffectMode::SideSwipe => "Side Swipe",
        }
    }

    /// One-line description shown next to the mode picker.
    pub fn description(&self) -> &'static str {
        match self {
            EffectMode::Blur => "Gradual blur effect",
            EffectMode::PixelFreeze => "Randomly freeze pixels",
            EffectMode::PixelBlackout => "Randomly black out pixels",
            EffectMode::SleepyEmoji => "Cover screen with sleepy emojis",
            EffectMode::Distortion => "Funky distortion overlay",
            EffectMode::Messages => "Fill screen with bedtime messages",
            EffectMode::SideSwipe => "Rainbow swipe from right to left",
        }
    }
}

impl fmt::Display for EffectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user picked: a concrete mode or the daily random pseudo-mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ModeSelection {
    Random,
    Fixed(EffectMode),
}

impl Default for ModeSelection {
    fn default() -> Self {
        ModeSelection::Fixed(EffectMode::default())
    }
}

impl ModeSelection {
    /// Resolve to the concrete mode for `today`.
    ///
    /// `Random` indexes the pool with the 1-based ordinal day of the year, so
    /// consecutive days walk through every mode once before repeating.
    pub fn resolve(self, today: NaiveDate) -> EffectMode {
        match self {
            ModeSelection::Fixed(mode) => mode,
            ModeSelection::Random => {
                let pool = &EffectMode::ALL;
                pool[today.ordinal() as usize % pool.len()]
            }
        }
    }

    pub fn is_random(&self) -> bool {
        matches!(self, ModeSelection::Random)
    }
}

impl fmt::Display for ModeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeSelection::Random => f.write_str("random"),
            ModeSelection::Fixed(mode) => mode.fmt(f),
        }
    }
}

impl FromStr for ModeSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        if normalized == "random" {
            return Ok(ModeSelection::Random);
        }
        EffectMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .map(ModeSelection::Fixed)
            .ok_or_else(|| {
                let names: Vec<_> = EffectMode::ALL.iter().map(|m| m.as_str()).collect();
                format!(
                    "Unknown mode '{s}'. Expected random or one of: {}",
                    names.join(", ")
                )
            })
    }
}

impl TryFrom<String> for ModeSelection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
