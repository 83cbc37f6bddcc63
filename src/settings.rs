//! Speech settings and per-call overrides

use crate::tts::VoiceDescriptor;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Process-wide speech defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Speaking rate multiplier (> 0)
    pub rate: f32,
    /// Pitch multiplier (> 0)
    pub pitch: f32,
    /// Volume in [0, 1]
    pub volume: f32,
    /// Language tag, e.g. "zh-TW"
    #[serde(rename = "lang")]
    pub language: String,
    /// Voice to use instead of the one picked from the catalog
    #[serde(default)]
    pub preferred_voice: Option<VoiceDescriptor>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rate: 0.8,
            pitch: 1.0,
            volume: 1.0,
            language: "zh-TW".to_string(),
            preferred_voice: None,
        }
    }
}

/// Overrides for a single `speak` call. Unset fields inherit the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeakOptions {
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
    pub lang: Option<String>,
}

impl SpeakOptions {
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }
}

impl Settings {
    /// Effective settings for one call: options win over stored defaults.
    pub fn merged(&self, options: &SpeakOptions) -> Settings {
        let mut out = self.clone();
        if let Some(rate) = options.rate {
            out.set_rate(rate);
        }
        if let Some(pitch) = options.pitch {
            out.set_pitch(pitch);
        }
        if let Some(volume) = options.volume {
            out.set_volume(volume);
        }
        if let Some(lang) = options.lang.as_deref() {
            out.set_language(lang);
        }
        out
    }

    /// Non-positive or non-finite rates are ignored.
    pub fn set_rate(&mut self, rate: f32) {
        if rate.is_finite() && rate > 0.0 {
            self.rate = rate;
        } else {
            warn!("⚠️ Ignoring invalid rate {}", rate);
        }
    }

    /// Non-positive or non-finite pitches are ignored.
    pub fn set_pitch(&mut self, pitch: f32) {
        if pitch.is_finite() && pitch > 0.0 {
            self.pitch = pitch;
        } else {
            warn!("⚠️ Ignoring invalid pitch {}", pitch);
        }
    }

    /// Clamped into [0, 1].
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            warn!("⚠️ Ignoring invalid volume {}", volume);
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Returns whether the tag was taken; blank tags are ignored.
    pub fn set_language(&mut self, lang: &str) -> bool {
        let lang = lang.trim();
        if lang.is_empty() {
            warn!("⚠️ Ignoring empty language tag");
            return false;
        }
        self.language = lang.to_string();
        true
    }
}
