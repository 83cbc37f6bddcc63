//! Local (on-device) speech synthesis
//!
//! The `SpeechPlatform` trait is the seam to whatever synthesizer the host
//! provides. On top of it sit the voice catalog, the language capability
//! check and the single-utterance local engine.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod capability;
pub mod catalog;
pub mod espeak;
pub mod local;

pub use catalog::VoiceCatalog;
pub use local::LocalSpeechEngine;

/// One installed synthesis voice as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    /// Language tag the voice speaks, e.g. "en-GB"
    pub lang: String,
    /// Platform identifier for the voice
    pub name: String,
}

impl VoiceDescriptor {
    pub fn new(lang: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            name: name.into(),
        }
    }
}

/// A single request to the platform synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub voice: Option<VoiceDescriptor>,
}

/// On-device synthesis primitive.
#[async_trait]
pub trait SpeechPlatform: Send + Sync + std::fmt::Debug {
    /// Voices the platform currently knows about (may be empty early on)
    async fn voices(&self) -> Vec<VoiceDescriptor>;

    /// Resolves on the next "voices changed" notification
    async fn voices_changed(&self);

    /// Speak one utterance. Resolves when it ends, errors with the platform
    /// error code otherwise (a cancelled utterance errors too).
    async fn speak(&self, utterance: Utterance) -> Result<()>;

    /// Cancel everything queued or speaking
    fn cancel(&self);

    fn pause(&self);

    fn resume(&self);

    /// Get the platform name
    fn name(&self) -> &str;
}
