//! Speakwise Library
//!
//! Resilient text-to-speech: the on-device synthesizer first, a remote
//! translation-service speech endpoint (with mirror failover) when the
//! device cannot speak the requested language.

pub mod audio;
pub mod config;
pub mod error;
pub mod languages;
pub mod orchestrator;
pub mod playback;
pub mod remote;
pub mod retry;
pub mod settings;
pub mod status;
pub mod tts;

pub use error::{SpeechError, SpeechResult};
pub use orchestrator::{LanguageReport, OrchestratorOptions, SpeechOrchestrator, Spoken, Status};
pub use settings::{Settings, SpeakOptions};
