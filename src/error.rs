//! Speakwise Error Types
//!
//! Centralized error handling for the speech fallback engine.

use thiserror::Error;

/// Central error type for Speakwise
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Nothing to speak: input text is empty")]
    EmptyInput,

    #[error("Local synthesis failed: {0}")]
    LocalSynthesis(String),

    #[error("Remote mirror {mirror} failed: {reason}")]
    RemoteMirror { mirror: usize, reason: String },

    #[error("All remote mirrors failed ({attempts} attempts)")]
    RemoteExhausted { attempts: usize },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Playback was cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for Speakwise operations
pub type SpeechResult<T> = Result<T, SpeechError>;
