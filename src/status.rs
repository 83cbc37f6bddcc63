//! User-visible status reporting

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Playing,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Warning => "warning",
            Severity::Playing => "playing",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// Receives status updates for display to the user.
pub trait StatusSink: Send + Sync {
    fn report(&self, message: &str, severity: Severity);
}

/// Default sink: writes status updates to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn report(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Warning => warn!("[{}] {}", severity, message),
            Severity::Playing => info!("[{}] {}", severity, message),
            Severity::Error => error!("[{}] {}", severity, message),
        }
    }
}
