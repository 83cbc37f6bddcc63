//! Remote speech fallback
//!
//! Synthesized audio is fetched from a translation service's speech
//! endpoint. Several equivalent mirrors are configured and tried strictly in
//! order, one at a time, until one plays through or the list runs out.

use crate::error::{SpeechError, SpeechResult};
use crate::playback::{PlaybackState, PlaybackTracker, Ticket};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

pub mod http;

pub use http::HttpAudioBackend;

/// Fixed client id the translation service expects
pub const DEFAULT_CLIENT_ID: &str = "tw-ob";

/// Mirror URL templates. `{lang}`, `{client}` and `{text}` are substituted.
pub const DEFAULT_MIRRORS: [&str; 3] = [
    "https://translate.google.com/translate_tts?ie=UTF-8&tl={lang}&client={client}&q={text}",
    "https://translate.google.com.vn/translate_tts?ie=UTF-8&tl={lang}&client={client}&q={text}",
    "https://translate.google.com.hk/translate_tts?ie=UTF-8&tl={lang}&client={client}&q={text}",
];

/// Resolves when a started clip has played out (or fails).
#[derive(Debug)]
pub struct PlaybackHandle {
    finished: oneshot::Receiver<Result<()>>,
}

impl PlaybackHandle {
    pub fn new(finished: oneshot::Receiver<Result<()>>) -> Self {
        Self { finished }
    }

    /// Wait for end of audio. A dropped notifier means playback was stopped.
    pub async fn finished(self) -> Result<()> {
        self.finished
            .await
            .map_err(|_| anyhow!("playback stopped"))?
    }
}

/// Audio player for remote clips (one clip at a time).
#[async_trait]
pub trait AudioBackend: Send + Sync + std::fmt::Debug {
    /// Point the player at `url` and start playback.
    async fn start(&self, url: &str) -> Result<PlaybackHandle>;

    /// Stop and rewind whatever is playing. Safe to call at any time.
    fn stop(&self);

    /// Get the backend name
    fn name(&self) -> &str;
}

/// Ordered list of mirror URL templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoints {
    templates: Vec<String>,
    client_id: String,
}

impl Default for RemoteEndpoints {
    fn default() -> Self {
        Self::new(DEFAULT_MIRRORS.iter().map(|s| s.to_string()).collect(), DEFAULT_CLIENT_ID)
    }
}

impl RemoteEndpoints {
    pub fn new(templates: Vec<String>, client_id: impl Into<String>) -> Self {
        Self {
            templates,
            client_id: client_id.into(),
        }
    }

    /// One request URL per mirror, in mirror order.
    pub fn urls(&self, text: &str, lang: &str) -> Vec<String> {
        let text = urlencoding::encode(text);
        let lang = urlencoding::encode(lang);
        let client = urlencoding::encode(&self.client_id);
        self.templates
            .iter()
            .map(|t| {
                t.replace("{lang}", &lang)
                    .replace("{client}", &client)
                    .replace("{text}", &text)
            })
            .collect()
    }
}

fn preview(text: &str, max: usize) -> String {
    let mut out: String = text.chars().take(max).collect();
    if text.chars().count() > max {
        out.push('…');
    }
    out
}

#[derive(Debug)]
pub struct RemoteSpeechClient {
    backend: Arc<dyn AudioBackend>,
    endpoints: RemoteEndpoints,
    tracker: Arc<PlaybackTracker>,
    start_timeout: Option<Duration>,
}

impl RemoteSpeechClient {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        endpoints: RemoteEndpoints,
        tracker: Arc<PlaybackTracker>,
    ) -> Self {
        Self {
            backend,
            endpoints,
            tracker,
            start_timeout: None,
        }
    }

    /// Give up on a mirror that has not started playing within `timeout`.
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = Some(timeout);
        self
    }

    /// Speak `text` through the mirrors. Returns the 1-based mirror that played it.
    pub async fn speak(&self, text: &str, remote_code: &str, ticket: &Ticket) -> SpeechResult<usize> {
        info!("🌐 Remote speech ({}): \"{}\"", remote_code, preview(text, 50));

        let mut attempts = 0;
        for (index, url) in self.endpoints.urls(text, remote_code).iter().enumerate() {
            if !ticket.is_current() {
                return Err(SpeechError::Cancelled);
            }
            let mirror = index + 1;
            attempts += 1;
            debug!("Trying mirror {}: {}", mirror, preview(url, 100));

            match self.attempt(mirror, url, ticket).await {
                Ok(()) => {
                    self.tracker.settle(ticket);
                    info!("✅ Remote speech finished (mirror {})", mirror);
                    return Ok(mirror);
                }
                Err(SpeechError::Cancelled) => return Err(SpeechError::Cancelled),
                Err(e) => warn!("❌ {}", e),
            }
        }

        if !ticket.is_current() {
            return Err(SpeechError::Cancelled);
        }
        self.tracker.settle(ticket);
        Err(SpeechError::RemoteExhausted { attempts })
    }

    async fn attempt(&self, mirror: usize, url: &str, ticket: &Ticket) -> SpeechResult<()> {
        let failed = |reason: String| SpeechError::RemoteMirror { mirror, reason };

        let start = async {
            match self.start_timeout {
                Some(limit) => tokio::time::timeout(limit, self.backend.start(url))
                    .await
                    .map_err(|_| limit),
                None => Ok(self.backend.start(url).await),
            }
        };

        // A superseded attempt must not get as far as the shared player
        let started = tokio::select! {
            started = start => started,
            _ = ticket.cancelled() => {
                debug!("Mirror {} start abandoned (attempt {})", mirror, ticket.id());
                return Err(SpeechError::Cancelled);
            }
        };
        let started = match started {
            Ok(started) => started,
            Err(limit) => {
                self.backend.stop();
                return Err(failed(format!("did not start within {:?}", limit)));
            }
        };

        if !ticket.is_current() {
            // A clip that started after stop() must not stay audible
            if started.is_ok() {
                self.backend.stop();
            }
            return Err(SpeechError::Cancelled);
        }
        let handle = started.map_err(|e| failed(e.to_string()))?;
        self.tracker.transition(ticket, PlaybackState::PlayingRemote);

        let result = handle.finished().await;
        if !ticket.is_current() {
            return Err(SpeechError::Cancelled);
        }
        result.map_err(|e| failed(e.to_string()))
    }

    /// Stop the remote player. Safe to call at any time.
    pub fn cancel(&self) {
        self.backend.stop();
    }
}
