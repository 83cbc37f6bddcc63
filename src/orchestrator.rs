//! Speech orchestrator
//!
//! Decides per request whether the local synthesizer can speak the language,
//! falls back to the remote mirrors when it cannot (or when it fails), and
//! owns the playback state and lifecycle controls for both backends.

use crate::config::Config;
use crate::error::{SpeechError, SpeechResult};
use crate::languages::{self, SUPPORTED_LANGUAGES};
use crate::playback::{PlaybackState, PlaybackTracker};
use crate::remote::{AudioBackend, RemoteEndpoints, RemoteSpeechClient};
use crate::retry::RetryPolicy;
use crate::settings::{Settings, SpeakOptions};
use crate::status::{LogStatusSink, Severity, StatusSink};
use crate::tts::{LocalSpeechEngine, SpeechPlatform, VoiceCatalog};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How a `speak` call ended (errors aside).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spoken {
    /// Played by the on-device synthesizer
    Local,
    /// Played by the remote service; carries the 1-based mirror index
    Remote { mirror: usize },
    /// Blank input, nothing was attempted
    Skipped,
    /// `stop()` or a newer `speak` superseded this call
    Cancelled,
}

/// Snapshot returned by `status()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub is_playing: bool,
    pub is_paused: bool,
    pub voices_loaded: bool,
    pub voice_count: usize,
    pub current_language: String,
    pub remote_fallback_enabled: bool,
}

/// Result of probing one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageReport {
    pub tag: String,
    pub display_name: String,
    pub local: bool,
    pub remote: bool,
}

impl LanguageReport {
    pub fn available(&self) -> bool {
        self.local || self.remote
    }

    /// Log the sweep results and warn about unusable Chinese or Japanese.
    pub fn summarize(reports: &[LanguageReport]) {
        info!("=== Language support ===");
        for r in reports {
            info!(
                "{}: local {} remote {}",
                r.display_name,
                if r.local { "✅" } else { "❌" },
                if r.remote { "✅" } else { "❌" }
            );
        }
        for tag in ["zh-CN", "ja-JP"] {
            if let Some(r) = reports.iter().find(|r| r.tag == tag) {
                if !r.available() {
                    warn!("⚠️ {} speech may be unavailable", r.display_name);
                }
            }
        }
    }
}

/// Knobs that are not speech settings.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub remote_fallback: bool,
    pub voice_retry: RetryPolicy,
    pub voices_changed_timeout: Option<Duration>,
    pub mirror_start_timeout: Option<Duration>,
    pub probe_delay: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for OrchestratorOptions {
    fn from(config: &Config) -> Self {
        Self {
            remote_fallback: config.remote_fallback,
            voice_retry: RetryPolicy::new(config.voice_load_attempts, config.voice_retry_delay()),
            voices_changed_timeout: Some(config.voices_changed_timeout()),
            mirror_start_timeout: Some(config.mirror_start_timeout()),
            probe_delay: config.probe_delay(),
        }
    }
}

pub struct SpeechOrchestrator {
    settings: Mutex<Settings>,
    remote_fallback: AtomicBool,
    voice_retry: RetryPolicy,
    probe_delay: Duration,
    tracker: Arc<PlaybackTracker>,
    catalog: Arc<VoiceCatalog>,
    local: LocalSpeechEngine,
    remote: RemoteSpeechClient,
    status: Arc<dyn StatusSink>,
}

impl std::fmt::Debug for SpeechOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechOrchestrator")
            .field("state", &self.tracker.state())
            .field("voices", &self.catalog.len())
            .finish()
    }
}

impl SpeechOrchestrator {
    pub fn new(
        platform: Arc<dyn SpeechPlatform>,
        audio: Arc<dyn AudioBackend>,
        endpoints: RemoteEndpoints,
        settings: Settings,
        options: OrchestratorOptions,
    ) -> Self {
        let tracker = Arc::new(PlaybackTracker::new());

        let mut catalog = VoiceCatalog::new(Arc::clone(&platform));
        if let Some(timeout) = options.voices_changed_timeout {
            catalog = catalog.with_notify_timeout(timeout);
        }
        let catalog = Arc::new(catalog);

        let local = LocalSpeechEngine::new(platform, Arc::clone(&catalog), Arc::clone(&tracker));
        let mut remote = RemoteSpeechClient::new(audio, endpoints, Arc::clone(&tracker));
        if let Some(timeout) = options.mirror_start_timeout {
            remote = remote.with_start_timeout(timeout);
        }

        Self {
            settings: Mutex::new(settings),
            remote_fallback: AtomicBool::new(options.remote_fallback),
            voice_retry: options.voice_retry,
            probe_delay: options.probe_delay,
            tracker,
            catalog,
            local,
            remote,
            status: Arc::new(LogStatusSink),
        }
    }

    /// Build from a loaded `Config`.
    pub fn from_config(
        config: &Config,
        platform: Arc<dyn SpeechPlatform>,
        audio: Arc<dyn AudioBackend>,
    ) -> Self {
        let endpoints = RemoteEndpoints::new(config.mirrors.clone(), config.client_id.clone());
        Self::new(
            platform,
            audio,
            endpoints,
            config.settings.clone(),
            OrchestratorOptions::from(config),
        )
    }

    /// Send status updates somewhere other than the log.
    pub fn with_status_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.status = sink;
        self
    }

    /// Startup: load the voice catalog with retry and log what was found.
    pub async fn init(&self) -> bool {
        info!("🚀 Initializing speech...");
        let loaded = self.catalog.load_with_retry(&self.voice_retry).await;
        self.catalog.log_summary();
        loaded
    }

    fn settings(&self) -> MutexGuard<'_, Settings> {
        self.settings.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Speak `text`, locally when possible, remotely otherwise.
    ///
    /// Only total failure (every mirror failed, or no local voice with the
    /// remote fallback switched off) is returned as an error.
    pub async fn speak(&self, text: &str, options: &SpeakOptions) -> SpeechResult<Spoken> {
        if text.trim().is_empty() {
            self.status
                .report("Please provide text to speak", Severity::Warning);
            debug!("{}", SpeechError::EmptyInput);
            return Ok(Spoken::Skipped);
        }

        self.stop();
        let ticket = self.tracker.begin();
        let settings = self.settings().merged(options);
        let lang = settings.language.clone();
        let name = languages::display_name(&lang).to_string();

        self.catalog.refresh_if_empty().await;

        if self.catalog.is_supported(&lang) {
            info!("🎯 Trying local speech: {}", lang);
            self.status
                .report(&format!("🔊 Local TTS: {}", name), Severity::Playing);
            match self.local.speak(text, &settings, &ticket).await {
                Ok(()) => return Ok(Spoken::Local),
                Err(SpeechError::Cancelled) => return Ok(Spoken::Cancelled),
                Err(e) => {
                    warn!("❌ {}", e);
                    if self.remote_fallback_enabled() {
                        self.status.report(
                            &format!("Local TTS failed, switching to remote: {}", name),
                            Severity::Warning,
                        );
                    }
                }
            }
        } else {
            info!("❌ No local voice for {}, skipping local speech", lang);
            if self.remote_fallback_enabled() {
                self.status.report(
                    &format!("No local voice, using remote TTS: {}", name),
                    Severity::Warning,
                );
            }
        }

        if !ticket.is_current() {
            return Ok(Spoken::Cancelled);
        }

        if !self.remote_fallback_enabled() {
            let err = SpeechError::UnsupportedLanguage(lang);
            self.status.report(&format!("❌ {}", err), Severity::Error);
            return Err(err);
        }

        let code = languages::remote_code(&lang);
        match self.remote.speak(text, &code, &ticket).await {
            Ok(mirror) => {
                self.status
                    .report(&format!("✅ Remote TTS: {}", name), Severity::Playing);
                Ok(Spoken::Remote { mirror })
            }
            Err(SpeechError::Cancelled) => Ok(Spoken::Cancelled),
            Err(e) => {
                self.status
                    .report(&format!("❌ Remote TTS failed too: {}", e), Severity::Error);
                Err(e)
            }
        }
    }

    /// Stop everything audible. Always safe; leaves the player idle.
    pub fn stop(&self) {
        self.tracker.cancel();
        self.local.cancel();
        self.remote.cancel();
    }

    /// Pause local speech. No-op unless local speech is playing.
    pub fn pause(&self) {
        self.local.pause();
    }

    /// Resume paused local speech. No-op unless paused.
    pub fn resume(&self) {
        self.local.resume();
    }

    pub fn set_rate(&self, rate: f32) {
        self.settings().set_rate(rate);
    }

    pub fn set_pitch(&self, pitch: f32) {
        self.settings().set_pitch(pitch);
    }

    pub fn set_volume(&self, volume: f32) {
        self.settings().set_volume(volume);
    }

    pub fn set_language(&self, lang: &str) {
        if self.settings().set_language(lang) {
            info!("🌐 Language set to: {}", languages::display_name(lang.trim()));
        }
    }

    pub fn set_remote_fallback(&self, enabled: bool) {
        self.remote_fallback.store(enabled, Ordering::SeqCst);
    }

    pub fn remote_fallback_enabled(&self) -> bool {
        self.remote_fallback.load(Ordering::SeqCst)
    }

    pub fn current_settings(&self) -> Settings {
        self.settings().clone()
    }

    pub fn state(&self) -> PlaybackState {
        self.tracker.state()
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn status(&self) -> Status {
        let state = self.tracker.state();
        Status {
            is_playing: state.is_playing(),
            is_paused: state == PlaybackState::Paused,
            voices_loaded: self.catalog.is_loaded(),
            voice_count: self.catalog.len(),
            current_language: self.settings().language.clone(),
            remote_fallback_enabled: self.remote_fallback_enabled(),
        }
    }

    /// Probe every supported language: local support plus a short remote
    /// phrase. Probes run one at a time with a pause in between so the
    /// remote service does not throttle us.
    pub async fn test_all_languages(&self) -> Vec<LanguageReport> {
        info!("🚀 Testing language support...");
        let mut reports = Vec::with_capacity(SUPPORTED_LANGUAGES.len());

        for (i, entry) in SUPPORTED_LANGUAGES.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.probe_delay).await;
            }

            let local = self.catalog.is_supported(entry.tag);

            self.stop();
            let ticket = self.tracker.begin();
            let remote = match self
                .remote
                .speak(entry.probe_phrase, entry.remote_code, &ticket)
                .await
            {
                Ok(_) => true,
                Err(e) => {
                    debug!("Remote probe for {} failed: {}", entry.tag, e);
                    false
                }
            };

            reports.push(LanguageReport {
                tag: entry.tag.to_string(),
                display_name: entry.display_name.to_string(),
                local,
                remote,
            });
        }

        LanguageReport::summarize(&reports);
        reports
    }
}
