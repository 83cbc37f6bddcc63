//! Local speech engine: one utterance at a time on the platform synthesizer

use super::{SpeechPlatform, Utterance, VoiceCatalog};
use crate::error::{SpeechError, SpeechResult};
use crate::languages;
use crate::playback::{PlaybackState, PlaybackTracker, Ticket};
use crate::settings::Settings;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct LocalSpeechEngine {
    platform: Arc<dyn SpeechPlatform>,
    catalog: Arc<VoiceCatalog>,
    tracker: Arc<PlaybackTracker>,
}

impl LocalSpeechEngine {
    pub fn new(
        platform: Arc<dyn SpeechPlatform>,
        catalog: Arc<VoiceCatalog>,
        tracker: Arc<PlaybackTracker>,
    ) -> Self {
        Self {
            platform,
            catalog,
            tracker,
        }
    }

    /// Build the platform request for `text` with the given settings.
    pub fn utterance(&self, text: &str, settings: &Settings) -> Utterance {
        let voice = settings
            .preferred_voice
            .clone()
            .or_else(|| self.catalog.pick_voice(&settings.language));
        Utterance {
            text: text.to_string(),
            lang: settings.language.clone(),
            rate: settings.rate,
            pitch: settings.pitch,
            volume: settings.volume,
            voice,
        }
    }

    /// Speak `text` and wait until the platform reports the end or an error.
    ///
    /// Anything already speaking is cut off first. If `ticket` is superseded
    /// while waiting, the platform outcome is dropped and `Cancelled` returned.
    pub async fn speak(&self, text: &str, settings: &Settings, ticket: &Ticket) -> SpeechResult<()> {
        self.platform.cancel();

        let utterance = self.utterance(text, settings);
        if !self.tracker.transition(ticket, PlaybackState::PlayingLocal) {
            return Err(SpeechError::Cancelled);
        }
        info!(
            "🔊 Local speech ({}) via {}: voice {:?}",
            languages::display_name(&utterance.lang),
            self.platform.name(),
            utterance.voice.as_ref().map(|v| v.name.as_str())
        );

        let result = self.platform.speak(utterance).await;

        if !ticket.is_current() {
            debug!("Ignoring outcome of cancelled utterance (attempt {})", ticket.id());
            return Err(SpeechError::Cancelled);
        }
        self.tracker.settle(ticket);

        match result {
            Ok(()) => {
                info!("✅ Local speech finished");
                Ok(())
            }
            Err(e) => Err(SpeechError::LocalSynthesis(e.to_string())),
        }
    }

    /// Hard stop of the platform synthesizer. Safe to call at any time.
    pub fn cancel(&self) {
        self.platform.cancel();
    }

    /// Pause the current utterance. Returns whether anything was paused.
    pub fn pause(&self) -> bool {
        if self
            .tracker
            .swap(PlaybackState::PlayingLocal, PlaybackState::Paused)
        {
            self.platform.pause();
            debug!("⏸️ Local speech paused");
            true
        } else {
            false
        }
    }

    /// Resume a paused utterance. Returns whether anything was resumed.
    pub fn resume(&self) -> bool {
        if self
            .tracker
            .swap(PlaybackState::Paused, PlaybackState::PlayingLocal)
        {
            self.platform.resume();
            debug!("▶️ Local speech resumed");
            true
        } else {
            false
        }
    }
}
