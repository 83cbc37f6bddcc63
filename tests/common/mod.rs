pub mod mock_audio;
pub mod mock_platform;

use speakwise::remote::RemoteEndpoints;
use speakwise::retry::RetryPolicy;
use speakwise::status::{Severity, StatusSink};
use speakwise::{OrchestratorOptions, Settings, SpeechOrchestrator};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use mock_audio::{MirrorBehavior, MockAudio};
pub use mock_platform::MockPlatform;

/// Status sink that records every report
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub reports: Mutex<Vec<(String, Severity)>>,
}

impl RecordingSink {
    pub fn severities(&self) -> Vec<Severity> {
        self.reports.lock().unwrap().iter().map(|(_, s)| *s).collect()
    }

    pub fn count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

impl StatusSink for RecordingSink {
    fn report(&self, message: &str, severity: Severity) {
        self.reports
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}

pub fn test_endpoints() -> RemoteEndpoints {
    RemoteEndpoints::new(
        (1..=3)
            .map(|i| format!("https://mirror{}.test/tts?tl={{lang}}&client={{client}}&q={{text}}", i))
            .collect(),
        "tw-ob",
    )
}

pub fn test_options() -> OrchestratorOptions {
    OrchestratorOptions {
        remote_fallback: true,
        voice_retry: RetryPolicy::new(3, Duration::ZERO),
        voices_changed_timeout: None,
        mirror_start_timeout: None,
        probe_delay: Duration::ZERO,
    }
}

pub struct Harness {
    pub platform: Arc<MockPlatform>,
    pub audio: Arc<MockAudio>,
    pub sink: Arc<RecordingSink>,
    pub speech: Arc<SpeechOrchestrator>,
}

impl Harness {
    pub fn new(voices: &[&str]) -> Self {
        Self::with_options(voices, Settings::default(), test_options())
    }

    pub fn with_options(voices: &[&str], settings: Settings, options: OrchestratorOptions) -> Self {
        let platform = Arc::new(MockPlatform::with_voices(voices));
        let audio = Arc::new(MockAudio::default());
        let sink = Arc::new(RecordingSink::default());
        let speech = SpeechOrchestrator::new(
            platform.clone(),
            audio.clone(),
            test_endpoints(),
            settings,
            options,
        )
        .with_status_sink(sink.clone());

        Self {
            platform,
            audio,
            sink,
            speech: Arc::new(speech),
        }
    }
}

/// Let spawned tasks run until `cond` holds.
pub async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
