//! Mock speech platform for testing
//!
//! Records every utterance and lets tests hold an utterance open to
//! exercise stop/pause/resume while it is "speaking".

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use speakwise::tts::{SpeechPlatform, Utterance, VoiceDescriptor};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

#[derive(Debug, Default)]
pub struct MockPlatform {
    pub voices: Mutex<Vec<VoiceDescriptor>>,
    pub notifications: AtomicUsize,
    pub utterances: Mutex<Vec<Utterance>>,
    /// Error code to fail every utterance with
    pub fail_with: Mutex<Option<String>>,
    /// Keep utterances open until `release()` or `cancel()`
    pub hold: AtomicBool,
    /// Never deliver the voices-changed notification
    pub silent: AtomicBool,
    pub pauses: AtomicUsize,
    pub resumes: AtomicUsize,
    pending: Mutex<Option<oneshot::Sender<Result<()>>>>,
}

impl MockPlatform {
    pub fn with_voices(langs: &[&str]) -> Self {
        let voices = langs
            .iter()
            .map(|l| VoiceDescriptor::new(*l, format!("voice-{}", l)))
            .collect();
        Self {
            voices: Mutex::new(voices),
            ..Default::default()
        }
    }

    pub fn fail(&self, code: &str) {
        *self.fail_with.lock().unwrap() = Some(code.to_string());
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.utterances.lock().unwrap().clone()
    }

    pub fn is_speaking(&self) -> bool {
        self.pending.lock().unwrap().is_some()
    }

    /// Finish the held utterance successfully.
    pub fn release(&self) {
        if let Some(tx) = self.pending.lock().unwrap().take() {
            let _ = tx.send(Ok(()));
        }
    }
}

#[async_trait]
impl SpeechPlatform for MockPlatform {
    async fn voices(&self) -> Vec<VoiceDescriptor> {
        self.voices.lock().unwrap().clone()
    }

    async fn voices_changed(&self) {
        self.notifications.fetch_add(1, Ordering::SeqCst);
        if self.silent.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    async fn speak(&self, utterance: Utterance) -> Result<()> {
        self.utterances.lock().unwrap().push(utterance);
        if let Some(code) = self.fail_with.lock().unwrap().clone() {
            return Err(anyhow!(code));
        }
        if !self.hold.load(Ordering::SeqCst) {
            return Ok(());
        }

        let (tx, rx) = oneshot::channel();
        *self.pending.lock().unwrap() = Some(tx);
        rx.await.map_err(|_| anyhow!("interrupted"))?
    }

    fn cancel(&self) {
        // Like a real synthesizer, a cancelled utterance reports an error
        if let Some(tx) = self.pending.lock().unwrap().take() {
            let _ = tx.send(Err(anyhow!("interrupted")));
        }
    }

    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.resumes.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "mock"
    }
}
