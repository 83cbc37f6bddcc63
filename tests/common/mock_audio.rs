//! Mock remote audio player for testing
//!
//! Each `start` consumes the next scripted behavior (defaulting to `Play`)
//! and records the URL it was pointed at. Like the real player there is one
//! output: a clip that starts replaces whatever was playing.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use speakwise::remote::{AudioBackend, PlaybackHandle};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorBehavior {
    /// Playback never starts
    FailStart,
    /// Starts, then reports a playback error
    FailPlayback,
    /// Starts and plays to the end
    Play,
    /// Starts and keeps playing until stopped or `finish()`
    Hold,
    /// `start` does not resolve until `release_start()`, then behaves like `Hold`
    Stall,
}

#[derive(Debug, Default)]
pub struct MockAudio {
    pub urls: Mutex<Vec<String>>,
    pub script: Mutex<VecDeque<MirrorBehavior>>,
    pub stops: AtomicUsize,
    pending: Mutex<Option<oneshot::Sender<Result<()>>>>,
    stalled: Mutex<Option<oneshot::Sender<()>>>,
}

impl MockAudio {
    pub fn script(&self, behaviors: &[MirrorBehavior]) {
        self.script.lock().unwrap().extend(behaviors.iter().copied());
    }

    pub fn requested(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    /// Let a stalled `start` complete.
    pub fn release_start(&self) {
        if let Some(tx) = self.stalled.lock().unwrap().take() {
            let _ = tx.send(());
        }
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled.lock().unwrap().is_some()
    }

    /// Let a held clip play out.
    pub fn finish(&self) {
        if let Some(tx) = self.pending.lock().unwrap().take() {
            let _ = tx.send(Ok(()));
        }
    }
}

#[async_trait]
impl AudioBackend for MockAudio {
    async fn start(&self, url: &str) -> Result<PlaybackHandle> {
        self.urls.lock().unwrap().push(url.to_string());
        let behavior = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(MirrorBehavior::Play);

        if behavior == MirrorBehavior::Stall {
            let (release, released) = oneshot::channel();
            *self.stalled.lock().unwrap() = Some(release);
            let _ = released.await;
        }

        // The new clip takes over the output
        self.pending.lock().unwrap().take();

        let (tx, rx) = oneshot::channel();
        match behavior {
            MirrorBehavior::FailStart => return Err(anyhow!("NotAllowedError")),
            MirrorBehavior::FailPlayback => {
                let _ = tx.send(Err(anyhow!("MEDIA_ERR_NETWORK")));
            }
            MirrorBehavior::Play => {
                let _ = tx.send(Ok(()));
            }
            MirrorBehavior::Hold | MirrorBehavior::Stall => {
                *self.pending.lock().unwrap() = Some(tx);
            }
        }
        Ok(PlaybackHandle::new(rx))
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        // Dropping the notifier reports the clip as stopped
        self.pending.lock().unwrap().take();
    }

    fn name(&self) -> &str {
        "mock"
    }
}
