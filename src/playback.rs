//! Playback state tracking
//!
//! One `PlaybackTracker` per orchestrator holds the current `PlaybackState`
//! and an attempt counter. Every `speak` attempt takes a `Ticket`; `cancel()`
//! bumps the counter so outcomes arriving for older tickets are discarded.
//! The counter is published on a watch channel so in-flight work can also
//! await its own cancellation.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::debug;

/// What is audible right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Idle,
    PlayingLocal,
    PlayingRemote,
    Paused,
}

impl PlaybackState {
    pub fn is_playing(self) -> bool {
        self != PlaybackState::Idle
    }
}

/// Handle identifying one playback attempt.
#[derive(Debug, Clone)]
pub struct Ticket {
    id: u64,
    epoch: watch::Receiver<u64>,
}

impl Ticket {
    /// False once `cancel()` or a newer `begin()` has superseded this attempt.
    pub fn is_current(&self) -> bool {
        *self.epoch.borrow() == self.id
    }

    /// Resolves once this attempt has been superseded.
    pub async fn cancelled(&self) {
        let mut epoch = self.epoch.clone();
        let superseded = epoch.wait_for(|e| *e != self.id).await.is_ok();
        if !superseded {
            // Tracker gone: nothing can cancel us any more
            std::future::pending::<()>().await;
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug)]
pub struct PlaybackTracker {
    state: Mutex<PlaybackState>,
    epoch: watch::Sender<u64>,
}

impl Default for PlaybackTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackTracker {
    pub fn new() -> Self {
        let (epoch, _) = watch::channel(0);
        Self {
            state: Mutex::new(PlaybackState::Idle),
            epoch,
        }
    }

    fn bump(&self) -> u64 {
        let mut id = 0;
        self.epoch.send_modify(|e| {
            *e += 1;
            id = *e;
        });
        id
    }

    pub fn state(&self) -> PlaybackState {
        *self.lock()
    }

    /// Start a new attempt, superseding any previous one.
    pub fn begin(&self) -> Ticket {
        let id = self.bump();
        *self.lock() = PlaybackState::Idle;
        Ticket {
            id,
            epoch: self.epoch.subscribe(),
        }
    }

    /// Invalidate every outstanding ticket and return to `Idle`.
    pub fn cancel(&self) {
        let id = self.bump();
        let mut state = self.lock();
        if *state != PlaybackState::Idle {
            debug!("🛑 Playback cancelled (now attempt {})", id);
        }
        *state = PlaybackState::Idle;
    }

    /// Move to `next` if `ticket` is still current. Returns whether it applied.
    pub fn transition(&self, ticket: &Ticket, next: PlaybackState) -> bool {
        let mut state = self.lock();
        if !ticket.is_current() {
            return false;
        }
        *state = next;
        true
    }

    /// Attempt finished (either way): back to `Idle` if still current.
    pub fn settle(&self, ticket: &Ticket) -> bool {
        self.transition(ticket, PlaybackState::Idle)
    }

    /// Swap `from` for `to` regardless of ticket. Used by pause/resume.
    pub fn swap(&self, from: PlaybackState, to: PlaybackState) -> bool {
        let mut state = self.lock();
        if *state != from {
            return false;
        }
        *state = to;
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PlaybackState> {
        // The guarded value is a plain Copy enum, a poisoned lock still holds a valid state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
