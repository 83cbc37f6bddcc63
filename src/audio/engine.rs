//! Sound Engine for remote speech audio
//!
//! Uses a channel-based architecture to handle rodio's non-Send stream.
//! The engine spawns a dedicated audio thread that owns the playback infrastructure
//! and reports back when a clip starts and when it has played out.

use anyhow::{anyhow, Result};
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// How often the audio thread checks whether the current clip has drained
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Commands sent to the audio thread
enum AudioCommand {
    Play {
        generation: u64,
        bytes: Vec<u8>,
        started: oneshot::Sender<Result<()>>,
        finished: oneshot::Sender<Result<()>>,
    },
    Stop,
}

/// Thread-safe handle to the sound engine
#[derive(Clone)]
pub struct SoundEngine {
    sender: mpsc::Sender<AudioCommand>,
    /// Bumped by every `stop()`; clips requested before the last stop are dropped
    generation: Arc<AtomicU64>,
}

impl std::fmt::Debug for SoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundEngine").finish()
    }
}

impl SoundEngine {
    pub fn new() -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<AudioCommand>();
        let generation = Arc::new(AtomicU64::new(0));

        // Spawn dedicated audio thread
        let current = Arc::clone(&generation);
        thread::Builder::new()
            .name("speakwise-audio".into())
            .spawn(move || {
                Self::audio_thread(receiver, current);
            })?;

        Ok(Self { sender, generation })
    }

    fn audio_thread(receiver: mpsc::Receiver<AudioCommand>, current: Arc<AtomicU64>) {
        use rodio::OutputStream;

        // Initialize audio output on this thread
        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(s) => s,
            Err(e) => {
                warn!("🔇 Failed to initialize audio output: {}", e);
                return;
            }
        };

        // Keep stream alive
        let _stream = stream;
        let mut sink = match rodio::Sink::try_new(&stream_handle) {
            Ok(s) => s,
            Err(e) => {
                error!("❌ Failed to create audio sink: {}", e);
                return;
            }
        };
        // End-of-audio notifier for the clip currently in the sink
        let mut pending: Option<oneshot::Sender<Result<()>>> = None;

        info!("🔊 Audio thread started");

        loop {
            match receiver.recv_timeout(DRAIN_POLL) {
                Ok(AudioCommand::Play {
                    generation,
                    started,
                    ..
                }) if is_stale(generation, current.load(Ordering::SeqCst)) => {
                    debug!("Dropping clip requested before the last stop");
                    let _ = started.send(Err(anyhow!("clip superseded by stop")));
                }
                Ok(AudioCommand::Play {
                    bytes,
                    started,
                    finished,
                    ..
                }) => {
                    // One clip at a time: anything still queued is dropped
                    if !sink.empty() {
                        sink.stop();
                        if let Ok(new_sink) = rodio::Sink::try_new(&stream_handle) {
                            sink = new_sink;
                        }
                    }
                    pending = None;

                    match rodio::Decoder::new(Cursor::new(bytes)) {
                        Ok(source) => {
                            sink.append(source);
                            sink.play();
                            debug!("🔊 Clip started");
                            let _ = started.send(Ok(()));
                            pending = Some(finished);
                        }
                        Err(e) => {
                            let _ = started.send(Err(anyhow!("Undecodable audio: {}", e)));
                        }
                    }
                }
                Ok(AudioCommand::Stop) => {
                    debug!("🛑 Stopping playback");
                    sink.stop();
                    // Re-create sink after stop as it becomes unusable if we want to play again
                    if let Ok(new_sink) = rodio::Sink::try_new(&stream_handle) {
                        sink = new_sink;
                    }
                    // Dropping the notifier tells the waiter the clip was stopped
                    pending = None;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if pending.is_some() && sink.empty() {
                if let Some(finished) = pending.take() {
                    debug!("✅ Clip finished");
                    let _ = finished.send(Ok(()));
                }
            }
        }

        info!("🔇 Audio thread stopped");
    }

    fn send(&self, cmd: AudioCommand) -> Result<()> {
        self.sender
            .send(cmd)
            .map_err(|e| anyhow!("Audio thread disconnected: {}", e))
    }

    /// Current stop generation. Take it before preparing a clip and hand it
    /// to `start` so a `stop()` in between cancels the clip.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Decode and start playing an encoded clip (mp3, wav, ...).
    ///
    /// Resolves once playback has started; the returned receiver fires when
    /// the clip has played out, or errors if it was stopped first. Fails if
    /// `stop()` was called after `generation` was taken.
    pub async fn start(
        &self,
        generation: u64,
        bytes: Vec<u8>,
    ) -> Result<oneshot::Receiver<Result<()>>> {
        let (started_tx, started_rx) = oneshot::channel();
        let (finished_tx, finished_rx) = oneshot::channel();
        self.send(AudioCommand::Play {
            generation,
            bytes,
            started: started_tx,
            finished: finished_tx,
        })?;
        started_rx
            .await
            .map_err(|_| anyhow!("Audio thread dropped the clip"))??;
        Ok(finished_rx)
    }

    /// Stop current playback and clear the queue
    pub fn stop(&self) -> Result<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.send(AudioCommand::Stop)
    }
}

fn is_stale(requested: u64, current: u64) -> bool {
    requested != current
}
