//! eSpeak NG platform backend calling the local binary

use super::{SpeechPlatform, Utterance, VoiceDescriptor};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// espeak-ng's default speed in words per minute, used for rate 1.0
const BASE_WPM: f32 = 175.0;

#[derive(Debug)]
struct ActiveUtterance {
    id: u64,
    pid: Option<u32>,
    interrupt: oneshot::Sender<()>,
}

#[derive(Debug)]
pub struct EspeakPlatform {
    binary: String,
    active: Mutex<Option<ActiveUtterance>>,
    next_id: AtomicU64,
}

impl Default for EspeakPlatform {
    fn default() -> Self {
        Self::new("espeak-ng")
    }
}

impl EspeakPlatform {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            active: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    fn active(&self) -> std::sync::MutexGuard<'_, Option<ActiveUtterance>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Deliver `signal` to the running utterance without blocking the caller.
    fn signal(&self, signal: &'static str) {
        let Some(pid) = self.active().as_ref().and_then(|a| a.pid) else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("⚠️ No async runtime to send {} to espeak-ng ({})", signal, pid);
            return;
        };
        runtime.spawn(async move {
            match Command::new("kill").arg(signal).arg(pid.to_string()).status().await {
                Ok(status) if status.success() => {}
                Ok(status) => debug!("kill {} {} exited with {}", signal, pid, status),
                Err(e) => warn!("⚠️ Failed to send {} to espeak-ng ({}): {}", signal, pid, e),
            }
        });
    }

    /// Forget utterance `id` if it is still the active one.
    fn finish(&self, id: u64) {
        let mut active = self.active();
        if active.as_ref().map(|a| a.id) == Some(id) {
            *active = None;
        }
    }
}

/// Parse `espeak-ng --voices` output.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
/// ```
pub fn parse_voices(output: &str) -> Vec<VoiceDescriptor> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _priority = cols.next()?;
            let lang = cols.next()?;
            let _age_gender = cols.next()?;
            let name = cols.next()?;
            Some(VoiceDescriptor::new(lang, name))
        })
        .collect()
}

fn words_per_minute(rate: f32) -> u32 {
    (BASE_WPM * rate).clamp(80.0, 450.0).round() as u32
}

/// espeak-ng pitch is 0..=99 with 50 as the default
fn pitch_value(pitch: f32) -> u32 {
    (50.0 * pitch).clamp(0.0, 99.0).round() as u32
}

/// espeak-ng amplitude is 0..=200 with 100 as the default
fn amplitude(volume: f32) -> u32 {
    (100.0 * volume).clamp(0.0, 200.0).round() as u32
}

/// Feed the text and wait for the child to exit or be interrupted.
async fn drive(child: &mut Child, text: &str, interrupted: oneshot::Receiver<()>) -> Result<()> {
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await?;
        stdin.shutdown().await?;
    }

    let status = tokio::select! {
        status = child.wait() => Some(status),
        _ = interrupted => None,
    };
    let Some(status) = status else {
        let _ = child.kill().await;
        bail!("interrupted")
    };
    let status = status?;
    if !status.success() {
        bail!("synthesis-failed ({})", status);
    }
    Ok(())
}

#[async_trait]
impl SpeechPlatform for EspeakPlatform {
    async fn voices(&self) -> Vec<VoiceDescriptor> {
        match Command::new(&self.binary).arg("--voices").output().await {
            Ok(out) if out.status.success() => parse_voices(&String::from_utf8_lossy(&out.stdout)),
            Ok(out) => {
                warn!("⚠️ {} --voices failed with status {}", self.binary, out.status);
                Vec::new()
            }
            Err(e) => {
                debug!("{} not available: {}", self.binary, e);
                Vec::new()
            }
        }
    }

    async fn voices_changed(&self) {
        // The binary's voice list never changes while we run.
    }

    async fn speak(&self, utterance: Utterance) -> Result<()> {
        let voice = utterance
            .voice
            .as_ref()
            .map(|v| v.lang.as_str())
            .unwrap_or(utterance.lang.as_str());
        debug!("espeak-ng speaking ({}): {}", voice, utterance.text);

        let mut child = Command::new(&self.binary)
            .arg("-v")
            .arg(voice)
            .arg("-s")
            .arg(words_per_minute(utterance.rate).to_string())
            .arg("-p")
            .arg(pitch_value(utterance.pitch).to_string())
            .arg("-a")
            .arg(amplitude(utterance.volume).to_string())
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow!("Failed to spawn {}: {}", self.binary, e))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (interrupt, interrupted) = oneshot::channel();
        *self.active() = Some(ActiveUtterance {
            id,
            pid: child.id(),
            interrupt,
        });

        let result = drive(&mut child, &utterance.text, interrupted).await;
        self.finish(id);
        result
    }

    fn cancel(&self) {
        if let Some(active) = self.active().take() {
            debug!("🛑 Cancelling espeak-ng utterance {}", active.id);
            let _ = active.interrupt.send(());
        }
    }

    fn pause(&self) {
        self.signal("-STOP");
    }

    fn resume(&self) {
        self.signal("-CONT");
    }

    fn name(&self) -> &str {
        "espeak-ng"
    }
}
