//! Voice catalog
//!
//! Platforms often report their voice list late, so loading waits for one
//! "voices changed" notification when the first query comes back empty and
//! the whole thing is retried a bounded number of times.

use super::{capability, SpeechPlatform, VoiceDescriptor};
use crate::retry::RetryPolicy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct VoiceCatalog {
    platform: Arc<dyn SpeechPlatform>,
    voices: RwLock<Vec<VoiceDescriptor>>,
    loaded: AtomicBool,
    notify_timeout: Option<Duration>,
}

impl VoiceCatalog {
    pub fn new(platform: Arc<dyn SpeechPlatform>) -> Self {
        Self {
            platform,
            voices: RwLock::new(Vec::new()),
            loaded: AtomicBool::new(false),
            notify_timeout: None,
        }
    }

    /// Stop waiting for a "voices changed" notification after `timeout`.
    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = Some(timeout);
        self
    }

    /// Query the platform once, waiting for a change notification if the
    /// list is empty. The result may still be empty.
    pub async fn load(&self) -> Vec<VoiceDescriptor> {
        let voices = self.platform.voices().await;
        if !voices.is_empty() {
            return voices;
        }

        debug!("⏳ No voices yet, waiting for '{}' to report", self.platform.name());
        match self.notify_timeout {
            Some(timeout) => {
                if tokio::time::timeout(timeout, self.platform.voices_changed())
                    .await
                    .is_err()
                {
                    debug!("No voices-changed notification within {:?}", timeout);
                }
            }
            None => self.platform.voices_changed().await,
        }

        self.platform.voices().await
    }

    /// Load with bounded retry. Returns whether the catalog is now loaded.
    ///
    /// An empty result after all attempts is not an error: the catalog stays
    /// unloaded and every language is routed to the remote service.
    pub async fn load_with_retry(&self, policy: &RetryPolicy) -> bool {
        let result = policy
            .run(move || async move {
                let voices = self.load().await;
                if voices.is_empty() {
                    Err(())
                } else {
                    Ok(voices)
                }
            })
            .await;

        match result {
            Ok(voices) => {
                info!("✅ Loaded {} local voices", voices.len());
                self.replace(voices);
                true
            }
            Err(()) => {
                warn!(
                    "⚠️ No local voices after {} attempts, remote speech will be used",
                    policy.max_attempts
                );
                false
            }
        }
    }

    /// Re-query the platform (without waiting) when the catalog is empty.
    pub async fn refresh_if_empty(&self) {
        if !self.is_empty() {
            return;
        }
        let voices = self.platform.voices().await;
        if !voices.is_empty() {
            info!("🔄 Voices appeared late: {} available", voices.len());
            self.replace(voices);
        }
    }

    fn replace(&self, voices: Vec<VoiceDescriptor>) {
        *self.voices.write().unwrap_or_else(|e| e.into_inner()) = voices;
        self.loaded.store(true, Ordering::SeqCst);
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<VoiceDescriptor>> {
        self.voices.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn voices(&self) -> Vec<VoiceDescriptor> {
        self.read().clone()
    }

    pub fn is_supported(&self, lang: &str) -> bool {
        capability::is_supported(&self.read(), lang)
    }

    pub fn pick_voice(&self, lang: &str) -> Option<VoiceDescriptor> {
        capability::pick_voice(&self.read(), lang).cloned()
    }

    /// Log how many voices exist and how many cover Chinese and Japanese.
    pub fn log_summary(&self) {
        let voices = self.read();
        info!("=== Local voices: {} ===", voices.len());
        if voices.is_empty() {
            info!("❌ No local voices, remote speech will be used");
            return;
        }
        let family = |prefix: &str| {
            voices
                .iter()
                .filter(|v| crate::languages::same_primary(&v.lang, prefix))
                .count()
        };
        info!("📢 Chinese voices: {}", family("zh"));
        info!("🎌 Japanese voices: {}", family("ja"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Reports `later` only after the first voices-changed notification.
    #[derive(Debug, Default)]
    struct LatePlatform {
        later: Vec<VoiceDescriptor>,
        notified: AtomicBool,
        notifications: AtomicUsize,
        current: Mutex<Vec<VoiceDescriptor>>,
    }

    #[async_trait]
    impl SpeechPlatform for LatePlatform {
        async fn voices(&self) -> Vec<VoiceDescriptor> {
            if self.notified.load(Ordering::SeqCst) {
                self.later.clone()
            } else {
                self.current.lock().unwrap().clone()
            }
        }

        async fn voices_changed(&self) {
            self.notifications.fetch_add(1, Ordering::SeqCst);
            self.notified.store(true, Ordering::SeqCst);
        }

        async fn speak(&self, _utterance: super::super::Utterance) -> Result<()> {
            Ok(())
        }

        fn cancel(&self) {}
        fn pause(&self) {}
        fn resume(&self) {}

        fn name(&self) -> &str {
            "late"
        }
    }

    #[tokio::test]
    async fn test_load_waits_for_notification() {
        let platform = Arc::new(LatePlatform {
            later: vec![VoiceDescriptor::new("en-US", "Alex")],
            ..Default::default()
        });
        let catalog = VoiceCatalog::new(platform.clone());

        let voices = catalog.load().await;
        assert_eq!(voices.len(), 1);
        assert_eq!(platform.notifications.load(Ordering::SeqCst), 1);
        // load() alone does not populate the catalog
        assert!(!catalog.is_loaded());
    }

    #[tokio::test]
    async fn test_load_with_retry_marks_loaded() {
        let platform = Arc::new(LatePlatform {
            later: vec![VoiceDescriptor::new("zh-TW", "Mei-Jia")],
            ..Default::default()
        });
        let catalog = VoiceCatalog::new(platform);
        let policy = RetryPolicy::new(3, Duration::ZERO);

        assert!(catalog.load_with_retry(&policy).await);
        assert!(catalog.is_loaded());
        assert_eq!(catalog.len(), 1);
        assert!(catalog.is_supported("zh-HK"));
    }

    #[tokio::test]
    async fn test_refresh_if_empty_adopts_late_voices() {
        let platform = Arc::new(LatePlatform::default());
        let catalog = VoiceCatalog::new(platform.clone());
        catalog.refresh_if_empty().await;
        assert!(catalog.is_empty());

        platform
            .current
            .lock()
            .unwrap()
            .push(VoiceDescriptor::new("ko-KR", "Yuna"));
        catalog.refresh_if_empty().await;
        assert!(catalog.is_loaded());
        assert_eq!(catalog.pick_voice("ko-KR").unwrap().name, "Yuna");
    }
}
