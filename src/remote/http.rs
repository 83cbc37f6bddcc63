//! HTTP audio backend: downloads the clip with reqwest, plays it via the SoundEngine

use super::{AudioBackend, PlaybackHandle};
use crate::audio::SoundEngine;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// The endpoint rejects requests without a browser user agent
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

#[derive(Debug, Clone)]
pub struct HttpAudioBackend {
    client: reqwest::Client,
    engine: SoundEngine,
}

impl HttpAudioBackend {
    pub fn new(engine: SoundEngine, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client, engine })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {}", status));
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(anyhow!("empty audio body"));
        }
        debug!("Fetched {} bytes of audio", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl AudioBackend for HttpAudioBackend {
    async fn start(&self, url: &str) -> Result<PlaybackHandle> {
        let generation = self.engine.generation();
        let bytes = self.fetch(url).await?;
        let finished = self.engine.start(generation, bytes).await?;
        Ok(PlaybackHandle::new(finished))
    }

    fn stop(&self) {
        if let Err(e) = self.engine.stop() {
            warn!("⚠️ Could not stop audio: {}", e);
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
