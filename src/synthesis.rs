use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::SynthesisConfig;
use crate::error::{Result, PolydubError};
use crate::retry::with_retries;

/// Main trait for speech synthesis operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize spoken audio for the translated text and write it to
    /// `dest`. Fails with `Synthesis`, scoped to the offending language.
    async fn synthesize(&self, text: &str, language: &str, dest: &Path) -> Result<()>;
}

/// Factory for creating synthesizer instances
pub struct SynthesizerFactory;

impl SynthesizerFactory {
    /// Create the default synthesizer implementation (HTTP TTS service)
    pub fn create_synthesizer(
        config: SynthesisConfig,
        client: reqwest::Client,
    ) -> Arc<dyn SpeechSynthesizer> {
        Arc::new(HttpSynthesizer::new(config, client))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub input: String,
    pub language: String,
    pub voice: String,
    pub format: String,
}

/// Synthesizer backed by an HTTP text-to-speech service returning encoded
/// audio bytes
pub struct HttpSynthesizer {
    client: reqwest::Client,
    config: SynthesisConfig,
}

impl HttpSynthesizer {
    pub fn new(config: SynthesisConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    fn build_request(&self, text: &str, language: &str) -> SynthesisRequest {
        SynthesisRequest {
            input: text.to_string(),
            language: language.to_string(),
            voice: self.config.voice.clone(),
            format: "mp3".to_string(),
        }
    }

    async fn request_audio(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let url = format!("{}/api/tts", self.config.endpoint);
        let request = self.build_request(text, language);

        debug!("Sending synthesis request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PolydubError::Synthesis(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PolydubError::Synthesis(format!(
                "Synthesis API error {}: {}",
                status, error_text
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PolydubError::Synthesis(format!("Failed to read audio body: {}", e)))?;

        if bytes.is_empty() {
            return Err(PolydubError::Synthesis(
                "Synthesis service returned no audio".to_string(),
            ));
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, language: &str, dest: &Path) -> Result<()> {
        info!("Synthesizing {} speech to {}", language, dest.display());

        let audio = with_retries(self.config.max_retries, || {
            self.request_audio(text, language)
        })
        .await?;

        // Write to a temp name and rename so a failed write never leaves a
        // partial artifact behind.
        let temp_path = dest.with_extension("part");
        tokio::fs::write(&temp_path, &audio).await.map_err(|e| {
            PolydubError::Synthesis(format!("Failed to write audio file: {}", e))
        })?;
        tokio::fs::rename(&temp_path, dest).await.map_err(|e| {
            PolydubError::Synthesis(format!("Failed to move audio file into place: {}", e))
        })?;

        info!("Synthesis completed for {}", language);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_voice_and_format() {
        let config = SynthesisConfig {
            endpoint: "http://localhost:5002".to_string(),
            voice: "narrator".to_string(),
            max_retries: 0,
            timeout_secs: 10,
        };
        let synth = HttpSynthesizer::new(config, reqwest::Client::new());
        let request = synth.build_request("Hola mundo", "es");
        assert_eq!(request.input, "Hola mundo");
        assert_eq!(request.language, "es");
        assert_eq!(request.voice, "narrator");
        assert_eq!(request.format, "mp3");
    }
}
