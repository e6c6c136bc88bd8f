use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;
use tracing::info;

use crate::config::TranscribeConfig;
use crate::error::{Result, PolydubError};
use super::{Transcriber, Transcript};

/// Whisper CLI JSON output format (the subset the pipeline consumes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperOutput {
    pub text: String,
    pub language: Option<String>,
}

/// Transcriber backed by the whisper command line tool
pub struct WhisperCliTranscriber {
    config: TranscribeConfig,
}

impl WhisperCliTranscriber {
    pub fn new(config: TranscribeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        info!("Transcribing {}", audio_path.display());

        let temp_dir = tempfile::tempdir().map_err(|e| {
            PolydubError::TranscriberUnavailable(format!("Failed to create temp directory: {}", e))
        })?;
        let output_dir = temp_dir.path();

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg(audio_path)
            .arg("--model")
            .arg(&self.config.model)
            .arg("--output_dir")
            .arg(output_dir)
            .arg("--output_format")
            .arg("json");

        if let Some(lang) = &self.config.language {
            cmd.arg("--language").arg(lang);
        }

        let output = cmd.output().await.map_err(|e| {
            PolydubError::TranscriberUnavailable(format!("Failed to execute whisper: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PolydubError::TranscriberUnavailable(format!(
                "Whisper failed: {}",
                stderr
            )));
        }

        // Whisper writes <audio stem>.json into the output directory.
        let audio_stem = audio_path
            .file_stem()
            .ok_or_else(|| {
                PolydubError::TranscriberUnavailable("Invalid audio filename".to_string())
            })?
            .to_string_lossy();
        let json_file = output_dir.join(format!("{}.json", audio_stem));

        let json_content = tokio::fs::read_to_string(&json_file).await.map_err(|e| {
            PolydubError::TranscriberUnavailable(format!("Failed to read whisper output: {}", e))
        })?;

        let whisper_output: WhisperOutput = serde_json::from_str(&json_content).map_err(|e| {
            PolydubError::TranscriberUnavailable(format!("Failed to parse whisper JSON: {}", e))
        })?;

        transcript_from_output(whisper_output, audio_path)
    }
}

/// An empty recognition result is unintelligible audio, not a service
/// failure; the caller decides whether the job proceeds.
fn transcript_from_output(output: WhisperOutput, audio_path: &Path) -> Result<Transcript> {
    let text = output.text.trim().to_string();
    if text.is_empty() {
        return Err(PolydubError::Unintelligible(format!(
            "no speech recognized in {}",
            audio_path.display()
        )));
    }

    Ok(Transcript {
        text,
        language: output.language,
    })
}
