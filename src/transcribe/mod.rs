// Transcription architecture
//
// A transcriber turns an extracted audio track into source-language text.
// Implementations are created through a factory so the orchestrator only ever
// sees the trait. The orchestrator guarantees exactly-once invocation per job
// regardless of how many target languages fan out afterwards.

pub mod whisper_cli;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::config::TranscribeConfig;
use crate::error::Result;

/// Source-language text derived once per job and shared read-only across all
/// requested languages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// Detected source language, when the recognizer reports one.
    pub language: Option<String>,
}

/// Main trait for transcription operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file to source-language text.
    ///
    /// Errors distinguish `Unintelligible` (the recognizer ran but found no
    /// speech — recoverable, the job may proceed with an empty transcript)
    /// from `TranscriberUnavailable` (the service could not run — terminal
    /// for the job).
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create the default transcriber implementation (whisper CLI)
    pub fn create_transcriber(config: TranscribeConfig) -> Arc<dyn Transcriber> {
        Arc::new(whisper_cli::WhisperCliTranscriber::new(config))
    }
}
