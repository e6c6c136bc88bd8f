// Media processing architecture
//
// This module provides an abstraction over the local media operations the
// pipeline needs:
// - Commands: ffmpeg command builders
// - Processor: FFmpeg-based implementation

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Extract the audio stream of a video into a standalone file in the
    /// format the transcriber accepts.
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()>;

    /// Remux the video with the dub track as its only audio.
    async fn replace_audio(
        &self,
        video_path: &Path,
        dub_path: &Path,
        output_path: &Path,
    ) -> Result<()>;

    /// Remux the video with original and dub audio mixed into one track at
    /// the configured relative gains.
    async fn mix_audio(
        &self,
        video_path: &Path,
        original_audio_path: &Path,
        dub_path: &Path,
        output_path: &Path,
    ) -> Result<()>;

    /// Check if the media processor binary is available
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Arc<dyn MediaProcessor> {
        Arc::new(processor::FfmpegProcessor::new(config))
    }
}
