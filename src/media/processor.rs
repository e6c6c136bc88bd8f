use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use tracing::info;

use crate::config::MediaConfig;
use crate::error::{Result, PolydubError};
use super::{MediaProcessor, MediaCommandBuilder};

/// FFmpeg-based media processor
pub struct FfmpegProcessor {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegProcessor {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        info!(
            "Extracting audio from {} to {}",
            video_path.display(),
            audio_path.display()
        );

        let command = self.command_builder.extract_audio(video_path, audio_path);
        command.execute().await?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn replace_audio(
        &self,
        video_path: &Path,
        dub_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Remuxing {} with dub track {} -> {}",
            video_path.display(),
            dub_path.display(),
            output_path.display()
        );

        let command = self
            .command_builder
            .replace_audio(video_path, dub_path, output_path);
        command.execute().await.map_err(remux_error)?;

        info!("Audio replacement remux completed");
        Ok(())
    }

    async fn mix_audio(
        &self,
        video_path: &Path,
        original_audio_path: &Path,
        dub_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Mixing original ({}x) and dub ({}x) audio into {}",
            self.config.original_gain,
            self.config.dub_gain,
            output_path.display()
        );

        let command = self.command_builder.mix_audio(
            video_path,
            original_audio_path,
            dub_path,
            output_path,
            self.config.original_gain,
            self.config.dub_gain,
        );
        command.execute().await.map_err(remux_error)?;

        info!("Audio mix remux completed");
        Ok(())
    }

    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| PolydubError::Media(format!("Media processor not found: {}", e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(PolydubError::Media(
                "Media processor version check failed".to_string(),
            ))
        }
    }
}

/// Mux failures surface as remux errors, not generic media errors.
fn remux_error(e: PolydubError) -> PolydubError {
    match e {
        PolydubError::Media(msg) => PolydubError::Remux(msg),
        other => other,
    }
}
