use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, PolydubError};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy video stream without re-encoding
    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Select a stream for the output
    pub fn map<S: Into<String>>(self, specifier: S) -> Self {
        self.arg("-map").arg(specifier)
    }

    /// Add a filter graph
    pub fn filter_complex<S: Into<String>>(self, graph: S) -> Self {
        self.arg("-filter_complex").arg(graph)
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| PolydubError::Media(format!("Failed to execute media processor: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PolydubError::Media(format!(
                "{} failed: {}",
                self.description, stderr
            )));
        }

        Ok(())
    }
}

/// Builder for the pipeline's media operations
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build audio extraction command: 16 kHz mono PCM WAV, the fixed format
    /// the transcriber accepts.
    pub fn extract_audio<P: AsRef<Path>>(&self, video_path: P, audio_path: P) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(16000)
            .audio_channels(1)
            .overwrite()
            .output(audio_path)
    }

    /// Build dub-only remux command: the original video stream copied,
    /// the dub track as the only audio. No `-shortest`, so the container
    /// duration is max(video, audio) when the tracks disagree.
    pub fn replace_audio<P: AsRef<Path>>(
        &self,
        video_path: P,
        dub_path: P,
        output_path: P,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio replacement remux")
            .overwrite()
            .input(video_path)
            .input(dub_path)
            .map("0:v:0")
            .map("1:a:0")
            .copy_video()
            .audio_codec("aac")
            .output(output_path)
    }

    /// Build preserve-original mix command: original audio attenuated, dub
    /// emphasized, mixed into one track under the untouched video stream.
    /// `duration=longest` keeps the mix as long as the longer input, so the
    /// output duration is max(video, audio).
    pub fn mix_audio<P: AsRef<Path>>(
        &self,
        video_path: P,
        original_audio_path: P,
        dub_path: P,
        output_path: P,
        original_gain: f32,
        dub_gain: f32,
    ) -> MediaCommand {
        let graph = format!(
            "[1:a]volume={}[orig];[2:a]volume={}[dub];[orig][dub]amix=inputs=2:duration=longest[mixed]",
            original_gain, dub_gain
        );

        MediaCommand::new(&self.binary_path, "Audio mix remux")
            .overwrite()
            .input(video_path)
            .input(original_audio_path)
            .input(dub_path)
            .filter_complex(graph)
            .map("0:v:0")
            .map("[mixed]")
            .copy_video()
            .audio_codec("aac")
            .output(output_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check").arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new("ffmpeg")
    }

    #[test]
    fn test_extract_audio_uses_recognizer_format() {
        let cmd = builder().extract_audio("in.mp4", "out.wav");
        let args = cmd.args.join(" ");
        assert!(args.contains("-vn"));
        assert!(args.contains("-acodec pcm_s16le") || args.contains("-c:a pcm_s16le"));
        assert!(args.contains("-ar 16000"));
        assert!(args.contains("-ac 1"));
    }

    #[test]
    fn test_replace_audio_maps_dub_track_alone() {
        let cmd = builder().replace_audio("original.mp4", "dubbed_es.mp3", "output_es.mp4");
        let args = cmd.args.join(" ");
        assert!(args.contains("-map 0:v:0"));
        assert!(args.contains("-map 1:a:0"));
        assert!(args.contains("-c:v copy"));
        // Duration must follow the longer stream: -shortest would truncate.
        assert!(!cmd.args.iter().any(|a| a == "-shortest"));
        assert!(!args.contains("filter_complex"));
    }

    #[test]
    fn test_mix_audio_applies_configured_gains() {
        let cmd = builder().mix_audio(
            "original.mp4",
            "original_audio.wav",
            "dubbed_es.mp3",
            "output_es.mp4",
            0.3,
            0.7,
        );
        let graph = cmd
            .args
            .iter()
            .position(|a| a == "-filter_complex")
            .map(|i| cmd.args[i + 1].clone())
            .expect("mix command must carry a filter graph");
        assert!(graph.contains("volume=0.3"));
        assert!(graph.contains("volume=0.7"));
        assert!(graph.contains("amix=inputs=2:duration=longest"));
        let args = cmd.args.join(" ");
        assert!(args.contains("-map 0:v:0"));
        assert!(args.contains("-map [mixed]"));
        assert!(args.contains("-c:v copy"));
        assert!(!cmd.args.iter().any(|a| a == "-shortest"));
    }
}
