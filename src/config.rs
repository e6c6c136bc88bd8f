use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, PolydubError};

fn default_max_concurrent_jobs() -> usize {
    2
}

fn default_max_concurrent_languages() -> usize {
    4
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub jobs: JobsConfig,
    pub fetch: FetchConfig,
    pub media: MediaConfig,
    pub transcribe: TranscribeConfig,
    pub translate: TranslateConfig,
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP boundary binds to
    pub bind_addr: String,
    /// Request body ceiling in bytes, enforced by the boundary
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Root directory holding one output directory per job id
    pub output_root: PathBuf,
    /// How many jobs may run at once
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    /// How many per-language sub-pipelines may run at once within a job
    #[serde(default = "default_max_concurrent_languages")]
    pub max_concurrent_languages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Path to the downloader binary (yt-dlp)
    pub binary_path: String,
    /// Format selector passed to the downloader. Must yield a single file
    /// containing both video and audio streams.
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Gain applied to the original audio track when preserve-original is set
    pub original_gain: f32,
    /// Gain applied to the synthesized dub track when preserve-original is set
    pub dub_gain: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeConfig {
    /// Path to transcriber binary (e.g., whisper)
    pub binary_path: String,
    /// Model to use for transcription
    pub model: String,
    /// Source language hint; None lets the recognizer detect it
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Translation service endpoint URL (Ollama-compatible)
    pub endpoint: String,
    /// LLM model to use for translation
    pub model: String,
    /// Maximum retries for transient translation failures
    pub max_retries: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Speech synthesis service endpoint URL
    pub endpoint: String,
    /// Voice identifier passed to the service
    pub voice: String,
    /// Maximum retries for transient synthesis failures
    pub max_retries: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "127.0.0.1:8080".to_string(),
                max_body_bytes: 50 * 1024 * 1024,
            },
            jobs: JobsConfig {
                output_root: PathBuf::from("outputs"),
                max_concurrent_jobs: default_max_concurrent_jobs(),
                max_concurrent_languages: default_max_concurrent_languages(),
            },
            fetch: FetchConfig {
                binary_path: "yt-dlp".to_string(),
                format: "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string(),
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                original_gain: 0.3,
                dub_gain: 0.7,
            },
            transcribe: TranscribeConfig {
                binary_path: "whisper".to_string(),
                model: "base".to_string(),
                language: None,
            },
            translate: TranslateConfig {
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2:3b".to_string(),
                max_retries: 3,
                timeout_secs: 300,
            },
            synthesis: SynthesisConfig {
                endpoint: "http://localhost:5002".to_string(),
                voice: "default".to_string(),
                max_retries: 3,
                timeout_secs: 120,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PolydubError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| PolydubError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PolydubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| PolydubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
