use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolydubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Audio unintelligible: {0}")]
    Unintelligible(String),

    #[error("Transcription service unavailable: {0}")]
    TranscriberUnavailable(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Unsupported target language: {0}")]
    UnsupportedLanguage(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Remux error: {0}")]
    Remux(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PolydubError {
    /// Whether a retry has any chance of succeeding. Deterministic failures
    /// (unsupported language, malformed input, validation) are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PolydubError::Http(_)
                | PolydubError::Translation(_)
                | PolydubError::Synthesis(_)
                | PolydubError::TranscriberUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PolydubError>;
