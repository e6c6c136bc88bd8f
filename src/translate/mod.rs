// Translation architecture
//
// A translator is a pure function of (text, target language): it holds no
// mutable state, so the orchestrator may call it once per requested language,
// concurrently. The HTTP client is constructed once and injected — no
// process-wide singletons.

pub mod llm;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::TranslateConfig;
use crate::error::Result;

/// Main trait for translation operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate source text into the target language.
    ///
    /// An unrecognized language code fails with `UnsupportedLanguage`
    /// (deterministic, never retried); upstream failures fail with
    /// `Translation` and are retried within the configured bound.
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the default translator implementation (LLM-backed)
    pub fn create_translator(config: TranslateConfig, client: reqwest::Client) -> Arc<dyn Translator> {
        Arc::new(llm::LlmTranslator::new(config, client))
    }
}
