use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, PolydubError};
use crate::retry::with_retries;
use super::Translator;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// LLM-backed translator speaking the Ollama generate API
pub struct LlmTranslator {
    client: reqwest::Client,
    config: TranslateConfig,
}

impl LlmTranslator {
    pub fn new(config: TranslateConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    async fn request_translation(&self, text: &str, target_language: &str) -> Result<String> {
        let prompt = build_translation_prompt(text, target_language);

        let request = TranslationRequest {
            model: self.config.model.clone(),
            prompt,
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.config.endpoint);

        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PolydubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PolydubError::Translation(format!(
                "Translation API error {}: {}",
                status, error_text
            )));
        }

        let translation_response: TranslationResponse = response
            .json()
            .await
            .map_err(|e| PolydubError::Translation(format!("Failed to parse response: {}", e)))?;

        let raw_response = translation_response.response.trim().to_string();

        if raw_response.is_empty() {
            return Err(PolydubError::Translation(
                "Empty translation received".to_string(),
            ));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(&raw_response) {
            return Ok(result.text.trim().to_string());
        }

        Ok(clean_translation_response(&raw_response))
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        // Unsupported codes fail before any network round trip.
        if language_code_to_name(target_language).is_none() {
            return Err(PolydubError::UnsupportedLanguage(
                target_language.to_string(),
            ));
        }

        with_retries(self.config.max_retries, || {
            self.request_translation(text, target_language)
        })
        .await
    }
}

/// Build the translation prompt, asking for JSON output so the response can
/// be parsed rather than scraped.
fn build_translation_prompt(text: &str, target_language: &str) -> String {
    let language_name = language_code_to_name(target_language).unwrap_or(target_language);

    format!(
        "You are a professional translator.\n\
         \n\
         CRITICAL: You must translate the text to {} ONLY. Do not translate to any other language.\n\
         The target language is: {} (language code: {})\n\
         \n\
         Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
         Do not include any explanations, alternatives, or text in other languages.\n\
         \n\
         [Text to translate]\n\
         {}\n",
        language_name, language_name, target_language, language_name, text
    )
}

/// Convert language code to full language name for clearer prompts. Returns
/// None for codes the pipeline does not support.
pub fn language_code_to_name(code: &str) -> Option<&'static str> {
    let name = match code.to_lowercase().as_str() {
        "en" => "English",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "fr" => "French",
        "de" => "German",
        "es" => "Spanish",
        "ru" => "Russian",
        "it" => "Italian",
        "pt" => "Portuguese",
        "pl" => "Polish",
        "nl" => "Dutch",
        "tr" => "Turkish",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "sv" => "Swedish",
        "da" => "Danish",
        "no" => "Norwegian",
        "fi" => "Finnish",
        "he" => "Hebrew",
        "hu" => "Hungarian",
        "cs" => "Czech",
        "sk" => "Slovak",
        "bg" => "Bulgarian",
        "hr" => "Croatian",
        "sl" => "Slovenian",
        "et" => "Estonian",
        "lv" => "Latvian",
        "lt" => "Lithuanian",
        "ca" => "Catalan",
        "uk" => "Ukrainian",
        "el" => "Greek",
        "ro" => "Romanian",
        "id" => "Indonesian",
        "ms" => "Malay",
        "bn" => "Bengali",
        "ta" => "Tamil",
        "te" => "Telugu",
        _ => return None,
    };
    Some(name)
}

/// Extract a usable translation line when the model ignored the JSON format
/// instruction and replied in prose.
fn clean_translation_response(response: &str) -> String {
    for line in response.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("Here are")
            || trimmed.starts_with("Option")
            || trimmed.starts_with("Translation:")
            || trimmed.starts_with("- ")
            || trimmed.starts_with("* ")
        {
            continue;
        }

        if trimmed.starts_with("**") && trimmed.ends_with("**") {
            continue;
        }

        if trimmed.len() > 3 {
            return trimmed.to_string();
        }
    }

    for line in response.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    response.to_string()
}
