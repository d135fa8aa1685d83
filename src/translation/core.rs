/*!
 * Core translation service implementation.
 *
 * This module defines the [`Translate`] capability consumed by the segment
 * translator, and [`TranslationService`], which fulfils it with one of the
 * configured remote providers.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::fmt;

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::TranslationError;
use crate::language_utils::get_language_name;
use crate::providers::Provider;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::openai::{OpenAI, OpenAIRequest};

/// A backend able to translate one piece of text.
///
/// Implementations may be slow or fail; callers own retry and timeout policy.
#[async_trait]
pub trait Translate: Send + Sync {
    /// Translate `text`, returning the translated text
    async fn translate(&self, text: &str) -> Result<String, TranslationError>;
}

/// Adapts a plain function or closure into a [`Translate`] backend
pub struct FnTranslator<F> {
    func: F,
}

impl<F> FnTranslator<F>
where
    F: Fn(&str) -> Result<String, TranslationError> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> Translate for FnTranslator<F>
where
    F: Fn(&str) -> Result<String, TranslationError> + Send + Sync,
{
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        (self.func)(text)
    }
}

/// Log entry for capturing translation process logs
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new("INFO", message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new("WARN", message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new("ERROR", message)
    }

    pub fn is_warning(&self) -> bool {
        self.level == "WARN"
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Translation provider implementation variants
enum TranslationProviderImpl {
    /// OpenAI-compatible chat completions API
    OpenAI {
        /// Client instance
        client: OpenAI,
    },

    /// Anthropic messages API
    Anthropic {
        /// Client instance
        client: Anthropic,
    },
}

/// Translation service backed by a remote LLM provider
pub struct TranslationService {
    /// Provider implementation
    provider: TranslationProviderImpl,

    /// Configuration for the translation service
    pub config: TranslationConfig,

    /// English name of the source language, as used in prompts
    source_language: String,

    /// English name of the target language, as used in prompts
    target_language: String,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig, source_language: &str, target_language: &str) -> Result<Self> {
        let timeout_secs = config.get_timeout_secs();

        let provider = match config.provider {
            ConfigTranslationProvider::OpenAI => TranslationProviderImpl::OpenAI {
                client: OpenAI::new_with_config(config.get_api_key(), config.get_endpoint(), timeout_secs),
            },
            ConfigTranslationProvider::Anthropic => TranslationProviderImpl::Anthropic {
                client: Anthropic::new_with_config(config.get_api_key(), config.get_endpoint(), timeout_secs),
            },
        };

        let source_language = get_language_name(source_language)
            .map_err(|e| anyhow!("Invalid source language: {}", e))?;
        let target_language = get_language_name(target_language)
            .map_err(|e| anyhow!("Invalid target language: {}", e))?;

        Ok(Self {
            provider,
            config,
            source_language,
            target_language,
        })
    }

    /// Render the user prompt for one piece of text
    pub fn build_prompt(&self, text: &str) -> String {
        self.config
            .common
            .prompt_template
            .replace("{source_language}", &self.source_language)
            .replace("{target_language}", &self.target_language)
            .replace("{text}", text)
    }

    /// Translate a short fixed phrase to check that the provider answers
    pub async fn test_connection(&self) -> Result<String> {
        self.translate("こんにちは")
            .await
            .map_err(|e| anyhow!("Failed to reach {}: {}", self.config.provider.display_name(), e))
    }
}

#[async_trait]
impl Translate for TranslationService {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        let prompt = self.build_prompt(text);
        let model = self.config.get_model();
        let common = &self.config.common;

        let translated = match &self.provider {
            TranslationProviderImpl::OpenAI { client } => {
                let request = OpenAIRequest::new(model)
                    .add_message("user", prompt)
                    .temperature(common.temperature)
                    .max_tokens(common.max_tokens);
                let response = client.complete(request).await?;
                OpenAI::extract_text(&response)
            }
            TranslationProviderImpl::Anthropic { client } => {
                let request = AnthropicRequest::new(model, common.max_tokens)
                    .add_message("user", prompt)
                    .temperature(common.temperature);
                let response = client.complete(request).await?;
                Anthropic::extract_text(&response)
            }
        };

        let translated = translated.trim();
        if translated.is_empty() {
            return Err(TranslationError::EmptyResponse);
        }

        Ok(translated.to_string())
    }
}
