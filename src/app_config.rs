use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::language_utils;
use crate::translation::{RegionMarkers, RetryPolicy};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Input and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Page download settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Manifest URL rewriting
    #[serde(default)]
    pub url_rewrite: UrlRewriteConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: OpenAI-compatible chat completions
    #[default]
    OpenAI,
    // @provider: Anthropic
    Anthropic,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI-compatible",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: default_openai_model(),
                api_key: String::new(),
                endpoint: default_openai_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
        }
    }
}

/// Where manifests and pages live
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathsConfig {
    /// YAML manifest listing the help pages
    #[serde(default = "default_manifest_path")]
    pub manifest: PathBuf,

    /// Directory receiving downloaded (decoded) pages
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Directory receiving translated pages
    #[serde(default = "default_translated_dir")]
    pub translated_dir: PathBuf,

    /// JSON manifest whose detailUrl fields get rewritten
    #[serde(default = "default_url_manifest_path")]
    pub url_manifest: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest_path(),
            download_dir: default_download_dir(),
            translated_dir: default_translated_dir(),
            url_manifest: default_url_manifest_path(),
        }
    }
}

/// Page download settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DownloadConfig {
    /// Pause between consecutive downloads in milliseconds
    #[serde(default = "default_download_delay_ms")]
    pub request_delay_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language header sent with every request
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Consult the statistical encoding detector before anything else
    #[serde(default = "default_true")]
    pub statistical_detection: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_download_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            statistical_detection: true,
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default = "default_available_providers")]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,

    /// Markers delimiting the translatable region of a page
    #[serde(default)]
    pub region: RegionConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Prompt sent for every segment
    /// Placeholders: {source_language}, {target_language}, {text}
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token limit per segment
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Attempts per segment, including the first
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Fixed pause between failed attempts (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Pause after each successful request (in milliseconds)
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Pause after each translated document (in milliseconds)
    #[serde(default = "default_document_delay_ms")]
    pub document_delay_ms: u64,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            prompt_template: default_prompt_template(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            request_delay_ms: default_request_delay_ms(),
            document_delay_ms: default_document_delay_ms(),
        }
    }
}

/// Region marker configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegionConfig {
    #[serde(default = "default_start_marker")]
    pub start_marker: String,

    #[serde(default = "default_end_marker")]
    pub end_marker: String,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            start_marker: default_start_marker(),
            end_marker: default_end_marker(),
        }
    }
}

/// Manifest URL rewriting configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UrlRewriteConfig {
    /// URL template; `{id}` is replaced by each record's id
    #[serde(default = "default_url_template")]
    pub template: String,
}

impl Default for UrlRewriteConfig {
    fn default() -> Self {
        Self {
            template: default_url_template(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_target_language() -> String {
    "zh".to_string()
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("gakumasu-diff/orig/HelpContent.yaml")
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloaded_help_pages")
}

fn default_translated_dir() -> PathBuf {
    PathBuf::from("translated_help_pages")
}

fn default_url_manifest_path() -> PathBuf {
    PathBuf::from("HelpContent.json")
}

fn default_download_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_accept_language() -> String {
    "ja-JP,ja;q=0.9,en;q=0.8".to_string()
}

fn default_true() -> bool {
    true
}

fn default_available_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new(TranslationProvider::OpenAI),
        ProviderConfig::new(TranslationProvider::Anthropic),
    ]
}

fn default_prompt_template() -> String {
    "Translate the following {source_language} text into {target_language}. Reply with the translation only, without any explanation:\n\n{text}".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_document_delay_ms() -> u64 {
    1000
}

fn default_start_marker() -> String {
    "<main>".to_string()
}

fn default_end_marker() -> String {
    "</main>".to_string()
}

fn default_url_template() -> String {
    "https://chihya72.github.io/gakumas-help-pages/translated_help_pages/{id}.html?_cb=c3e6734e2d81779b113c8abea6bbef30b6f45fbaae2362ffcc1bce290abac7a8".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.siliconflow.cn/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_openai_model() -> String {
    "Pro/deepseek-ai/DeepSeek-V3".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

impl Config {
    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate the settings every command relies on
    pub fn validate(&self) -> Result<()> {
        language_utils::get_language_name(&self.source_language)?;
        language_utils::get_language_name(&self.target_language)?;

        if language_utils::language_codes_match(&self.source_language, &self.target_language) {
            return Err(anyhow!("Source and target language are both '{}'", self.source_language));
        }

        let region = &self.translation.region;
        if region.start_marker.is_empty() || region.end_marker.is_empty() {
            return Err(anyhow!("Region markers must not be empty"));
        }

        if self.translation.common.retry_count == 0 {
            return Err(anyhow!("retry_count must be at least 1"));
        }

        self.url_rewrite.validate()
    }

    /// Additional checks needed before talking to a translation provider
    pub fn validate_for_translation(&self) -> Result<()> {
        self.validate()?;

        if self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                self.translation.provider.display_name()
            ));
        }

        Url::parse(&self.translation.get_endpoint())
            .with_context(|| format!("Invalid provider endpoint: {}", self.translation.get_endpoint()))?;

        Ok(())
    }
}

impl UrlRewriteConfig {
    /// The template must contain `{id}` and render to an absolute URL
    pub fn validate(&self) -> Result<()> {
        if !self.template.contains("{id}") {
            return Err(anyhow!("URL template must contain {{id}}: {}", self.template));
        }

        let sample = self.template.replace("{id}", "sample-id");
        Url::parse(&sample)
            .with_context(|| format!("URL template does not produce a valid URL: {}", self.template))?;

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            paths: PathsConfig::default(),
            download: DownloadConfig::default(),
            translation: TranslationConfig::default(),
            url_rewrite: UrlRewriteConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, created on demand
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        match self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            Some(index) => &mut self.available_providers[index],
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider.clone()));
                let last = self.available_providers.len() - 1;
                &mut self.available_providers[last]
            }
        }
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        match self.provider {
            TranslationProvider::OpenAI => default_openai_model(),
            TranslationProvider::Anthropic => default_anthropic_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        match self.provider {
            TranslationProvider::OpenAI => default_openai_endpoint(),
            TranslationProvider::Anthropic => default_anthropic_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or_else(default_timeout_secs)
    }

    /// Region markers for the segment translator
    pub fn region_markers(&self) -> RegionMarkers {
        RegionMarkers::new(&self.region.start_marker, &self.region.end_marker)
    }

    /// Retry policy for the segment translator
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.common.retry_count,
            backoff: Duration::from_millis(self.common.retry_backoff_ms),
            request_timeout: Duration::from_secs(self.get_timeout_secs()),
            request_delay: Duration::from_millis(self.common.request_delay_ms),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: default_available_providers(),
            common: TranslationCommonConfig::default(),
            region: RegionConfig::default(),
        }
    }
}
