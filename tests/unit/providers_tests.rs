/*!
 * Tests for provider clients and the provider-backed translation service
 */

use anyhow::Result;
use serde_json::{json, Value};

use helptrans::app_config::{TranslationConfig, TranslationProvider};
use helptrans::errors::{ProviderError, TranslationError};
use helptrans::providers::Provider;
use helptrans::providers::anthropic::{Anthropic, AnthropicRequest, AnthropicResponse};
use helptrans::providers::openai::{OpenAI, OpenAIRequest, OpenAIResponse};
use helptrans::translation::{Translate, TranslationService};
use crate::common::{self, CannedResponse};

fn config_for(provider: TranslationProvider, endpoint: &str) -> TranslationConfig {
    let mut config = TranslationConfig::default();
    config.provider = provider;
    let provider_config = config.active_provider_config_mut();
    provider_config.endpoint = endpoint.to_string();
    provider_config.api_key = "test-key".to_string();
    provider_config.timeout_secs = 5;
    config
}

fn request_body(raw: &str) -> Result<Value> {
    let body = raw.split("\r\n\r\n").nth(1).unwrap_or_default();
    Ok(serde_json::from_str(body)?)
}

#[test]
fn test_openai_request_shouldSerializeChatCompletionFields() -> Result<()> {
    let request = OpenAIRequest::new("Pro/deepseek-ai/DeepSeek-V3")
        .add_message("user", "こんにちは")
        .temperature(0.3)
        .max_tokens(2000);

    let value = serde_json::to_value(&request)?;

    assert_eq!(value["model"], "Pro/deepseek-ai/DeepSeek-V3");
    assert_eq!(value["messages"][0], json!({ "role": "user", "content": "こんにちは" }));
    assert_eq!(value["max_tokens"], 2000);
    assert!((value["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_openai_extract_text_shouldUseFirstChoice() -> Result<()> {
    let response: OpenAIResponse = serde_json::from_value(json!({
        "choices": [
            { "message": { "role": "assistant", "content": "你好" } },
            { "message": { "role": "assistant", "content": "ignored" } }
        ]
    }))?;

    assert_eq!(OpenAI::extract_text(&response), "你好");
    Ok(())
}

#[test]
fn test_anthropic_extract_text_shouldJoinTextBlocks() -> Result<()> {
    let response: AnthropicResponse = serde_json::from_value(json!({
        "content": [
            { "type": "text", "text": "你" },
            { "type": "tool_use", "id": "x" },
            { "type": "text", "text": "好" }
        ],
        "usage": { "input_tokens": 3, "output_tokens": 2 }
    }))?;

    assert_eq!(Anthropic::extract_text(&response), "你好");
    Ok(())
}

#[test]
fn test_anthropic_request_shouldOmitUnsetTemperature() -> Result<()> {
    let plain = serde_json::to_value(AnthropicRequest::new("m", 100).add_message("user", "x"))?;
    let tuned = serde_json::to_value(AnthropicRequest::new("m", 100).temperature(0.5))?;

    assert!(plain.get("temperature").is_none());
    assert_eq!(plain["max_tokens"], 100);
    assert_eq!(plain["messages"][0]["content"], "x");
    assert_eq!(tuned["temperature"], 0.5);
    Ok(())
}

#[test]
fn test_build_prompt_shouldFillLanguagesAndText() -> Result<()> {
    let mut config = TranslationConfig::default();
    config.common.prompt_template = "{source_language} -> {target_language}: {text}".to_string();

    let service = TranslationService::new(config, "ja", "zh")?;

    assert_eq!(service.build_prompt("本文"), "Japanese -> Chinese: 本文");
    Ok(())
}

#[test]
fn test_translation_service_withInvalidLanguage_shouldFail() {
    assert!(TranslationService::new(TranslationConfig::default(), "ja", "xx").is_err());
}

#[tokio::test]
async fn test_translation_service_withOpenAiEndpoint_shouldReturnTrimmedText() -> Result<()> {
    let (url, requests) = common::spawn_http_server(CannedResponse::json(
        200,
        r#"{"choices":[{"message":{"role":"assistant","content":"  你好 \n"}}]}"#,
    )).await?;
    let service = TranslationService::new(config_for(TranslationProvider::OpenAI, &url), "ja", "zh")?;

    let translated = service.translate("こんにちは").await?;

    assert_eq!(translated, "你好");
    let requests = requests.lock().unwrap().clone();
    assert!(requests[0].starts_with("POST /chat/completions"));
    assert!(requests[0].to_lowercase().contains("authorization: bearer test-key"));
    let body = request_body(&requests[0])?;
    assert_eq!(body["model"], "Pro/deepseek-ai/DeepSeek-V3");
    assert!(body["messages"][0]["content"].as_str().unwrap().ends_with("こんにちは"));
    Ok(())
}

#[tokio::test]
async fn test_translation_service_withAnthropicEndpoint_shouldSendApiKeyHeader() -> Result<()> {
    let (url, requests) = common::spawn_http_server(CannedResponse::json(
        200,
        r#"{"content":[{"type":"text","text":"你好"}],"usage":{"input_tokens":1,"output_tokens":1}}"#,
    )).await?;
    let service = TranslationService::new(config_for(TranslationProvider::Anthropic, &url), "ja", "zh")?;

    assert_eq!(service.translate("こんにちは").await?, "你好");

    let requests = requests.lock().unwrap().clone();
    assert!(requests[0].starts_with("POST /v1/messages"));
    assert!(requests[0].to_lowercase().contains("x-api-key: test-key"));
    Ok(())
}

#[tokio::test]
async fn test_translation_service_withRateLimit_shouldReturnProviderError() -> Result<()> {
    let (url, _) = common::spawn_http_server(CannedResponse::json(429, r#"{"error":"slow down"}"#)).await?;
    let service = TranslationService::new(config_for(TranslationProvider::OpenAI, &url), "ja", "zh")?;

    let error = service.translate("こんにちは").await.unwrap_err();

    assert!(matches!(error, TranslationError::Provider(ProviderError::RateLimitExceeded(_))));
    Ok(())
}

#[tokio::test]
async fn test_translation_service_withEmptyAnswer_shouldReturnEmptyResponse() -> Result<()> {
    let (url, _) = common::spawn_http_server(CannedResponse::json(200, r#"{"choices":[]}"#)).await?;
    let service = TranslationService::new(config_for(TranslationProvider::OpenAI, &url), "ja", "zh")?;

    let error = service.translate("こんにちは").await.unwrap_err();

    assert!(matches!(error, TranslationError::EmptyResponse));
    Ok(())
}

#[tokio::test]
async fn test_translation_service_withMalformedBody_shouldReturnParseError() -> Result<()> {
    let (url, _) = common::spawn_http_server(CannedResponse::json(200, "not json")).await?;
    let service = TranslationService::new(config_for(TranslationProvider::OpenAI, &url), "ja", "zh")?;

    let error = service.translate("こんにちは").await.unwrap_err();

    assert!(matches!(error, TranslationError::Provider(ProviderError::ParseError(_))));
    Ok(())
}

#[tokio::test]
async fn test_test_connection_withWorkingProvider_shouldReturnTranslation() -> Result<()> {
    let (url, _) = common::spawn_http_server(CannedResponse::json(
        200,
        r#"{"choices":[{"message":{"role":"assistant","content":"你好"}}]}"#,
    )).await?;
    let service = TranslationService::new(config_for(TranslationProvider::OpenAI, &url), "ja", "zh")?;

    assert_eq!(service.test_connection().await?, "你好");
    Ok(())
}

#[tokio::test]
async fn test_test_connection_withUnreachableProvider_shouldNameProvider() -> Result<()> {
    let (url, _) = common::spawn_http_server(CannedResponse::json(401, r#"{"error":"bad key"}"#)).await?;
    let service = TranslationService::new(config_for(TranslationProvider::Anthropic, &url), "ja", "zh")?;

    let error = service.test_connection().await.unwrap_err();

    assert!(error.to_string().contains("Anthropic"));
    Ok(())
}
