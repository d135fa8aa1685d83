/*!
 * Provider implementations for remote translation backends.
 *
 * - OpenAI: any OpenAI-compatible chat completions endpoint
 * - Anthropic: Anthropic messages API
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Map a reqwest transport error to a provider error
pub(crate) fn transport_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() || error.is_connect() {
        ProviderError::ConnectionError(format!("{}: {}", provider, error))
    } else {
        ProviderError::RequestFailed(format!("{}: {}", provider, error))
    }
}

pub mod anthropic;
pub mod openai;
