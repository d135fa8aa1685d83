/*!
 * Downloading help pages.
 *
 * [`PageSource`] is the capability the download batch depends on; [`HttpFetcher`]
 * is the real implementation over `reqwest`.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::app_config::DownloadConfig;
use crate::encoding::RawDocument;
use crate::errors::FetchError;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Something that can return the raw bytes behind a URL
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError>;
}

/// HTTP page source with browser-like request headers
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher from the download settings
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .with_context(|| format!("Invalid Accept-Language header: {}", config.accept_language))?,
        );
        headers.insert(header::DNT, HeaderValue::from_static("1"));
        headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let response = self.client.get(parsed).send().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status_code: status.as_u16(),
            });
        }

        let declared_encoding = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_from_content_type);

        let bytes = response.bytes().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        debug!(
            "Fetched {} bytes from {} (declared charset: {})",
            bytes.len(),
            url,
            declared_encoding.as_deref().unwrap_or("none")
        );

        Ok(RawDocument::new(bytes.to_vec(), declared_encoding))
    }
}

/// The `charset` parameter of a `Content-Type` header value, if any
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"').trim().to_string())
        .filter(|value| !value.is_empty())
}
