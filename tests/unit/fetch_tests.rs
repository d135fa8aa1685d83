/*!
 * Tests for the HTTP page source
 */

use anyhow::Result;
use encoding_rs::SHIFT_JIS;

use helptrans::app_config::DownloadConfig;
use helptrans::errors::FetchError;
use helptrans::fetch::{HttpFetcher, PageSource};
use crate::common::{self, CannedResponse};

#[tokio::test]
async fn test_fetch_shouldReturnBytesAndDeclaredCharset() -> Result<()> {
    let (body, _, _) = SHIFT_JIS.encode("<p>ヘルプ</p>");
    let (url, requests) = common::spawn_http_server(CannedResponse::html(
        "text/html; charset=Shift_JIS",
        body.to_vec(),
    )).await?;
    let fetcher = HttpFetcher::new(&DownloadConfig::default())?;

    let raw = fetcher.fetch(&format!("{}/help/page", url)).await?;

    assert_eq!(raw.bytes, body.to_vec());
    assert_eq!(raw.declared_encoding.as_deref(), Some("Shift_JIS"));

    let request = requests.lock().unwrap()[0].to_lowercase();
    assert!(request.starts_with("get /help/page"));
    assert!(request.contains("accept-language: ja-jp,ja;q=0.9,en;q=0.8"));
    assert!(request.contains("user-agent: mozilla/5.0"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_withoutCharset_shouldLeaveEncodingUndeclared() -> Result<()> {
    let (url, _) = common::spawn_http_server(CannedResponse::html("text/html", b"<p>x</p>".to_vec())).await?;
    let fetcher = HttpFetcher::new(&DownloadConfig::default())?;

    let raw = fetcher.fetch(&url).await?;

    assert!(raw.declared_encoding.is_none());
    Ok(())
}

#[tokio::test]
async fn test_fetch_withErrorStatus_shouldReturnStatusError() -> Result<()> {
    let (url, _) = common::spawn_http_server(CannedResponse::json(404, "{}")).await?;
    let fetcher = HttpFetcher::new(&DownloadConfig::default())?;

    let error = fetcher.fetch(&url).await.unwrap_err();

    assert!(matches!(error, FetchError::Status { status_code: 404, .. }));
    Ok(())
}

#[tokio::test]
async fn test_fetch_withInvalidUrl_shouldFailWithoutRequest() -> Result<()> {
    let fetcher = HttpFetcher::new(&DownloadConfig::default())?;

    let error = fetcher.fetch("not a url").await.unwrap_err();

    assert!(matches!(error, FetchError::InvalidUrl { .. }));
    Ok(())
}

#[test]
fn test_http_fetcher_withInvalidHeaderValue_shouldFailToBuild() {
    let mut config = DownloadConfig::default();
    config.accept_language = "ja\nbad".to_string();

    assert!(HttpFetcher::new(&config).is_err());
}
