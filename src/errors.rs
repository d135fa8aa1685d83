/*!
 * Error types for the helptrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Map a non-success HTTP status to the matching provider error
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

/// Errors that can occur while downloading a help page
#[derive(Error, Debug)]
pub enum FetchError {
    /// The manifest URL could not be parsed
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Parser message
        message: String,
    },

    /// The request could not be sent or the body could not be read
    #[error("Request to {url} failed: {message}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying transport message
        message: String,
    },

    /// The server answered with a non-success status
    #[error("Server returned {status_code} for {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status_code: u16,
    },
}

/// Errors that can occur during translation of a single text segment
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The backend did not answer in time
    #[error("Translation timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered without any text
    #[error("Provider returned an empty translation")]
    EmptyResponse,

    /// Any other backend failure
    #[error("Translation backend error: {0}")]
    Backend(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error loading or parsing a manifest
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Error downloading a page
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Manifest(error.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Manifest(error.to_string())
    }
}
