/*!
 * # helptrans - help page downloader and translator
 *
 * A Rust library for archiving Japanese in-game help pages and machine
 * translating them while leaving their markup untouched.
 *
 * ## Features
 *
 * - Download pages listed in a YAML manifest
 * - Recover the character encoding of pages with missing or wrong charset metadata
 * - Translate only the Japanese text runs inside a page's content region
 * - Translate with any OpenAI-compatible endpoint or the Anthropic API
 * - Rewrite manifest URLs to point at the translated pages
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `encoding`: Character encoding resolution
 * - `fetch`: Page downloading
 * - `manifest`: YAML help page manifest
 * - `translation`: Segment-based translation:
 *   - `translation::core`: The translation capability and provider-backed service
 *   - `translation::segments`: Markup/text segmentation
 *   - `translation::document`: Region translation with retries
 * - `url_rewrite`: JSON manifest URL rewriting
 * - `file_utils`: File system operations
 * - `app_controller`: Batch drivers
 * - `language_utils`: Language codes and Japanese script detection
 * - `providers`: Client implementations for LLM providers
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod encoding;
pub mod errors;
pub mod fetch;
pub mod file_utils;
pub mod language_utils;
pub mod manifest;
pub mod providers;
pub mod translation;
pub mod url_rewrite;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{BatchSummary, Controller};
pub use encoding::{DecodeMethod, DecodedDocument, EncodingResolver, RawDocument};
pub use fetch::{HttpFetcher, PageSource};
pub use manifest::HelpEntry;
pub use translation::{SegmentedTranslator, Translate, TranslationService};
pub use language_utils::{contains_japanese, language_codes_match, looks_japanese};
pub use errors::{AppError, FetchError, ProviderError, TranslationError};
