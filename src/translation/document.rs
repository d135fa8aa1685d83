/*!
 * Structure-preserving translation of a page's content region.
 *
 * The region between the configured markers is split into segments; only text
 * segments containing Japanese script are sent to the backend, one at a time,
 * and everything else is copied through untouched.
 */

use log::{debug, warn};
use std::time::Duration;

use crate::errors::TranslationError;

use super::core::{LogEntry, Translate};
use super::segments::{RegionMarkers, Segment, join_segments, split_segments};

/// Number of characters of a failed segment quoted in warnings
const PREVIEW_CHARS: usize = 50;

/// Retry, timeout and throttling policy for backend calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per segment, including the first
    pub max_attempts: u32,
    /// Fixed pause between failed attempts
    pub backoff: Duration,
    /// Upper bound on a single backend call
    pub request_timeout: Duration,
    /// Pause after each successful backend call
    pub request_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            request_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Same attempt count with every pause removed
    pub fn without_delays(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Duration::ZERO,
            request_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// What happened while translating one document
#[derive(Debug, Clone, Default)]
pub struct DocumentReport {
    /// Whether the content region was found
    pub region_found: bool,
    /// Segments in the region
    pub segments: usize,
    /// Text segments containing Japanese script
    pub eligible: usize,
    /// Eligible segments replaced by a translation
    pub translated: usize,
    /// Eligible segments left untranslated after exhausting retries
    pub failed: usize,
    /// Warnings raised while processing this document
    pub issues: Vec<LogEntry>,
}

impl DocumentReport {
    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|entry| entry.is_warning()).count()
    }
}

/// Output of [`SegmentedTranslator::translate`]
#[derive(Debug, Clone)]
pub struct TranslatedDocument {
    pub text: String,
    pub report: DocumentReport,
}

/// Translates the text runs of a page's content region
#[derive(Debug, Clone, Default)]
pub struct SegmentedTranslator {
    markers: RegionMarkers,
    policy: RetryPolicy,
}

impl SegmentedTranslator {
    pub fn new(markers: RegionMarkers, policy: RetryPolicy) -> Self {
        Self { markers, policy }
    }

    pub fn markers(&self) -> &RegionMarkers {
        &self.markers
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Translate the content region of `document`.
    ///
    /// Never fails: a missing region or an untranslatable segment is recorded
    /// in the report and the affected text is passed through unchanged.
    pub async fn translate(&self, document: &str, backend: &dyn Translate) -> TranslatedDocument {
        let mut report = DocumentReport::default();

        let Some(region) = self.markers.locate(document) else {
            let message = format!(
                "Content region {}...{} not found, leaving document unchanged",
                self.markers.start, self.markers.end
            );
            warn!("{}", message);
            report.issues.push(LogEntry::warn(message));
            return TranslatedDocument {
                text: document.to_string(),
                report,
            };
        };
        report.region_found = true;

        let segments = split_segments(&document[region.clone()]);
        report.segments = segments.len();

        let mut output = Vec::with_capacity(segments.len());
        for segment in segments {
            if !segment.is_translatable() {
                output.push(segment);
                continue;
            }
            let text = segment.as_str().to_string();

            report.eligible += 1;
            match self.translate_segment(&text, backend).await {
                Ok(translated) => {
                    report.translated += 1;
                    output.push(Segment::Text(translated));
                }
                Err(e) => {
                    let message = format!(
                        "Translation failed after {} attempts, keeping original '{}': {}",
                        self.attempts(),
                        preview(&text),
                        e
                    );
                    warn!("{}", message);
                    report.failed += 1;
                    report.issues.push(LogEntry::warn(message));
                    output.push(Segment::Text(text));
                }
            }
        }

        let translated_region = join_segments(&output);
        let mut text = String::with_capacity(document.len() - region.len() + translated_region.len());
        text.push_str(&document[..region.start]);
        text.push_str(&translated_region);
        text.push_str(&document[region.end..]);

        debug!(
            "Region translated: {} of {} eligible segments",
            report.translated, report.eligible
        );

        TranslatedDocument { text, report }
    }

    fn attempts(&self) -> u32 {
        self.policy.max_attempts.max(1)
    }

    // Surrounding whitespace stays out of the request and is re-attached afterwards
    async fn translate_segment(&self, text: &str, backend: &dyn Translate) -> Result<String, TranslationError> {
        let core = text.trim();
        let leading = &text[..text.len() - text.trim_start().len()];
        let trailing = &text[text.trim_end().len()..];

        let attempts = self.attempts();
        let mut last_error = TranslationError::EmptyResponse;

        for attempt in 1..=attempts {
            let result = match tokio::time::timeout(self.policy.request_timeout, backend.translate(core)).await {
                Ok(result) => result,
                Err(_) => Err(TranslationError::Timeout(self.policy.request_timeout)),
            };

            match result {
                Ok(translated) => {
                    pause(self.policy.request_delay).await;
                    return Ok(format!("{}{}{}", leading, translated, trailing));
                }
                Err(e) => {
                    warn!("Translation attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e;
                    if attempt < attempts {
                        pause(self.policy.backoff).await;
                    }
                }
            }
        }

        Err(last_error)
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    let mut preview: String = trimmed.chars().take(PREVIEW_CHARS).collect();
    if trimmed.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}
