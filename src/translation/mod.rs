/*!
 * Translation of help page content.
 *
 * - `core`: the `Translate` capability and the provider-backed service
 * - `segments`: tag-boundary segmentation and region markers
 * - `document`: the segment translator with retry and failure isolation
 */

// Re-export main types for easier usage
pub use self::core::{FnTranslator, LogEntry, Translate, TranslationService};
pub use self::document::{DocumentReport, RetryPolicy, SegmentedTranslator, TranslatedDocument};
pub use self::segments::{RegionMarkers, Segment, join_segments, split_segments};

// Submodules
pub mod core;
pub mod document;
pub mod segments;
