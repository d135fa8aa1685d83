/*!
 * Character encoding recovery for downloaded help pages.
 *
 * Help pages arrive with missing or wrong charset metadata. The resolver tries,
 * in order: a statistical detector, the transport-declared charset, a fixed list
 * of Japanese-capable encodings, and finally lossy UTF-8. Every guess except the
 * detector's must also produce text that actually looks Japanese.
 */

use encoding_rs::Encoding;
use log::{debug, warn};

use crate::language_utils::looks_japanese;

/// Minimum detector confidence for its guess to be used without validation
pub const DETECTOR_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Charset names a transport reports when it did not actually determine one
pub const PLACEHOLDER_ENCODINGS: &[&str] = &["iso-8859-1", "windows-1252"];

/// Encodings tried in order when neither detector nor transport can be trusted
pub const CANDIDATE_ENCODINGS: &[&str] = &["utf-8", "shift_jis", "euc-jp", "iso-2022-jp", "cp932"];

// chardetng reports a boolean assessment instead of a score
const ASSURED_CONFIDENCE: f32 = 0.99;
const UNASSURED_CONFIDENCE: f32 = 0.5;

/// Top-level domain hint for chardetng. Without it, short Shift_JIS fragments
/// are confidently guessed as single-byte European or Arabic code pages.
pub const DETECTOR_TLD_HINT: &[u8] = b"jp";

/// Bytes as received from the network, plus the charset the server declared
#[derive(Debug, Clone, Default)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub declared_encoding: Option<String>,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, declared_encoding: Option<String>) -> Self {
        Self { bytes, declared_encoding }
    }
}

/// Which resolution step produced a decoded document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMethod {
    /// Statistical detector above the confidence threshold
    Detector,
    /// Charset declared by the transport
    Declared,
    /// One of [`CANDIDATE_ENCODINGS`]
    Candidate,
    /// Lossy UTF-8, invalid bytes dropped
    Fallback,
}

/// Text recovered from a [`RawDocument`]
#[derive(Debug, Clone)]
pub struct DecodedDocument {
    pub text: String,
    /// Canonical name of the encoding that produced `text`
    pub encoding: String,
    pub method: DecodeMethod,
}

/// A detector's encoding suggestion
#[derive(Debug, Clone, Copy)]
pub struct Detection {
    pub encoding: &'static Encoding,
    /// Confidence in the range 0.0..=1.0
    pub confidence: f32,
}

/// Statistical encoding detection capability
pub trait EncodingDetector: Send + Sync {
    /// Suggest an encoding for the bytes, or `None` when no suggestion can be made
    fn detect(&self, bytes: &[u8]) -> Option<Detection>;
}

/// Detector used when statistical detection is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDetector;

impl EncodingDetector for NoDetector {
    fn detect(&self, _bytes: &[u8]) -> Option<Detection> {
        None
    }
}

/// Detector backed by chardetng
#[derive(Debug, Default, Clone, Copy)]
pub struct ChardetngDetector;

impl EncodingDetector for ChardetngDetector {
    fn detect(&self, bytes: &[u8]) -> Option<Detection> {
        if bytes.is_empty() {
            return None;
        }

        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(bytes, true);
        let (encoding, assured) = detector.guess_assess(Some(DETECTOR_TLD_HINT), true);

        Some(Detection {
            encoding,
            confidence: if assured { ASSURED_CONFIDENCE } else { UNASSURED_CONFIDENCE },
        })
    }
}

/// Resolves raw page bytes into text
pub struct EncodingResolver {
    detector: Box<dyn EncodingDetector>,
}

impl Default for EncodingResolver {
    fn default() -> Self {
        Self::with_statistical_detection()
    }
}

impl EncodingResolver {
    /// Create a resolver around the given detector
    pub fn new(detector: Box<dyn EncodingDetector>) -> Self {
        Self { detector }
    }

    /// Resolver that consults chardetng first
    pub fn with_statistical_detection() -> Self {
        Self::new(Box::new(ChardetngDetector))
    }

    /// Resolver that skips statistical detection entirely
    pub fn without_detection() -> Self {
        Self::new(Box::new(NoDetector))
    }

    /// Resolve a downloaded document
    pub fn resolve_document(&self, raw: &RawDocument) -> DecodedDocument {
        self.resolve(&raw.bytes, raw.declared_encoding.as_deref())
    }

    /// Decode `bytes`, never failing. See the module docs for the step order.
    pub fn resolve(&self, bytes: &[u8], declared_encoding: Option<&str>) -> DecodedDocument {
        if let Some(decoded) = self.try_detector(bytes) {
            return decoded;
        }

        if let Some(decoded) = Self::try_declared(bytes, declared_encoding) {
            return decoded;
        }

        for label in CANDIDATE_ENCODINGS {
            let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
                debug!("Skipping unknown candidate encoding {}", label);
                continue;
            };

            if let Some(text) = decode_strict(encoding, bytes) {
                if looks_japanese(&text) {
                    debug!("Decoded with candidate encoding {}", encoding.name());
                    return DecodedDocument {
                        text,
                        encoding: encoding.name().to_string(),
                        method: DecodeMethod::Candidate,
                    };
                }
            }
        }

        warn!("Could not determine encoding, decoding as UTF-8 and dropping invalid bytes");
        DecodedDocument {
            text: decode_utf8_dropping_invalid(bytes),
            encoding: encoding_rs::UTF_8.name().to_string(),
            method: DecodeMethod::Fallback,
        }
    }

    // Trusts the detector's confidence in place of the script check
    fn try_detector(&self, bytes: &[u8]) -> Option<DecodedDocument> {
        let detection = self.detector.detect(bytes)?;
        if detection.confidence <= DETECTOR_CONFIDENCE_THRESHOLD {
            debug!(
                "Ignoring detector guess {} (confidence {:.2})",
                detection.encoding.name(),
                detection.confidence
            );
            return None;
        }

        let text = decode_strict(detection.encoding, bytes)?;
        debug!(
            "Detector chose {} (confidence {:.2})",
            detection.encoding.name(),
            detection.confidence
        );

        Some(DecodedDocument {
            text,
            encoding: detection.encoding.name().to_string(),
            method: DecodeMethod::Detector,
        })
    }

    fn try_declared(bytes: &[u8], declared_encoding: Option<&str>) -> Option<DecodedDocument> {
        let label = declared_encoding?.trim();
        if label.is_empty() || is_placeholder_encoding(label) {
            return None;
        }

        let encoding = Encoding::for_label(label.as_bytes())?;
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            debug!("Declared encoding {} produced replacement characters", label);
        }

        if !looks_japanese(&text) {
            return None;
        }

        debug!("Using declared encoding {}", encoding.name());
        Some(DecodedDocument {
            text: text.into_owned(),
            encoding: encoding.name().to_string(),
            method: DecodeMethod::Declared,
        })
    }
}

/// Whether a declared charset is a transport default rather than real information
pub fn is_placeholder_encoding(label: &str) -> bool {
    let label = label.trim().to_ascii_lowercase();
    PLACEHOLDER_ENCODINGS.contains(&label.as_str())
}

/// Decode without replacement; `None` on any malformed sequence
pub fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

fn decode_utf8_dropping_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}
