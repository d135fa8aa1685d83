/*!
 * Tests for character encoding resolution
 */

use encoding_rs::{EUC_JP, ISO_2022_JP, SHIFT_JIS, UTF_8};
use helptrans::encoding::{
    DecodeMethod, Detection, EncodingDetector, EncodingResolver, RawDocument,
};

const JAPANESE_PAGE: &str = "<html><body><p>学園アイドルマスターのヘルプページです。プロデュースを始めましょう。</p></body></html>";

/// Detector that always returns the same suggestion
struct FixedDetector(Detection);

impl EncodingDetector for FixedDetector {
    fn detect(&self, _bytes: &[u8]) -> Option<Detection> {
        Some(self.0)
    }
}

fn fixed(encoding: &'static encoding_rs::Encoding, confidence: f32) -> EncodingResolver {
    EncodingResolver::new(Box::new(FixedDetector(Detection { encoding, confidence })))
}

#[test]
fn test_resolve_withShiftJisBytes_shouldPickShiftJisCandidate() {
    let (bytes, _, had_errors) = SHIFT_JIS.encode(JAPANESE_PAGE);
    assert!(!had_errors);

    let decoded = EncodingResolver::without_detection().resolve(&bytes, None);

    assert_eq!(decoded.text, JAPANESE_PAGE);
    assert_eq!(decoded.encoding, "Shift_JIS");
    assert_eq!(decoded.method, DecodeMethod::Candidate);
}

#[test]
fn test_resolve_withEucJpBytes_shouldPickEucJpCandidate() {
    let (bytes, _, _) = EUC_JP.encode(JAPANESE_PAGE);

    let decoded = EncodingResolver::without_detection().resolve(&bytes, None);

    assert_eq!(decoded.text, JAPANESE_PAGE);
    assert_eq!(decoded.encoding, "EUC-JP");
}

#[test]
fn test_resolve_withStatisticalDetection_shouldRecoverShiftJisText() {
    let (bytes, _, _) = SHIFT_JIS.encode(JAPANESE_PAGE);

    let decoded = EncodingResolver::with_statistical_detection().resolve(&bytes, None);

    assert_eq!(decoded.text, JAPANESE_PAGE);
}

#[test]
fn test_resolve_withStatisticalDetectionAndShortShiftJis_shouldNotProduceMojibake() {
    let resolver = EncodingResolver::with_statistical_detection();

    for fragment in ["学園", "設定画面", "<p>レッスン</p>"] {
        let (bytes, _, _) = SHIFT_JIS.encode(fragment);

        let decoded = resolver.resolve(&bytes, None);

        assert_eq!(decoded.text, fragment, "decoded as {}", decoded.encoding);
        assert_eq!(decoded.encoding, "Shift_JIS");
    }
}

#[test]
fn test_resolve_withStatisticalDetectionAndShortEucJp_shouldRecoverText() {
    let resolver = EncodingResolver::with_statistical_detection();

    for fragment in ["設定を変更しました。", "<p>プロデュースを始めましょう</p>"] {
        let (bytes, _, _) = EUC_JP.encode(fragment);

        let decoded = resolver.resolve(&bytes, None);

        assert_eq!(decoded.text, fragment, "decoded as {}", decoded.encoding);
    }
}

#[test]
fn test_resolve_withDeclaredUtf8_shouldUseDeclaredEncoding() {
    let decoded = EncodingResolver::without_detection()
        .resolve(JAPANESE_PAGE.as_bytes(), Some("UTF-8"));

    assert_eq!(decoded.text, JAPANESE_PAGE);
    assert_eq!(decoded.method, DecodeMethod::Declared);
    assert_eq!(decoded.encoding, "UTF-8");
}

#[test]
fn test_resolve_withPlaceholderDeclared_shouldIgnoreIt() {
    let decoded = EncodingResolver::without_detection()
        .resolve(JAPANESE_PAGE.as_bytes(), Some("ISO-8859-1"));

    assert_eq!(decoded.text, JAPANESE_PAGE);
    assert_eq!(decoded.method, DecodeMethod::Candidate);
    assert_eq!(decoded.encoding, "UTF-8");
}

#[test]
fn test_resolve_withWrongDeclaredEncoding_shouldFallThroughToCandidates() {
    // Shift_JIS bytes declared as EUC-JP decode to non-Japanese garbage
    let (bytes, _, _) = SHIFT_JIS.encode(JAPANESE_PAGE);

    let decoded = EncodingResolver::without_detection().resolve(&bytes, Some("euc-jp"));

    assert_eq!(decoded.text, JAPANESE_PAGE);
    assert_eq!(decoded.encoding, "Shift_JIS");
}

#[test]
fn test_resolve_withUnknownDeclaredLabel_shouldFallThroughToCandidates() {
    let decoded = EncodingResolver::without_detection()
        .resolve(JAPANESE_PAGE.as_bytes(), Some("x-not-a-charset"));

    assert_eq!(decoded.method, DecodeMethod::Candidate);
}

#[test]
fn test_resolve_withConfidentDetector_shouldSkipScriptCheck() {
    let ascii = b"<html><body>plain ascii only</body></html>";

    let decoded = fixed(EUC_JP, 0.9).resolve(ascii, None);

    assert_eq!(decoded.method, DecodeMethod::Detector);
    assert_eq!(decoded.encoding, "EUC-JP");
    assert_eq!(decoded.text.as_bytes(), ascii);
}

#[test]
fn test_resolve_withDetectorAtThreshold_shouldIgnoreGuess() {
    let decoded = fixed(EUC_JP, 0.7).resolve(JAPANESE_PAGE.as_bytes(), None);

    assert_eq!(decoded.method, DecodeMethod::Candidate);
    assert_eq!(decoded.encoding, "UTF-8");
}

#[test]
fn test_resolve_withDetectorGuessThatFailsToDecode_shouldContinue() {
    // Non-ASCII bytes are never valid ISO-2022-JP
    let decoded = fixed(ISO_2022_JP, 0.95).resolve(JAPANESE_PAGE.as_bytes(), None);

    assert_eq!(decoded.text, JAPANESE_PAGE);
    assert_eq!(decoded.encoding, UTF_8.name());
}

#[test]
fn test_resolve_withUndecodableBytes_shouldFallBackDroppingInvalidBytes() {
    let decoded = EncodingResolver::without_detection().resolve(b"\xff\xfe abc \xff", None);

    assert_eq!(decoded.method, DecodeMethod::Fallback);
    assert_eq!(decoded.text, " abc ");
}

#[test]
fn test_resolve_withAsciiOnly_shouldFallBackToUtf8() {
    let decoded = EncodingResolver::without_detection().resolve(b"hello", Some("utf-8"));

    assert_eq!(decoded.method, DecodeMethod::Fallback);
    assert_eq!(decoded.text, "hello");
}

#[test]
fn test_resolve_withEmptyInput_shouldReturnEmptyText() {
    let decoded = EncodingResolver::default().resolve(&[], None);

    assert!(decoded.text.is_empty());
    assert_eq!(decoded.method, DecodeMethod::Fallback);
}

#[test]
fn test_resolveDocument_shouldUseDeclaredEncodingOfRawDocument() {
    let raw = RawDocument::new(JAPANESE_PAGE.as_bytes().to_vec(), Some("utf-8".to_string()));

    let decoded = EncodingResolver::without_detection().resolve_document(&raw);

    assert_eq!(decoded.method, DecodeMethod::Declared);
}

#[test]
fn test_resolve_withArbitraryBytes_shouldNeverPanic() {
    let resolver = EncodingResolver::default();
    for seed in 0u32..64 {
        let bytes: Vec<u8> = (0..256u32)
            .map(|i| (i.wrapping_mul(31).wrapping_add(seed.wrapping_mul(17)) % 256) as u8)
            .collect();
        let decoded = resolver.resolve(&bytes, Some("shift_jis"));
        assert!(decoded.text.len() <= bytes.len() * 3);
    }
}
