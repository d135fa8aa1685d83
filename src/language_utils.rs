use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities
///
/// ISO 639 code handling for the configured source/target languages, and the
/// Japanese script heuristics shared by encoding recovery and segment
/// translation.

/// Number of leading characters examined by [`looks_japanese`]
pub const SCRIPT_SAMPLE_CHARS: usize = 2000;

/// Share of Japanese characters a sample must exceed to count as Japanese
pub const SCRIPT_RATIO_THRESHOLD: f64 = 0.01;

// ISO 639-2/B codes that differ from their 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }

        if let Some((_, part2t)) = PART2B_TO_PART2T.iter().find(|(b, _)| *b == normalized_code) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Whether a character belongs to hiragana, katakana or the CJK unified ideograph block
pub fn is_japanese_char(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'   // hiragana
        | '\u{30A0}'..='\u{30FF}' // katakana
        | '\u{4E00}'..='\u{9FAF}' // kanji
    )
}

/// Whether the text contains at least one Japanese script character
pub fn contains_japanese(text: &str) -> bool {
    text.chars().any(is_japanese_char)
}

/// Ratio-based script check used to validate an encoding guess.
///
/// Only the first [`SCRIPT_SAMPLE_CHARS`] characters are examined. The text
/// passes when its Japanese characters exceed [`SCRIPT_RATIO_THRESHOLD`] of
/// the sample, so an empty sample never passes.
pub fn looks_japanese(text: &str) -> bool {
    let mut sample_len = 0usize;
    let mut japanese = 0usize;

    for c in text.chars().take(SCRIPT_SAMPLE_CHARS) {
        sample_len += 1;
        if is_japanese_char(c) {
            japanese += 1;
        }
    }

    japanese as f64 > sample_len as f64 * SCRIPT_RATIO_THRESHOLD
}
