//! Language identification with a two-detector cascade.
//!
//! The primary detector is fast and confidence-scored; when its confidence
//! drops below 0.99 the (heavier, lazily built) secondary detector decides.
//! Failures yield an empty string, never an error.

use lingua::LanguageDetector as LinguaDetector;
use lingua::LanguageDetectorBuilder;
use once_cell::sync::Lazy;
use tracing::trace;

static SECONDARY: Lazy<LinguaDetector> =
    Lazy::new(|| LanguageDetectorBuilder::from_all_languages().build());

const CONFIDENCE_FLOOR: f64 = 0.99;

/// Detect the language of `text`, returning an ISO-639-1 code or `""`.
pub fn detect_language(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    if let Some(info) = whatlang::detect(text) {
        if info.confidence() >= CONFIDENCE_FLOOR {
            if let Some(code) = iso_639_1_from_639_3(info.lang().code()) {
                return code;
            }
        }
        trace!(
            confidence = info.confidence(),
            "Primary detector below confidence floor, consulting secondary"
        );
    }

    secondary_detect(text)
}

fn secondary_detect(text: &str) -> String {
    match SECONDARY.detect_language_of(text) {
        Some(language) => language.iso_code_639_1().to_string().to_lowercase(),
        None => String::new(),
    }
}

fn iso_639_1_from_639_3(code: &str) -> Option<String> {
    isolang::Language::from_639_3(code)
        .and_then(|lang| lang.to_639_1())
        .map(str::to_string)
}

/// Whether `code` is a valid two-letter ISO-639-1 language code.
pub fn is_valid_iso_639_1(code: &str) -> bool {
    code.len() == 2 && isolang::Language::from_639_1(code).is_some()
}
