//! Provider language-support tables.

/// ISO-639-1 codes accepted by the Google endpoint.
pub const GOOGLE_LANGUAGES: &[&str] = &[
    "af", "am", "ar", "az", "be", "bg", "bn", "bs", "ca", "ceb", "co", "cs", "cy", "da", "de",
    "el", "en", "eo", "es", "et", "eu", "fa", "fi", "fr", "fy", "ga", "gd", "gl", "gu", "ha",
    "he", "hi", "hr", "ht", "hu", "hy", "id", "ig", "is", "it", "ja", "jv", "ka", "kk", "km",
    "kn", "ko", "ku", "ky", "la", "lb", "lo", "lt", "lv", "mg", "mi", "mk", "ml", "mn", "mr",
    "ms", "mt", "my", "ne", "nl", "no", "ny", "pa", "pl", "ps", "pt", "ro", "ru", "rw", "sd",
    "si", "sk", "sl", "sm", "sn", "so", "sq", "sr", "st", "su", "sv", "sw", "ta", "te", "tg",
    "th", "tk", "tl", "tr", "tt", "ug", "uk", "ur", "uz", "vi", "xh", "yi", "yo", "zh", "zu",
];

/// BCP-47 pairs the MyMemory endpoint understands; sources and targets are
/// resolved from bare ISO-639-1 codes by prefix match.
pub const MYMEMORY_LANGUAGES: &[&str] = &[
    "ar-SA", "bg-BG", "bn-IN", "ca-ES", "cs-CZ", "da-DK", "de-DE", "el-GR", "en-GB", "es-ES",
    "et-EE", "fa-IR", "fi-FI", "fr-FR", "he-IL", "hi-IN", "hr-HR", "hu-HU", "id-ID", "it-IT",
    "ja-JP", "ko-KR", "lt-LT", "lv-LV", "ms-MY", "nl-NL", "no-NO", "pl-PL", "pt-PT", "ro-RO",
    "ru-RU", "sk-SK", "sl-SI", "sr-RS", "sv-SE", "th-TH", "tr-TR", "uk-UA", "ur-PK", "vi-VN",
    "zh-CN",
];

/// Resolve a bare ISO-639-1 code to the provider's BCP-47 tag by prefix.
pub fn mymemory_tag(code: &str) -> Option<&'static str> {
    let needle = code.to_lowercase();
    MYMEMORY_LANGUAGES
        .iter()
        .find(|tag| {
            tag.to_lowercase()
                .starts_with(&format!("{needle}-"))
        })
        .copied()
}

pub fn google_supports(code: &str) -> bool {
    GOOGLE_LANGUAGES.contains(&code.to_lowercase().as_str())
}
