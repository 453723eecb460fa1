//! Post-extraction content scrubbing.
//!
//! The cleaner removes markup remnants the article extractor lets through
//! (markdown images and links, raw URLs, stray tags, fenced code blocks),
//! personal-data noise (emails, long digit runs) and invisible characters,
//! then normalizes whitespace line by line. A separate pass matches known
//! scrape-failure templates and collapses the whole body to a sentinel the
//! downstream stages treat as a soft failure.

use once_cell::sync::Lazy;
use regex::Regex;

/// Literal stored in `content` when the page yielded an error template
/// instead of an article.
pub const ERROR_SENTINEL: &str = "error_pattern_found";

static MD_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("regex"));
static MD_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\[\]]+)\]\([^()]+\)").expect("regex"));
static RAW_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("regex"));
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("regex"));
static MD_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+.*$").expect("regex"));
static MD_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(-{3,}|\*{3,})$").expect("regex"));
static FENCED_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("regex"));
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[\w.-]+@[\w.-]+\.\w{2,4}\b").expect("regex"));
static LONG_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{10,}\b").expect("regex"));
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("regex"));
static MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").expect("regex"));

/// Known connection / bot-wall / DNS failure templates that some sites
/// serve with HTTP 200.
static ERROR_PATTERNS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(connection refused|connection reset|connection timed out|could not resolve host|dns (error|lookup failed)|err_name_not_resolved|err_connection|access denied|403 forbidden|404 not found|page not found|captcha|are you a robot|unusual traffic|request blocked|blocked by|cloudflare|ddos protection|checking your browser|service unavailable|temporarily unavailable|too many requests|gateway time-?out|bad gateway)",
    )
    .expect("regex")
});

/// Whether the text matches a known scrape-failure template.
pub fn find_error_pattern(text: &str) -> bool {
    !text.is_empty() && ERROR_PATTERNS.is_match(text)
}

/// Scrub extractor output, or collapse it to [`ERROR_SENTINEL`] when the
/// page served an error template instead of an article.
pub fn clean_content(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let cleaned = remove_ui_junk(text);
    if find_error_pattern(&cleaned) {
        return ERROR_SENTINEL.to_string();
    }
    cleaned
}

/// The markup/noise scrub on its own, without the sentinel check.
pub fn remove_ui_junk(text: &str) -> String {
    // Invisible characters first so they never glue tokens together.
    let text = text.replace('\u{200b}', "").replace('\u{feff}', "");

    let text = MD_IMAGE.replace_all(&text, "");
    let text = MD_LINK.replace_all(&text, "$1");
    let text = RAW_URL.replace_all(&text, "");
    let text = HTML_TAG.replace_all(&text, "");
    let text = MD_HEADER.replace_all(&text, "");
    let text = MD_RULE.replace_all(&text, "");
    let text = FENCED_CODE.replace_all(&text, "");
    let text = EMAIL.replace_all(&text, "");
    let text = LONG_DIGITS.replace_all(&text, "");

    let lines: Vec<String> = text
        .lines()
        .map(|line| MULTI_SPACE.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect();

    let joined = lines.join("\n");
    MULTI_NEWLINE.replace_all(&joined, "\n").trim().to_string()
}
