//! Regex detectors for the domain categories the neural model does not
//! cover. Each hit carries the category's fixed confidence.

use flashwire_types::EntityLabel;
use once_cell::sync::Lazy;
use regex::Regex;

pub const EVENT_SCORE: f64 = 0.95;
pub const LAW_SCORE: f64 = 0.90;
pub const DATE_YEAR_SCORE: f64 = 0.99;
pub const DATE_NUMERIC_SCORE: f64 = 0.97;
pub const MONEY_SCORE: f64 = 0.95;
pub const QUANTITY_SCORE: f64 = 0.90;
pub const NORP_SCORE: f64 = 0.85;

static RE_EVENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(COP ?\d{1,2}|Protocolo\s+de\s+\w+|Acordo\s+de\s+\w+|Tratado\s+de\s+\w+|Summit|Cúpula)\b",
    )
    .expect("regex")
});

static RE_LAW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(Lei\s+[^\d\W]\w+|Lei\s+\d[\w.\-/]*|PL\s?\d[\w.\-/]*|MP\s?\d[\w.\-/]*|Decreto\s+\d[\w.\-/]*)",
    )
    .expect("regex")
});

/// Four-digit years 1500-2199.
static RE_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(1[5-9]\d{2}|20\d{2}|21\d{2})\b").expect("regex"));

static RE_DATE_NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-3]?\d[/\-.][0-1]?\d[/\-.](?:19|20)\d{2}\b").expect("regex")
});

static RE_MONEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:R\$|US\$|\$|€|£|¥)\s?\d{1,3}(?:[.,\s]\d{3})*(?:[.,]\d{1,2})?|\b\d{1,3}(?:[.,\s]\d{3})*(?:[.,]\d{1,2})?\s?(?:USD|EUR|BRL|GBP|JPY)\b",
    )
    .expect("regex")
});

static RE_QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d[\d.,\s]*\s?(?:(?:km2|km²|km|m²|m3|MW|GW|kW|t|ton(?:nes)?|milhões|bilhões)\b|%)",
    )
    .expect("regex")
});

static RE_NORP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(indígenas?|democratas?|republicanos?|socialistas?|comunistas?|europeus?|brasileir[oa]s?)\b",
    )
    .expect("regex")
});

/// Run every detector over the whole text.
pub fn extract_extras(text: &str) -> Vec<(EntityLabel, String, f64)> {
    let mut found = Vec::new();

    for m in RE_EVENT.find_iter(text) {
        push(&mut found, EntityLabel::Event, m.as_str(), EVENT_SCORE);
    }
    for m in RE_LAW.find_iter(text) {
        push(&mut found, EntityLabel::Law, m.as_str(), LAW_SCORE);
    }
    for m in RE_YEAR.find_iter(text) {
        push(&mut found, EntityLabel::Date, m.as_str(), DATE_YEAR_SCORE);
    }
    for m in RE_DATE_NUMERIC.find_iter(text) {
        push(&mut found, EntityLabel::Date, m.as_str(), DATE_NUMERIC_SCORE);
    }
    for m in RE_MONEY.find_iter(text) {
        push(&mut found, EntityLabel::Money, m.as_str(), MONEY_SCORE);
    }
    for m in RE_QUANTITY.find_iter(text) {
        push(&mut found, EntityLabel::Quantity, m.as_str(), QUANTITY_SCORE);
    }
    for m in RE_NORP.find_iter(text) {
        push(&mut found, EntityLabel::Norp, m.as_str(), NORP_SCORE);
    }

    found
}

fn push(found: &mut Vec<(EntityLabel, String, f64)>, label: EntityLabel, text: &str, score: f64) {
    let text = text.trim();
    if !text.is_empty() {
        found.push((label, text.to_string(), score));
    }
}
