//! Country resolution from article text.
//!
//! A multilingual alias index (scanned with Aho–Corasick) turns free text
//! and LOC entities into ranked ISO-3166 country records. Title mentions
//! are weighted up, weak or sparse candidates are filtered out, and LOC
//! validation is applied as an advisory intersection.

mod alias;
mod tagger;

pub use alias::{tag_place, tag_text_countries, PlaceTag, FEATURE_REGION, FEATURE_SOVEREIGN};
pub use tagger::{Geotagger, GeotaggerConfig};
