//! Shared utilities for the Flashwire pipeline: date-partition handling,
//! retry backoff, text helpers and language detection.

pub mod dates;
pub mod lang;
pub mod retry;
pub mod text;

pub use dates::{table_name_for_date, validate_wire_date};
pub use lang::{detect_language, is_valid_iso_639_1};
pub use retry::backoff_delay;
pub use text::{split_sentences, word_count};
