//! Named-entity extraction for long multilingual text.
//!
//! A black-box neural recognizer supplies PER/ORG/LOC spans over
//! newline-aligned chunks; precompiled regex layers add the domain
//! categories (EVENT, LAW, DATE, MONEY, QUANTITY, NORP). Results are merged
//! case-insensitively keeping the best score, sorted, and wrapped with run
//! metadata. The tagger never raises: failures produce an empty bundle with
//! correct metadata.

mod recognizer;
mod regex_layer;
mod tagger;

pub use recognizer::{EntityRecognizer, HttpNerClient, RecognizedSpan};
pub use tagger::{EntityTagger, TaggerConfig};
