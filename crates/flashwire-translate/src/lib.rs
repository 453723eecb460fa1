//! Short-string translation across a provider cascade.
//!
//! Three public providers are tried in randomized order per call, each
//! behind a consecutive-failure circuit breaker. A provider whose circuit
//! opens is additionally disabled for the rest of the process. Results are
//! memoized in a process-wide LRU keyed by `(text, source, target)`. When
//! every provider fails the service returns `None`, never an error.

mod circuit;
mod languages;
mod providers;
mod service;

pub use circuit::Circuit;
pub use providers::{
    FreeApiBackend, GoogleBackend, MyMemoryBackend, ProviderId, TranslateBackend, TranslateError,
};
pub use service::{TranslationConfig, TranslationService};
