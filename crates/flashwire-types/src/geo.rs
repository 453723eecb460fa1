use serde::{Deserialize, Serialize};

/// A country resolved from article text.
///
/// `count` is the number of alias hits across the scanned text, `avg_score`
/// the best confidence observed for the country (title mentions raise it to
/// at least 1.0). Uniqueness within a result list is by `alpha2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoEntity {
    pub name: String,
    pub alpha2: String,
    pub alpha3: String,
    pub count: u32,
    pub avg_score: f64,
}
