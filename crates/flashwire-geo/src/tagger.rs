use crate::alias::{self, FEATURE_SOVEREIGN};
use flashwire_types::{EntityMention, GeoEntity};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Ranking thresholds.
#[derive(Debug, Clone)]
pub struct GeotaggerConfig {
    pub enabled: bool,
    /// Body text is scanned in chunks of at most this many characters.
    pub chunk_chars: usize,
    /// Minimum alias hits for a candidate to survive.
    pub min_count: u32,
    /// Minimum best score for a candidate to survive.
    pub min_score: f64,
    /// Result list cap.
    pub max_results: usize,
    /// NER confidence floor for LOC validation.
    pub loc_confidence: f64,
}

impl Default for GeotaggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chunk_chars: 20_000,
            min_count: 2,
            min_score: 0.6,
            max_results: 4,
            loc_confidence: 0.80,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Candidate {
    count: u32,
    score: f64,
}

/// Resolves article text plus LOC entities to ranked sovereign countries.
pub struct Geotagger {
    config: GeotaggerConfig,
}

impl Geotagger {
    pub fn new(config: GeotaggerConfig) -> Self {
        Self { config }
    }

    /// Rank the countries an article is about. Fails soft to an empty list.
    pub fn extract(
        &self,
        title: &str,
        content: &str,
        locations: &[EntityMention],
    ) -> Vec<GeoEntity> {
        if !self.config.enabled || (title.is_empty() && content.is_empty()) {
            return Vec::new();
        }

        // 1. Accumulate alias hits over the body, chunk by chunk.
        let mut candidates: HashMap<String, Candidate> = HashMap::new();
        for chunk in chunk_lines(content, self.config.chunk_chars) {
            for tag in alias::tag_text_countries(chunk) {
                let entry = candidates.entry(tag.alpha2.to_string()).or_default();
                entry.count += 1;
                entry.score = entry.score.max(tag.score);
            }
        }

        // 2. Title hits merge in with a score floor of 1.0; a title mention
        // is highly salient.
        for tag in alias::tag_text_countries(title) {
            let entry = candidates.entry(tag.alpha2.to_string()).or_default();
            entry.count += 1;
            entry.score = entry.score.max(tag.score).max(1.0);
        }

        // 3. Drop sparse or weak candidates.
        candidates.retain(|_, candidate| {
            candidate.count >= self.config.min_count && candidate.score >= self.config.min_score
        });

        // 4. Validate confident LOC entities into a set of alpha2 codes.
        let validated = self.validate_locations(locations);

        // 5. Advisory intersection: apply only when it keeps something.
        if !validated.is_empty() {
            let intersects = candidates.keys().any(|alpha2| validated.contains(alpha2));
            if intersects {
                candidates.retain(|alpha2, _| validated.contains(alpha2));
            } else {
                debug!("LOC validation disjoint from candidates, keeping all");
            }
        }

        // 6. Rank and cap.
        let mut ranked: Vec<(String, Candidate)> = candidates.into_iter().collect();
        ranked.sort_by(|(a2_a, a), (a2_b, b)| {
            b.count
                .cmp(&a.count)
                .then_with(|| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a2_a.cmp(a2_b))
        });
        ranked.truncate(self.config.max_results);

        // 7. Enrich from the ISO-3166 table.
        ranked
            .into_iter()
            .filter_map(|(alpha2, candidate)| {
                let country = isocountry::CountryCode::for_alpha2(&alpha2).ok()?;
                Some(GeoEntity {
                    name: country.name().to_string(),
                    alpha2,
                    alpha3: country.alpha3().to_string(),
                    count: candidate.count,
                    avg_score: candidate.score,
                })
            })
            .collect()
    }

    /// Resolve confident LOC entities to sovereign alpha2 codes, both by
    /// exact place lookup and by substring scan.
    fn validate_locations(&self, locations: &[EntityMention]) -> HashSet<String> {
        let mut validated = HashSet::new();
        for location in locations {
            if location.score < self.config.loc_confidence {
                continue;
            }
            if let Some(tag) = alias::tag_place(&location.text) {
                if tag.feature_code == FEATURE_SOVEREIGN && !tag.alpha2.is_empty() {
                    validated.insert(tag.alpha2.to_string());
                    continue;
                }
            }
            for tag in alias::tag_text_countries(&location.text) {
                validated.insert(tag.alpha2.to_string());
            }
        }
        validated
    }
}

fn chunk_lines(text: &str, chunk_chars: usize) -> Vec<&str> {
    if text.len() <= chunk_chars {
        return vec![text];
    }
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut end = 0usize;
    for line in text.split_inclusive('\n') {
        let line_start = end;
        end += line.len();
        if end - start > chunk_chars && line_start > start {
            chunks.push(&text[start..line_start]);
            start = line_start;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}
