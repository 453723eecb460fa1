use crate::recognizer::EntityRecognizer;
use crate::regex_layer;
use flashwire_types::{BundleMeta, EntityBundle, EntityLabel, EntityMention};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Chunking and feature configuration.
#[derive(Debug, Clone)]
pub struct TaggerConfig {
    /// Maximum characters per recognizer call; lines are never broken.
    pub chunk_chars: usize,
    pub enabled: bool,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            chunk_chars: 20_000,
            enabled: true,
        }
    }
}

/// Chunked entity extraction with regex augmentation. Never raises.
pub struct EntityTagger {
    recognizer: Arc<dyn EntityRecognizer>,
    chunk_chars: usize,
    enabled: bool,
}

impl EntityTagger {
    pub fn new(config: TaggerConfig, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            recognizer,
            chunk_chars: config.chunk_chars.max(5_000),
            enabled: config.enabled,
        }
    }

    /// Extract all entity buckets from `text`.
    pub async fn extract(&self, text: &str) -> EntityBundle {
        let model = self.recognizer.model_id().to_string();
        if !self.enabled || text.is_empty() {
            return EntityBundle::empty(text.len(), model);
        }

        let mut raw: Vec<(EntityLabel, String, f64)> = Vec::new();
        let mut chunks_processed = 0usize;

        // The model is CPU-bound on the other side; chunks go sequentially.
        for chunk in iter_chunks(text, self.chunk_chars) {
            chunks_processed += 1;
            match self.recognizer.extract(chunk).await {
                Ok(spans) => {
                    for span in spans {
                        let label = match remap_label(&span.label) {
                            Some(label) => label,
                            None => continue,
                        };
                        raw.push((label, span.text, span.score));
                    }
                }
                Err(err) => {
                    // A failed chunk never cancels its siblings.
                    warn!(chunk = chunks_processed, error = %err, "NER failed on chunk");
                }
            }
        }

        raw.extend(regex_layer::extract_extras(text));

        let bundle = aggregate(raw, chunks_processed, text.len(), model);
        debug!(
            chunks = bundle.meta.chunks,
            mentions = bundle.len(),
            "Entity extraction complete"
        );
        bundle
    }
}

fn remap_label(raw: &str) -> Option<EntityLabel> {
    match raw {
        "PER" | "PERSON" => Some(EntityLabel::Person),
        "ORG" => Some(EntityLabel::Org),
        "LOC" => Some(EntityLabel::Loc),
        _ => None,
    }
}

/// Split on line boundaries into chunks of at most `chunk_chars`; a single
/// oversized line becomes its own chunk.
fn iter_chunks(text: &str, chunk_chars: usize) -> Vec<&str> {
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

/// Merge mentions case-insensitively per bucket, keeping the max score and
/// the first-seen title-cased display form; sort by `(-score, text)`.
fn aggregate(
    raw: Vec<(EntityLabel, String, f64)>,
    chunks: usize,
    chars: usize,
    model: String,
) -> EntityBundle {
    let mut buckets: HashMap<EntityLabel, HashMap<String, (String, f64)>> = HashMap::new();

    for (label, text, score) in raw {
        let merge_key = text.trim().to_lowercase();
        if merge_key.is_empty() {
            continue;
        }
        let canonical = title_case(text.trim());
        let entry = buckets
            .entry(label)
            .or_default()
            .entry(merge_key)
            .or_insert((canonical, 0.0));
        entry.1 = entry.1.max(score);
    }

    let mut bundle = EntityBundle::default();
    let mut all_scores = Vec::new();

    for label in EntityLabel::ALL {
        if let Some(merged) = buckets.remove(&label) {
            let mut mentions: Vec<EntityMention> = merged
                .into_values()
                .map(|(text, score)| EntityMention::new(text, round4(score)))
                .collect();
            mentions.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.text.to_lowercase().cmp(&b.text.to_lowercase()))
            });
            all_scores.extend(mentions.iter().map(|m| m.score));
            *bundle.bucket_mut(label) = mentions;
        }
    }

    let score = if all_scores.is_empty() {
        0.0
    } else {
        round4(all_scores.iter().sum::<f64>() / all_scores.len() as f64)
    };

    bundle.meta = BundleMeta {
        chunks,
        chars,
        model,
        score,
    };
    bundle
}

/// Capitalize the first letter of each word, leaving the rest untouched
/// (so acronyms like `COP30` survive).
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
