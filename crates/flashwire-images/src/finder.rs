use crate::regions;
use crate::search::{ImageHit, ImageSearch};
use flashwire_proxy::ProxyPool;
use flashwire_types::{EntityBundle, EntityLabel, ExtractResult};
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Quality filters and collection limits.
#[derive(Debug, Clone)]
pub struct FinderConfig {
    pub enabled: bool,
    pub max_images: usize,
    pub min_dimension: u32,
    pub max_dimension: u32,
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// Entity score floor for query generation.
    pub query_score_floor: f64,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_images: 5,
            min_dimension: 500,
            max_dimension: 4000,
            min_aspect: 0.5,
            max_aspect: 3.0,
            query_score_floor: 0.85,
        }
    }
}

/// Finds candidate image URLs for an article via query expansion across
/// region/language locales.
pub struct ImageFinder {
    config: FinderConfig,
    backend: Arc<dyn ImageSearch>,
    proxies: Arc<dyn ProxyPool>,
}

impl ImageFinder {
    /// Entity buckets mined for search terms.
    const QUERY_LABELS: [EntityLabel; 7] = [
        EntityLabel::Person,
        EntityLabel::Org,
        EntityLabel::Gpe,
        EntityLabel::Loc,
        EntityLabel::Event,
        EntityLabel::Law,
        EntityLabel::Norp,
    ];

    pub fn new(
        config: FinderConfig,
        backend: Arc<dyn ImageSearch>,
        proxies: Arc<dyn ProxyPool>,
    ) -> Self {
        Self {
            config,
            backend,
            proxies,
        }
    }

    /// Up to `max_images` unique candidate URLs; empty on total failure.
    pub async fn find(&self, article: &ExtractResult) -> Vec<String> {
        if !self.config.enabled {
            return Vec::new();
        }

        let country = article
            .geo_entities
            .first()
            .map(|geo| geo.alpha2.as_str());
        let locales = regions::search_regions(&article.language, country);
        let proxies = self.proxies.snapshot().await;

        let mut collected: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        'locales: for locale in &locales {
            if collected.len() >= self.config.max_images {
                break;
            }

            if !article.title.is_empty() {
                self.search_into(&article.title, locale, &proxies, &mut collected, &mut seen)
                    .await;
                if collected.len() >= self.config.max_images {
                    break 'locales;
                }
            }

            // Still short after the native title: try the English title too.
            if !article.title_en.is_empty() && article.title_en != article.title {
                self.search_into(&article.title_en, locale, &proxies, &mut collected, &mut seen)
                    .await;
                if collected.len() >= self.config.max_images {
                    break 'locales;
                }
            }
        }

        debug!(images = collected.len(), locales = locales.len(), "Image search complete");
        collected
    }

    async fn search_into(
        &self,
        query: &str,
        locale: &str,
        proxies: &[String],
        collected: &mut Vec<String>,
        seen: &mut HashSet<String>,
    ) {
        let proxy = proxies
            .choose(&mut rand::thread_rng())
            .map(String::as_str);
        match self.backend.search(query, locale, proxy).await {
            Ok(hits) => {
                for hit in hits {
                    if !self.passes_quality(&hit) {
                        continue;
                    }
                    if seen.insert(hit.url.clone()) {
                        collected.push(hit.url);
                    }
                    if collected.len() >= self.config.max_images {
                        return;
                    }
                }
            }
            Err(err) => {
                warn!(locale = %locale, query = %query, error = %err, "Image search failed");
            }
        }
    }

    /// Individual entity terms plus joined combinations, capped at five.
    pub fn build_queries(&self, bundle: &EntityBundle) -> Vec<String> {
        let mut terms: Vec<(String, f64)> = Vec::new();
        for label in Self::QUERY_LABELS {
            for mention in bundle.bucket(label) {
                let length = mention.text.chars().count();
                if mention.score >= self.config.query_score_floor && (3..=40).contains(&length) {
                    terms.push((mention.text.clone(), mention.score));
                }
            }
        }
        terms.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut unique: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for (text, _) in terms {
            if seen.insert(text.to_lowercase()) {
                unique.push(text);
            }
        }
        unique.truncate(3);

        let mut queries = unique.clone();
        if unique.len() >= 2 {
            queries.push(unique[..2].join(" "));
        }
        if unique.len() >= 3 {
            queries.push(unique[..3].join(" "));
        }
        queries.truncate(5);
        queries
    }

    fn passes_quality(&self, hit: &ImageHit) -> bool {
        if !hit.url.starts_with("http://") && !hit.url.starts_with("https://") {
            return false;
        }
        let (w, h) = (hit.width, hit.height);
        if w < self.config.min_dimension || h < self.config.min_dimension {
            return false;
        }
        if w > self.config.max_dimension || h > self.config.max_dimension {
            return false;
        }
        let aspect = if h > 0 { w as f64 / h as f64 } else { 0.0 };
        (self.config.min_aspect..=self.config.max_aspect).contains(&aspect)
    }
}
