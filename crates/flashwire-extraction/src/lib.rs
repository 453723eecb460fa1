//! Resilient article-content extraction.
//!
//! Two-stage fallback chain: a direct HTTP fetch run through the HTML
//! article extractor, then a headless-browser render for pages the first
//! stage cannot read. Results from both stages are merged field-wise, the
//! body text is scrubbed by the cleaner, and known scrape-failure templates
//! collapse the content to the `error_pattern_found` sentinel.

pub mod article;
pub mod cleaner;
pub mod extractor;
pub mod headless;
pub mod stealth;
pub mod urls;

pub use article::{extract_article, ArticleData};
pub use cleaner::{clean_content, find_error_pattern, ERROR_SENTINEL};
pub use extractor::{ContentExtractor, ExtractorConfig, Scraper};
pub use headless::{HeadlessRenderer, PageRenderer, RendererConfig};
pub use stealth::random_user_agent;
pub use urls::normalize_url;
