//! Language-agnostic article extraction over raw HTML.
//!
//! Pulls the body text out of the page's content landmark (falling back to
//! paragraph density) and the metadata out of OpenGraph / standard meta
//! tags.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static LANDMARKS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article", "main", "[role=main]", ".article", ".article-body"]
        .iter()
        .map(|s| Selector::parse(s).expect("valid selector"))
        .collect()
});
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("valid selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid selector"));
static HTML_TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("html").expect("valid selector"));
static TIME_TAG: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time[datetime]").expect("valid selector"));

/// What the extractor could read from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleData {
    pub title: String,
    pub author: String,
    pub published_date: String,
    pub main_image: String,
    pub text: String,
    pub language_hint: String,
    pub hostname: String,
    pub sitename: String,
}

/// Extract article text and metadata from `html` fetched at `url`.
pub fn extract_article(html: &str, url: &str) -> ArticleData {
    let document = Html::parse_document(html);

    ArticleData {
        title: meta_content(&document, &["og:title", "twitter:title"])
            .or_else(|| text_of_first(&document, &TITLE))
            .unwrap_or_default(),
        author: meta_named(&document, &["author", "article:author", "parsely-author"])
            .unwrap_or_default(),
        published_date: meta_content(&document, &["article:published_time", "og:updated_time"])
            .or_else(|| meta_named(&document, &["date", "publish-date", "parsely-pub-date"]))
            .or_else(|| datetime_attr(&document))
            .unwrap_or_default(),
        main_image: meta_content(&document, &["og:image", "twitter:image"]).unwrap_or_default(),
        text: body_text(&document),
        language_hint: html_lang(&document).unwrap_or_default(),
        hostname: Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default(),
        sitename: meta_content(&document, &["og:site_name"]).unwrap_or_default(),
    }
}

fn body_text(document: &Html) -> String {
    for landmark in LANDMARKS.iter() {
        if let Some(root) = document.select(landmark).next() {
            let text = paragraphs_of(root);
            if !text.is_empty() {
                return text;
            }
        }
    }

    // No landmark: fall back to document-wide paragraph density.
    let paragraphs: Vec<String> = document
        .select(&PARAGRAPH)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect();
    paragraphs.join("\n")
}

fn paragraphs_of(root: ElementRef) -> String {
    let paragraphs: Vec<String> = root
        .select(&PARAGRAPH)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        element_text(root)
    } else {
        paragraphs.join("\n")
    }
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<Vec<_>>().join(" ").trim().to_string()
}

fn meta_content(document: &Html, properties: &[&str]) -> Option<String> {
    for property in properties {
        let selector = Selector::parse(&format!(r#"meta[property="{property}"]"#)).ok()?;
        if let Some(content) = first_meta(document, &selector) {
            return Some(content);
        }
        // Some sites emit OpenGraph keys in `name` instead of `property`.
        let selector = Selector::parse(&format!(r#"meta[name="{property}"]"#)).ok()?;
        if let Some(content) = first_meta(document, &selector) {
            return Some(content);
        }
    }
    None
}

fn meta_named(document: &Html, names: &[&str]) -> Option<String> {
    for name in names {
        let selector = Selector::parse(&format!(r#"meta[name="{name}"]"#)).ok()?;
        if let Some(content) = first_meta(document, &selector) {
            return Some(content);
        }
    }
    None
}

fn first_meta(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .find(|c| !c.is_empty())
}

fn datetime_attr(document: &Html) -> Option<String> {
    document
        .select(&TIME_TAG)
        .filter_map(|el| el.value().attr("datetime"))
        .map(|c| c.trim().to_string())
        .find(|c| !c.is_empty())
}

fn text_of_first(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(element_text)
        .find(|t| !t.is_empty())
}

fn html_lang(document: &Html) -> Option<String> {
    document
        .select(&HTML_TAG)
        .filter_map(|el| el.value().attr("lang"))
        .map(|lang| {
            lang.split('-')
                .next()
                .unwrap_or(lang)
                .to_lowercase()
        })
        .next()
}
