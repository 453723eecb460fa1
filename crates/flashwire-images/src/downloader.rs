use crate::store::ImageStore;
use anyhow::{anyhow, Result};
use flashwire_types::ExtractResult;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

/// Known image extensions; used for URL cleanup and filename derivation.
static IMAGE_EXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(?:jpg|jpeg|png|gif|webp|avif|svg|bmp|tiff?|ico|heic|heif)\b")
        .expect("regex")
});

const KNOWN_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".avif", ".svg", ".bmp", ".tiff", ".tif", ".ico",
    ".heic", ".heif",
];

/// Downloader limits.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub enabled: bool,
    /// Reject bodies larger than this (checked against Content-Length and
    /// again against the downloaded bytes).
    pub max_bytes: u64,
    pub max_concurrency: usize,
    pub head_timeout: Duration,
    pub get_timeout: Duration,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_bytes: 5 * 1024 * 1024,
            max_concurrency: 4,
            head_timeout: Duration::from_secs(5),
            get_timeout: Duration::from_secs(15),
        }
    }
}

/// Truncate CMS-style suffixes after the first known image extension and
/// drop query/fragment noise:
/// `https://x.y/a.jpg/@@images/b.png` → `https://x.y/a.jpg`.
pub fn clean_image_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let mut path = parsed.path().to_string();
    if let Some(found) = IMAGE_EXT.find(&path) {
        path.truncate(found.end());
    }

    let host = parsed.host_str()?;
    let mut cleaned = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        cleaned.push_str(&format!(":{port}"));
    }
    cleaned.push_str(&path);
    Some(cleaned)
}

/// Materializes candidate image URLs into the bucket under
/// `<date>/<flashpoint_id>/`, rewriting `ExtractResult.images` to the
/// served URLs. Failed candidates are dropped.
pub struct ImageDownloader {
    config: DownloaderConfig,
    store: Arc<dyn ImageStore>,
    client: reqwest::Client,
}

impl ImageDownloader {
    pub fn new(config: DownloaderConfig, store: Arc<dyn ImageStore>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("flashwire/0.3")
            .timeout(config.get_timeout)
            .build()
            .expect("downloader client");
        Self {
            config,
            store,
            client,
        }
    }

    /// Download and persist the article's candidate images.
    pub async fn download(
        &self,
        date: &str,
        flashpoint_id: &str,
        mut article: ExtractResult,
    ) -> ExtractResult {
        if !self.config.enabled {
            debug!("Image download disabled, skipping");
            return article;
        }

        let candidates: Vec<String> = article
            .images
            .iter()
            .filter_map(|raw| clean_image_url(raw))
            .collect();
        if candidates.is_empty() {
            debug!("No downloadable image candidates");
            article.images = Vec::new();
            return article;
        }

        let prefix = format!("{}/{}", date, flashpoint_id.trim());
        self.clear_prefix(&prefix).await;

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let tasks = candidates.iter().enumerate().map(|(index, url)| {
            let semaphore = Arc::clone(&semaphore);
            let bucket_path = format!(
                "{}/{}",
                prefix,
                self.build_filename(index, &article.id, url)
            );
            async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                match self.process_one(url, &bucket_path).await {
                    Ok(served) => Some(served),
                    Err(err) => {
                        warn!(url = %url, error = %err, "Image processing failed");
                        None
                    }
                }
            }
        });

        // Results come back parallel to the inputs; failures drop the URL.
        let served: Vec<String> = join_all(tasks).await.into_iter().flatten().collect();
        info!(
            uploaded = served.len(),
            candidates = candidates.len(),
            prefix = %prefix,
            "Image download complete"
        );
        article.images = served;
        article
    }

    /// Latest-wins per flashpoint per date: drop whatever is already there.
    /// Not serialized against concurrent flashpoint runs; failing to clear
    /// is logged, not fatal.
    async fn clear_prefix(&self, prefix: &str) {
        match self.store.list(prefix).await {
            Ok(existing) if !existing.is_empty() => {
                let paths: Vec<String> = existing
                    .into_iter()
                    .map(|name| format!("{prefix}/{name}"))
                    .collect();
                match self.store.remove(&paths).await {
                    Ok(()) => info!(cleared = paths.len(), prefix = %prefix, "Cleared existing objects"),
                    Err(err) => warn!(prefix = %prefix, error = %err, "Could not clear existing objects"),
                }
            }
            Ok(_) => {}
            Err(err) => warn!(prefix = %prefix, error = %err, "Could not list existing objects"),
        }
    }

    async fn process_one(&self, url: &str, bucket_path: &str) -> Result<String> {
        let (probe_mime, probe_length) = self.head_probe(url).await;
        if let Some(length) = probe_length {
            if length > self.config.max_bytes {
                return Err(anyhow!(
                    "content-length {length} over cap {}",
                    self.config.max_bytes
                ));
            }
        }

        let response = self.client.get(url).send().await?.error_for_status()?;
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or(probe_mime)
            .or_else(|| guess_mime(url))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let bytes = response.bytes().await?;
        if bytes.len() as u64 > self.config.max_bytes {
            return Err(anyhow!("downloaded {} bytes over cap", bytes.len()));
        }

        if !mime.to_lowercase().contains("image") {
            return Err(anyhow!("not an image MIME: {mime}"));
        }
        // Magic-byte check: the declared MIME alone is not trusted.
        let head = &bytes[..bytes.len().min(32)];
        if !infer::is_image(head) {
            return Err(anyhow!("invalid image magic header"));
        }

        self.store
            .upload(bucket_path, bytes.to_vec(), &mime)
            .await?;
        self.store.served_url(bucket_path).await
    }

    /// HEAD first, then GET with a zero range, then full GET, to learn the
    /// content type and length from servers with varying support.
    async fn head_probe(&self, url: &str) -> (Option<String>, Option<u64>) {
        let read_headers = |response: &reqwest::Response| {
            let mime = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let length = response
                .headers()
                .get(reqwest::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            (mime, length)
        };

        if let Ok(response) = self
            .client
            .head(url)
            .timeout(self.config.head_timeout)
            .send()
            .await
        {
            if response.status().is_success() || response.status().is_redirection() {
                return read_headers(&response);
            }
        }

        if let Ok(response) = self
            .client
            .get(url)
            .header(reqwest::header::RANGE, "bytes=0-0")
            .timeout(self.config.head_timeout)
            .send()
            .await
        {
            let status = response.status().as_u16();
            if status == 200 || status == 206 {
                return read_headers(&response);
            }
        }

        if let Ok(response) = self.client.get(url).send().await {
            if response.status().is_success() {
                return read_headers(&response);
            }
        }

        (None, None)
    }

    /// Deterministic filename: `img_<index>_<safe_id><short_hash>.<ext>`.
    fn build_filename(&self, index: usize, extract_id: &str, url: &str) -> String {
        let mut safe_id: String = extract_id
            .chars()
            .filter(|c| c.is_alphanumeric())
            .take(32)
            .collect();
        if safe_id.is_empty() {
            safe_id.push('x');
        }
        let digest = Sha256::digest(url.as_bytes());
        let short_hash = &hex::encode(digest)[..8];
        format!("img_{index}_{safe_id}{short_hash}{}", guess_ext(url))
    }
}

fn guess_ext(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_default();
    let lowered = path.to_lowercase();
    for ext in KNOWN_EXTENSIONS {
        if lowered.ends_with(ext) {
            return normalize_ext(ext);
        }
    }
    // Fall back to the MIME guess from the URL.
    match guess_mime(url).as_deref() {
        Some("image/png") => ".png".to_string(),
        Some("image/gif") => ".gif".to_string(),
        Some("image/webp") => ".webp".to_string(),
        Some("image/svg+xml") => ".svg".to_string(),
        Some("image/bmp") => ".bmp".to_string(),
        Some("image/tiff") => ".tiff".to_string(),
        _ => ".jpg".to_string(),
    }
}

fn normalize_ext(ext: &str) -> String {
    match ext {
        ".jpe" => ".jpg".to_string(),
        other => other.to_string(),
    }
}

fn guess_mime(url: &str) -> Option<String> {
    let path = Url::parse(url).ok()?.path().to_string();
    mime_guess::from_path(&path)
        .first()
        .map(|m| m.essence_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path as wm_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Minimal valid PNG header followed by filler.
    fn png_bytes(total: usize) -> Vec<u8> {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.resize(total.max(8), 0);
        bytes
    }

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    }

    #[async_trait]
    impl ImageStore for MemoryStore {
        async fn list(&self, prefix: &str) -> Result<Vec<String>> {
            let objects = self.objects.lock().unwrap();
            Ok(objects
                .keys()
                .filter_map(|key| {
                    key.strip_prefix(&format!("{prefix}/"))
                        .map(str::to_string)
                })
                .collect())
        }

        async fn remove(&self, paths: &[String]) -> Result<()> {
            let mut objects = self.objects.lock().unwrap();
            for path in paths {
                objects.remove(path);
            }
            Ok(())
        }

        async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
            self.objects
                .lock()
                .unwrap()
                .insert(path.to_string(), (bytes, content_type.to_string()));
            Ok(())
        }

        async fn served_url(&self, path: &str) -> Result<String> {
            Ok(format!("https://bucket.example.com/{path}"))
        }
    }

    fn article_with(images: Vec<&str>) -> ExtractResult {
        ExtractResult {
            id: "a1".to_string(),
            parent_id: "fp1".to_string(),
            images: images.into_iter().map(str::to_string).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn clean_image_url_truncates_cms_suffixes() {
        assert_eq!(
            clean_image_url("https://x.y/a.jpg/@@images/b.png").as_deref(),
            Some("https://x.y/a.jpg")
        );
        assert_eq!(
            clean_image_url("https://x.y/photos/a.webp?w=300#frag").as_deref(),
            Some("https://x.y/photos/a.webp")
        );
        assert_eq!(
            clean_image_url("https://x.y/plain/path").as_deref(),
            Some("https://x.y/plain/path")
        );
    }

    #[test]
    fn clean_image_url_rejects_non_http_schemes() {
        assert!(clean_image_url("ftp://x.y/a.jpg").is_none());
        assert!(clean_image_url("data:image/png;base64,xyz").is_none());
        assert!(clean_image_url("not a url").is_none());
    }

    #[test]
    fn filenames_are_deterministic_and_safe() {
        let downloader =
            ImageDownloader::new(DownloaderConfig::default(), Arc::new(MemoryStore::default()));
        let one = downloader.build_filename(0, "art-1/../x", "https://x.y/a.jpg");
        let two = downloader.build_filename(0, "art-1/../x", "https://x.y/a.jpg");
        assert_eq!(one, two);
        assert!(one.starts_with("img_0_art1x"));
        assert!(one.ends_with(".jpg"));
        assert!(!one.contains('/'));

        let other = downloader.build_filename(0, "art-1/../x", "https://x.y/b.jpg");
        assert_ne!(one, other);
    }

    #[tokio::test]
    async fn downloads_validate_and_serve() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(wm_path("/a.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .insert_header("content-length", "2048"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(wm_path("/a.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(png_bytes(2048)),
            )
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::default());
        let downloader = ImageDownloader::new(DownloaderConfig::default(), store.clone());
        let article = article_with(vec![&format!("{}/a.png", server.uri())]);
        let result = downloader.download("2025-07-02", "fp1", article).await;

        assert_eq!(result.images.len(), 1);
        assert!(result.images[0].starts_with("https://bucket.example.com/2025-07-02/fp1/img_0_"));

        let objects = store.objects.lock().unwrap();
        assert_eq!(objects.len(), 1);
        let (bytes, mime) = objects.values().next().unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes.len(), 2048);
    }

    #[tokio::test]
    async fn oversized_content_length_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(wm_path("/big.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .insert_header("content-length", "6291456"),
            )
            .mount(&server)
            .await;

        let downloader = ImageDownloader::new(
            DownloaderConfig::default(),
            Arc::new(MemoryStore::default()),
        );
        let article = article_with(vec![&format!("{}/big.png", server.uri())]);
        let result = downloader.download("2025-07-02", "fp1", article).await;
        assert!(result.images.is_empty());
    }

    #[tokio::test]
    async fn bad_magic_bytes_are_rejected_even_with_image_mime() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(wm_path("/fake.png"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(wm_path("/fake.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_string("<html>not an image</html>"),
            )
            .mount(&server)
            .await;

        let downloader = ImageDownloader::new(
            DownloaderConfig::default(),
            Arc::new(MemoryStore::default()),
        );
        let article = article_with(vec![&format!("{}/fake.png", server.uri())]);
        let result = downloader.download("2025-07-02", "fp1", article).await;
        assert!(result.images.is_empty());
    }

    #[tokio::test]
    async fn existing_objects_are_cleared_before_upload() {
        let store = Arc::new(MemoryStore::default());
        store
            .upload("2025-07-02/fp1/stale.jpg", vec![1, 2, 3], "image/jpeg")
            .await
            .unwrap();

        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(wm_path("/a.png"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(wm_path("/a.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(png_bytes(512)),
            )
            .mount(&server)
            .await;

        let downloader = ImageDownloader::new(DownloaderConfig::default(), store.clone());
        let article = article_with(vec![&format!("{}/a.png", server.uri())]);
        let _ = downloader.download("2025-07-02", "fp1", article).await;

        let objects = store.objects.lock().unwrap();
        assert!(!objects.contains_key("2025-07-02/fp1/stale.jpg"));
        assert_eq!(objects.len(), 1);
    }

    #[tokio::test]
    async fn disabled_downloader_passes_through() {
        let downloader = ImageDownloader::new(
            DownloaderConfig {
                enabled: false,
                ..Default::default()
            },
            Arc::new(MemoryStore::default()),
        );
        let article = article_with(vec!["https://x.y/a.jpg"]);
        let result = downloader.download("2025-07-02", "fp1", article).await;
        assert_eq!(result.images, vec!["https://x.y/a.jpg"]);
    }
}
