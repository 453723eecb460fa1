use anyhow::Result;
use async_trait::async_trait;

/// Object-bucket operations the downloader needs. The storage adapter
/// implements this against the real bucket; tests use an in-memory fake.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Object names directly under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Remove the given object paths.
    async fn remove(&self, paths: &[String]) -> Result<()>;

    /// Upload with upsert semantics and a long-lived cache-control header.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Public or signed URL for a stored object.
    async fn served_url(&self, path: &str) -> Result<String>;
}
