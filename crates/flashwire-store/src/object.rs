use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use flashwire_images::ImageStore;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Bucket endpoint configuration.
#[derive(Debug, Clone)]
pub struct BucketConfig {
    /// Project base URL (no trailing slash).
    pub base_url: String,
    /// Service-role key used for writes.
    pub service_key: String,
    pub bucket: String,
    /// Serve signed URLs instead of public ones.
    pub use_signed_urls: bool,
    pub signed_url_expiry_secs: u64,
}

#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// REST client for the image bucket.
pub struct BucketStorage {
    config: BucketConfig,
    client: reqwest::Client,
}

impl BucketStorage {
    pub fn new(config: BucketConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("flashwire/0.3")
            .timeout(Duration::from_secs(30))
            .build()
            .expect("storage client");
        Self { config, client }
    }

    fn storage_url(&self, suffix: &str) -> String {
        format!("{}/storage/v1/{}", self.config.base_url, suffix)
    }

    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
    }
}

#[async_trait]
impl ImageStore for BucketStorage {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let url = self.storage_url(&format!("object/list/{}", self.config.bucket));
        let response = self
            .auth(self.client.post(&url))
            .json(&json!({ "prefix": prefix, "limit": 200, "offset": 0 }))
            .send()
            .await
            .context("bucket list request")?
            .error_for_status()
            .context("bucket list status")?;
        let objects: Vec<ListedObject> = response.json().await.context("bucket list body")?;
        debug!(prefix = %prefix, objects = objects.len(), "Listed bucket objects");
        Ok(objects.into_iter().map(|o| o.name).collect())
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = self.storage_url(&format!("object/{}", self.config.bucket));
        self.auth(self.client.delete(&url))
            .json(&json!({ "prefixes": paths }))
            .send()
            .await
            .context("bucket remove request")?
            .error_for_status()
            .context("bucket remove status")?;
        Ok(())
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let url = self.storage_url(&format!("object/{}/{}", self.config.bucket, path));
        self.auth(self.client.post(&url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .header(reqwest::header::CACHE_CONTROL, "public, max-age=31536000")
            .body(bytes)
            .send()
            .await
            .context("bucket upload request")?
            .error_for_status()
            .context("bucket upload status")?;
        debug!(path = %path, "Uploaded object");
        Ok(())
    }

    async fn served_url(&self, path: &str) -> Result<String> {
        if !self.config.use_signed_urls {
            return Ok(self.storage_url(&format!(
                "object/public/{}/{}",
                self.config.bucket, path
            )));
        }

        let url = self.storage_url(&format!("object/sign/{}/{}", self.config.bucket, path));
        let response = self
            .auth(self.client.post(&url))
            .json(&json!({ "expiresIn": self.config.signed_url_expiry_secs }))
            .send()
            .await
            .context("sign request")?
            .error_for_status()
            .context("sign status")?;
        let signed: SignedUrlResponse = response.json().await.context("sign body")?;
        if signed.signed_url.is_empty() {
            return Err(anyhow!("empty signed URL for {path}"));
        }
        Ok(format!(
            "{}/storage/v1{}",
            self.config.base_url, signed.signed_url
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, headers, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn storage(server: &MockServer, signed: bool) -> BucketStorage {
        BucketStorage::new(BucketConfig {
            base_url: server.uri(),
            service_key: "service-key".to_string(),
            bucket: "flashpoint-images".to_string(),
            use_signed_urls: signed,
            signed_url_expiry_secs: 3600,
        })
    }

    #[tokio::test]
    async fn lists_objects_under_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/flashpoint-images"))
            .and(body_json(json!({
                "prefix": "2025-07-02/fp1",
                "limit": 200,
                "offset": 0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "img_0_abc.jpg"},
                {"name": "img_1_def.png"}
            ])))
            .mount(&server)
            .await;

        let names = storage(&server, false).list("2025-07-02/fp1").await.unwrap();
        assert_eq!(names, vec!["img_0_abc.jpg", "img_1_def.png"]);
    }

    #[tokio::test]
    async fn uploads_with_upsert_and_cache_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/storage/v1/object/flashpoint-images/2025-07-02/fp1/img_0_abc.jpg",
            ))
            .and(header("x-upsert", "true"))
            .and(headers("cache-control", vec!["public", "max-age=31536000"]))
            .and(header("content-type", "image/jpeg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "ok"})))
            .mount(&server)
            .await;

        storage(&server, false)
            .upload("2025-07-02/fp1/img_0_abc.jpg", vec![1, 2, 3], "image/jpeg")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn public_url_is_derived_without_a_request() {
        let server = MockServer::start().await;
        let url = storage(&server, false)
            .served_url("2025-07-02/fp1/img_0_abc.jpg")
            .await
            .unwrap();
        assert_eq!(
            url,
            format!(
                "{}/storage/v1/object/public/flashpoint-images/2025-07-02/fp1/img_0_abc.jpg",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn signed_url_round_trips_through_sign_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/storage/v1/object/sign/flashpoint-images/2025-07-02/fp1/img_0_abc.jpg",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "signedURL": "/object/sign/flashpoint-images/2025-07-02/fp1/img_0_abc.jpg?token=tkn"
            })))
            .mount(&server)
            .await;

        let url = storage(&server, true)
            .served_url("2025-07-02/fp1/img_0_abc.jpg")
            .await
            .unwrap();
        assert!(url.contains("token=tkn"));
        assert!(url.starts_with(&server.uri()));
    }

    #[tokio::test]
    async fn removing_nothing_is_a_no_op() {
        let server = MockServer::start().await;
        storage(&server, false).remove(&[]).await.unwrap();
    }
}
