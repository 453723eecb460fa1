use async_trait::async_trait;
use flashwire_store::FeedStore;
use flashwire_types::{EnrichResult, FeedEntry};

/// Feed-table access the processor depends on. The Postgres store adapter
/// implements it; tests use an in-memory fake.
#[async_trait]
pub trait FeedRepository: Send + Sync {
    async fn fetch_entries(&self, date: &str) -> EnrichResult<Vec<FeedEntry>>;

    async fn fetch_entries_by_flashpoint(
        &self,
        date: &str,
        flashpoint_id: &str,
    ) -> EnrichResult<Vec<FeedEntry>>;

    async fn fetch_entry(
        &self,
        date: &str,
        flashpoint_id: &str,
        article_id: &str,
    ) -> EnrichResult<Option<FeedEntry>>;

    async fn upsert_enriched(&self, date: &str, entry: &FeedEntry) -> EnrichResult<()>;

    async fn health_check(&self) -> bool;
}

#[async_trait]
impl FeedRepository for FeedStore {
    async fn fetch_entries(&self, date: &str) -> EnrichResult<Vec<FeedEntry>> {
        FeedStore::fetch_entries(self, date).await
    }

    async fn fetch_entries_by_flashpoint(
        &self,
        date: &str,
        flashpoint_id: &str,
    ) -> EnrichResult<Vec<FeedEntry>> {
        FeedStore::fetch_entries_by_flashpoint(self, date, flashpoint_id).await
    }

    async fn fetch_entry(
        &self,
        date: &str,
        flashpoint_id: &str,
        article_id: &str,
    ) -> EnrichResult<Option<FeedEntry>> {
        FeedStore::fetch_entry(self, date, flashpoint_id, article_id).await
    }

    async fn upsert_enriched(&self, date: &str, entry: &FeedEntry) -> EnrichResult<()> {
        FeedStore::upsert_enriched(self, date, entry).await
    }

    async fn health_check(&self) -> bool {
        FeedStore::health_check(self).await
    }
}
