use flashwire_types::{EnrichError, EnrichResult, FeedEntry};
use flashwire_utils::dates;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

const UNDEFINED_TABLE: &str = "42P01";

/// Date-partitioned feed table access. Tables are named
/// `feed_entries_<YYYYMMDD>`; a missing partition surfaces as
/// [`EnrichError::TableMissing`].
pub struct FeedStore {
    pool: PgPool,
}

impl FeedStore {
    pub async fn connect(db_url: &str, max_connections: u32) -> EnrichResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(db_url)
            .await
            .map_err(|e| EnrichError::storage(format!("database connect: {e}")))?;
        info!("Feed store connected");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All entries of a date partition.
    pub async fn fetch_entries(&self, date: &str) -> EnrichResult<Vec<FeedEntry>> {
        let table = dates::table_name_for_date(date)?;
        let sql = select_sql(&table, None);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error(e, &table))?;
        debug!(table = %table, rows = rows.len(), "Loaded feed entries");
        Ok(rows.iter().map(row_to_entry).collect())
    }

    /// Entries of one flashpoint within a date partition.
    pub async fn fetch_entries_by_flashpoint(
        &self,
        date: &str,
        flashpoint_id: &str,
    ) -> EnrichResult<Vec<FeedEntry>> {
        let table = dates::table_name_for_date(date)?;
        let sql = select_sql(&table, Some("flashpoint_id = $1"));
        let rows = sqlx::query(&sql)
            .bind(flashpoint_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error(e, &table))?;
        Ok(rows.iter().map(row_to_entry).collect())
    }

    /// One entry by `(id, flashpoint_id)`.
    pub async fn fetch_entry(
        &self,
        date: &str,
        flashpoint_id: &str,
        article_id: &str,
    ) -> EnrichResult<Option<FeedEntry>> {
        let table = dates::table_name_for_date(date)?;
        let sql = select_sql(&table, Some("flashpoint_id = $1 AND id = $2"));
        let row = sqlx::query(&sql)
            .bind(flashpoint_id)
            .bind(article_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, &table))?;
        Ok(row.as_ref().map(row_to_entry))
    }

    /// Write an enriched entry back, keyed on `(id, flashpoint_id)`.
    /// Re-running an article overwrites its previous enrichment.
    pub async fn upsert_enriched(&self, date: &str, entry: &FeedEntry) -> EnrichResult<()> {
        let table = dates::table_name_for_date(date)?;
        let entities = entry
            .entities
            .as_ref()
            .map(|bundle| serde_json::to_value(bundle).unwrap_or_default());
        let geo_entities = serde_json::to_value(&entry.geo_entities)
            .map_err(|e| EnrichError::storage(format!("geo serialization: {e}")))?;

        sqlx::query(&upsert_sql(&table))
            .bind(&entry.id)
            .bind(&entry.flashpoint_id)
            .bind(&entry.url)
            .bind(&entry.title)
            .bind(&entry.title_en)
            .bind(&entry.content)
            .bind(&entry.language)
            .bind(&entry.images)
            .bind(&entry.hostname)
            .bind(entities)
            .bind(geo_entities)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, &table))?;
        debug!(table = %table, id = %entry.id, "Upserted enriched entry");
        Ok(())
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Feed store connection pool closed");
    }
}

fn select_sql(table: &str, filter: Option<&str>) -> String {
    let base = format!(
        "SELECT id, flashpoint_id, url, title, title_en, content, language, \
         images, hostname, entities, geo_entities FROM {table}"
    );
    match filter {
        Some(filter) => format!("{base} WHERE {filter}"),
        None => base,
    }
}

fn upsert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {table} \
         (id, flashpoint_id, url, title, title_en, content, language, images, \
          hostname, entities, geo_entities) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (id, flashpoint_id) DO UPDATE SET \
         url = EXCLUDED.url, title = EXCLUDED.title, title_en = EXCLUDED.title_en, \
         content = EXCLUDED.content, language = EXCLUDED.language, \
         images = EXCLUDED.images, hostname = EXCLUDED.hostname, \
         entities = EXCLUDED.entities, geo_entities = EXCLUDED.geo_entities"
    )
}

fn row_to_entry(row: &PgRow) -> FeedEntry {
    let entities = row
        .try_get::<Option<serde_json::Value>, _>("entities")
        .ok()
        .flatten()
        .and_then(|value| serde_json::from_value(value).ok());
    let geo_entities = row
        .try_get::<Option<serde_json::Value>, _>("geo_entities")
        .ok()
        .flatten()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();

    FeedEntry {
        id: row.try_get("id").unwrap_or_default(),
        flashpoint_id: row.try_get("flashpoint_id").unwrap_or_default(),
        url: row.try_get("url").unwrap_or_default(),
        title: row
            .try_get::<Option<String>, _>("title")
            .ok()
            .flatten()
            .unwrap_or_default(),
        title_en: row
            .try_get::<Option<String>, _>("title_en")
            .ok()
            .flatten()
            .unwrap_or_default(),
        content: row
            .try_get::<Option<String>, _>("content")
            .ok()
            .flatten()
            .unwrap_or_default(),
        language: row
            .try_get::<Option<String>, _>("language")
            .ok()
            .flatten()
            .unwrap_or_default(),
        images: row
            .try_get::<Option<Vec<String>>, _>("images")
            .ok()
            .flatten()
            .unwrap_or_default(),
        hostname: row
            .try_get::<Option<String>, _>("hostname")
            .ok()
            .flatten()
            .unwrap_or_default(),
        entities,
        geo_entities,
        ..Default::default()
    }
}

fn map_db_error(error: sqlx::Error, table: &str) -> EnrichError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.code().as_deref() == Some(UNDEFINED_TABLE) {
            return EnrichError::table_missing(table);
        }
    }
    EnrichError::storage(format!("query against {table}: {error}"))
}
