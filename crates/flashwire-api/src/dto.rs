use serde::{Deserialize, Serialize};

/// Fire-and-forget trigger value: the upstream scheduler posts this and
/// expects an immediate acknowledgement while processing runs in
/// background.
pub const BACKGROUND_TRIGGER: &str = "masxai";

#[derive(Debug, Deserialize)]
pub struct WarmupRequest {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub date: Option<String>,
    pub trigger: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessFlashpointRequest {
    pub date: Option<String>,
    pub flashpoint_id: Option<String>,
    pub trigger: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessArticleRequest {
    pub date: Option<String>,
    pub flashpoint_id: Option<String>,
    pub article_id: Option<String>,
    pub trigger: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessBatchArticlesRequest {
    pub date: Option<String>,
    #[serde(default)]
    pub articles_ids: Vec<String>,
    pub trigger: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartedResponse {
    pub status: String,
    pub date: String,
    pub total_entries: usize,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl StartedResponse {
    pub fn for_date(date: &str, what: &str) -> Self {
        Self {
            status: "started".to_string(),
            date: date.to_string(),
            total_entries: 0,
            message: format!("{what} started in background for date {date}"),
            timestamp: chrono::Utc::now(),
        }
    }
}
