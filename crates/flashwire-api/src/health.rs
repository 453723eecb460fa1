use crate::state::AppState;
use serde_json::{json, Value};
use std::time::Duration;

fn component(status: &str, details: &str) -> Value {
    json!({ "status": status, "details": details })
}

fn toggled(enabled: bool) -> Value {
    if enabled {
        component("healthy", "Available")
    } else {
        component("disabled", "Disabled")
    }
}

/// Component-by-component health map, including an outbound egress probe.
pub async fn health_report(state: &AppState) -> Value {
    let database_healthy = state.processor().health_check().await;
    let egress_ok = probe_egress(state.egress_probe_url()).await;

    let mut overall = "healthy";
    if !database_healthy {
        overall = "unhealthy";
    }

    let components = json!({
        "thread_pool": component("healthy", "Available"),
        "database": if database_healthy {
            component("healthy", "Connected successfully")
        } else {
            component("unhealthy", "Connection failed")
        },
        "scraper": component("healthy", "Available"),
        "text_cleaner": toggled(state.features().clean_text),
        "geotagger": toggled(state.features().geotagging),
        "image_finder": toggled(state.features().image_search),
    });

    json!({
        "overall": overall,
        "components": components,
        "outbound_ping": if egress_ok { "ok" } else { "failed" },
        "timestamp": chrono::Utc::now(),
    })
}

/// Best-effort GET against a known external endpoint to certify egress.
async fn probe_egress(url: &str) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
    {
        Ok(client) => client,
        Err(_) => return false,
    };
    client.get(url).send().await.is_ok()
}
