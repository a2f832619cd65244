use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored short URL. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlEntry {
    pub shortcode: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl UrlEntry {
    /// Expiry is a computed predicate checked at read time; nothing sweeps
    /// expired entries out of the store.
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// One redirect traversal of a short URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    pub referrer: String,
    pub country: String,
}

/// A single shortening request as accepted by `POST /api/shorten`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    pub url: String,
    #[serde(default)]
    pub shortcode: Option<String>,
    #[serde(default)]
    pub validity_minutes: Option<i64>,
}

/// A UrlEntry joined with its click history, as returned by `GET /api/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct UrlStats {
    #[serde(flatten)]
    pub entry: UrlEntry,
    pub clicks: Vec<ClickEvent>,
}
