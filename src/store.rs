use crate::models::{ClickEvent, UrlEntry};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

#[derive(Default)]
struct StoreInner {
    urls: HashMap<String, UrlEntry>,
    /// Insertion order of shortcodes, so enumeration is deterministic.
    order: Vec<String>,
    clicks: HashMap<String, Vec<ClickEvent>>,
}

/// In-memory store mapping shortcode -> UrlEntry, with a parallel map of
/// per-shortcode click histories.
///
/// Cheap to clone (shared `Arc` inner) so it can be dependency-injected into
/// handlers through `AppState` rather than living as a process-wide global.
/// No persistence: state is lost on restart.
#[derive(Clone)]
pub struct UrlStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl UrlStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
        }
    }

    /// Insert an entry and initialize its empty click list under one write
    /// lock. Callers must pre-check uniqueness via `has_shortcode`.
    pub async fn add_url(&self, entry: UrlEntry) {
        let mut inner = self.inner.write().await;
        let code = entry.shortcode.clone();
        inner.clicks.entry(code.clone()).or_default();
        if !inner.urls.contains_key(&code) {
            inner.order.push(code.clone());
        }
        inner.urls.insert(code, entry);
    }

    pub async fn get_url(&self, shortcode: &str) -> Option<UrlEntry> {
        self.inner.read().await.urls.get(shortcode).cloned()
    }

    /// Append a click to the shortcode's history, creating the list if it
    /// does not exist yet.
    pub async fn add_click(&self, shortcode: &str, click: ClickEvent) {
        let mut inner = self.inner.write().await;
        inner
            .clicks
            .entry(shortcode.to_owned())
            .or_default()
            .push(click);
    }

    /// All entries in insertion order.
    pub async fn get_all_urls(&self) -> Vec<UrlEntry> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|code| inner.urls.get(code))
            .cloned()
            .collect()
    }

    /// Click history for a shortcode; empty if the shortcode is unknown.
    pub async fn get_url_clicks(&self, shortcode: &str) -> Vec<ClickEvent> {
        self.inner
            .read()
            .await
            .clicks
            .get(shortcode)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn has_shortcode(&self, shortcode: &str) -> bool {
        self.inner.read().await.urls.contains_key(shortcode)
    }
}

impl Default for UrlStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(code: &str) -> UrlEntry {
        let now = Utc::now();
        UrlEntry {
            shortcode: code.to_owned(),
            original_url: "https://example.com".to_owned(),
            created_at: now,
            expires_at: now + Duration::minutes(30),
        }
    }

    fn click(referrer: &str) -> ClickEvent {
        ClickEvent {
            timestamp: Utc::now(),
            referrer: referrer.to_owned(),
            country: "Unknown".to_owned(),
        }
    }

    #[tokio::test]
    async fn add_and_get_url() {
        let store = UrlStore::new();
        store.add_url(entry("abcd")).await;

        assert!(store.has_shortcode("abcd").await);
        assert!(!store.has_shortcode("wxyz").await);

        let got = store.get_url("abcd").await.unwrap();
        assert_eq!(got.original_url, "https://example.com");
        assert!(store.get_url("wxyz").await.is_none());
    }

    #[tokio::test]
    async fn click_list_created_with_entry() {
        let store = UrlStore::new();
        store.add_url(entry("abcd")).await;

        // List exists and is empty from the moment the entry is stored.
        assert!(store.get_url_clicks("abcd").await.is_empty());
    }

    #[tokio::test]
    async fn clicks_append_in_order() {
        let store = UrlStore::new();
        store.add_url(entry("abcd")).await;

        store.add_click("abcd", click("https://a.example")).await;
        store.add_click("abcd", click("https://b.example")).await;

        let clicks = store.get_url_clicks("abcd").await;
        assert_eq!(clicks.len(), 2);
        assert_eq!(clicks[0].referrer, "https://a.example");
        assert_eq!(clicks[1].referrer, "https://b.example");
    }

    #[tokio::test]
    async fn clicks_for_unknown_shortcode_are_empty() {
        let store = UrlStore::new();
        assert!(store.get_url_clicks("nope1").await.is_empty());
    }

    #[tokio::test]
    async fn enumeration_follows_insertion_order() {
        let store = UrlStore::new();
        for code in ["cccc", "aaaa", "bbbb"] {
            store.add_url(entry(code)).await;
        }

        let codes: Vec<String> = store
            .get_all_urls()
            .await
            .into_iter()
            .map(|e| e.shortcode)
            .collect();
        assert_eq!(codes, ["cccc", "aaaa", "bbbb"]);
    }
}
