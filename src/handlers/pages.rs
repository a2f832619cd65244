use crate::{
    models::{ShortenRequest, UrlEntry},
    service, AppState,
};
use askama::Template;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

// ── Template structs ───────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "index.html")]
struct HomeTemplate {
    created: Vec<CreatedRow>,
    error: Option<String>,
}

struct CreatedRow {
    short_url: String,
    original_url: String,
    expires_at: String,
}

#[derive(Template)]
#[template(path = "stats.html")]
struct StatsTemplate {
    rows: Vec<StatsRow>,
}

struct StatsRow {
    shortcode: String,
    short_url: String,
    original_url: String,
    created_at: String,
    expires_at: String,
    expired: bool,
    click_count: usize,
    clicks: Vec<ClickRow>,
}

struct ClickRow {
    timestamp: String,
    referrer: String,
    country: String,
}

// ── Form types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ShortenForm {
    url: String,
    shortcode: Option<String>,
    validity_minutes: Option<String>,
}

// ── Handlers ───────────────────────────────────────────────────────────────

/// GET /
pub async fn home() -> Response {
    HomeTemplate {
        created: Vec::new(),
        error: None,
    }
    .into_response()
}

/// POST /
///
/// The HTML form goes through the same service path as the JSON API; the
/// page is re-rendered with either the created short link or the error.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ShortenForm>,
) -> Response {
    let shortcode = form
        .shortcode
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    // Empty field means "use the default"; anything else must be an integer.
    let validity_minutes = match form
        .validity_minutes
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(raw) => match raw.parse::<i64>() {
            Ok(minutes) => Some(minutes),
            Err(_) => {
                return render_home_error("Validity must be a whole number of minutes.");
            }
        },
        None => None,
    };

    let request = ShortenRequest {
        url: form.url.trim().to_owned(),
        shortcode,
        validity_minutes,
    };

    match service::shorten_urls(&state.store, vec![request]).await {
        Ok(entries) => HomeTemplate {
            created: entries
                .iter()
                .map(|entry| created_row(entry, &state.config.base_url))
                .collect(),
            error: None,
        }
        .into_response(),
        Err(e) => render_home_error(&e.to_string()),
    }
}

/// GET /stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Response {
    let mut all = service::get_all_urls(&state.store).await;
    // Newest first
    all.sort_by(|a, b| b.entry.created_at.cmp(&a.entry.created_at));

    let rows = all
        .into_iter()
        .map(|stats| {
            let expired = stats.entry.is_expired();
            StatsRow {
            short_url: format!("{}/{}", state.config.base_url, stats.entry.shortcode),
            shortcode: stats.entry.shortcode,
            original_url: stats.entry.original_url,
            created_at: format_instant(&stats.entry.created_at),
            expires_at: format_instant(&stats.entry.expires_at),
            expired,
            click_count: stats.clicks.len(),
            clicks: stats
                .clicks
                .into_iter()
                .map(|click| ClickRow {
                    timestamp: format_instant(&click.timestamp),
                    referrer: click.referrer,
                    country: click.country,
                })
                .collect(),
            }
        })
        .collect();

    StatsTemplate { rows }.into_response()
}

// ── Private helpers ────────────────────────────────────────────────────────

fn render_home_error(message: &str) -> Response {
    HomeTemplate {
        created: Vec::new(),
        error: Some(message.to_owned()),
    }
    .into_response()
}

fn created_row(entry: &UrlEntry, base_url: &str) -> CreatedRow {
    CreatedRow {
        short_url: format!("{}/{}", base_url, entry.shortcode),
        original_url: entry.original_url.clone(),
        expires_at: format_instant(&entry.expires_at),
    }
}

fn format_instant(instant: &chrono::DateTime<chrono::Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M UTC").to_string()
}
