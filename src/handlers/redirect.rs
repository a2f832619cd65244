use crate::{error::ServiceError, geo, service, AppState};
use askama::Template;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate;

#[derive(Template)]
#[template(path = "expired.html")]
struct ExpiredTemplate;

/// GET /:code
///
/// 1. Resolve the shortcode against the in-memory store.
/// 2. Unknown code → rendered "not found" page; expired code → rendered
///    "expired" page. Neither redirects.
/// 3. Otherwise spawn a background task to record the click (referrer from
///    the request, country via geo lookup) so the redirect is not blocked
///    by analytics, then redirect to the original URL.
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Response {
    let entry = match service::resolve_url(&state.store, &code).await {
        Ok(entry) => entry,
        Err(e @ ServiceError::Expired(_)) => {
            tracing::info!(shortcode = %code, "short URL expired");
            return (e.status(), ExpiredTemplate).into_response();
        }
        Err(e) => {
            tracing::info!(shortcode = %code, "shortcode not found");
            return (e.status(), NotFoundTemplate).into_response();
        }
    };

    let referrer = headers
        .get("referer")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let ip = extract_ip(&headers);

    // Clone everything needed so the background task owns its data.
    // The geo lookup and click write both happen here — never on the hot path.
    let state_bg = state.clone();
    let code_bg = code.clone();

    tokio::spawn(async move {
        let country = match ip {
            Some(ip) => geo::lookup_country(&ip, &state_bg.geo_cache).await,
            None => None,
        };

        if let Err(e) = service::record_click(
            &state_bg.store,
            &code_bg,
            referrer.as_deref(),
            country.as_deref(),
        )
        .await
        {
            tracing::warn!(shortcode = %code_bg, "click recording failed: {}", e);
        }
    });

    tracing::info!(shortcode = %code, url = %entry.original_url, "redirecting to original URL");
    Redirect::to(&entry.original_url).into_response()
}

/// Determine the real client IP from common proxy headers. Without a proxy
/// in front there is nothing to read, and the click simply carries no country.
fn extract_ip(headers: &HeaderMap) -> Option<String> {
    // X-Forwarded-For can be a comma-separated list; take the first entry.
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = xff.split(',').next().map(str::trim) {
            if !ip.is_empty() {
                return Some(ip.to_owned());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_for_takes_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "8.8.8.8, 10.0.0.1".parse().unwrap());
        assert_eq!(extract_ip(&headers).as_deref(), Some("8.8.8.8"));
    }

    #[test]
    fn real_ip_is_a_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "9.9.9.9".parse().unwrap());
        assert_eq!(extract_ip(&headers).as_deref(), Some("9.9.9.9"));
    }

    #[test]
    fn no_proxy_headers_means_no_ip() {
        assert_eq!(extract_ip(&HeaderMap::new()), None);
    }
}
