use crate::{
    error::ServiceError,
    models::{ClickEvent, ShortenRequest, UrlEntry, UrlStats},
    store::UrlStore,
};
use chrono::{Duration, Utc};
use url::Url;

/// Validity window applied when a request omits `validityMinutes`.
pub const DEFAULT_VALIDITY_MINUTES: i64 = 30;

const SHORTCODE_LEN: usize = 6;

/// 62^6 ≈ 56.8 billion codes; generation fails closed past this bound.
const MAX_GENERATION_ATTEMPTS: usize = 100;

const REFERRER_DIRECT: &str = "Direct";
const COUNTRY_UNKNOWN: &str = "Unknown";

/// True iff `s` parses as an absolute URL with a host. No network check.
pub fn is_valid_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(url) => url.has_host(),
        Err(_) => false,
    }
}

/// Shortcode constraint enforced at every boundary: 4–12 ASCII alphanumerics.
pub fn is_valid_shortcode(s: &str) -> bool {
    (4..=12).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Generate a random alphanumeric string of the given length.
fn random_code(len: usize) -> String {
    use rand::Rng;
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Draw 6-character codes until one is free in the store.
pub async fn generate_shortcode(store: &UrlStore) -> Result<String, ServiceError> {
    for _ in 0..MAX_GENERATION_ATTEMPTS {
        let code = random_code(SHORTCODE_LEN);
        if !store.has_shortcode(&code).await {
            return Ok(code);
        }
    }
    Err(ServiceError::GenerationExhausted)
}

/// Process shortening requests sequentially, in input order.
///
/// Not atomic across the batch: an error on request *i* stops the loop, and
/// the entries created for earlier requests remain stored. This matches the
/// documented endpoint semantics rather than transactional intent.
pub async fn shorten_urls(
    store: &UrlStore,
    requests: Vec<ShortenRequest>,
) -> Result<Vec<UrlEntry>, ServiceError> {
    let mut results = Vec::with_capacity(requests.len());

    for request in requests {
        if !is_valid_url(&request.url) {
            return Err(ServiceError::InvalidUrl(request.url));
        }

        let shortcode = match request.shortcode {
            Some(code) => {
                if !is_valid_shortcode(&code) {
                    return Err(ServiceError::InvalidShortcodeFormat(code));
                }
                if store.has_shortcode(&code).await {
                    return Err(ServiceError::ShortcodeCollision(code));
                }
                code
            }
            None => generate_shortcode(store).await?,
        };

        let validity_minutes = request.validity_minutes.unwrap_or(DEFAULT_VALIDITY_MINUTES);
        if validity_minutes < 1 {
            return Err(ServiceError::InvalidValidity(validity_minutes));
        }

        let created_at = Utc::now();
        let entry = UrlEntry {
            shortcode: shortcode.clone(),
            original_url: request.url.clone(),
            created_at,
            expires_at: created_at + Duration::minutes(validity_minutes),
        };

        store.add_url(entry.clone()).await;
        results.push(entry);

        tracing::info!(
            shortcode = %shortcode,
            url = %request.url,
            validity_minutes,
            "URL shortened"
        );
    }

    Ok(results)
}

/// Resolve a shortcode for redirecting. Unknown codes and expired entries
/// are distinct failures so callers can render different outcomes.
pub async fn resolve_url(store: &UrlStore, shortcode: &str) -> Result<UrlEntry, ServiceError> {
    let entry = store
        .get_url(shortcode)
        .await
        .ok_or_else(|| ServiceError::NotFound(shortcode.to_owned()))?;

    if entry.is_expired() {
        return Err(ServiceError::Expired(shortcode.to_owned()));
    }

    Ok(entry)
}

/// Record one redirect traversal. Referrer defaults to "Direct", country to
/// "Unknown". Unknown shortcodes are rejected so no orphaned click list is
/// ever created.
pub async fn record_click(
    store: &UrlStore,
    shortcode: &str,
    referrer: Option<&str>,
    country: Option<&str>,
) -> Result<ClickEvent, ServiceError> {
    if !store.has_shortcode(shortcode).await {
        tracing::warn!(%shortcode, "click for unknown shortcode discarded");
        return Err(ServiceError::NotFound(shortcode.to_owned()));
    }

    let click = ClickEvent {
        timestamp: Utc::now(),
        referrer: referrer
            .filter(|s| !s.is_empty())
            .unwrap_or(REFERRER_DIRECT)
            .to_owned(),
        country: country
            .filter(|s| !s.is_empty())
            .unwrap_or(COUNTRY_UNKNOWN)
            .to_owned(),
    };

    store.add_click(shortcode, click.clone()).await;
    tracing::info!(
        %shortcode,
        referrer = %click.referrer,
        country = %click.country,
        "URL accessed"
    );

    Ok(click)
}

/// Every stored entry augmented with its click history.
pub async fn get_all_urls(store: &UrlStore) -> Vec<UrlStats> {
    let mut stats = Vec::new();
    for entry in store.get_all_urls().await {
        let clicks = store.get_url_clicks(&entry.shortcode).await;
        stats.push(UrlStats { entry, clicks });
    }
    stats
}
