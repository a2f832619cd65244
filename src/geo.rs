use dashmap::DashMap;
use serde::Deserialize;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Thread-safe in-memory cache: IP string → Option<country>.
/// `None` means we already tried and the lookup failed/returned no data.
#[derive(Clone, Debug)]
pub struct GeoCache {
    inner: Arc<DashMap<String, Option<String>>>,
}

impl GeoCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }
}

impl Default for GeoCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct IpApiResponse {
    status: String,
    country: Option<String>,
}

/// Look up the country for `ip`, using `cache` to avoid repeated network
/// requests for the same address.
///
/// Returns `None` for:
/// - private / loopback / link-local addresses
/// - failed or rate-limited API responses
/// - IPs that previously returned no useful data
///
/// The lookup is performed with a 3-second timeout so it can never stall a
/// background task for long.
pub async fn lookup_country(ip: &str, cache: &GeoCache) -> Option<String> {
    // Skip addresses that can never be geolocated
    if is_private(ip) {
        return None;
    }

    // Check cache first (covers both successful hits and known misses)
    if let Some(entry) = cache.inner.get(ip) {
        return entry.clone();
    }

    let result = fetch_country(ip).await;

    // Store in cache regardless of outcome so we don't retry endlessly
    cache.inner.insert(ip.to_owned(), result.clone());

    result
}

async fn fetch_country(ip: &str) -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .ok()?;

    let url = format!("http://ip-api.com/json/{}?fields=status,country", ip);

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| tracing::debug!("geo lookup network error for {}: {}", ip, e))
        .ok()?;

    let body: IpApiResponse = resp
        .json()
        .await
        .map_err(|e| tracing::debug!("geo lookup parse error for {}: {}", ip, e))
        .ok()?;

    if body.status != "success" {
        tracing::debug!("geo lookup returned non-success status for {}", ip);
        return None;
    }

    body.country.filter(|s| !s.is_empty())
}

/// Return `true` for addresses that should never be sent to a public
/// geolocation API: loopback, link-local, private ranges, and IPv6 special
/// addresses.
fn is_private(ip_str: &str) -> bool {
    // Strip IPv6-mapped IPv4 prefix: "::ffff:1.2.3.4" → "1.2.3.4"
    let ip_str = ip_str.strip_prefix("::ffff:").unwrap_or(ip_str);

    match IpAddr::from_str(ip_str) {
        Ok(IpAddr::V4(addr)) => {
            let octets = addr.octets();
            addr.is_loopback()
                || addr.is_link_local()
                || addr.is_unspecified()
                || addr.is_broadcast()
                || octets[0] == 10
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
                || (octets[0] == 192 && octets[1] == 168)
        }
        Ok(IpAddr::V6(addr)) => {
            addr.is_loopback()
                || addr.is_unspecified()
                || (addr.segments()[0] & 0xffc0) == 0xfe80
                || (addr.segments()[0] & 0xfe00) == 0xfc00
        }
        Err(_) => true, // unparseable → treat as private / skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_ranges_are_skipped() {
        for ip in ["127.0.0.1", "10.1.2.3", "172.20.0.1", "192.168.1.5", "::1"] {
            assert!(is_private(ip), "{ip} should be treated as private");
        }
    }

    #[test]
    fn public_addresses_are_not_private() {
        assert!(!is_private("8.8.8.8"));
        assert!(!is_private("::ffff:8.8.8.8"));
    }

    #[test]
    fn garbage_is_treated_as_private() {
        assert!(is_private("not-an-ip"));
    }
}
