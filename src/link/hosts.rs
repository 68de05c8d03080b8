//! Host predicates: which links are Google Maps, which are shortened.

use url::Url;

/// Hosts accepted verbatim by the extractor.
const GOOGLE_MAPS_HOSTS: &[&str] = &["maps.google.com", "www.google.com", "google.com", "goo.gl"];

/// Country domains such as `maps.google.co.in`.
const GOOGLE_MAPS_HOST_PREFIX: &str = "maps.google.";

const SHORT_LINK_HOST: &str = "maps.app.goo.gl";
const LEGACY_SHORT_HOST: &str = "goo.gl";
const LEGACY_SHORT_PATH_PREFIX: &str = "/maps";

/// Whether `hostname` belongs to the Google Maps family.
///
/// Expects a lowercase hostname, which is what [`Url::host_str`] yields.
pub fn is_google_maps_host(hostname: &str) -> bool {
    GOOGLE_MAPS_HOSTS.contains(&hostname) || hostname.starts_with(GOOGLE_MAPS_HOST_PREFIX)
}

/// Whether `raw` is a shortened Google Maps link that needs resolving.
///
/// Anything that fails to parse is simply not a short link.
pub fn is_short_link(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw.trim()) else {
        return false;
    };
    match url.host_str() {
        Some(SHORT_LINK_HOST) => true,
        Some(LEGACY_SHORT_HOST) => url.path().starts_with(LEGACY_SHORT_PATH_PREFIX),
        _ => false,
    }
}
