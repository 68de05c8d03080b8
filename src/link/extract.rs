//! Coordinate extraction from Google Maps URLs.
//!
//! Sources are tried in a fixed order, first valid pair wins:
//!   q= → query= → destination= → path (`/@lat,lng`) → `!3d!4d` data blob → raw URL scan
//!
//! A source whose candidate is out of range does not fail the parse; the next
//! source is tried instead.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::hosts::is_google_maps_host;
use super::types::{Coordinates, ParseError, ParsedLocation};

/// Signed decimal pair: 1–2 integer digits of latitude, 1–3 of longitude.
///
/// The latitude must not continue a longer number, so `123.45` never reads as `23.45`.
static LAT_LNG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(-?\d{1,2}\.\d+),\s*(-?\d{1,3}\.\d+)").expect("valid lat,lng regex")
});

/// Place pin inside the `data=` blob, e.g. `!3d27.1751!4d78.0421`.
static DATA_BLOB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!3d(-?\d{1,2}\.\d+)!4d(-?\d{1,3}\.\d+)").expect("valid data blob regex"));

/// Query parameters that may hold coordinates or an address, highest priority first.
const QUERY_KEYS: [&str; 3] = ["q", "query", "destination"];

/// What every matcher gets to look at.
struct MatchInput<'a> {
    url: &'a Url,
    raw: &'a str,
}

type Matcher = fn(&MatchInput<'_>) -> Option<Coordinates>;

/// Extraction order. Auditable in one place; each entry is testable on its own.
const MATCHERS: &[(&str, Matcher)] = &[
    ("q", match_q),
    ("query", match_query),
    ("destination", match_destination),
    ("path", match_path),
    ("data_blob", match_data_blob),
    ("raw", match_raw),
];

fn match_q(input: &MatchInput<'_>) -> Option<Coordinates> {
    query_param(input.url, "q").and_then(|v| scan(&LAT_LNG, &v))
}

fn match_query(input: &MatchInput<'_>) -> Option<Coordinates> {
    query_param(input.url, "query").and_then(|v| scan(&LAT_LNG, &v))
}

fn match_destination(input: &MatchInput<'_>) -> Option<Coordinates> {
    query_param(input.url, "destination").and_then(|v| scan(&LAT_LNG, &v))
}

// Covers `/maps/@12.34,77.11,17z` style paths.
fn match_path(input: &MatchInput<'_>) -> Option<Coordinates> {
    scan(&LAT_LNG, input.url.path())
}

fn match_data_blob(input: &MatchInput<'_>) -> Option<Coordinates> {
    scan(&DATA_BLOB, input.raw)
}

fn match_raw(input: &MatchInput<'_>) -> Option<Coordinates> {
    scan(&LAT_LNG, input.raw)
}

/// Parse a Google Maps URL into a [`ParsedLocation`].
///
/// Pure: no network access. Short links must be resolved beforehand
/// (see [`super::LinkResolver`]).
pub fn parse_google_maps_link(raw: &str) -> Result<ParsedLocation, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let url = Url::parse(trimmed).map_err(|_| ParseError::InvalidUrl)?;

    let host = url.host_str().unwrap_or_default();
    if !is_google_maps_host(host) {
        return Err(ParseError::NotGoogleMaps);
    }

    let input = MatchInput { url: &url, raw };
    let coordinates = extract_coordinates(&input).ok_or(ParseError::CoordinatesNotFound)?;

    let place_name = query_param(&url, "q")
        .and_then(|q| q.split(',').next().map(|name| name.trim().to_string()));
    let address = QUERY_KEYS.iter().find_map(|key| query_param(&url, key));

    Ok(ParsedLocation::new(raw, coordinates, place_name, address))
}

fn extract_coordinates(input: &MatchInput<'_>) -> Option<Coordinates> {
    MATCHERS.iter().find_map(|(name, matcher)| {
        let found = matcher(input)?;
        log::debug!("coordinates {} matched via '{}'", found, name);
        Some(found)
    })
}

/// First non-empty, decoded value of `key`.
fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// First match of `pattern` in `text`, kept only if it is a valid pair.
fn scan(pattern: &Regex, text: &str) -> Option<Coordinates> {
    let caps = pattern.captures(text)?;
    let lat: f64 = caps.get(1)?.as_str().parse().ok()?;
    let lng: f64 = caps.get(2)?.as_str().parse().ok()?;
    Coordinates::new(lat, lng)
}
