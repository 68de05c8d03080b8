//! The full pipeline for a shared string: resolve, then extract.

use serde::Serialize;

use super::extract::parse_google_maps_link;
use super::resolver::{LinkResolver, RedirectTransport, Resolution};
use super::types::{ParseError, ParsedLocation};

/// A parsed location together with how its URL was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedLocation {
    pub resolution: Resolution,
    pub location: ParsedLocation,
}

/// Resolve `incoming` if it is a short link and extract its destination.
///
/// Resolution problems never surface here; only extraction can fail.
pub fn handle_shared_link<T: RedirectTransport>(
    incoming: &str,
    resolver: &LinkResolver<T>,
) -> Result<SharedLocation, ParseError> {
    let trimmed = incoming.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let resolution = resolver.resolve(trimmed);
    let location = parse_google_maps_link(resolution.url())?;
    Ok(SharedLocation { resolution, location })
}
