//! Core types for the link subsystem.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Label used when a link carries no `q=` text.
pub const FALLBACK_PLACE_NAME: &str = "Selected destination";

/// A latitude/longitude pair that is always finite and in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Returns `None` for non-finite values, `|lat| > 90` or `|lng| > 180`.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
            return None;
        }
        Some(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.4}\u{00B0}{}, {:.4}\u{00B0}{}",
            self.latitude.abs(),
            ns,
            self.longitude.abs(),
            ew
        )
    }
}

/// A destination extracted from a Google Maps link.
///
/// Immutable once built; the only constructor goes through [`Coordinates`],
/// so an instance never holds an out-of-range pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedLocation {
    original_url: String,
    #[serde(flatten)]
    coordinates: Coordinates,
    place_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
}

impl ParsedLocation {
    pub fn new(
        original_url: impl Into<String>,
        coordinates: Coordinates,
        place_name: Option<String>,
        address: Option<String>,
    ) -> Self {
        let place_name = place_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_PLACE_NAME.to_string());
        Self {
            original_url: original_url.into(),
            coordinates,
            place_name,
            address,
        }
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.longitude
    }

    pub fn place_name(&self) -> &str {
        &self.place_name
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn display_line(&self) -> String {
        format!("\u{1F4CD} {}\n  \u{1F4D0} {}", self.place_name, self.coordinates)
    }
}

/// Reasons a shared link could not be turned into a [`ParsedLocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("No shared link received")]
    EmptyInput,
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Not a Google Maps URL")]
    NotGoogleMaps,
    #[error("Could not extract coordinates from Google Maps link")]
    CoordinatesNotFound,
}

impl ParseError {
    /// Stable machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::InvalidUrl => "invalid_url",
            Self::NotGoogleMaps => "not_google_maps",
            Self::CoordinatesNotFound => "coordinates_not_found",
        }
    }
}
