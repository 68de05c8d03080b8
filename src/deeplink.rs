//! Provider deep links built from a [`ParsedLocation`].
//!
//! Building a link never opens it; callers must get an explicit confirmation
//! from the user first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

use crate::link::ParsedLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Uber,
    Ola,
    GoogleMaps,
}

impl Provider {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uber => "Uber",
            Self::Ola => "Ola",
            Self::GoogleMaps => "Google Maps",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "uber" => Ok(Self::Uber),
            "ola" => Ok(Self::Ola),
            "google_maps" | "google-maps" | "maps" => Ok(Self::GoogleMaps),
            other => Err(format!(
                "Unknown provider '{}'. Use 'uber', 'ola' or 'google_maps'.",
                other
            )),
        }
    }
}

/// Build the deep link for one provider.
pub fn build(provider: Provider, location: &ParsedLocation) -> String {
    match provider {
        Provider::Uber => uber(location),
        Provider::Ola => ola(location),
        Provider::GoogleMaps => google_maps(location),
    }
}

fn uber(location: &ParsedLocation) -> String {
    let nickname = match location.place_name().trim() {
        "" => "Destination",
        name => name,
    };
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("action", "setPickup")
        .append_pair("dropoff[latitude]", &location.latitude().to_string())
        .append_pair("dropoff[longitude]", &location.longitude().to_string())
        .append_pair("dropoff[nickname]", nickname)
        .finish();
    format!("https://m.uber.com/ul/?{}", query)
}

fn ola(location: &ParsedLocation) -> String {
    let (lat, lng) = (location.latitude(), location.longitude());
    let destination = format!("{},{}", lat, lng);
    let drop_location: String = form_urlencoded::byte_serialize(destination.as_bytes()).collect();
    format!(
        "https://book.olacabs.com/?drop_lat={}&drop_lng={}&drop_location={}",
        lat, lng, drop_location
    )
}

fn google_maps(location: &ParsedLocation) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={},{}",
        location.latitude(),
        location.longitude()
    )
}

/// Deep links for every provider, as served by the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeepLinks {
    pub uber: String,
    pub ola: String,
    pub google_maps: String,
}

impl DeepLinks {
    pub fn for_location(location: &ParsedLocation) -> Self {
        Self {
            uber: build(Provider::Uber, location),
            ola: build(Provider::Ola, location),
            google_maps: build(Provider::GoogleMaps, location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{Coordinates, ParsedLocation};

    fn taj() -> ParsedLocation {
        let coords = Coordinates::new(27.1751, 78.0421).unwrap();
        ParsedLocation::new("https://maps.google.com/?q=Taj+Mahal,27.1751,78.0421", coords, Some("Taj Mahal".into()), None)
    }

    #[test]
    fn test_uber_link() {
        assert_eq!(
            build(Provider::Uber, &taj()),
            "https://m.uber.com/ul/?action=setPickup&dropoff%5Blatitude%5D=27.1751\
             &dropoff%5Blongitude%5D=78.0421&dropoff%5Bnickname%5D=Taj+Mahal"
        );
    }

    #[test]
    fn test_ola_link() {
        assert_eq!(
            build(Provider::Ola, &taj()),
            "https://book.olacabs.com/?drop_lat=27.1751&drop_lng=78.0421&drop_location=27.1751%2C78.0421"
        );
    }

    #[test]
    fn test_google_maps_link() {
        assert_eq!(
            build(Provider::GoogleMaps, &taj()),
            "https://www.google.com/maps/search/?api=1&query=27.1751,78.0421"
        );
    }

    #[test]
    fn test_negative_coordinates() {
        let coords = Coordinates::new(-33.8568, -70.5).unwrap();
        let loc = ParsedLocation::new("u", coords, None, None);
        assert_eq!(
            build(Provider::GoogleMaps, &loc),
            "https://www.google.com/maps/search/?api=1&query=-33.8568,-70.5"
        );
        assert!(build(Provider::Uber, &loc).ends_with("dropoff%5Bnickname%5D=Selected+destination"));
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("UBER".parse::<Provider>(), Ok(Provider::Uber));
        assert_eq!("google-maps".parse::<Provider>(), Ok(Provider::GoogleMaps));
        assert!("lyft".parse::<Provider>().is_err());
    }

    #[test]
    fn test_provider_serde_names() {
        assert_eq!(serde_json::to_string(&Provider::GoogleMaps).unwrap(), "\"google_maps\"");
        let p: Provider = serde_json::from_str("\"ola\"").unwrap();
        assert_eq!(p, Provider::Ola);
    }

    #[test]
    fn test_all_links() {
        let links = DeepLinks::for_location(&taj());
        assert!(links.uber.starts_with("https://m.uber.com/ul/"));
        assert!(links.ola.starts_with("https://book.olacabs.com/"));
        assert!(links.google_maps.starts_with("https://www.google.com/maps/search/"));
    }
}
