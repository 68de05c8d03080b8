//! Link subsystem: short-link resolution and coordinate extraction.
//!
//! Resolver and extractor are independent; [`handle_shared_link`] chains them.

pub mod extract;
pub mod hosts;
pub mod resolver;
pub mod share;
pub mod types;

pub use extract::parse_google_maps_link;
pub use hosts::{is_google_maps_host, is_short_link};
pub use resolver::{LinkResolver, RedirectTransport, RequestMethod, Resolution, ResolveFailure, UreqTransport};
pub use share::{handle_shared_link, SharedLocation};
pub use types::{Coordinates, ParseError, ParsedLocation, FALLBACK_PLACE_NAME};
