//! RidePrompt: turns shared Google Maps links into ride destinations.
//!
//! The core is the [`link`] pipeline: short-link resolution followed by
//! coordinate extraction. Everything else ([`deeplink`], [`history`],
//! [`server`]) consumes its [`link::ParsedLocation`] output.

pub mod config;
pub mod deeplink;
pub mod history;
pub mod link;
pub mod logging;
pub mod server;
