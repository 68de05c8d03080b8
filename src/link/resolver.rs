//! Short-link resolver: follows `maps.app.goo.gl` / `goo.gl/maps` redirects.
//!
//! Flow:  not short → passthrough (no network)
//!        short     → HEAD → GET (shared timeout budget) → resolved | fallback
//!
//! Failures never propagate: the original URL is handed on so extraction can
//! still try it.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::hosts::is_short_link;
use crate::config::ResolverConfig;

/// HTTP method used for a resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Head,
    Get,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "HEAD",
            Self::Get => "GET",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the transport saw at the end of the redirect chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub final_url: String,
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

/// Anything that can perform a request, follow redirects and report where it
/// ended up. Must abandon the request once `timeout` elapses.
pub trait RedirectTransport: Send + Sync {
    fn follow(
        &self,
        method: RequestMethod,
        url: &str,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

/// Production transport backed by `ureq`.
pub struct UreqTransport {
    user_agent: String,
    max_redirects: u32,
}

impl UreqTransport {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_redirects: config.max_redirects,
        }
    }
}

impl RedirectTransport for UreqTransport {
    fn follow(
        &self,
        method: RequestMethod,
        url: &str,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .redirects(self.max_redirects)
            .user_agent(&self.user_agent)
            .build();

        match agent.request(method.as_str(), url).call() {
            Ok(response) => Ok(TransportResponse {
                final_url: response.get_url().to_string(),
                status: response.status(),
            }),
            // Redirects were still followed; the caller decides what a 4xx/5xx means.
            Err(ureq::Error::Status(status, response)) => Ok(TransportResponse {
                final_url: response.get_url().to_string(),
                status,
            }),
            Err(ureq::Error::Transport(transport)) if is_timeout(&transport) => Err(TransportError::Timeout),
            Err(ureq::Error::Transport(transport)) => Err(TransportError::Network(transport.to_string())),
        }
    }
}

/// Whether any error in the source chain is an I/O timeout.
///
/// ureq reports an expired deadline as `TimedOut`; a socket read timeout can
/// surface as `WouldBlock` on Unix.
fn is_timeout(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if matches!(io_err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// Why a short link was handed on unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveFailure {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Transport(TransportError),
    #[error("rejected with HTTP {0}")]
    Rejected(u16),
    #[error("no destination URL reported")]
    NoDestination,
}

/// Outcome of [`LinkResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Not a short link; returned as given without any network call.
    Passthrough { url: String },
    /// Short link followed to its destination.
    Resolved {
        original: String,
        final_url: String,
        method: RequestMethod,
    },
    /// Short link that could not be followed; the original is used instead.
    Fallback { original: String, reason: ResolveFailure },
}

impl Resolution {
    /// The URL extraction should run on.
    pub fn url(&self) -> &str {
        match self {
            Self::Passthrough { url } => url,
            Self::Resolved { final_url, .. } => final_url,
            Self::Fallback { original, .. } => original,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Passthrough { .. } => "passthrough",
            Self::Resolved { .. } => "resolved",
            Self::Fallback { .. } => "fallback",
        }
    }
}

/// Wire shape of a [`Resolution`]: `{ status, url, method?, reason? }`.
#[derive(Serialize)]
struct ResolutionInfo<'a> {
    status: &'static str,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<RequestMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl Serialize for Resolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (method, reason) = match self {
            Self::Passthrough { .. } => (None, None),
            Self::Resolved { method, .. } => (Some(*method), None),
            Self::Fallback { reason, .. } => (None, Some(reason.to_string())),
        };
        ResolutionInfo {
            status: self.status(),
            url: self.url(),
            method,
            reason,
        }
        .serialize(serializer)
    }
}

/// The short-link resolver. Stateless; share it freely across threads.
pub struct LinkResolver<T = UreqTransport> {
    transport: T,
    timeout: Duration,
}

impl LinkResolver<UreqTransport> {
    pub fn new() -> Self {
        Self::from_config(&ResolverConfig::default())
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            transport: UreqTransport::new(config),
            timeout: config.timeout(),
        }
    }
}

impl Default for LinkResolver<UreqTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RedirectTransport> LinkResolver<T> {
    /// Create a resolver over a specific transport (for testing).
    pub fn with_transport(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn resolve(&self, raw: &str) -> Resolution {
        if !is_short_link(raw) {
            log::debug!("not a short link, passing through: {}", raw);
            return Resolution::Passthrough { url: raw.to_string() };
        }

        let target = raw.trim();
        let deadline = Instant::now() + self.timeout;
        let mut failure = ResolveFailure::NoDestination;

        // HEAD is cheap but some Google endpoints refuse it.
        for method in [RequestMethod::Head, RequestMethod::Get] {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                failure = ResolveFailure::Timeout(self.timeout);
                break;
            }

            match self.transport.follow(method, target, remaining) {
                Ok(resp) if resp.final_url.trim().is_empty() => {
                    failure = ResolveFailure::NoDestination;
                }
                Ok(resp) if method == RequestMethod::Head && resp.status >= 400 => {
                    log::debug!("{} {} rejected with {}", method, target, resp.status);
                    failure = ResolveFailure::Rejected(resp.status);
                }
                // An error status without any redirect means the short link itself is dead.
                Ok(resp) if resp.status >= 400 && resp.final_url.trim() == target => {
                    log::debug!("{} {} answered {} without redirecting", method, target, resp.status);
                    failure = ResolveFailure::Rejected(resp.status);
                }
                Ok(resp) => {
                    log::debug!("{} {} -> {} ({})", method, target, resp.final_url, resp.status);
                    return Resolution::Resolved {
                        original: raw.to_string(),
                        final_url: resp.final_url,
                        method,
                    };
                }
                Err(TransportError::Timeout) => {
                    failure = ResolveFailure::Timeout(self.timeout);
                }
                Err(e) => {
                    log::debug!("{} {} failed: {}", method, target, e);
                    failure = ResolveFailure::Transport(e);
                }
            }
        }

        log::warn!("could not resolve short link {}: {}; using it as-is", target, failure);
        Resolution::Fallback {
            original: raw.to_string(),
            reason: failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted outcomes and records every call.
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
        calls: Mutex<Vec<RequestMethod>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<TransportResponse, TransportError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<RequestMethod> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RedirectTransport for ScriptedTransport {
        fn follow(
            &self,
            method: RequestMethod,
            _url: &str,
            timeout: Duration,
        ) -> Result<TransportResponse, TransportError> {
            assert!(!timeout.is_zero());
            self.calls.lock().unwrap().push(method);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransportError::Network("no scripted outcome".into())))
        }
    }

    fn ok(url: &str, status: u16) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse { final_url: url.into(), status })
    }

    fn resolver(outcomes: Vec<Result<TransportResponse, TransportError>>) -> LinkResolver<ScriptedTransport> {
        LinkResolver::with_transport(ScriptedTransport::new(outcomes), Duration::from_secs(10))
    }

    const SHORT: &str = "https://maps.app.goo.gl/abc123";
    const LONG: &str = "https://www.google.com/maps/place/X/@12.9716,77.5946,15z";

    #[test]
    fn test_passthrough_makes_no_call() {
        let r = resolver(vec![]);
        let res = r.resolve("https://maps.google.com/?q=1.5,2.5");
        assert_eq!(res, Resolution::Passthrough { url: "https://maps.google.com/?q=1.5,2.5".into() });
        assert!(r.transport.calls().is_empty());
    }

    #[test]
    fn test_passthrough_keeps_input_unchanged() {
        let r = resolver(vec![]);
        assert_eq!(r.resolve("  not a url ").url(), "  not a url ");
    }

    #[test]
    fn test_head_success() {
        let r = resolver(vec![ok(LONG, 200)]);
        let res = r.resolve(SHORT);
        assert_eq!(res.url(), LONG);
        assert!(matches!(res, Resolution::Resolved { method: RequestMethod::Head, .. }));
        assert_eq!(r.transport.calls(), vec![RequestMethod::Head]);
    }

    #[test]
    fn test_head_rejected_falls_back_to_get() {
        let r = resolver(vec![ok(SHORT, 405), ok(LONG, 200)]);
        let res = r.resolve(SHORT);
        assert_eq!(res.url(), LONG);
        assert!(matches!(res, Resolution::Resolved { method: RequestMethod::Get, .. }));
        assert_eq!(r.transport.calls(), vec![RequestMethod::Head, RequestMethod::Get]);
    }

    #[test]
    fn test_head_error_falls_back_to_get() {
        let r = resolver(vec![Err(TransportError::Network("reset".into())), ok(LONG, 200)]);
        assert_eq!(r.resolve(SHORT).url(), LONG);
    }

    #[test]
    fn test_head_without_destination_falls_back_to_get() {
        let r = resolver(vec![ok("", 200), ok(LONG, 200)]);
        assert_eq!(r.resolve(SHORT).url(), LONG);
    }

    #[test]
    fn test_get_error_status_still_resolves() {
        let r = resolver(vec![ok(SHORT, 403), ok(LONG, 404)]);
        assert_eq!(r.resolve(SHORT).url(), LONG);
    }

    #[test]
    fn test_dead_short_link_falls_back() {
        let r = resolver(vec![ok(SHORT, 405), ok(SHORT, 404)]);
        let res = r.resolve(SHORT);
        assert!(res.is_fallback());
        assert_eq!(res.url(), SHORT);
        assert_eq!(
            res,
            Resolution::Fallback {
                original: SHORT.into(),
                reason: ResolveFailure::Rejected(404),
            }
        );
        assert_eq!(r.transport.calls(), vec![RequestMethod::Head, RequestMethod::Get]);
    }

    #[test]
    fn test_network_failure_falls_back_to_original() {
        let r = resolver(vec![
            Err(TransportError::Network("dns".into())),
            Err(TransportError::Network("dns".into())),
        ]);
        let res = r.resolve(SHORT);
        assert!(res.is_fallback());
        assert_eq!(res.url(), SHORT);
        assert_eq!(
            res,
            Resolution::Fallback {
                original: SHORT.into(),
                reason: ResolveFailure::Transport(TransportError::Network("dns".into())),
            }
        );
    }

    #[test]
    fn test_transport_timeout_falls_back() {
        let r = resolver(vec![Err(TransportError::Timeout), Err(TransportError::Timeout)]);
        let res = r.resolve(SHORT);
        assert_eq!(
            res,
            Resolution::Fallback {
                original: SHORT.into(),
                reason: ResolveFailure::Timeout(Duration::from_secs(10)),
            }
        );
    }

    #[test]
    fn test_exhausted_budget_skips_network() {
        let r = LinkResolver::with_transport(ScriptedTransport::new(vec![ok(LONG, 200)]), Duration::ZERO);
        let res = r.resolve(SHORT);
        assert!(matches!(res, Resolution::Fallback { reason: ResolveFailure::Timeout(_), .. }));
        assert!(r.transport.calls().is_empty());
    }

    #[test]
    fn test_resolution_json() {
        let res = Resolution::Resolved {
            original: SHORT.into(),
            final_url: LONG.into(),
            method: RequestMethod::Get,
        };
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["status"], "resolved");
        assert_eq!(json["url"], LONG);
        assert_eq!(json["method"], "GET");
        assert!(json.get("reason").is_none());

        let fb = Resolution::Fallback { original: SHORT.into(), reason: ResolveFailure::Rejected(405) };
        let json = serde_json::to_value(&fb).unwrap();
        assert_eq!(json["url"], SHORT);
        assert_eq!(json["reason"], "rejected with HTTP 405");
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(Resolution::Passthrough { url: "u".into() }.status(), "passthrough");
        let fb = Resolution::Fallback { original: "u".into(), reason: ResolveFailure::NoDestination };
        assert_eq!(fb.status(), "fallback");
    }
}
