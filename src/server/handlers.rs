use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::deeplink::DeepLinks;
use crate::history::{AcceptedEvent, AnalyticsEvent, HistoryError, HistoryItem, NewHistoryItem};
use crate::link::{
    handle_shared_link, parse_google_maps_link, ParseError, ParsedLocation, Resolution, SharedLocation,
};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    kind: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.message,
            code: self.status.as_u16(),
            kind: self.kind,
        };
        (self.status, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError {
        status,
        message: msg.into(),
        kind: None,
    }
}

impl From<ParseError> for ApiError {
    fn from(e: ParseError) -> Self {
        let status = match e {
            ParseError::EmptyInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        ApiError {
            status,
            message: e.to_string(),
            kind: Some(e.kind()),
        }
    }
}

impl From<HistoryError> for ApiError {
    fn from(e: HistoryError) -> Self {
        api_error(StatusCode::BAD_REQUEST, e.to_string())
    }
}

// ─── GET /health ─────────────────────────────────────────────────

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

// ─── GET /api/parse ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ParseQuery {
    pub url: Option<String>,
    /// Follow short links (default true).
    pub resolve: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub location: ParsedLocation,
    pub resolution: Resolution,
    pub deeplinks: DeepLinks,
}

pub async fn parse_link(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ParseQuery>,
) -> Result<Json<ParseResponse>, ApiError> {
    let start = Instant::now();

    let raw = params.url.unwrap_or_default();
    if raw.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'url' parameter"));
    }

    let shared = if params.resolve.unwrap_or(true) {
        // ureq blocks; keep it off the async workers.
        let input = raw.clone();
        let task_state = Arc::clone(&state);
        let joined = tokio::task::spawn_blocking(move || handle_shared_link(&input, &task_state.resolver)).await;
        let result = joined.map_err(|e| {
            api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Resolver task failed: {}", e))
        })?;
        result.inspect_err(|e| log::info!("GET /api/parse url={} -> {}", raw, e))?
    } else {
        let location = parse_google_maps_link(&raw)
            .inspect_err(|e| log::info!("GET /api/parse url={} -> {}", raw, e))?;
        SharedLocation {
            resolution: Resolution::Passthrough { url: raw.clone() },
            location,
        }
    };

    log::info!(
        "GET /api/parse url={} -> {} [{}] ({:.1}ms)",
        raw,
        shared.location.coordinates(),
        shared.resolution.status(),
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(ParseResponse {
        deeplinks: DeepLinks::for_location(&shared.location),
        resolution: shared.resolution,
        location: shared.location,
    }))
}

// ─── /history ────────────────────────────────────────────────────

pub async fn create_history(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewHistoryItem>,
) -> Result<(StatusCode, Json<HistoryItem>), ApiError> {
    let item = state.history.record(body)?;
    log::info!("POST /history provider={} consent={}", item.provider, item.location_consent);
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_history(State(state): State<Arc<AppState>>) -> Json<Vec<HistoryItem>> {
    Json(state.history.list())
}

// ─── POST /analytics/event ───────────────────────────────────────

pub async fn analytics_event(
    Json(body): Json<AnalyticsEvent>,
) -> Result<(StatusCode, Json<AcceptedEvent>), ApiError> {
    let accepted = body.accept()?;
    log::info!("POST /analytics/event event={}", accepted.event);
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::deeplink::Provider;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(&Config::default()))
    }

    fn parse_query(url: &str, resolve: Option<bool>) -> Query<ParseQuery> {
        Query(ParseQuery {
            url: Some(url.to_string()),
            resolve,
        })
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_parse_long_link() {
        let url = "https://maps.google.com/?q=Taj+Mahal,27.1751,78.0421";
        let Json(resp) = parse_link(State(state()), parse_query(url, None)).await.unwrap();
        assert_eq!(resp.location.place_name(), "Taj Mahal");
        assert_eq!(resp.resolution.status(), "passthrough");
        assert_eq!(resp.resolution.url(), url);
        assert_eq!(resp.deeplinks.google_maps, "https://www.google.com/maps/search/?api=1&query=27.1751,78.0421");
    }

    #[tokio::test]
    async fn test_parse_without_resolve() {
        let url = "https://www.google.com/maps/@12.9716,77.5946,15z";
        let Json(resp) = parse_link(State(state()), parse_query(url, Some(false))).await.unwrap();
        assert_eq!(resp.location.place_name(), "Selected destination");
        assert_eq!(resp.location.address(), None);
    }

    #[tokio::test]
    async fn test_parse_errors() {
        let err = parse_link(State(state()), parse_query("not a url", None)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.kind, Some("invalid_url"));

        let err = parse_link(State(state()), parse_query("https://example.com/?q=1.5,2.5", Some(false)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, Some("not_google_maps"));

        let err = parse_link(State(state()), parse_query("  ", None)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let missing = Query(ParseQuery { url: None, resolve: None });
        let err = parse_link(State(state()), missing).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_roundtrip() {
        let state = state();
        let body = NewHistoryItem {
            provider: Some(Provider::Uber),
            place_name: Some("Taj Mahal".into()),
            lat: Some(27.1751),
            lng: Some(78.0421),
            location_consent: false,
        };
        let (status, Json(item)) = create_history(State(Arc::clone(&state)), Json(body)).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item.lat, None);

        let Json(items) = list_history(State(state)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, item.id);
    }

    #[tokio::test]
    async fn test_history_requires_provider() {
        let err = create_history(State(state()), Json(NewHistoryItem::default())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "provider is required");
    }

    #[tokio::test]
    async fn test_analytics_event() {
        let body = AnalyticsEvent { event: Some("confirm_open".into()), at: None };
        let (status, Json(accepted)) = analytics_event(Json(body)).await.unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(accepted.event, "confirm_open");

        let err = analytics_event(Json(AnalyticsEvent::default())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_router_builds() {
        let _ = crate::server::build_router(&Config::default());
    }
}
