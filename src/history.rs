//! In-memory ride history and analytics events for the HTTP service.
//!
//! Nothing here is written to disk. Coordinates are only kept when the user
//! gave location consent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::deeplink::Provider;
use crate::link::Coordinates;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("provider is required")]
    MissingProvider,
    #[error("event is required")]
    MissingEvent,
    #[error("Invalid coordinates. Lat: -90..90, Lng: -180..180")]
    InvalidCoordinates,
}

/// Body of `POST /history`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistoryItem {
    pub provider: Option<Provider>,
    pub place_name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub location_consent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    pub location_consent: bool,
}

impl HistoryItem {
    /// Validate a request body and stamp it with an id and time.
    pub fn from_request(req: NewHistoryItem) -> Result<Self, HistoryError> {
        let provider = req.provider.ok_or(HistoryError::MissingProvider)?;

        let (lat, lng) = if req.location_consent {
            match (req.lat, req.lng) {
                (Some(lat), Some(lng)) => {
                    let c = Coordinates::new(lat, lng).ok_or(HistoryError::InvalidCoordinates)?;
                    (Some(c.latitude()), Some(c.longitude()))
                }
                (None, None) => (None, None),
                _ => return Err(HistoryError::InvalidCoordinates),
            }
        } else {
            (None, None)
        };

        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            provider,
            place_name: req.place_name.filter(|n| !n.trim().is_empty()),
            lat,
            lng,
            location_consent: req.location_consent,
        })
    }
}

/// Bounded newest-first store.
pub struct HistoryStore {
    limit: usize,
    items: Mutex<VecDeque<HistoryItem>>,
}

impl HistoryStore {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            items: Mutex::new(VecDeque::with_capacity(limit)),
        }
    }

    pub fn record(&self, req: NewHistoryItem) -> Result<HistoryItem, HistoryError> {
        let item = HistoryItem::from_request(req)?;
        let mut items = self.lock();
        items.push_front(item.clone());
        items.truncate(self.limit);
        Ok(item)
    }

    /// Newest first.
    pub fn list(&self) -> Vec<HistoryItem> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<HistoryItem>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Body of `POST /analytics/event`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsEvent {
    pub event: Option<String>,
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedEvent {
    pub accepted: bool,
    pub event: String,
    pub at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn accept(self) -> Result<AcceptedEvent, HistoryError> {
        let event = self
            .event
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or(HistoryError::MissingEvent)?;
        Ok(AcceptedEvent {
            accepted: true,
            event,
            at: self.at.unwrap_or_else(Utc::now),
        })
    }
}
