//! External providers behind a uniform result shape
//!
//! Each provider client speaks its own wire format and reports failures as a
//! [`ProviderError`]. The planner never sees those: every call goes through
//! [`call`], which bounds it with a timeout and flattens the result into an
//! [`Outcome`], so missing credentials, non-2xx responses and parse failures
//! all arrive as `Outcome::Failure(message)`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{BorderCrossing, Coordinates, TransportMode};

pub mod amadeus;
pub mod graphhopper;
pub mod normalize;
pub mod openai;

pub use amadeus::AmadeusClient;
pub use graphhopper::GraphHopperClient;
pub use openai::ChatCompletionClient;

/// Longest provider error body carried into user-facing messages
const MAX_ERROR_BODY: usize = 200;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("no match found for '{0}'")]
    NoMatch(String),

    #[error(
        "No route found. The destination may be inaccessible by {mode}; try a different transport mode."
    )]
    NoRoute { mode: TransportMode },

    #[error("no response within {0}s")]
    Timeout(u64),
}

impl ProviderError {
    pub fn transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }

    pub fn parse(err: impl std::fmt::Display) -> Self {
        Self::Parse(err.to_string())
    }

    /// Classify a non-success status
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::Auth(format!("credentials rejected (HTTP {status})")),
            _ => Self::Http {
                status,
                body: truncate(body.trim(), MAX_ERROR_BODY),
            },
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Return the response untouched when it succeeded, otherwise classify it
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::from_status(status.as_u16(), &body))
}

/// Normalized result of one provider interaction
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
}

impl<T> From<Result<T, ProviderError>> for Outcome<T> {
    fn from(result: Result<T, ProviderError>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Failure(err.to_string()),
        }
    }
}

/// Run one provider request with a deadline and normalize its result
pub async fn call<T, F>(provider: &'static str, timeout: Duration, request: F) -> Outcome<T>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let result = match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(timeout.as_secs())),
    };
    match &result {
        Ok(_) => debug!(provider, "provider call succeeded"),
        Err(ProviderError::NotConfigured(what)) => {
            debug!(provider, "skipping provider call, {what} is not configured");
        }
        Err(err) => warn!(provider, error = %err, "provider call failed"),
    }
    result.into()
}

/// Which providers have credentials; unconfigured ones fail fast at call time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProviderAvailability {
    pub routing: bool,
    pub flights: bool,
    pub narrative: bool,
}

/// Provider-neutral route returned by a [`RouteProvider`]
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// Transport method per consecutive stretch of the route
    pub segment_modes: Vec<String>,
    pub border_crossings: Vec<BorderCrossing>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlightLeg {
    pub departure_code: String,
    pub arrival_code: String,
    pub carrier_code: String,
    pub duration_iso8601: String,
}

/// One bookable flight offer
#[derive(Debug, Clone, PartialEq)]
pub struct FlightOffer {
    pub total_price: Decimal,
    /// Duration of the outbound itinerary
    pub duration_iso8601: String,
    pub legs: Vec<FlightLeg>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NarrativePrompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve free text to the best matching coordinates
    async fn geocode(&self, query: &str) -> Result<Coordinates, ProviderError>;
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(
        &self,
        from: &Coordinates,
        to: &Coordinates,
        mode: TransportMode,
    ) -> Result<RouteSummary, ProviderError>;
}

#[async_trait]
pub trait FlightSearch: Send + Sync {
    /// Search one-way offers; an empty list is a valid answer
    async fn search(
        &self,
        origin_code: &str,
        destination_code: &str,
        date: NaiveDate,
    ) -> Result<Vec<FlightOffer>, ProviderError>;
}

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn complete(&self, prompt: &NarrativePrompt) -> Result<String, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_call_normalizes_errors() {
        let outcome: Outcome<u32> = call("test", Duration::from_secs(1), async {
            Err(ProviderError::NotConfigured("Test API key"))
        })
        .await;
        assert_eq!(
            outcome,
            Outcome::Failure("Test API key is not configured".to_string())
        );
    }

    #[tokio::test]
    async fn test_call_passes_success_through() {
        let outcome = call("test", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(outcome, Outcome::Success(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_times_out_slow_provider() {
        let outcome: Outcome<u32> = call("slow", Duration::from_secs(2), async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(1)
        })
        .await;
        assert_eq!(outcome, Outcome::Failure("no response within 2s".to_string()));
    }

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            ProviderError::from_status(401, ""),
            ProviderError::Auth(_)
        ));
        let err = ProviderError::from_status(500, &"x".repeat(500));
        match err {
            ProviderError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY + 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_no_route_message_names_mode() {
        let err = ProviderError::NoRoute {
            mode: TransportMode::Pedestrian,
        };
        assert!(err.to_string().contains("inaccessible by pedestrian"));
    }
}
