//! GraphHopper client for geocoding and routing
//!
//! One API key serves both endpoints. Path details are requested so the
//! route can report ferry stretches and country transitions.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{Geocoder, ProviderError, RouteProvider, RouteSummary, ensure_success};
use crate::config::RoutingConfig;
use crate::models::{BorderCrossing, Coordinates, TransportMode};

pub struct GraphHopperClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GraphHopperClient {
    pub fn new(config: &RoutingConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Tripwise/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("GraphHopper API key"))
    }
}

/// GraphHopper routing profile for a transport mode
fn profile(mode: TransportMode) -> &'static str {
    match mode {
        TransportMode::Car => "car",
        TransportMode::Truck => "truck",
        TransportMode::Pedestrian => "foot",
        TransportMode::Bicycle => "bike",
        TransportMode::Scooter => "scooter",
    }
}

#[async_trait]
impl Geocoder for GraphHopperClient {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Coordinates, ProviderError> {
        let key = self.api_key()?;
        let url = format!("{}/geocode", self.base_url);

        let response = self
            .client
            .get(url)
            .query(&[("q", query), ("limit", "1"), ("locale", "en"), ("key", key)])
            .send()
            .await
            .map_err(ProviderError::transport)?;
        let response = ensure_success(response).await?;

        let body: GeocodeResponse = response.json().await.map_err(ProviderError::transport)?;
        let point = body
            .hits
            .into_iter()
            .next()
            .map(|hit| Coordinates::new(hit.point.lat, hit.point.lng))
            .ok_or_else(|| ProviderError::NoMatch(query.to_string()))?;

        debug!("Geocoded '{}' to {}", query, point.format_coordinates());
        Ok(point)
    }
}

#[async_trait]
impl RouteProvider for GraphHopperClient {
    #[instrument(skip(self))]
    async fn route(
        &self,
        from: &Coordinates,
        to: &Coordinates,
        mode: TransportMode,
    ) -> Result<RouteSummary, ProviderError> {
        let key = self.api_key()?;
        let url = format!("{}/route", self.base_url);
        let (origin, destination) = (from.to_query_point(), to.to_query_point());

        let response = self
            .client
            .get(url)
            .query(&[
                ("point", origin.as_str()),
                ("point", destination.as_str()),
                ("profile", profile(mode)),
                ("points_encoded", "false"),
                ("instructions", "false"),
                ("details", "road_environment"),
                ("details", "country"),
                ("key", key),
            ])
            .send()
            .await
            .map_err(ProviderError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_route_error(status.as_u16(), &body, mode));
        }

        let body: RouteResponse = response.json().await.map_err(ProviderError::transport)?;
        body.into_summary(mode)
    }
}

/// GraphHopper answers unroutable requests with a 400 and a descriptive message
fn classify_route_error(status: u16, body: &str, mode: TransportMode) -> ProviderError {
    if status == 400 {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.message.to_lowercase())
            .unwrap_or_default();
        let unroutable = ["connection between locations not found", "cannot find point"];
        if unroutable.iter().any(|phrase| message.contains(phrase)) {
            return ProviderError::NoRoute { mode };
        }
    }
    ProviderError::from_status(status, body)
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    hits: Vec<GeocodeHit>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    point: GeocodePoint,
}

#[derive(Debug, Deserialize)]
struct GeocodePoint {
    lat: f64,
    lng: f64,
}

/// `[from_index, to_index, value]` interval over the path's point list
type DetailInterval = (usize, usize, Value);

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    paths: Vec<RoutePath>,
}

#[derive(Debug, Deserialize)]
struct RoutePath {
    /// Meters
    distance: f64,
    /// Milliseconds
    time: u64,
    #[serde(default)]
    points: Option<PointList>,
    #[serde(default)]
    details: PathDetails,
}

#[derive(Debug, Deserialize)]
struct PointList {
    /// `[longitude, latitude]` pairs, optionally with elevation
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct PathDetails {
    #[serde(default)]
    road_environment: Vec<DetailInterval>,
    #[serde(default)]
    country: Vec<DetailInterval>,
}

impl RouteResponse {
    fn into_summary(self, mode: TransportMode) -> Result<RouteSummary, ProviderError> {
        let path = self
            .paths
            .into_iter()
            .next()
            .ok_or(ProviderError::NoRoute { mode })?;
        let points = path.points.map(|p| p.coordinates).unwrap_or_default();

        Ok(RouteSummary {
            distance_meters: path.distance,
            duration_seconds: path.time as f64 / 1000.0,
            segment_modes: transport_methods(mode, &path.details.road_environment),
            border_crossings: border_crossings(&path.details.country, &points),
        })
    }
}

/// Collapse road environments into the ordered modes a traveller uses
fn transport_methods(mode: TransportMode, environments: &[DetailInterval]) -> Vec<String> {
    let mut methods: Vec<String> = Vec::new();
    for (_, _, environment) in environments {
        let method = if environment.as_str() == Some("ferry") {
            "ferry"
        } else {
            mode.as_str()
        };
        if methods.last().map(String::as_str) != Some(method) {
            methods.push(method.to_string());
        }
    }
    if methods.is_empty() {
        methods.push(mode.to_string());
    }
    methods
}

fn border_crossings(countries: &[DetailInterval], points: &[Vec<f64>]) -> Vec<BorderCrossing> {
    countries
        .windows(2)
        .filter_map(|pair| {
            let (_, _, from) = &pair[0];
            let (start, _, to) = &pair[1];
            let (from, to) = (from.as_str()?, to.as_str()?);
            if from == to {
                return None;
            }
            let point = points.get(*start)?;
            let (longitude, latitude) = (*point.first()?, *point.get(1)?);
            Some(BorderCrossing {
                name: format!("{from} -> {to}"),
                coordinates: Coordinates::new(latitude, longitude),
            })
        })
        .collect()
}
