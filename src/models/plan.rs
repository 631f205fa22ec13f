//! Plan request, per-provider sub-results and the composite travel plan

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Coordinates;
use crate::TripwiseError;

/// How the traveller intends to cover the overland part of the trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Car,
    Truck,
    Pedestrian,
    Bicycle,
    Scooter,
}

impl TransportMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Car => "car",
            TransportMode::Truck => "truck",
            TransportMode::Pedestrian => "pedestrian",
            TransportMode::Bicycle => "bicycle",
            TransportMode::Scooter => "scooter",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user submitted from the planning form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub citizenship: String,
    pub residency_status: String,
    pub departure_location: String,
    pub destination_location: String,
    pub transport_mode: TransportMode,
}

impl PlanRequest {
    /// Reject requests with blank fields. The planner assumes this already ran.
    pub fn validate(&self) -> crate::Result<()> {
        let fields = [
            ("citizenship", &self.citizenship),
            ("residencyStatus", &self.residency_status),
            ("departureLocation", &self.departure_location),
            ("destinationLocation", &self.destination_location),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(TripwiseError::validation(format!("{name} cannot be empty")));
            }
        }
        Ok(())
    }
}

/// Where a sub-result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Authoritative data from a live provider call
    Live,
    /// Computed guess standing in for provider data
    Fallback,
    /// Static table data
    Mock,
    /// The provider could not be used; values are placeholders
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderCrossing {
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub distance_km: u64,
    pub duration_minutes: u64,
    pub transport_methods: Vec<String>,
    pub border_crossings: Vec<BorderCrossing>,
    pub provenance: Provenance,
    pub error_detail: Option<String>,
}

impl RouteResult {
    /// Placeholder route carrying only the requested mode
    #[must_use]
    pub fn error(mode: TransportMode, detail: impl Into<String>) -> Self {
        Self {
            distance_km: 0,
            duration_minutes: 0,
            transport_methods: vec![mode.to_string()],
            border_crossings: Vec::new(),
            provenance: Provenance::Error,
            error_detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSegment {
    pub departure_code: String,
    pub arrival_code: String,
    pub price: Decimal,
    pub duration_iso8601: String,
    pub airline_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightResult {
    pub segments: Vec<FlightSegment>,
    pub total_price: Decimal,
    pub provenance: Provenance,
    pub error_detail: Option<String>,
}

impl FlightResult {
    #[must_use]
    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            segments: Vec::new(),
            total_price: Decimal::ZERO,
            provenance: Provenance::Error,
            error_detail: Some(detail.into()),
        }
    }

    /// Live price usable for the cost estimate, if any
    #[must_use]
    pub fn live_price(&self) -> Option<Decimal> {
        (self.provenance == Provenance::Live && self.total_price > Decimal::ZERO)
            .then_some(self.total_price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisaResult {
    pub required: bool,
    pub visa_type: Option<String>,
    pub processing_time: Option<String>,
    pub documents: Vec<String>,
    pub notes: Option<String>,
    pub provenance: Provenance,
    pub error_detail: Option<String>,
}

impl VisaResult {
    /// Conservative placeholder: assume a visa is needed
    #[must_use]
    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            required: true,
            visa_type: None,
            processing_time: None,
            documents: Vec::new(),
            notes: None,
            provenance: Provenance::Error,
            error_detail: Some(detail.into()),
        }
    }
}

/// Identifier of a persisted plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub Uuid);

impl PlanId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PlanId {
    type Err = TripwiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(PlanId)
            .map_err(|_| TripwiseError::validation(format!("'{s}' is not a valid plan id")))
    }
}

/// The composite plan returned to the frontend and persisted once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelPlan {
    pub id: PlanId,
    pub owner: String,
    pub request: PlanRequest,
    pub narrative: String,
    pub route: RouteResult,
    pub flight: FlightResult,
    pub visa: VisaResult,
    pub total_estimated_cost: Decimal,
    pub status_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PlanRequest {
        PlanRequest {
            citizenship: "American".to_string(),
            residency_status: "Citizen".to_string(),
            departure_location: "New York, USA".to_string(),
            destination_location: "London, UK".to_string(),
            transport_mode: TransportMode::Car,
        }
    }

    #[test]
    fn test_request_validation_rejects_blank_fields() {
        assert!(request().validate().is_ok());

        let mut blank = request();
        blank.destination_location = "   ".to_string();
        let err = blank.validate().unwrap_err();
        assert!(err.to_string().contains("destinationLocation"));
    }

    #[test]
    fn test_request_json_uses_camel_case() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["departureLocation"], "New York, USA");
        assert_eq!(json["transportMode"], "car");
    }

    #[test]
    fn test_transport_mode_parses_lowercase() {
        let mode: TransportMode = serde_json::from_str("\"pedestrian\"").unwrap();
        assert_eq!(mode, TransportMode::Pedestrian);
        assert_eq!(mode.to_string(), "pedestrian");
    }

    #[test]
    fn test_error_route_keeps_requested_mode() {
        let route = RouteResult::error(TransportMode::Bicycle, "no geocode");
        assert_eq!(route.distance_km, 0);
        assert_eq!(route.transport_methods, vec!["bicycle".to_string()]);
        assert_eq!(route.provenance, Provenance::Error);
    }

    #[test]
    fn test_live_price_requires_live_positive_total() {
        let mut flight = FlightResult::error("down");
        assert_eq!(flight.live_price(), None);

        flight.provenance = Provenance::Live;
        assert_eq!(flight.live_price(), None);

        flight.total_price = Decimal::new(42_050, 2);
        assert_eq!(flight.live_price(), Some(Decimal::new(42_050, 2)));
    }

    #[test]
    fn test_plan_id_round_trips_through_string() {
        let id = PlanId::new();
        let parsed: PlanId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<PlanId>().is_err());
    }
}
