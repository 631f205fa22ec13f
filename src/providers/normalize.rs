//! Conversion of normalized provider outcomes into plan sub-results
//!
//! These are pure functions of their input: the same outcome always produces
//! the same sub-result.

use rust_decimal::Decimal;

use super::{FlightOffer, Outcome, RouteSummary};
use crate::models::{FlightResult, FlightSegment, Provenance, RouteResult, TransportMode};

/// Round provider units to whole output units; negative or NaN become 0
fn whole_units(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

impl RouteResult {
    #[must_use]
    pub fn from_outcome(outcome: &Outcome<RouteSummary>, mode: TransportMode) -> Self {
        match outcome {
            Outcome::Success(summary) => {
                let transport_methods = if summary.segment_modes.is_empty() {
                    vec![mode.to_string()]
                } else {
                    summary.segment_modes.clone()
                };
                Self {
                    distance_km: whole_units(summary.distance_meters / 1000.0),
                    duration_minutes: whole_units(summary.duration_seconds / 60.0),
                    transport_methods,
                    border_crossings: summary.border_crossings.clone(),
                    provenance: Provenance::Live,
                    error_detail: None,
                }
            }
            Outcome::Failure(message) => RouteResult::error(mode, message.clone()),
        }
    }
}

impl FlightSegment {
    /// Summarize an offer as origin to final destination; `None` for offers without legs
    fn from_offer(offer: &FlightOffer) -> Option<Self> {
        let first = offer.legs.first()?;
        let last = offer.legs.last()?;
        Some(Self {
            departure_code: first.departure_code.clone(),
            arrival_code: last.arrival_code.clone(),
            price: offer.total_price,
            duration_iso8601: offer.duration_iso8601.clone(),
            airline_code: first.carrier_code.clone(),
        })
    }
}

impl FlightResult {
    /// One segment per offer, cheapest first; the total is the cheapest price
    #[must_use]
    pub fn from_outcome(outcome: &Outcome<Vec<FlightOffer>>) -> Self {
        match outcome {
            Outcome::Success(offers) => {
                let mut segments: Vec<FlightSegment> =
                    offers.iter().filter_map(FlightSegment::from_offer).collect();
                segments.sort_by(|a, b| a.price.cmp(&b.price));
                let total_price = segments.first().map_or(Decimal::ZERO, |s| s.price);
                Self {
                    segments,
                    total_price,
                    provenance: Provenance::Live,
                    error_detail: None,
                }
            }
            Outcome::Failure(message) => FlightResult::error(message.clone()),
        }
    }
}
