//! Data models for the Tripwise application
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates
//! - Plan: The plan request, the per-provider sub-results and the composite plan
//! - Trip leg: Optional itemized breakdown attached to a plan

pub mod location;
pub mod plan;
pub mod trip_leg;

// Re-export all public types for convenient access
pub use location::Coordinates;
pub use plan::{
    BorderCrossing, FlightResult, FlightSegment, PlanId, PlanRequest, Provenance, RouteResult,
    TransportMode, TravelPlan, VisaResult,
};
pub use trip_leg::{NewTripLeg, TripLeg};
