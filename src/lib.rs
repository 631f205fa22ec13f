//! `Tripwise` - travel plan aggregation
//!
//! Combines routing, flight offers, visa rules and a generated travel brief
//! into one stored travel plan, degrading gracefully when any provider fails.

pub mod airports;
pub mod api;
pub mod checklist;
pub mod config;
pub mod cost;
pub mod error;
pub mod models;
pub mod planner;
pub mod providers;
pub mod status;
pub mod store;
pub mod telemetry;
pub mod visa;
pub mod web;

// Re-export core types for public API
pub use config::TripwiseConfig;
pub use error::TripwiseError;
pub use models::{PlanId, PlanRequest, Provenance, TransportMode, TravelPlan};
pub use planner::TripPlanner;
pub use store::{FjallPlanStore, MemoryPlanStore, PlanStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripwiseError>;
