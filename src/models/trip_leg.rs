//! Itemized trip legs a client may attach to a plan

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PlanId, TransportMode};
use crate::TripwiseError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripLeg {
    pub id: Uuid,
    pub plan_id: PlanId,
    /// Position of the leg within the trip, starting at 1
    pub sequence: u32,
    pub from: String,
    pub to: String,
    pub mode: TransportMode,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
}

/// Body of a create-leg request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTripLeg {
    pub sequence: u32,
    pub from: String,
    pub to: String,
    pub mode: TransportMode,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTripLeg {
    pub fn into_leg(self, plan_id: PlanId) -> crate::Result<TripLeg> {
        if self.from.trim().is_empty() || self.to.trim().is_empty() {
            return Err(TripwiseError::validation("a trip leg needs both endpoints"));
        }
        if self.distance_km.is_some_and(|d| d < 0.0) {
            return Err(TripwiseError::validation("distanceKm cannot be negative"));
        }
        Ok(TripLeg {
            id: Uuid::new_v4(),
            plan_id,
            sequence: self.sequence,
            from: self.from,
            to: self.to,
            mode: self.mode,
            distance_km: self.distance_km,
            notes: self.notes,
        })
    }
}
