//! Fake providers shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use tripwise::airports::AirportTable;
use tripwise::models::{Coordinates, TripLeg};
use tripwise::planner::{PlannerSettings, Providers, TripPlanner};
use tripwise::providers::{
    FlightLeg, FlightOffer, FlightSearch, Geocoder, NarrativeGenerator, NarrativePrompt,
    ProviderAvailability, ProviderError, RouteProvider, RouteSummary,
};
use tripwise::visa::VisaRules;
use tripwise::{MemoryPlanStore, PlanId, PlanRequest, PlanStore, TransportMode, TravelPlan};

pub const NARRATIVE: &str = "\
Enjoy the trip.

Documents:
- Valid passport
- Travel insurance certificate";

/// Geocoder that fails for the listed queries and succeeds otherwise
pub struct FakeGeocoder {
    pub failing: Vec<String>,
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, query: &str) -> Result<Coordinates, ProviderError> {
        if self.failing.iter().any(|q| q == query) {
            Err(ProviderError::NoMatch(query.to_string()))
        } else {
            Ok(Coordinates::new(48.137, 11.575))
        }
    }
}

pub struct FakeRouter {
    pub result: Result<RouteSummary, ProviderError>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl RouteProvider for FakeRouter {
    async fn route(
        &self,
        _from: &Coordinates,
        _to: &Coordinates,
        _mode: TransportMode,
    ) -> Result<RouteSummary, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

pub struct FakeFlights {
    pub result: Result<Vec<FlightOffer>, ProviderError>,
    pub searches: Mutex<Vec<(String, String, NaiveDate)>>,
}

#[async_trait]
impl FlightSearch for FakeFlights {
    async fn search(
        &self,
        origin_code: &str,
        destination_code: &str,
        date: NaiveDate,
    ) -> Result<Vec<FlightOffer>, ProviderError> {
        self.searches.lock().unwrap().push((
            origin_code.to_string(),
            destination_code.to_string(),
            date,
        ));
        self.result.clone()
    }
}

pub enum NarrativeBehaviour {
    Reply(Result<String, ProviderError>),
    Panic,
}

pub struct FakeNarrative {
    pub behaviour: NarrativeBehaviour,
    pub prompts: Mutex<Vec<NarrativePrompt>>,
}

#[async_trait]
impl NarrativeGenerator for FakeNarrative {
    async fn complete(&self, prompt: &NarrativePrompt) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        match &self.behaviour {
            NarrativeBehaviour::Reply(result) => result.clone(),
            NarrativeBehaviour::Panic => panic!("narrative generator exploded"),
        }
    }
}

/// Store whose writes always fail
pub struct FailingStore;

#[async_trait]
impl PlanStore for FailingStore {
    async fn insert_plan(&self, _plan: &TravelPlan) -> anyhow::Result<()> {
        Err(anyhow!("disk full"))
    }

    async fn get_plan(&self, _id: PlanId) -> anyhow::Result<Option<TravelPlan>> {
        Ok(None)
    }

    async fn list_plans(&self, _owner: &str) -> anyhow::Result<Vec<TravelPlan>> {
        Ok(Vec::new())
    }

    async fn insert_trip_leg(&self, _leg: &TripLeg) -> anyhow::Result<()> {
        Err(anyhow!("disk full"))
    }

    async fn list_trip_legs(&self, _plan_id: PlanId) -> anyhow::Result<Vec<TripLeg>> {
        Ok(Vec::new())
    }
}

pub fn offer(price: i64, from: &str, to: &str) -> FlightOffer {
    FlightOffer {
        total_price: Decimal::new(price, 2),
        duration_iso8601: "PT7H30M".to_string(),
        legs: vec![FlightLeg {
            departure_code: from.to_string(),
            arrival_code: to.to_string(),
            carrier_code: "BA".to_string(),
            duration_iso8601: "PT7H30M".to_string(),
        }],
    }
}

pub fn summary() -> RouteSummary {
    RouteSummary {
        distance_meters: 5_570_400.0,
        duration_seconds: 25_200.0,
        segment_modes: vec!["car".to_string()],
        border_crossings: Vec::new(),
    }
}

pub fn request(citizenship: &str, from: &str, to: &str, mode: TransportMode) -> PlanRequest {
    PlanRequest {
        citizenship: citizenship.to_string(),
        residency_status: "Citizen".to_string(),
        departure_location: from.to_string(),
        destination_location: to.to_string(),
        transport_mode: mode,
    }
}

/// Planner wired to fakes; every provider succeeds unless overridden
pub struct Harness {
    pub failing_geocodes: Vec<String>,
    pub route: Result<RouteSummary, ProviderError>,
    pub flights: Result<Vec<FlightOffer>, ProviderError>,
    pub narrative: NarrativeBehaviour,
    pub store: Arc<dyn PlanStore>,
    pub availability: ProviderAvailability,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            failing_geocodes: Vec::new(),
            route: Ok(summary()),
            flights: Ok(vec![offer(65_000, "JFK", "LHR"), offer(42_050, "JFK", "LHR")]),
            narrative: NarrativeBehaviour::Reply(Ok(NARRATIVE.to_string())),
            store: Arc::new(MemoryPlanStore::new()),
            availability: ProviderAvailability {
                routing: true,
                flights: true,
                narrative: true,
            },
        }
    }
}

pub struct Built {
    pub planner: TripPlanner,
    pub router: Arc<FakeRouter>,
    pub flights: Arc<FakeFlights>,
    pub narrative: Arc<FakeNarrative>,
}

impl Harness {
    pub fn build(self) -> Built {
        let router = Arc::new(FakeRouter {
            result: self.route,
            calls: AtomicUsize::new(0),
        });
        let flights = Arc::new(FakeFlights {
            result: self.flights,
            searches: Mutex::new(Vec::new()),
        });
        let narrative = Arc::new(FakeNarrative {
            behaviour: self.narrative,
            prompts: Mutex::new(Vec::new()),
        });
        let providers = Providers {
            geocoder: Arc::new(FakeGeocoder {
                failing: self.failing_geocodes,
            }),
            router: router.clone(),
            flights: flights.clone(),
            narrative: narrative.clone(),
            availability: self.availability,
        };
        let planner = TripPlanner::new(
            providers,
            AirportTable::default(),
            VisaRules::default(),
            self.store,
            PlannerSettings::default(),
        );
        Built {
            planner,
            router,
            flights,
            narrative,
        }
    }
}
