//! Trip plan aggregation
//!
//! Combines geocoding, routing, flight search, the visa table and the
//! narrative generator into a single [`TravelPlan`]. Every provider failure
//! is absorbed into the affected sub-result and a status fragment, so a plan
//! is produced (and stored) for any valid request.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{Days, NaiveDate, Utc};
use futures::FutureExt;
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use crate::TripwiseError;
use crate::airports::AirportTable;
use crate::config::TripwiseConfig;
use crate::cost;
use crate::models::{
    Coordinates, FlightResult, PlanId, PlanRequest, RouteResult, TransportMode, TravelPlan,
    VisaResult,
};
use crate::providers::{
    self, AmadeusClient, ChatCompletionClient, FlightSearch, Geocoder, GraphHopperClient,
    NarrativeGenerator, NarrativePrompt, Outcome, ProviderAvailability, RouteProvider,
};
use crate::status::{StatusMessage, sentence};
use crate::store::PlanStore;
use crate::visa::VisaRules;

/// Flights are searched this many days after today (UTC)
pub const FLIGHT_LEAD_DAYS: u64 = 7;

pub const NARRATIVE_FALLBACK: &str = "A detailed travel brief could not be generated right now. \
     The route, flight and visa details below are still available.";

pub const APOLOGY_NARRATIVE: &str = "We're sorry, something went wrong while preparing this \
     travel plan. Please try generating it again.";

pub const PLAN_FAILURE_NOTICE: &str =
    "Plan generation did not complete; some details below are placeholders.";

pub const VISA_MOCK_NOTE: &str = "Visa information is indicative only (mock data); \
     confirm requirements with official sources before travelling.";

const INCOMPLETE_DETAIL: &str = "Not available because plan generation did not complete";

const SYSTEM_PROMPT: &str = "You are an experienced international travel advisor. \
     Give practical, concise advice for the trip described by the user. \
     Use short paragraphs and list required documents as bullet points.";

/// Collaborators the planner calls out to
#[derive(Clone)]
pub struct Providers {
    pub geocoder: Arc<dyn Geocoder>,
    pub router: Arc<dyn RouteProvider>,
    pub flights: Arc<dyn FlightSearch>,
    pub narrative: Arc<dyn NarrativeGenerator>,
    pub availability: ProviderAvailability,
}

#[derive(Debug, Clone)]
pub struct PlannerSettings {
    /// Deadline for geocoding, routing and flight calls
    pub call_timeout: Duration,
    pub narrative_timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl PlannerSettings {
    #[must_use]
    pub fn from_config(config: &TripwiseConfig) -> Self {
        Self {
            call_timeout: Duration::from_secs(config.providers.timeout_seconds.into()),
            narrative_timeout: Duration::from_secs(config.narrative.timeout_seconds.into()),
            max_tokens: config.narrative.max_tokens,
            temperature: config.narrative.temperature,
        }
    }
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self::from_config(&TripwiseConfig::default())
    }
}

/// Sub-results collected so far. Anything still unset when generation
/// aborts is replaced with an error placeholder.
#[derive(Default)]
struct PlanDraft {
    route: Option<RouteResult>,
    flight: Option<FlightResult>,
    visa: Option<VisaResult>,
    narrative: Option<String>,
    total_cost: Option<Decimal>,
    status: StatusMessage,
}

impl PlanDraft {
    fn recover(&mut self, mode: TransportMode) {
        self.route
            .get_or_insert_with(|| RouteResult::error(mode, INCOMPLETE_DETAIL));
        self.flight
            .get_or_insert_with(|| FlightResult::error(INCOMPLETE_DETAIL));
        self.visa
            .get_or_insert_with(|| VisaResult::error(INCOMPLETE_DETAIL));
        self.narrative = Some(APOLOGY_NARRATIVE.to_string());
        self.total_cost = Some(cost::MISC_COST_BASELINE);
        self.status.prepend(PLAN_FAILURE_NOTICE);
    }

    fn finish(self, owner: &str, request: PlanRequest) -> TravelPlan {
        let mode = request.transport_mode;
        TravelPlan {
            id: PlanId::new(),
            owner: owner.to_string(),
            narrative: self
                .narrative
                .unwrap_or_else(|| APOLOGY_NARRATIVE.to_string()),
            route: self
                .route
                .unwrap_or_else(|| RouteResult::error(mode, INCOMPLETE_DETAIL)),
            flight: self
                .flight
                .unwrap_or_else(|| FlightResult::error(INCOMPLETE_DETAIL)),
            visa: self
                .visa
                .unwrap_or_else(|| VisaResult::error(INCOMPLETE_DETAIL)),
            total_estimated_cost: self.total_cost.unwrap_or(cost::MISC_COST_BASELINE),
            status_message: self.status.render(),
            created_at: Utc::now(),
            request,
        }
    }
}

pub struct TripPlanner {
    providers: Providers,
    airports: AirportTable,
    visa_rules: VisaRules,
    store: Arc<dyn PlanStore>,
    settings: PlannerSettings,
}

impl TripPlanner {
    #[must_use]
    pub fn new(
        providers: Providers,
        airports: AirportTable,
        visa_rules: VisaRules,
        store: Arc<dyn PlanStore>,
        settings: PlannerSettings,
    ) -> Self {
        Self {
            providers,
            airports,
            visa_rules,
            store,
            settings,
        }
    }

    /// Build the planner with the HTTP provider clients and lookup tables
    /// described by `config`
    pub fn from_config(config: &TripwiseConfig, store: Arc<dyn PlanStore>) -> anyhow::Result<Self> {
        let settings = PlannerSettings::from_config(config);
        let graphhopper = Arc::new(GraphHopperClient::new(
            &config.routing,
            settings.call_timeout,
        )?);
        let amadeus = AmadeusClient::new(&config.flights, settings.call_timeout)?;
        let chat = ChatCompletionClient::new(&config.narrative, settings.narrative_timeout)?;
        let availability = ProviderAvailability {
            routing: graphhopper.is_configured(),
            flights: amadeus.is_configured(),
            narrative: chat.is_configured(),
        };
        let providers = Providers {
            geocoder: graphhopper.clone(),
            router: graphhopper,
            flights: Arc::new(amadeus),
            narrative: Arc::new(chat),
            availability,
        };

        let airports = match &config.data.airports_file {
            Some(path) => AirportTable::from_file(path)?,
            None => AirportTable::default(),
        };
        let visa_rules = match &config.data.visa_rules_file {
            Some(path) => VisaRules::from_file(path)?,
            None => VisaRules::default(),
        };

        Ok(Self::new(providers, airports, visa_rules, store, settings))
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn PlanStore> {
        &self.store
    }

    #[must_use]
    pub fn availability(&self) -> ProviderAvailability {
        self.providers.availability
    }

    /// Generate and store a plan for `request`.
    ///
    /// Provider failures never fail the call; they show up in the plan's
    /// sub-results and status message. The only error returned is a failure
    /// to persist the plan. `request` is expected to have passed
    /// [`PlanRequest::validate`].
    #[instrument(skip(self, request), fields(mode = %request.transport_mode))]
    pub async fn generate(&self, owner: &str, request: PlanRequest) -> crate::Result<TravelPlan> {
        let mut draft = PlanDraft::default();
        let outcome = AssertUnwindSafe(self.assemble(&request, &mut draft))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!("Plan generation aborted: {:#}", err);
                draft.recover(request.transport_mode);
            }
            Err(panic) => {
                error!("Plan generation panicked: {}", panic_message(panic.as_ref()));
                draft.recover(request.transport_mode);
            }
        }

        let plan = draft.finish(owner, request);
        self.store
            .insert_plan(&plan)
            .await
            .map_err(|e| TripwiseError::storage(format!("{e:#}")))?;

        info!(
            "Generated plan {} ({} to {}, route {:?}, flight {:?})",
            plan.id,
            plan.request.departure_location,
            plan.request.destination_location,
            plan.route.provenance,
            plan.flight.provenance
        );
        Ok(plan)
    }

    /// Run generation again with the request of an existing plan owned by `owner`
    pub async fn regenerate(&self, owner: &str, id: PlanId) -> crate::Result<TravelPlan> {
        let previous = self
            .store
            .get_plan(id)
            .await
            .map_err(|e| TripwiseError::storage(format!("{e:#}")))?
            .filter(|plan| plan.owner == owner)
            .ok_or_else(|| TripwiseError::not_found(format!("Plan {id} was not found")))?;
        self.generate(owner, previous.request).await
    }

    async fn assemble(&self, request: &PlanRequest, draft: &mut PlanDraft) -> anyhow::Result<()> {
        let mode = request.transport_mode;
        let flight_date = Utc::now()
            .date_naive()
            .checked_add_days(Days::new(FLIGHT_LEAD_DAYS))
            .ok_or_else(|| anyhow!("flight date is out of range"))?;

        let (departure, destination, (flight, flight_note), visa) = tokio::join!(
            self.locate(&request.departure_location),
            self.locate(&request.destination_location),
            self.search_flights(request, flight_date),
            async {
                self.visa_rules
                    .lookup(&request.citizenship, &request.destination_location)
            },
        );

        let route = match (departure, destination) {
            (Outcome::Success(from), Outcome::Success(to)) => {
                let outcome = providers::call(
                    "routing",
                    self.settings.call_timeout,
                    self.providers.router.route(&from, &to, mode),
                )
                .await;
                if let Outcome::Failure(message) = &outcome {
                    draft
                        .status
                        .push(sentence(format!("Route unavailable: {message}")));
                }
                RouteResult::from_outcome(&outcome, mode)
            }
            (departure, destination) => {
                let failures: Vec<String> = [
                    ("departure", &request.departure_location, departure),
                    ("destination", &request.destination_location, destination),
                ]
                .into_iter()
                .filter_map(|(role, location, outcome)| match outcome {
                    Outcome::Failure(message) => Some(sentence(format!(
                        "Could not locate {role} '{location}': {message}"
                    ))),
                    Outcome::Success(_) => None,
                })
                .collect();
                for failure in &failures {
                    draft.status.push(failure.as_str());
                }
                RouteResult::error(mode, failures.join(" "))
            }
        };
        draft.route = Some(route);

        if let Some(note) = flight_note {
            draft.status.push(note);
        }
        let (total, cost_note) = cost::estimate_total(&flight);
        draft.flight = Some(flight);
        draft.total_cost = Some(total);
        if let Some(note) = cost_note {
            draft.status.push(note);
        }

        draft.visa = Some(visa);
        draft.status.push(VISA_MOCK_NOTE);

        let prompt = self.narrative_prompt(request);
        let narrative = providers::call(
            "narrative",
            self.settings.narrative_timeout,
            self.providers.narrative.complete(&prompt),
        )
        .await;
        draft.narrative = Some(match narrative {
            Outcome::Success(text) => text,
            Outcome::Failure(message) => {
                draft
                    .status
                    .push(sentence(format!("Travel brief unavailable: {message}")));
                NARRATIVE_FALLBACK.to_string()
            }
        });

        Ok(())
    }

    async fn locate(&self, location: &str) -> Outcome<Coordinates> {
        providers::call(
            "geocoding",
            self.settings.call_timeout,
            self.providers.geocoder.geocode(location),
        )
        .await
    }

    /// Flight result plus the status fragment it contributes, if any
    async fn search_flights(
        &self,
        request: &PlanRequest,
        date: NaiveDate,
    ) -> (FlightResult, Option<String>) {
        let origin = self.airports.resolve(&request.departure_location);
        let destination = self.airports.resolve(&request.destination_location);

        let (origin, destination) = match (origin, destination) {
            (Some(origin), Some(destination)) if origin == destination => {
                let detail = format!("Departure and destination share the airport {origin}");
                return (
                    FlightResult::error(detail.clone()),
                    Some(sentence(format!("Flight search skipped: {detail}"))),
                );
            }
            (Some(origin), Some(destination)) => (origin, destination),
            (origin, destination) => {
                let unresolved: Vec<&str> = [
                    (origin.is_none(), request.departure_location.as_str()),
                    (destination.is_none(), request.destination_location.as_str()),
                ]
                .into_iter()
                .filter_map(|(missing, location)| missing.then_some(location))
                .collect();
                let detail = format!("No airport code is known for {}", unresolved.join(" or "));
                warn!("{}", detail);
                return (
                    FlightResult::error(detail.clone()),
                    Some(sentence(format!("Flight search skipped: {detail}"))),
                );
            }
        };

        let outcome = providers::call(
            "flights",
            self.settings.call_timeout,
            self.providers.flights.search(&origin, &destination, date),
        )
        .await;
        let flight = FlightResult::from_outcome(&outcome);
        let note = match &outcome {
            Outcome::Failure(message) => Some(sentence(format!("Flight search failed: {message}"))),
            Outcome::Success(_) if flight.segments.is_empty() => Some(format!(
                "No flights were found from {origin} to {destination} on {date}."
            )),
            Outcome::Success(_) => None,
        };
        (flight, note)
    }

    fn narrative_prompt(&self, request: &PlanRequest) -> NarrativePrompt {
        let user = format!(
            "I am a citizen of {citizenship} with residency status \"{residency}\". \
             I am travelling from {departure} to {destination} by {mode}.\n\
             Please cover:\n\
             - visa and entry requirements for my citizenship and residency status\n\
             - a bulleted checklist of documents to prepare\n\
             - advice on the journey by {mode}, including border crossings\n\
             - local safety and practical tips for {destination}",
            citizenship = request.citizenship,
            residency = request.residency_status,
            departure = request.departure_location,
            destination = request.destination_location,
            mode = request.transport_mode,
        );
        NarrativePrompt {
            system: SYSTEM_PROMPT.to_string(),
            user,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
