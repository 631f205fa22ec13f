//! JSON API mounted under `/api`
//!
//! Every request names its user in the `x-user-id` header; plans of other
//! users are reported as missing.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::TripwiseError;
use crate::checklist::extract_checklist;
use crate::models::{NewTripLeg, PlanId, PlanRequest, TravelPlan, TripLeg};
use crate::planner::TripPlanner;
use crate::providers::ProviderAvailability;

pub const USER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<TripPlanner>,
}

/// Error response carrying the user-facing message only
pub struct ApiError(TripwiseError);

impl From<TripwiseError> for ApiError {
    fn from(err: TripwiseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TripwiseError::Validation { .. } => StatusCode::BAD_REQUEST,
            TripwiseError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.user_message() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Body extraction result; rejections become validation errors so every
/// failure keeps the `{ "error": ... }` shape
type JsonBody<T> = Result<Json<T>, JsonRejection>;

fn body<T>(payload: JsonBody<T>) -> Result<T, TripwiseError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| TripwiseError::validation(rejection.body_text()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub plan_id: PlanId,
    pub items: Vec<String>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    providers: ProviderAvailability,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/{id}", get(get_plan))
        .route("/plans/{id}/regenerate", post(regenerate_plan))
        .route("/plans/{id}/checklist", get(get_checklist))
        .route("/plans/{id}/legs", get(list_legs).post(add_leg))
        .with_state(state)
}

fn user_id(headers: &HeaderMap) -> Result<String, TripwiseError> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| TripwiseError::validation(format!("the {USER_HEADER} header is required")))
}

fn storage_error(err: anyhow::Error) -> TripwiseError {
    TripwiseError::storage(format!("{err:#}"))
}

/// Load a plan owned by `owner`; other users' plans are not found
async fn owned_plan(state: &AppState, owner: &str, id: &str) -> Result<TravelPlan, TripwiseError> {
    let id: PlanId = id.parse()?;
    state
        .planner
        .store()
        .get_plan(id)
        .await
        .map_err(storage_error)?
        .filter(|plan| plan.owner == owner)
        .ok_or_else(|| TripwiseError::not_found(format!("Plan {id} was not found")))
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: crate::VERSION,
        providers: state.planner.availability(),
    })
}

async fn create_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: JsonBody<PlanRequest>,
) -> ApiResult<(StatusCode, Json<TravelPlan>)> {
    let owner = user_id(&headers)?;
    let request = body(payload)?;
    request.validate()?;
    let plan = state.planner.generate(&owner, request).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn list_plans(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<TravelPlan>>> {
    let owner = user_id(&headers)?;
    let plans = state
        .planner
        .store()
        .list_plans(&owner)
        .await
        .map_err(storage_error)?;
    Ok(Json(plans))
}

async fn get_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<TravelPlan>> {
    let owner = user_id(&headers)?;
    Ok(Json(owned_plan(&state, &owner, &id).await?))
}

async fn regenerate_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<TravelPlan>)> {
    let owner = user_id(&headers)?;
    let id: PlanId = id.parse()?;
    let plan = state.planner.regenerate(&owner, id).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn get_checklist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Checklist>> {
    let owner = user_id(&headers)?;
    let plan = owned_plan(&state, &owner, &id).await?;
    Ok(Json(Checklist {
        plan_id: plan.id,
        items: extract_checklist(&plan.narrative),
    }))
}

async fn list_legs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<TripLeg>>> {
    let owner = user_id(&headers)?;
    let plan = owned_plan(&state, &owner, &id).await?;
    let legs = state
        .planner
        .store()
        .list_trip_legs(plan.id)
        .await
        .map_err(storage_error)?;
    Ok(Json(legs))
}

async fn add_leg(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: JsonBody<NewTripLeg>,
) -> ApiResult<(StatusCode, Json<TripLeg>)> {
    let owner = user_id(&headers)?;
    let plan = owned_plan(&state, &owner, &id).await?;
    let leg = body(payload)?.into_leg(plan.id)?;
    state
        .planner
        .store()
        .insert_trip_leg(&leg)
        .await
        .map_err(storage_error)?;
    Ok((StatusCode::CREATED, Json(leg)))
}
