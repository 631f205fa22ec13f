mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::Harness;
use tripwise::api::{AppState, USER_HEADER};
use tripwise::providers::ProviderAvailability;
use tripwise::web;

fn app() -> Router {
    let built = Harness {
        availability: ProviderAvailability {
            routing: true,
            flights: false,
            narrative: true,
        },
        ..Harness::default()
    }
    .build();
    let state = AppState {
        planner: Arc::new(built.planner),
    };
    web::app(state, "tests/no-frontend")
}

fn plan_body() -> Value {
    json!({
        "citizenship": "American",
        "residencyStatus": "Citizen",
        "departureLocation": "New York, USA",
        "destinationLocation": "London, UK",
        "transportMode": "car"
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_reports_providers() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["providers"]["routing"], true);
    assert_eq!(body["providers"]["flights"], false);
}

#[tokio::test]
async fn test_create_then_fetch_plan() {
    let app = app();
    let (status, created) =
        send(&app, "POST", "/api/plans", Some("alice"), Some(plan_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["route"]["provenance"], "live");
    assert_eq!(created["visa"]["provenance"], "mock");
    assert_eq!(created["request"]["transportMode"], "car");

    let id = created["id"].as_str().unwrap();
    let uri = format!("/api/plans/{id}");
    let (status, fetched) = send(&app, "GET", &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, listed) = send(&app, "GET", "/api/plans", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_other_users_plan_is_not_found() {
    let app = app();
    let (_, created) = send(&app, "POST", "/api/plans", Some("alice"), Some(plan_body())).await;
    let id = created["id"].as_str().unwrap();

    let uri = format!("/api/plans/{id}");
    let (status, body) = send(&app, "GET", &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(id));

    let (_, listed) = send(&app, "GET", "/api/plans", Some("bob"), None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_user_header_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/plans", None, Some(plan_body())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains(USER_HEADER));
}

#[tokio::test]
async fn test_invalid_plan_id_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/plans/not-a-uuid", Some("alice"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_blank_field_is_bad_request() {
    let app = app();
    let mut body = plan_body();
    body["destinationLocation"] = json!("  ");
    let (status, body) = send(&app, "POST", "/api/plans", Some("alice"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("destinationLocation"));
}

#[tokio::test]
async fn test_unknown_transport_mode_is_json_bad_request() {
    let app = app();
    let mut body = plan_body();
    body["transportMode"] = json!("plane");
    let (status, body) = send(&app, "POST", "/api/plans", Some("alice"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("transportMode"));
}

#[tokio::test]
async fn test_malformed_leg_body_is_json_bad_request() {
    let app = app();
    let (_, created) = send(&app, "POST", "/api/plans", Some("alice"), Some(plan_body())).await;
    let id = created["id"].as_str().unwrap();

    let leg = json!({ "sequence": "first", "from": "Heathrow", "to": "London", "mode": "car" });
    let uri = format!("/api/plans/{id}/legs");
    let (status, body) = send(&app, "POST", &uri, Some("alice"), Some(leg)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_regenerate_and_checklist() {
    let app = app();
    let (_, created) = send(&app, "POST", "/api/plans", Some("alice"), Some(plan_body())).await;
    let id = created["id"].as_str().unwrap();

    let uri = format!("/api/plans/{id}/regenerate");
    let (status, regenerated) = send(&app, "POST", &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(regenerated["id"], created["id"]);

    let uri = format!("/api/plans/{id}/checklist");
    let (status, checklist) = send(&app, "GET", &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        checklist["items"],
        json!(["Valid passport", "Travel insurance certificate"])
    );
}

#[tokio::test]
async fn test_trip_legs_round_trip_in_sequence_order() {
    let app = app();
    let (_, created) = send(&app, "POST", "/api/plans", Some("alice"), Some(plan_body())).await;
    let id = created["id"].as_str().unwrap();
    let legs_uri = format!("/api/plans/{id}/legs");

    for (sequence, from, to) in [(2, "Heathrow", "London"), (1, "New York", "JFK")] {
        let leg = json!({ "sequence": sequence, "from": from, "to": to, "mode": "car" });
        let (status, _) = send(&app, "POST", &legs_uri, Some("alice"), Some(leg)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, legs) = send(&app, "GET", &legs_uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    let sequences: Vec<u64> = legs
        .as_array()
        .unwrap()
        .iter()
        .map(|leg| leg["sequence"].as_u64().unwrap())
        .collect();
    assert_eq!(sequences, vec![1, 2]);

    let bad_leg = json!({ "sequence": 3, "from": "", "to": "Soho", "mode": "pedestrian" });
    let (status, _) = send(&app, "POST", &legs_uri, Some("alice"), Some(bad_leg)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", &legs_uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
