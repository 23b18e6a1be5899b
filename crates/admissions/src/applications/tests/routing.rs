use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::applications::domain::ApplicationStatus;
use crate::applications::router::{submit_handler, transition_handler};
use crate::applications::StatusChangeRequest;
use crate::extract::{AdmissionJson, AdmissionPath};
use crate::persistence::InMemoryStore;
use crate::principal::{Principal, PRINCIPAL_ID_HEADER, PRINCIPAL_ROLE_HEADER};

fn request(method: Method, uri: &str, principal: &Principal, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(PRINCIPAL_ID_HEADER, principal.id.as_str())
        .header(PRINCIPAL_ROLE_HEADER, principal.role.label());
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

fn submission_json(scenario: &Scenario) -> Value {
    serde_json::to_value(scenario.submission()).expect("serializable submission")
}

#[tokio::test]
async fn submit_route_creates_pending_application() {
    let scenario = Scenario::new();
    let response = scenario
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/applications",
            &candidate(),
            Some(submission_json(&scenario)),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "pending");
    assert_eq!(payload["version"], 1);
    assert_eq!(payload["candidate_id"], "cand-1");
    assert_eq!(payload["history"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn duplicate_submission_maps_to_conflict() {
    let scenario = Scenario::new();
    scenario
        .service
        .submit(&candidate(), scenario.submission())
        .expect("submitted");

    let response = submit_handler::<InMemoryStore, InMemoryStore, MemoryNotifier>(
        State(scenario.service.clone()),
        candidate(),
        AdmissionJson(scenario.submission()),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "duplicate_submission");
}

#[tokio::test]
async fn invalid_transition_maps_to_bad_request() {
    let scenario = Scenario::new();
    let application = scenario
        .service
        .submit(&candidate(), scenario.submission())
        .expect("submitted");
    scenario
        .service
        .transition(
            &admin(),
            &application.id,
            StatusChangeRequest::to(ApplicationStatus::Approved),
        )
        .expect("approved");

    let response = transition_handler::<InMemoryStore, InMemoryStore, MemoryNotifier>(
        State(scenario.service.clone()),
        admin(),
        AdmissionPath(application.id),
        AdmissionJson(StatusChangeRequest::to(ApplicationStatus::Processing)),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "invalid_transition");
}

#[tokio::test]
async fn stale_version_maps_to_conflict() {
    let scenario = Scenario::new();
    let application = scenario
        .service
        .submit(&candidate(), scenario.submission())
        .expect("submitted");

    let uri = format!("/api/v1/applications/{}/status", application.id);
    let response = scenario
        .router()
        .oneshot(request(
            Method::PATCH,
            &uri,
            &admin(),
            Some(json!({ "status": "processing", "expected_version": 7 })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "concurrent_modification");
}

#[tokio::test]
async fn candidate_approval_is_forbidden() {
    let scenario = Scenario::new();
    let application = scenario
        .service
        .submit(&candidate(), scenario.submission())
        .expect("submitted");

    let uri = format!("/api/v1/applications/{}/status", application.id);
    let response = scenario
        .router()
        .oneshot(request(
            Method::PATCH,
            &uri,
            &candidate(),
            Some(json!({ "status": "approved" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_status_values_are_rejected() {
    let scenario = Scenario::new();
    let application = scenario
        .service
        .submit(&candidate(), scenario.submission())
        .expect("submitted");

    let uri = format!("/api/v1/applications/{}/status", application.id);
    let response = scenario
        .router()
        .oneshot(request(
            Method::PATCH,
            &uri,
            &admin(),
            Some(json!({ "status": "archived" })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["kind"], "validation_failed");
}

#[tokio::test]
async fn missing_application_maps_to_not_found() {
    let scenario = Scenario::new();
    let uri = format!(
        "/api/v1/applications/{}",
        crate::applications::ApplicationId::generate()
    );
    let response = scenario
        .router()
        .oneshot(request(Method::GET, &uri, &admin(), None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn history_and_mine_routes_return_candidate_data() {
    let scenario = Scenario::new();
    let application = scenario
        .service
        .submit(&candidate(), scenario.submission())
        .expect("submitted");

    let uri = format!("/api/v1/applications/{}/history", application.id);
    let response = scenario
        .router()
        .oneshot(request(Method::GET, &uri, &candidate(), None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["from"], "pending");
    assert_eq!(payload[0]["to"], "pending");
    assert_eq!(payload[0]["actor"]["role"], "candidate");

    let response = scenario
        .router()
        .oneshot(request(
            Method::GET,
            "/api/v1/applications/mine",
            &candidate(),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn summary_route_counts_statuses_for_administrators() {
    let scenario = Scenario::new();
    scenario
        .service
        .submit(&candidate(), scenario.submission())
        .expect("submitted");

    let response = scenario
        .router()
        .oneshot(request(
            Method::GET,
            "/api/v1/applications/summary?year=2025",
            &admin(),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total"], 1);
    assert_eq!(payload["by_status"]["pending"], 1);
    assert_eq!(payload["by_status"]["approved"], 0);

    let response = scenario
        .router()
        .oneshot(request(
            Method::GET,
            "/api/v1/applications?status=pending",
            &candidate(),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_principal_is_unauthorized() {
    let scenario = Scenario::new();
    let response = scenario
        .router()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/v1/applications/mine")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
