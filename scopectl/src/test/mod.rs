//! End-to-end tests through the full router.

use crate::api::models::instruments::InstrumentsResponse;
use crate::api::models::reservations::{CancelResponse, ReservationResponse};
use crate::api::models::time::TimeResponse;
use crate::errors::ErrorResponse;
use crate::test_utils::{create_test_app, create_test_config, create_test_config_with_coordinator};
use axum::body::Bytes;
use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESERVATIONS: &str = "/api/v1/reservations";

fn booking(scientist: serde_json::Value, instrument: &str, start: &str) -> serde_json::Value {
    json!({
        "scientist_id": scientist,
        "instrument": instrument,
        "start_time_utc": start,
    })
}

/// Walk a reservation through its whole life: book, read, list, cancel, cancel again.
#[test_log::test(tokio::test)]
async fn test_e2e_reservation_lifecycle() {
    let server = create_test_app(create_test_config()).await;

    let response = server
        .post(RESERVATIONS)
        .json(&booking(json!(42), "Hubble-Acad", "2026-01-01T00:00:00Z"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: ReservationResponse = response.json();
    assert_eq!(created.scientist_id, "42");
    assert_eq!(created.instrument, "Hubble-Acad");
    assert_eq!(created.start_time_utc, "2026-01-01T00:00:00Z");
    assert_eq!(created.links.self_link, format!("{RESERVATIONS}/{}", created.id));
    assert_eq!(created.links.cancel, created.links.self_link);

    let fetched: ReservationResponse = server.get(&created.links.self_link).await.json();
    assert_eq!(fetched.id, created.id);

    let listed: Vec<ReservationResponse> = server.get(RESERVATIONS).await.json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);

    let response = server.delete(&created.links.cancel).await;
    response.assert_status_ok();
    let cancelled: CancelResponse = response.json();
    assert_eq!(cancelled.status, "cancelled");

    let response = server.delete(&created.links.cancel).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<ErrorResponse>().error, "not-found");

    server.get(&created.links.self_link).await.assert_status(StatusCode::NOT_FOUND);
    let listed: Vec<ReservationResponse> = server.get(RESERVATIONS).await.json();
    assert!(listed.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_e2e_double_booking_is_a_conflict() {
    let server = create_test_app(create_test_config()).await;
    let body = booking(json!("sci-1"), "Kepler-Acad", "2026-03-01T12:00:00Z");

    server.post(RESERVATIONS).json(&body).await.assert_status(StatusCode::CREATED);

    let response = server
        .post(RESERVATIONS)
        .json(&booking(json!("sci-2"), "Kepler-Acad", "2026-03-01T12:00:00Z"))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<ErrorResponse>().error, "conflict");

    // Same instant on another instrument is a different slot
    server
        .post(RESERVATIONS)
        .json(&booking(json!("sci-2"), "Hubble-Acad", "2026-03-01T12:00:00Z"))
        .await
        .assert_status(StatusCode::CREATED);

    // Start times are compared as strings, so an equivalent spelling is a different slot too
    server
        .post(RESERVATIONS)
        .json(&booking(json!("sci-3"), "Kepler-Acad", "2026-03-01T12:00:00+00:00"))
        .await
        .assert_status(StatusCode::CREATED);
}

#[test_log::test(tokio::test)]
async fn test_e2e_rejects_missing_fields() {
    let server = create_test_app(create_test_config()).await;

    for (body, field) in [
        (json!({"instrument": "Hubble-Acad", "start_time_utc": "t"}), "scientist_id"),
        (json!({"scientist_id": 1, "start_time_utc": "t"}), "instrument"),
        (json!({"scientist_id": 1, "instrument": "Hubble-Acad"}), "start_time_utc"),
        (json!({"scientist_id": "", "instrument": "Hubble-Acad", "start_time_utc": "t"}), "scientist_id"),
    ] {
        let response = server.post(RESERVATIONS).json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.error, "invalid-input");
        assert!(error.message.contains(field), "{} should name {field}", error.message);
    }

    let listed: Vec<ReservationResponse> = server.get(RESERVATIONS).await.json();
    assert!(listed.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_e2e_rejects_malformed_requests() {
    let server = create_test_app(create_test_config()).await;

    let response = server
        .post(RESERVATIONS)
        .bytes(Bytes::from_static(b"{\"instrument\": "))
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<ErrorResponse>().error, "invalid-input");

    let response = server.post(RESERVATIONS).text("scientist_id=1").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.get(&format!("{RESERVATIONS}/not-a-uuid")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<ErrorResponse>().error, "invalid-input");

    server
        .delete(&format!("{RESERVATIONS}/not-a-uuid"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn test_e2e_time_and_instruments() {
    let mut config = create_test_config();
    config.instruments = vec!["Hubble-Acad".to_string(), "Webb-Acad".to_string()];
    let server = create_test_app(config).await;

    let before = chrono::Utc::now();
    let time: TimeResponse = server.get("/api/v1/time").await.json();
    let after = chrono::Utc::now();
    assert!(time.time_utc >= before && time.time_utc <= after);

    let instruments: InstrumentsResponse = server.get("/api/v1/instruments").await.json();
    assert_eq!(instruments.instruments, vec!["Hubble-Acad", "Webb-Acad"]);
}

#[test_log::test(tokio::test)]
async fn test_e2e_service_pages() {
    let server = create_test_app(create_test_config()).await;

    let response = server.get("/interface").await;
    response.assert_status_ok();
    assert!(response.text().contains("/api/v1/time"));

    server.get("/healthz").await.assert_status_ok();

    let spec: serde_json::Value = server.get("/api/v1/openapi.json").await.json();
    assert!(spec["paths"]["/api/v1/reservations"].is_object());

    // Metrics are off in the test config
    server.get("/internal/metrics").await.assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn test_e2e_metrics_endpoint_counts_bookings() {
    let mut config = create_test_config();
    config.enable_metrics = true;
    let server = create_test_app(config).await;

    server
        .post(RESERVATIONS)
        .json(&booking(json!(7), "Hubble-Acad", "2026-05-05T05:05:05Z"))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server.get("/internal/metrics").await;
    response.assert_status_ok();
    assert!(response.text().contains(crate::metrics::RESERVATIONS_CREATED));
}

#[test_log::test(tokio::test)]
async fn test_e2e_audit_file_records_create_and_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.jsonl");

    let mut config = create_test_config();
    config.audit.path = Some(audit_path.clone());
    let server = create_test_app(config).await;

    let created: ReservationResponse = server
        .post(RESERVATIONS)
        .json(&booking(json!(3), "Kepler-Acad", "2026-02-02T02:00:00Z"))
        .await
        .json();
    server.delete(&created.links.cancel).await.assert_status_ok();

    let contents = std::fs::read_to_string(&audit_path).unwrap();
    let events: Vec<serde_json::Value> = contents.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event_type"], "RESERVATION_CREATED");
    assert_eq!(events[1]["event_type"], "RESERVATION_CANCELLED");
    assert_eq!(events[0]["service"], "scopectl");
    assert_eq!(events[1]["details"]["reservation_id"], created.id.to_string());
}

#[test_log::test(tokio::test)]
async fn test_e2e_coordinator_denial_is_resource_locked() {
    let coordinator = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lock/acquire"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&coordinator)
        .await;
    Mock::given(method("POST"))
        .and(path("/lock/release"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&coordinator)
        .await;

    let server = create_test_app(create_test_config_with_coordinator(&coordinator.uri())).await;

    let response = server
        .post(RESERVATIONS)
        .json(&booking(json!(1), "Hubble-Acad", "2026-01-01T00:00:00Z"))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<ErrorResponse>().error, "resource-locked");

    let listed: Vec<ReservationResponse> = server.get(RESERVATIONS).await.json();
    assert!(listed.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_e2e_coordinator_failure_is_service_unavailable() {
    let coordinator = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lock/acquire"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&coordinator)
        .await;

    let server = create_test_app(create_test_config_with_coordinator(&coordinator.uri())).await;

    let response = server
        .post(RESERVATIONS)
        .json(&booking(json!(1), "Hubble-Acad", "2026-01-01T00:00:00Z"))
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<ErrorResponse>().error, "coordinator-unavailable");
}

#[test_log::test(tokio::test)]
async fn test_e2e_booking_through_http_coordinator() {
    let coordinator = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lock/acquire"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"lockId": "abc"})))
        .expect(2)
        .mount(&coordinator)
        .await;
    // The lock already expired on the coordinator side; that still counts as released
    Mock::given(method("POST"))
        .and(path("/lock/release"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&coordinator)
        .await;

    let server = create_test_app(create_test_config_with_coordinator(&coordinator.uri())).await;

    let created: ReservationResponse = server
        .post(RESERVATIONS)
        .json(&booking(json!(9), "Webb-Acad", "2026-09-09T09:00:00Z"))
        .await
        .json();
    server.delete(&created.links.cancel).await.assert_status_ok();

    coordinator.verify().await;
}
