use std::time::Duration;

use axum::{
    body::{to_bytes, Body, BodyDataStream},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use futures_util::StreamExt;
use reel_api::{app, AppState};
use reel_store::app_config::Config;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app(require_phone_number: bool) -> Router {
    let seed = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/catalog.json");
    let config = Config::from_toml(&format!(
        r#"
        [server]
        port = 0

        [storage]
        backend = "memory"

        [catalog]
        seed_file = "{seed}"

        [booking]
        lock_wait_ms = 500
        require_phone_number = {require_phone_number}
        "#
    ))
    .unwrap();

    let (state, db) = AppState::from_config(&config).await.unwrap();
    assert!(db.is_none());
    app(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap()
}

fn post_booking(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/bookings")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app(true).await;
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_catalog_reads() {
    let app = test_app(true).await;

    let (status, movies) = send(&app, get("/v1/movies")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(movies.as_array().unwrap().len(), 5);
    assert_eq!(movies[0]["title"], "Inception");

    let (status, listing) = send(&app, get("/v1/showtimes")).await;
    assert_eq!(status, StatusCode::OK);
    let rows = listing.as_array().unwrap();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|row| row["available_seats"] == 150));

    let (status, body) = send(&app, get("/v1/movies/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NOT_FOUND");
}

#[tokio::test]
async fn test_book_then_cancel() {
    let app = test_app(true).await;

    let (status, booking) = send(
        &app,
        post_booking(json!({
            "showtime_id": 1,
            "customer_name": "Ada Lovelace",
            "phone_number": "+15550100",
            "seats": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["booking_id"], 1);
    assert_eq!(booking["seats_booked"], 2);
    assert!(booking.get("phone_number").is_none());

    let (_, showtime) = send(&app, get("/v1/showtimes/1")).await;
    assert_eq!(showtime["available_seats"], 148);

    let (status, bookings) = send(&app, get("/v1/bookings")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bookings.as_array().unwrap().len(), 1);

    let (status, cancelled) = send(&app, delete("/v1/bookings/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["booking_id"], 1);

    let (_, showtime) = send(&app, get("/v1/showtimes/1")).await;
    assert_eq!(showtime["available_seats"], 150);

    let (status, body) = send(&app, delete("/v1/bookings/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NOT_FOUND");

    let (status, _) = send(&app, get("/v1/bookings/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_errors_map_to_status() {
    let app = test_app(true).await;

    let (status, body) = send(
        &app,
        post_booking(json!({ "showtime_id": 1, "customer_name": "John3", "phone_number": "555", "seats": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        post_booking(json!({ "showtime_id": 1, "customer_name": "Jane Doe", "seats": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        post_booking(json!({ "showtime_id": 999, "customer_name": "Jane Doe", "phone_number": "555", "seats": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NOT_FOUND");

    let (status, body) = send(
        &app,
        post_booking(json!({ "showtime_id": 2, "customer_name": "Jane Doe", "phone_number": "555", "seats": 151 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "INSUFFICIENT_SEATS");

    let (_, showtime) = send(&app, get("/v1/showtimes/2")).await;
    assert_eq!(showtime["available_seats"], 150);
}

#[tokio::test]
async fn test_phone_optional_policy() {
    let app = test_app(false).await;

    let (status, booking) = send(
        &app,
        post_booking(json!({ "showtime_id": 3, "customer_name": "Jane Doe", "seats": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["showtime_id"], 3);
}

#[tokio::test]
async fn test_stream_unknown_showtime() {
    let app = test_app(true).await;
    let (status, _) = send(&app, get("/v1/showtimes/999/stream")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_input_is_a_validation_error() {
    let app = test_app(true).await;

    let (status, body) = send(
        &app,
        post_booking(json!({ "showtime_id": 1, "customer_name": "Jane Doe", "phone_number": "555", "seats": "two" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().unwrap().contains("seats"));

    let (status, body) = send(
        &app,
        post_booking(json!({ "showtime_id": 1, "customer_name": "Jane Doe", "phone_number": "555" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "VALIDATION_ERROR");

    for uri in ["/v1/bookings/abc", "/v1/movies/abc", "/v1/showtimes/abc"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["kind"], "VALIDATION_ERROR", "{uri}");
    }

    let (status, body) = send(&app, delete("/v1/bookings/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "VALIDATION_ERROR");

    let (_, showtime) = send(&app, get("/v1/showtimes/1")).await;
    assert_eq!(showtime["available_seats"], 150);
}

/// Reads SSE frames until one complete event has arrived and returns its
/// name and JSON payload.
async fn next_event(frames: &mut BodyDataStream) -> (String, Value) {
    let mut buffer = String::new();
    while !buffer.contains("\n\n") {
        let chunk = tokio::time::timeout(Duration::from_secs(2), frames.next())
            .await
            .expect("event within two seconds")
            .expect("stream still open")
            .unwrap();
        buffer.push_str(&String::from_utf8_lossy(&chunk));
    }

    let mut name = String::new();
    let mut data = Value::Null;
    for line in buffer.lines() {
        if let Some(value) = line.strip_prefix("event: ") {
            name = value.to_string();
        } else if let Some(value) = line.strip_prefix("data: ") {
            data = serde_json::from_str(value).unwrap();
        }
    }
    (name, data)
}

#[tokio::test]
async fn test_stream_delivers_committed_events_for_its_showtime() {
    let app = test_app(true).await;

    let response = app.clone().oneshot(get("/v1/showtimes/1/stream")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    let mut frames = response.into_body().into_data_stream();

    let (status, _) = send(
        &app,
        post_booking(json!({ "showtime_id": 1, "customer_name": "Jane Doe", "phone_number": "555", "seats": 151 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        post_booking(json!({ "showtime_id": 2, "customer_name": "Jane Doe", "phone_number": "555", "seats": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, booking) = send(
        &app,
        post_booking(json!({ "showtime_id": 1, "customer_name": "Ada Lovelace", "phone_number": "555", "seats": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let booking_id = booking["booking_id"].as_i64().unwrap();

    let (name, data) = next_event(&mut frames).await;
    assert_eq!(name, "booked");
    assert_eq!(data["type"], "BOOKED");
    assert_eq!(data["showtime_id"], 1);
    assert_eq!(data["booking_id"], booking_id);
    assert_eq!(data["seats"], 3);
    assert_eq!(data["available_seats"], 147);

    let (status, _) = send(&app, delete(&format!("/v1/bookings/{booking_id}"))).await;
    assert_eq!(status, StatusCode::OK);

    let (name, data) = next_event(&mut frames).await;
    assert_eq!(name, "cancelled");
    assert_eq!(data["showtime_id"], 1);
    assert_eq!(data["available_seats"], 150);

    let quiet = tokio::time::timeout(Duration::from_millis(200), frames.next()).await;
    assert!(quiet.is_err(), "no further events for showtime 1");
}
