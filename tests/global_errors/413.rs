//! tests/global_errors/413.rs
//! Bodies above the configured limit (1KB in tests) answer with a 413 problem.

#[path = "../common/mod.rs"]
mod common;

use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde_json::Value;

#[tokio::test]
async fn returns_413_when_payload_exceeds_global_limit() {
    let base_url: String = common::spawn_app();

    let oversized_payload: Vec<u8> = vec![b'X'; 1024 + 100];

    let resp: reqwest::Response = reqwest::Client::new()
        .post(format!("{}/echo", base_url))
        .header("Accept", "application/problem+json")
        .body(oversized_payload)
        .send()
        .await
        .expect("Failed to send large request.");

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(resp.headers()[CONTENT_TYPE], "application/problem+json");

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], 413);
    assert_eq!(json["title"], "Payload Too Large");
}

#[tokio::test]
async fn small_payloads_are_echoed() {
    let base_url: String = common::spawn_app();

    let resp: reqwest::Response = reqwest::Client::new()
        .post(format!("{}/echo", base_url))
        .body("ping")
        .send()
        .await
        .expect("Failed to send request.");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ping");
}
