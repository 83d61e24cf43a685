//! tests/global_errors/500.rs
//! Exceptions, panics and trapped error events all map to a 500 problem.

#[path = "../common/mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

async fn get_problem(base_url: &str, path: &str) -> (StatusCode, Value) {
    let resp: reqwest::Response = reqwest::Client::new()
        .get(format!("{}{}", base_url, path))
        .header("Accept", "application/json")
        .send()
        .await
        .expect("Failed to make request.");

    let status: StatusCode = resp.status();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn returns_500_with_trace_on_exception() {
    let base_url: String = common::spawn_app();

    let (status, json) = get_problem(&base_url, "/error").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], 500);
    assert_eq!(json["title"], "Internal Server Error");
    assert_eq!(json["detail"], "Your SQL or password here");
    assert_eq!(json["exception"]["code"], 400);
    assert!(json["exception"]["class"].as_str().unwrap().ends_with("Exception"));
    assert!(json["exception"]["file"].as_str().unwrap().ends_with("server.rs"));
}

#[tokio::test]
async fn returns_500_on_panic() {
    let base_url: String = common::spawn_app();

    let (status, json) = get_problem(&base_url, "/panic").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["detail"], "Something went terribly wrong");
}

#[tokio::test]
async fn returns_500_on_trapped_error_event() {
    let base_url: String = common::spawn_app();

    let (status, json) = get_problem(&base_url, "/warn").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["detail"], "Cache backend unreachable cache=sessions");
}

#[tokio::test]
async fn problem_exceptions_keep_their_status() {
    let base_url: String = common::spawn_app();

    let (status, json) = get_problem(&base_url, "/problem").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["balance"], 30);
    assert_eq!(json["accounts"], serde_json::json!(["/account/12345", "/account/67890"]));
    assert!(json.get("exception").is_none());
}
