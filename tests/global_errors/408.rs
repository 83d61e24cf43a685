//! tests/global_errors/408.rs
//! Requests outliving the server timeout answer with a 408 problem.

#[path = "../common/mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn returns_408_when_request_times_out() {
    let base_url: String = common::spawn_app();

    // The /timeout route sleeps one second longer than the server timeout.
    let resp_result: Result<Result<reqwest::Response, reqwest::Error>, tokio::time::error::Elapsed> = timeout(
        Duration::from_secs(5),
        async {
            reqwest::Client::new()
                .get(format!("{}/timeout", base_url))
                .header("Accept", "application/json")
                .send()
                .await
        }
    )
    .await;

    assert!(resp_result.is_ok(), "Client timed out waiting for server.");

    let resp: reqwest::Response = resp_result.unwrap().expect("Request failed unexpectedly.");
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], 408);
    assert_eq!(json["title"], "Request Timeout");
    assert_eq!(json["detail"], "The request took too long to complete.");
}
