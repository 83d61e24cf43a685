//! tests/global_errors/404.rs
//! Unknown routes answer with a 404 problem, or a bare 404 when the client
//! accepts neither JSON nor XML.

#[path = "../common/mod.rs"]
mod common;

use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde_json::Value;

#[tokio::test]
async fn returns_404_problem_for_nonexistent_route() {
    let base_url: String = common::spawn_app();

    let resp: reqwest::Response = reqwest::Client::new()
        .delete(format!("{}/does-not-exist", base_url))
        .header("Accept", "application/json")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()[CONTENT_TYPE], "application/problem+json");

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], 404);
    assert_eq!(json["title"], "Not Found");
    assert_eq!(json["type"], "https://httpstatus.es/404");
    assert_eq!(json["detail"], "Cannot DELETE /does-not-exist!");
}

#[tokio::test]
async fn returns_xml_problem_when_xml_is_preferred() {
    let base_url: String = common::spawn_app();

    let resp: reqwest::Response = reqwest::Client::new()
        .get(format!("{}/does-not-exist", base_url))
        .header("Accept", "application/xml, application/json;q=0.5")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()[CONTENT_TYPE], "application/problem+xml");

    let body: String = resp.text().await.unwrap();
    assert!(body.starts_with("<?xml"));
    assert!(body.contains("<status>404</status>"));
}

#[tokio::test]
async fn returns_bare_404_for_html_clients() {
    let base_url: String = common::spawn_app();

    let resp: reqwest::Response = reqwest::Client::new()
        .get(format!("{}/does-not-exist", base_url))
        .header("Accept", "text/html")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.headers().get(CONTENT_TYPE).is_none());
    assert!(resp.text().await.unwrap().is_empty());
}
