//! tests/common/mod.rs
//! A shared test helper to spawn the demo app on an ephemeral port.

use std::collections::HashMap;

use axum::{serve, Router};
use axum_problem_details::config::{environment::EnvironmentVariables, state::AppState};
use axum_problem_details::core::server::create_app;
use tokio::net::TcpListener as TokioTcpListener;

/// Spawns the app on a random unused port and returns its base URL.
///
/// The app runs in debug mode with a one second timeout and a 1KB body limit.
pub fn spawn_app() -> String {
    let vars: HashMap<String, String> = [
        ("ENVIRONMENT", "development"),
        ("DEFAULT_TIMEOUT_SECONDS", "1"),
        ("MAX_REQUEST_BODY_SIZE", "1024"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value.to_owned()))
    .collect();

    let env: EnvironmentVariables = EnvironmentVariables::from_vars(&vars).expect("Failed to build test environment");
    let app: Router = create_app(AppState::new(env));

    // * Bind an ephemeral port using std::net::TcpListener.
    let std_listener: std::net::TcpListener = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    std_listener.set_nonblocking(true).unwrap();

    // * Convert std::net::TcpListener to tokio::net::TcpListener.
    let tokio_listener: TokioTcpListener = TokioTcpListener::from_std(std_listener)
        .expect("Failed to convert to tokio listener");

    let addr: std::net::SocketAddr = tokio_listener.local_addr().unwrap();

    // * Spawn the server in a background task.
    tokio::spawn(async move {
        serve(tokio_listener, app)
            .await
            .expect("Server failed");
    });

    format!("http://{}", addr)
}
