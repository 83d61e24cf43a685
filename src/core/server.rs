// Start of file: /src/core/server.rs

// * Demo server: every way a handler can fail, rendered as problem details

use std::time::Duration;

use anyhow::Result;
use axum::{
    body::Bytes,
    error_handling::HandleErrorLayer,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use listenfd::ListenFd;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, signal};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tracing::{error, info};

use crate::config::{environment::EnvironmentVariables, state::AppState};
use crate::middlewares::problem_details::ProblemDetailsLayer;
use crate::models::exception::{Exception, HandlerError, ProblemDetailsException};
use crate::routes::fallback_handler::ProblemDetailsNotFoundHandler;
use crate::utils::error_handling::handle_global_error;

/// Creates and configures the application router with all middleware layers
pub fn create_app(state: AppState) -> Router {
    let env: &EnvironmentVariables = &state.environment;

    Router::new()
        .route("/hello", get(hello))
        .route("/error", get(raise_exception))
        .route("/problem", get(raise_problem))
        .route("/panic", get(raise_panic))
        .route("/warn", get(emit_error_event))
        .route("/timeout", get(sleep_past_timeout))
        .route("/echo", post(echo))
        .fallback_service(ProblemDetailsNotFoundHandler::new(state.factory.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(ProblemDetailsLayer::new(state.factory.clone()))
                .layer(HandleErrorLayer::new(handle_global_error))
                .layer(TimeoutLayer::new(Duration::from_secs(env.default_timeout_seconds)))
                .layer(DefaultBodyLimit::max(env.max_request_body_size)),
        )
        .with_state(state)
}

async fn hello(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Hello, World!",
        "environment": state.environment.environment,
    }))
}

async fn raise_exception() -> Result<Json<Value>, HandlerError> {
    Err(Exception::new("Your SQL or password here").with_code(400).into())
}

#[derive(Debug, Deserialize)]
struct ProblemQuery {
    account: Option<String>,
}

async fn raise_problem(Query(query): Query<ProblemQuery>) -> Result<Json<Value>, HandlerError> {
    let account: String = query.account.unwrap_or_else(|| "12345".to_owned());

    Err(ProblemDetailsException::new(StatusCode::FORBIDDEN, "Your current balance is 30, but that costs 50.")
        .with_title("You do not have enough credit.")
        .with_type("https://example.com/probs/out-of-credit")
        .with_extension("balance", 30)
        .with_extension("accounts", vec![format!("/account/{account}"), "/account/67890".to_owned()])
        .into())
}

async fn raise_panic() -> Json<Value> {
    panic!("Something went terribly wrong")
}

async fn emit_error_event() -> Json<Value> {
    error!(cache = "sessions", "Cache backend unreachable");
    Json(json!({ "message": "served from the slow path" }))
}

async fn sleep_past_timeout(State(state): State<AppState>) -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(state.environment.default_timeout_seconds + 1)).await;
    Json(json!({ "message": "too late" }))
}

async fn echo(body: Result<Bytes, BytesRejection>) -> Result<Bytes, HandlerError> {
    body.map_err(|rejection| {
        HandlerError::problem(ProblemDetailsException::new(rejection.status(), rejection.body_text()))
    })
}

/// Sets up the TCP listener from environment or binds to new address
pub async fn setup_listener(env: &EnvironmentVariables) -> Result<TcpListener> {
    let mut listenfd: ListenFd = ListenFd::from_env();

    let listener: TcpListener = match listenfd.take_tcp_listener(0)? {
        Some(std_listener) => {
            std_listener.set_nonblocking(true)?;
            TcpListener::from_std(std_listener)?
        }
        None => {
            let addr: String = format!("{}:{}", env.host, env.port);
            TcpListener::bind(&addr).await?
        }
    };

    Ok(listener)
}

/// Handles graceful shutdown signals (Ctrl+C and TERM)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for TERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Shutting down via Ctrl+C"),
        _ = terminate => info!("Shutting down via TERM signal"),
    }
}

// End of file: /src/core/server.rs
