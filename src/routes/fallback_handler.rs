// Start of file: /src/routes/fallback_handler.rs

/*
    * Not-found fallback rendering a 404 problem.
    *
    * Mount it with `Router::fallback_service`, or wrap another fallback with
    * `NotFoundLayer`. When the request accepts neither JSON nor XML problems,
    * the wrapped "next" service answers instead.
*/

use std::convert::Infallible;
use std::future::{ready, Ready};
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::Request,
    http::{header::ACCEPT, StatusCode},
    response::Response,
};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};
use tracing::debug;

use crate::models::request::RequestInfo;
use crate::response::factory::ProblemDetailsResponseFactory;
use crate::utils::negotiation::negotiate;

/// Next handler used when none is given: an empty 404.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyNotFound;

impl<B> Service<Request<B>> for EmptyNotFound {
    type Response = Response;
    type Error = Infallible;
    type Future = Ready<Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _request: Request<B>) -> Self::Future {
        let mut response: Response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NOT_FOUND;
        ready(Ok(response))
    }
}

#[derive(Clone, Debug)]
pub struct ProblemDetailsNotFoundHandler<S = EmptyNotFound> {
    factory: Arc<ProblemDetailsResponseFactory>,
    next: S,
}

impl ProblemDetailsNotFoundHandler {
    pub fn new(factory: Arc<ProblemDetailsResponseFactory>) -> Self {
        Self { factory, next: EmptyNotFound }
    }
}

impl<S> ProblemDetailsNotFoundHandler<S> {
    pub fn with_next(factory: Arc<ProblemDetailsResponseFactory>, next: S) -> Self {
        Self { factory, next }
    }
}

impl<S, B> Service<Request<B>> for ProblemDetailsNotFoundHandler<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        // ? Cannot represent a problem for this client, act as a no-op
        if negotiate(&request.header_line(ACCEPT.as_str())).is_none() {
            let clone: S = self.next.clone();
            let mut next: S = std::mem::replace(&mut self.next, clone);
            return Box::pin(next.call(request));
        }

        let detail: String = format!("Cannot {} {}!", request.method(), request.uri());
        debug!(method = %request.method(), uri = %request.uri(), "No route matched");

        let response: Response =
            self.factory
                .create_response(&request, StatusCode::NOT_FOUND, detail, None, None, None);
        Box::pin(async move { Ok(response) })
    }
}

/// Wraps a fallback service so representable requests get a 404 problem.
#[derive(Clone, Debug)]
pub struct NotFoundLayer {
    factory: Arc<ProblemDetailsResponseFactory>,
}

impl NotFoundLayer {
    pub fn new(factory: Arc<ProblemDetailsResponseFactory>) -> Self {
        Self { factory }
    }
}

impl<S> Layer<S> for NotFoundLayer {
    type Service = ProblemDetailsNotFoundHandler<S>;

    fn layer(&self, next: S) -> Self::Service {
        ProblemDetailsNotFoundHandler::with_next(self.factory.clone(), next)
    }
}

// End of file: /src/routes/fallback_handler.rs
