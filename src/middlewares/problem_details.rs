// Start of file: /src/middlewares/problem_details.rs

/*
    * Error handling middleware rendering problem details.
    *
    * Requests whose `Accept` header negotiates neither JSON nor XML are passed
    * through untouched, errors included. For the others the inner service runs
    * under the warning trap and anything it "throws" is rendered by the
    * response factory:
    *   - a trapped tracing event (always wins, it happened first)
    *   - a response carrying a `RaisedError` (a handler returned `HandlerError`)
    *   - an `Err` from the inner service
    *   - a panic
    * Listeners are notified with the rendered response before it is returned.
*/

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::Request,
    http::header::ACCEPT,
    response::Response,
    BoxError,
};
use futures_util::future::{BoxFuture, FutureExt};
use tower::{Layer, Service};
use tracing::debug;

use crate::config::problem_details::ProblemDetailsConfig;
use crate::middlewares::{
    listener::{ErrorListener, ErrorListeners},
    warning_trap::{TrapSlot, WarningTrap},
};
use crate::models::{
    exception::{HandlerError, RaisedError},
    request::{RequestHead, RequestInfo},
};
use crate::response::factory::ProblemDetailsResponseFactory;
use crate::utils::negotiation::negotiate;

#[derive(Clone, Debug)]
pub struct ProblemDetailsLayer {
    factory: Arc<ProblemDetailsResponseFactory>,
    listeners: Arc<ErrorListeners>,
    trap: Arc<WarningTrap>,
}

impl ProblemDetailsLayer {
    pub fn new(factory: Arc<ProblemDetailsResponseFactory>) -> Self {
        let trap: WarningTrap = WarningTrap::new(factory.config().trap_level);
        Self {
            factory,
            listeners: Arc::new(ErrorListeners::new()),
            trap: Arc::new(trap),
        }
    }

    pub fn from_config(config: ProblemDetailsConfig) -> Self {
        Self::new(Arc::new(ProblemDetailsResponseFactory::new(config)))
    }

    /// Registers a listener. Attaching the same `Arc` twice is a no-op.
    pub fn attach_listener(&mut self, listener: Arc<dyn ErrorListener>) -> bool {
        Arc::make_mut(&mut self.listeners).attach(listener)
    }

    pub fn with_listener(mut self, listener: Arc<dyn ErrorListener>) -> Self {
        self.attach_listener(listener);
        self
    }

    pub fn factory(&self) -> &Arc<ProblemDetailsResponseFactory> {
        &self.factory
    }
}

impl<S> Layer<S> for ProblemDetailsLayer {
    type Service = ProblemDetailsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ProblemDetailsMiddleware {
            inner,
            factory: self.factory.clone(),
            listeners: self.listeners.clone(),
            trap: self.trap.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProblemDetailsMiddleware<S> {
    inner: S,
    factory: Arc<ProblemDetailsResponseFactory>,
    listeners: Arc<ErrorListeners>,
    trap: Arc<WarningTrap>,
}

impl<S, B> Service<Request<B>> for ProblemDetailsMiddleware<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError> + Send,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        // * The clone goes back in place, the instance that was polled ready is used
        let clone: S = self.inner.clone();
        let mut inner: S = std::mem::replace(&mut self.inner, clone);

        let accept: String = request.header_line(ACCEPT.as_str());
        if negotiate(&accept).is_none() {
            debug!(accept = %accept, "No problem details representation acceptable, passing through");
            return Box::pin(inner.call(request));
        }

        let head: RequestHead = RequestHead::of(&request);
        let factory: Arc<ProblemDetailsResponseFactory> = self.factory.clone();
        let listeners: Arc<ErrorListeners> = self.listeners.clone();
        let trap: Arc<WarningTrap> = self.trap.clone();

        Box::pin(async move {
            let slot: TrapSlot = TrapSlot::default();
            let handled = async move { inner.call(request).await };

            let outcome: std::thread::Result<Result<Response, S::Error>> = if trap.is_enabled() {
                AssertUnwindSafe(trap.instrument(slot.clone(), handled)).catch_unwind().await
            } else {
                AssertUnwindSafe(handled).catch_unwind().await
            };

            let error: Arc<HandlerError> = match (slot.take(), outcome) {
                (Some(trapped), _) => Arc::new(HandlerError::new(trapped)),
                (None, Ok(Ok(mut response))) => match response.extensions_mut().remove::<RaisedError>() {
                    Some(RaisedError(raised)) => raised,
                    None => return Ok(response),
                },
                (None, Ok(Err(err))) => Arc::new(HandlerError::from_boxed(err.into())),
                (None, Err(payload)) => Arc::new(HandlerError::from_panic(payload)),
            };

            debug!(
                status = %error.status(),
                class = error.class_name(),
                method = %head.method,
                uri = %head.uri,
                "Rendering problem details for raised error"
            );

            let response: Response = factory.create_response_from_error(&head, &error);
            listeners.notify(&error, &head, &response);
            Ok(response)
        })
    }
}

// End of file: /src/middlewares/problem_details.rs
