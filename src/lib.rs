// Start of file: /src/lib.rs

/*
    * Problem details (RFC 7807/9457) error handling for axum.
    *
    * `ProblemDetailsLayer` catches what a handler raises (a returned
    * `HandlerError`, a service error, a panic or a trapped error event) and
    * answers with `application/problem+json` or `application/problem+xml`
    * depending on the `Accept` header. `ProblemDetailsNotFoundHandler` does
    * the same for unmatched routes.
*/

pub mod config;
pub mod core;
pub mod middlewares;
pub mod models;
pub mod response;
pub mod routes;
pub mod utils;

pub use crate::config::problem_details::ProblemDetailsConfig;
pub use crate::middlewares::{
    listener::ErrorListener,
    problem_details::{ProblemDetailsLayer, ProblemDetailsMiddleware},
};
pub use crate::models::{
    data::{Data, DataMap},
    exception::{Exception, HandlerError, ProblemDetailsError, ProblemDetailsException},
    problem::ProblemDetails,
};
pub use crate::response::{factory::ProblemDetailsResponseFactory, prototype::ResponsePrototype};
pub use crate::routes::fallback_handler::{NotFoundLayer, ProblemDetailsNotFoundHandler};
pub use crate::utils::{json::JsonFlags, negotiation::Format};

// End of file: /src/lib.rs
