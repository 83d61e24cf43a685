// Start of file: /src/utils/error_handling.rs

use axum::{http::StatusCode, BoxError};
use http_body_util::LengthLimitError;
use std::error::Error;
use tower::timeout::error::Elapsed;

use crate::models::exception::{HandlerError, ProblemDetailsException};

/*
    * Global error handler for middleware layers.
    * Errors raised by tower layers (timeouts, body limits) become problems with
    * a matching status; anything else stays a generic error. The returned
    * `HandlerError` is rendered by the problem details middleware above it.
*/
pub async fn handle_global_error(err: BoxError) -> HandlerError {
    if err.is::<Elapsed>() {
        return HandlerError::problem(
            ProblemDetailsException::new(StatusCode::REQUEST_TIMEOUT, "The request took too long to complete.")
                .with_source(err),
        );
    }

    let too_large: Option<String> = find_cause::<LengthLimitError>(&*err).map(ToString::to_string);
    if let Some(reason) = too_large {
        return HandlerError::problem(
            ProblemDetailsException::new(StatusCode::PAYLOAD_TOO_LARGE, format!("Request body too large: {reason}"))
                .with_source(err),
        );
    }

    HandlerError::from_boxed(err)
}

/*
    * Walks the error and its sources looking for a `T`
*/
pub fn find_cause<'a, T: Error + 'static>(err: &'a (dyn Error + 'static)) -> Option<&'a T> {
    let mut source: Option<&'a (dyn Error + 'static)> = Some(err);

    while let Some(s) = source {
        if let Some(typed) = s.downcast_ref::<T>() {
            return Some(typed);
        }
        source = s.source();
    }

    None
}

// End of file: /src/utils/error_handling.rs
