// Start of file: /src/models/exception.rs

/*
    * Error types flowing through the problem details middleware.
    *
    * `HandlerError` is what a handler "throws". It is either a generic error
    * (anything implementing `std::error::Error`, always rendered as a 500) or
    * a problem details error that carries its own status, title, type, detail
    * and extension members.
*/

use std::any::{type_name, Any};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    BoxError,
};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::Level;

use crate::models::data::{Data, DataMap, Substitutions};

/// Canonical member names of a problem document, in output order.
pub const CANONICAL_KEYS: [&str; 4] = ["type", "title", "status", "detail"];

// * Capability set of an error that knows how to describe itself as a problem
pub trait ProblemDetailsError: Error + Send + Sync + 'static {
    fn status(&self) -> StatusCode;

    /// Problem type URI; empty means "derive from the status".
    fn type_uri(&self) -> &str;

    /// Short summary; empty means "use the reason phrase".
    fn title(&self) -> &str;

    fn detail(&self) -> &str;

    fn additional_data(&self) -> DataMap {
        DataMap::new()
    }

    fn class_name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// The additional data with the four canonical members laid over it.
    fn to_payload(&self) -> DataMap {
        let mut payload: DataMap = DataMap::new()
            .with("type", self.type_uri())
            .with("title", self.title())
            .with("status", self.status().as_u16())
            .with("detail", self.detail());

        // * Only the canonical members are present yet, and they win
        for (key, value) in self.additional_data() {
            if !payload.contains_key(&key) {
                payload.insert(key, value);
            }
        }
        payload
    }
}

/// Ready-made problem details error.
#[derive(Debug, Error)]
#[error("{detail}")]
pub struct ProblemDetailsException {
    status: StatusCode,
    detail: String,
    title: String,
    type_uri: String,
    additional: DataMap,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl ProblemDetailsException {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            title: String::new(),
            type_uri: String::new(),
            additional: DataMap::new(),
            source: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_type(mut self, type_uri: impl Into<String>) -> Self {
        self.type_uri = type_uri.into();
        self
    }

    pub fn with_additional(mut self, additional: impl Into<DataMap>) -> Self {
        self.additional = additional.into();
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Data>) -> Self {
        self.additional.insert(key, value);
        self
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl ProblemDetailsError for ProblemDetailsException {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn type_uri(&self) -> &str {
        &self.type_uri
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn detail(&self) -> &str {
        &self.detail
    }

    fn additional_data(&self) -> DataMap {
        self.additional.clone()
    }
}

impl Serialize for ProblemDetailsException {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut report: Substitutions = Substitutions::default();
        Data::Map(self.to_payload()).sanitize(&mut report).serialize(serializer)
    }
}

impl IntoResponse for ProblemDetailsException {
    fn into_response(self) -> Response {
        HandlerError::problem(self).into_response()
    }
}

/// General purpose runtime error with a numeric code and an optional cause.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Exception {
    message: String,
    code: i64,
    #[source]
    previous: Option<Box<dyn Error + Send + Sync>>,
    location: &'static Location<'static>,
}

impl Exception {
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 0,
            previous: None,
            location: Location::caller(),
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    pub fn with_previous(mut self, previous: impl Into<BoxError>) -> Self {
        self.previous = Some(previous.into());
        self
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

/// An error-level diagnostic promoted to an error while a request was handled.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ErrorException {
    pub message: String,
    pub severity: Level,
    pub target: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// A panic caught while a request was handled.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PanicException {
    pub message: String,
}

impl PanicException {
    pub fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message: String = if let Some(text) = payload.downcast_ref::<&'static str>() {
            (*text).to_owned()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "Box<dyn Any>".to_owned()
        };
        Self { message }
    }
}

/// A generic error together with where and how it was raised.
#[derive(Debug)]
pub struct GenericError {
    error: BoxError,
    class: &'static str,
    location: &'static Location<'static>,
    backtrace: Backtrace,
}

impl GenericError {
    pub fn error(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.error
    }

    pub fn class_name(&self) -> &'static str {
        self.class
    }

    /// Where the error was converted into a `HandlerError` (usually a `?`).
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Frames of the captured backtrace, empty unless backtraces are enabled.
    pub fn backtrace_frames(&self) -> Vec<String> {
        if self.backtrace.status() != BacktraceStatus::Captured {
            return Vec::new();
        }
        self.backtrace
            .to_string()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// An error raised by a request handler.
#[derive(Debug)]
pub enum HandlerError {
    Generic(GenericError),
    Problem(Box<dyn ProblemDetailsError>),
}

impl HandlerError {
    /// Wraps any error. A `ProblemDetailsException` lands in the problem variant.
    #[track_caller]
    pub fn new<E: Error + Send + Sync + 'static>(error: E) -> Self {
        Self::classify(Box::new(error), type_name::<E>(), Location::caller())
    }

    /// Wraps a custom problem details error.
    pub fn problem(error: impl ProblemDetailsError) -> Self {
        HandlerError::Problem(Box::new(error))
    }

    /// Wraps an already boxed error, such as the error of a tower service.
    #[track_caller]
    pub fn from_boxed(error: BoxError) -> Self {
        let class: &'static str = known_class(&*error).unwrap_or("dyn core::error::Error");
        Self::classify(error, class, Location::caller())
    }

    /// Wraps the payload of a caught panic.
    #[track_caller]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::new(PanicException::from_payload(&*payload))
    }

    fn classify(error: BoxError, class: &'static str, location: &'static Location<'static>) -> Self {
        match error.downcast::<ProblemDetailsException>() {
            Ok(problem) => HandlerError::Problem(problem),
            Err(error) => HandlerError::Generic(GenericError {
                error,
                class,
                location,
                backtrace: Backtrace::capture(),
            }),
        }
    }

    pub fn as_problem(&self) -> Option<&dyn ProblemDetailsError> {
        match self {
            HandlerError::Problem(problem) => Some(problem.as_ref()),
            HandlerError::Generic(_) => None,
        }
    }

    pub fn as_generic(&self) -> Option<&GenericError> {
        match self {
            HandlerError::Generic(generic) => Some(generic),
            HandlerError::Problem(_) => None,
        }
    }

    /// Status a response for this error carries. Generic errors are always 500.
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Problem(problem) => problem.status(),
            HandlerError::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            HandlerError::Problem(problem) => problem.class_name(),
            HandlerError::Generic(generic) => generic.class,
        }
    }

    pub fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HandlerError::Problem(problem) => problem.source(),
            HandlerError::Generic(generic) => generic.error.source(),
        }
    }

    /// Downcasts the wrapped generic error.
    pub fn downcast_ref<T: Error + 'static>(&self) -> Option<&T> {
        self.as_generic().and_then(|generic| generic.error.downcast_ref::<T>())
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Problem(problem) => fmt::Display::fmt(problem, f),
            HandlerError::Generic(generic) => fmt::Display::fmt(&generic.error, f),
        }
    }
}

impl<E: Error + Send + Sync + 'static> From<E> for HandlerError {
    #[track_caller]
    fn from(error: E) -> Self {
        HandlerError::new(error)
    }
}

fn known_class(error: &(dyn Error + Send + Sync + 'static)) -> Option<&'static str> {
    if error.is::<Exception>() {
        Some(type_name::<Exception>())
    } else if error.is::<ErrorException>() {
        Some(type_name::<ErrorException>())
    } else if error.is::<PanicException>() {
        Some(type_name::<PanicException>())
    } else if error.is::<tower::timeout::error::Elapsed>() {
        Some(type_name::<tower::timeout::error::Elapsed>())
    } else {
        None
    }
}

/// A `HandlerError` riding on a response's extensions from the handler that
/// raised it to the middleware that renders it.
#[derive(Debug, Clone)]
pub struct RaisedError(pub Arc<HandlerError>);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let mut response: Response = self.status().into_response();
        response.extensions_mut().insert(RaisedError(Arc::new(self)));
        response
    }
}

// End of file: /src/models/exception.rs
