// Start of file: /src/models/problem.rs

/*
    * A problem document in the making.
    *
    * `ProblemDetails` holds the canonical members, the extension members and,
    * in debug mode, a description of the error chain. `into_document` merges
    * them in output order and sanitizes the extension data so the result can
    * be handed to either encoder.
*/

use std::error::Error;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::data::{DataMap, Substitutions};
use crate::models::exception::{
    ErrorException, Exception, GenericError, HandlerError, PanicException, CANONICAL_KEYS,
};

/// How many causes deep an exception trace goes.
pub const MAX_TRACE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct ProblemDetails {
    pub status: StatusCode,
    pub type_uri: String,
    pub title: String,
    pub detail: String,
    pub additional: DataMap,
    pub exception: Option<ExceptionTrace>,
}

impl ProblemDetails {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            type_uri: String::new(),
            title: String::new(),
            detail: detail.into(),
            additional: DataMap::new(),
            exception: None,
        }
    }

    /// Canonical members first, then extension members that do not collide
    /// with them, then the exception trace.
    pub fn into_document(self) -> ProblemDocument {
        let mut substitutions: Substitutions = Substitutions::default();
        let mut fields: Map<String, Value> = Map::new();

        fields.insert("type".into(), Value::String(self.type_uri));
        fields.insert("title".into(), Value::String(self.title));
        fields.insert("status".into(), Value::from(self.status.as_u16()));
        fields.insert("detail".into(), Value::String(self.detail));

        for (key, value) in self.additional {
            if CANONICAL_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(value) = value.sanitize(&mut substitutions) {
                fields.insert(key, value);
            }
        }

        if let Some(trace) = self.exception.and_then(|trace| serde_json::to_value(trace).ok()) {
            fields.insert("exception".into(), trace);
        }

        ProblemDocument { fields, substitutions }
    }
}

/// Debug description of an error and, nested under `stack`, its causes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionTrace {
    pub class: String,
    pub code: i64,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub trace: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stack: Vec<ExceptionTrace>,
}

impl ExceptionTrace {
    /// Traces a generic handler error. Problem details errors describe
    /// themselves and get no trace.
    pub fn of_handler_error(error: &HandlerError) -> Option<Self> {
        error.as_generic().map(Self::of_generic)
    }

    fn of_generic(generic: &GenericError) -> Self {
        let mut trace: ExceptionTrace = Self::describe(generic.error(), 0);
        trace.class = generic.class_name().to_owned();
        trace.trace = generic.backtrace_frames();
        if trace.file.is_none() {
            trace.file = Some(generic.location().file().to_owned());
            trace.line = Some(generic.location().line());
        }
        trace
    }

    /// Describes `error` and walks its `source` chain, stopping at
    /// [`MAX_TRACE_DEPTH`].
    pub fn of_error(error: &(dyn Error + 'static)) -> Self {
        Self::describe(error, 0)
    }

    fn describe(error: &(dyn Error + 'static), depth: usize) -> Self {
        let mut trace: ExceptionTrace = ExceptionTrace {
            class: class_of(error),
            code: 0,
            message: error.to_string(),
            file: None,
            line: None,
            trace: Vec::new(),
            stack: Vec::new(),
        };

        if let Some(exception) = error.downcast_ref::<Exception>() {
            trace.code = exception.code();
            trace.file = Some(exception.location().file().to_owned());
            trace.line = Some(exception.location().line());
        } else if let Some(promoted) = error.downcast_ref::<ErrorException>() {
            trace.file = promoted.file.clone();
            trace.line = promoted.line;
        }

        if depth + 1 < MAX_TRACE_DEPTH {
            if let Some(cause) = error.source() {
                trace.stack.push(Self::describe(cause, depth + 1));
            }
        }
        trace
    }

    /// Number of nodes in this trace, itself included.
    pub fn depth(&self) -> usize {
        1 + self.stack.first().map_or(0, ExceptionTrace::depth)
    }
}

fn class_of(error: &(dyn Error + 'static)) -> String {
    if error.is::<Exception>() {
        return std::any::type_name::<Exception>().to_owned();
    }
    if error.is::<ErrorException>() {
        return std::any::type_name::<ErrorException>().to_owned();
    }
    if error.is::<PanicException>() {
        return std::any::type_name::<PanicException>().to_owned();
    }

    // ? Unknown concrete type: the leading identifier of its Debug output
    let debug: String = format!("{error:?}");
    let class: String = debug
        .chars()
        .take_while(|ch| ch.is_alphanumeric() || *ch == '_' || *ch == ':')
        .collect();
    if class.is_empty() {
        "dyn core::error::Error".to_owned()
    } else {
        class
    }
}

/// A merged, sanitized problem document ready to encode.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemDocument {
    fields: Map<String, Value>,
    substitutions: Substitutions,
}

impl ProblemDocument {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// What sanitizing the extension members had to replace or drop.
    pub fn substitutions(&self) -> Substitutions {
        self.substitutions
    }

    /// Just the four canonical members.
    pub fn canonical_fields(&self) -> Map<String, Value> {
        CANONICAL_KEYS
            .iter()
            .filter_map(|key| self.fields.get(*key).map(|value| ((*key).to_owned(), value.clone())))
            .collect()
    }
}

// End of file: /src/models/problem.rs
