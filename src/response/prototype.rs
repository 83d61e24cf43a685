// Start of file: /src/response/prototype.rs

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, StatusCode, Version},
    response::Response,
};

type ResponseFn = dyn Fn() -> Response + Send + Sync;

/*
    * Source of the fresh responses problem documents are written into.
    * Whatever it yields, the factory then sets the status, the content type
    * and the body.
*/
#[derive(Clone, Default)]
pub enum ResponsePrototype {
    /// An empty `Response`.
    #[default]
    Default,
    /// Any closure producing a response.
    Callable(Arc<ResponseFn>),
    /// Headers and version copied onto every response.
    Template { headers: HeaderMap, version: Version },
}

impl ResponsePrototype {
    pub fn callable<F>(factory: F) -> Self
    where
        F: Fn() -> Response + Send + Sync + 'static,
    {
        ResponsePrototype::Callable(Arc::new(factory))
    }

    pub fn template(headers: HeaderMap) -> Self {
        ResponsePrototype::Template { headers, version: Version::HTTP_11 }
    }

    /// A fresh response with `status` applied.
    pub fn create(&self, status: StatusCode) -> Response {
        let mut response: Response = match self {
            ResponsePrototype::Default => Response::new(Body::empty()),
            ResponsePrototype::Callable(factory) => factory(),
            ResponsePrototype::Template { headers, version } => {
                let mut response: Response = Response::new(Body::empty());
                *response.headers_mut() = headers.clone();
                *response.version_mut() = *version;
                response
            }
        };

        *response.status_mut() = status;
        response
    }
}

impl fmt::Debug for ResponsePrototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponsePrototype::Default => f.write_str("Default"),
            ResponsePrototype::Callable(_) => f.write_str("Callable(..)"),
            ResponsePrototype::Template { headers, version } => f
                .debug_struct("Template")
                .field("headers", headers)
                .field("version", version)
                .finish(),
        }
    }
}

// End of file: /src/response/prototype.rs
