// Start of file: /src/models/request.rs

use axum::http::{request::Parts, HeaderMap, Method, Request, Uri, Version};

// * The few request facts the problem details machinery reads
pub trait RequestInfo {
    /// All values of a header joined with `", "`, or an empty string.
    fn header_line(&self, name: &str) -> String;
    fn method(&self) -> &Method;
    fn uri(&self) -> &Uri;
}

fn join_header_values(headers: &HeaderMap, name: &str) -> String {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<&str>>()
        .join(", ")
}

impl<B> RequestInfo for Request<B> {
    fn header_line(&self, name: &str) -> String {
        join_header_values(self.headers(), name)
    }

    fn method(&self) -> &Method {
        Request::method(self)
    }

    fn uri(&self) -> &Uri {
        Request::uri(self)
    }
}

impl RequestInfo for Parts {
    fn header_line(&self, name: &str) -> String {
        join_header_values(&self.headers, name)
    }

    fn method(&self) -> &Method {
        &self.method
    }

    fn uri(&self) -> &Uri {
        &self.uri
    }
}

/// Body-less copy of a request, kept so listeners can see what was asked
/// after the request itself has been consumed by the handler.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
}

impl RequestHead {
    pub fn of<R: ?Sized + AsHead>(request: &R) -> Self {
        request.as_head()
    }
}

// * Anything a RequestHead can be copied from
pub trait AsHead {
    fn as_head(&self) -> RequestHead;
}

impl<B> AsHead for Request<B> {
    fn as_head(&self) -> RequestHead {
        RequestHead {
            method: self.method().clone(),
            uri: self.uri().clone(),
            version: self.version(),
            headers: self.headers().clone(),
        }
    }
}

impl AsHead for Parts {
    fn as_head(&self) -> RequestHead {
        RequestHead {
            method: self.method.clone(),
            uri: self.uri.clone(),
            version: self.version,
            headers: self.headers.clone(),
        }
    }
}

impl RequestInfo for RequestHead {
    fn header_line(&self, name: &str) -> String {
        join_header_values(&self.headers, name)
    }

    fn method(&self) -> &Method {
        &self.method
    }

    fn uri(&self) -> &Uri {
        &self.uri
    }
}

// End of file: /src/models/request.rs
