// Start of file: /src/middlewares/listener.rs

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::response::Response;
use tracing::warn;

use crate::models::{
    exception::{HandlerError, PanicException},
    request::RequestHead,
};

// * Observer notified after an error has been rendered
pub trait ErrorListener: Send + Sync + 'static {
    fn on_error(&self, error: &HandlerError, request: &RequestHead, response: &Response);
}

impl<F> ErrorListener for F
where
    F: Fn(&HandlerError, &RequestHead, &Response) + Send + Sync + 'static,
{
    fn on_error(&self, error: &HandlerError, request: &RequestHead, response: &Response) {
        self(error, request, response)
    }
}

/// Registered listeners in attach order. The same `Arc` is only kept once.
#[derive(Clone, Default)]
pub struct ErrorListeners {
    listeners: Vec<Arc<dyn ErrorListener>>,
}

impl ErrorListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when this exact listener was already attached.
    pub fn attach(&mut self, listener: Arc<dyn ErrorListener>) -> bool {
        let already: bool = self
            .listeners
            .iter()
            .any(|existing| std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(&listener)));
        if already {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Calls every listener in order. A listener that panics is reported
    /// and skipped; the rest still run.
    pub fn notify(&self, error: &HandlerError, request: &RequestHead, response: &Response) {
        for listener in &self.listeners {
            let outcome: std::thread::Result<()> = catch_unwind(AssertUnwindSafe(|| listener.on_error(error, request, response)));
            if let Err(payload) = outcome {
                warn!(
                    panic = %PanicException::from_payload(&*payload),
                    method = %request.method,
                    uri = %request.uri,
                    "Error listener panicked"
                );
            }
        }
    }
}

impl std::fmt::Debug for ErrorListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorListeners").field("len", &self.listeners.len()).finish()
    }
}

// End of file: /src/middlewares/listener.rs
