//! Worker-side request handlers and their URI-based resolution.

mod registry;

pub use registry::HandlerRegistry;

use std::sync::Arc;

use crate::context::HttpContext;
use crate::protocol::{HttpRequest, HttpResponse, ProtocolError};

/// A blocking request handler.
///
/// Runs on a worker thread with ordinary stream I/O: reading the request
/// entity parks the thread until the reactor feeds more bytes, and the
/// attached response entity is streamed out under the same backpressure.
/// Protocol failures raised here are turned into mapped error responses.
pub trait RequestHandler: Send + Sync {
    fn handle(
        &self,
        request: &mut HttpRequest,
        response: &mut HttpResponse,
        context: &HttpContext,
    ) -> Result<(), ProtocolError>;
}

/// Maps a request URI path to the handler that serves it.
pub trait HandlerResolver: Send + Sync {
    fn lookup(&self, path: &str) -> Option<Arc<dyn RequestHandler>>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> RequestHandler for HandlerFn<F>
where
    F: Fn(&mut HttpRequest, &mut HttpResponse, &HttpContext) -> Result<(), ProtocolError> + Send + Sync,
{
    fn handle(
        &self,
        request: &mut HttpRequest,
        response: &mut HttpResponse,
        context: &HttpContext,
    ) -> Result<(), ProtocolError> {
        (self.f)(request, response, context)
    }
}

/// Wraps a plain function as a [`RequestHandler`].
pub fn make_handler<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut HttpRequest, &mut HttpResponse, &HttpContext) -> Result<(), ProtocolError> + Send + Sync,
{
    HandlerFn { f }
}
