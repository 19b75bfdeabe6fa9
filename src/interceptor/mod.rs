//! The request/response processing pipeline.
//!
//! The service handler runs every inbound message through an
//! [`HttpProcessor`] before resolving a handler, and every outbound
//! message through it before staging. [`Interceptors`] is the bundled
//! processor: an ordered chain of interceptors applied front to back.

mod standard;

pub use standard::{ResponseDate, ResponseServer};

use std::sync::Arc;

use crate::context::HttpContext;
use crate::protocol::{HttpRequest, HttpResponse, ProtocolError};

/// Processes messages crossing the connection, in both directions.
pub trait HttpProcessor: Send + Sync {
    fn process_request(&self, request: &mut HttpRequest, context: &HttpContext) -> Result<(), ProtocolError>;

    fn process_response(&self, response: &mut HttpResponse, context: &HttpContext) -> Result<(), ProtocolError>;
}

/// Mutates inbound requests before they reach a handler.
pub trait RequestInterceptor: Send + Sync {
    fn process(&self, request: &mut HttpRequest, context: &HttpContext) -> Result<(), ProtocolError>;
}

/// Mutates outbound responses before they are staged for transmission.
pub trait ResponseInterceptor: Send + Sync {
    fn process(&self, response: &mut HttpResponse, context: &HttpContext) -> Result<(), ProtocolError>;
}

/// An ordered interceptor chain.
#[derive(Default)]
pub struct Interceptors {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Interceptors {
    pub fn builder() -> InterceptorsBuilder {
        InterceptorsBuilder::new()
    }
}

impl HttpProcessor for Interceptors {
    fn process_request(&self, request: &mut HttpRequest, context: &HttpContext) -> Result<(), ProtocolError> {
        for interceptor in self.request.iter() {
            interceptor.process(request, context)?;
        }
        Ok(())
    }

    fn process_response(&self, response: &mut HttpResponse, context: &HttpContext) -> Result<(), ProtocolError> {
        for interceptor in self.response.iter() {
            interceptor.process(response, context)?;
        }
        Ok(())
    }
}

pub struct InterceptorsBuilder {
    inner: Interceptors,
}

impl InterceptorsBuilder {
    fn new() -> Self {
        Self { inner: Interceptors::default() }
    }

    pub fn on_request<I: RequestInterceptor + 'static>(mut self, interceptor: I) -> Self {
        self.inner.request.push(Arc::new(interceptor));
        self
    }

    pub fn on_response<I: ResponseInterceptor + 'static>(mut self, interceptor: I) -> Self {
        self.inner.response.push(Arc::new(interceptor));
        self
    }

    pub fn build(self) -> Interceptors {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Response;

    struct Marker(&'static str);

    impl ResponseInterceptor for Marker {
        fn process(&self, response: &mut HttpResponse, _context: &HttpContext) -> Result<(), ProtocolError> {
            response.headers_mut().append("x-chain", self.0.parse().unwrap());
            Ok(())
        }
    }

    struct Rejecting;

    impl RequestInterceptor for Rejecting {
        fn process(&self, _request: &mut HttpRequest, _context: &HttpContext) -> Result<(), ProtocolError> {
            Err(ProtocolError::violation("rejected by policy"))
        }
    }

    #[test]
    fn response_chain_runs_in_order() {
        let chain = Interceptors::builder().on_response(Marker("a")).on_response(Marker("b")).build();
        let mut response = Response::builder().body(None).unwrap();
        chain.process_response(&mut response, &HttpContext::new()).unwrap();

        let markers: Vec<_> = response.headers().get_all("x-chain").iter().map(|v| v.to_str().unwrap()).collect();
        assert_eq!(markers, ["a", "b"]);
    }

    #[test]
    fn request_chain_propagates_errors() {
        let chain = Interceptors::builder().on_request(Rejecting).build();
        let mut request = http::Request::builder().uri("/").body(None).unwrap();
        let err = chain.process_request(&mut request, &HttpContext::new()).unwrap_err();
        assert!(matches!(err, ProtocolError::Violation { .. }));
    }
}
