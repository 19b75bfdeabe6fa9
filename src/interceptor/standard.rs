//! Stock response interceptors.

use std::time::SystemTime;

use http::header::{DATE, SERVER};
use http::HeaderValue;
use httpdate::fmt_http_date;

use crate::context::HttpContext;
use crate::interceptor::ResponseInterceptor;
use crate::protocol::{HttpResponse, ProtocolError};

/// Adds a `Date` header to final responses that lack one.
#[derive(Default)]
pub struct ResponseDate;

impl ResponseInterceptor for ResponseDate {
    fn process(&self, response: &mut HttpResponse, _context: &HttpContext) -> Result<(), ProtocolError> {
        if response.status().is_informational() || response.headers().contains_key(DATE) {
            return Ok(());
        }
        let date = fmt_http_date(SystemTime::now());
        let value = HeaderValue::from_str(&date)
            .map_err(|_| ProtocolError::failure("formatted http date is not a valid header value"))?;
        response.headers_mut().insert(DATE, value);
        Ok(())
    }
}

/// Adds a `Server` header with the configured signature when absent.
pub struct ResponseServer {
    signature: HeaderValue,
}

impl ResponseServer {
    pub fn new(signature: HeaderValue) -> Self {
        Self { signature }
    }
}

impl ResponseInterceptor for ResponseServer {
    fn process(&self, response: &mut HttpResponse, _context: &HttpContext) -> Result<(), ProtocolError> {
        if !response.headers().contains_key(SERVER) {
            response.headers_mut().insert(SERVER, self.signature.clone());
        }
        Ok(())
    }
}
