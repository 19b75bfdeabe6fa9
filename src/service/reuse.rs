//! Connection reuse policy.

use http::header::CONNECTION;
use http::Version;

use crate::context::HttpContext;
use crate::protocol::ResponseHead;

/// Decides whether a connection may serve another request after the given
/// response.
pub trait ConnectionReuseStrategy: Send + Sync {
    fn keep_alive(&self, response: &ResponseHead, context: &HttpContext) -> bool;
}

/// The stock policy: an explicit `Connection` header wins, otherwise
/// keep-alive iff the response speaks HTTP/1.1 or later.
///
/// Error responses are emitted at HTTP/1.0 precisely so this policy closes
/// their connections.
#[derive(Default)]
pub struct DefaultReuseStrategy;

impl ConnectionReuseStrategy for DefaultReuseStrategy {
    fn keep_alive(&self, response: &ResponseHead, _context: &HttpContext) -> bool {
        if let Some(value) = response.headers().get(CONNECTION) {
            if value.as_bytes().eq_ignore_ascii_case(b"close") {
                return false;
            }
            if value.as_bytes().eq_ignore_ascii_case(b"keep-alive") {
                return true;
            }
        }
        response.version() >= Version::HTTP_11
    }
}
