//! HTTP request head handling.
//!
//! This module wraps the standard `http::Request` type into the head-only
//! form the reactor hands over once a request line and headers have been
//! parsed. The entity, if any, is attached later by the worker routine
//! after it wraps the connection's input buffer.

use http::header::{CONTENT_LENGTH, EXPECT, TRANSFER_ENCODING};
use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

use crate::protocol::PayloadSize;

/// An HTTP request head: request line plus headers, no entity.
#[derive(Debug)]
pub struct RequestHead {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHead {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl RequestHead {
    /// Consumes the head and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Attaches a body to this head, converting it into a full `Request<T>`.
    pub fn body<T>(self, body: T) -> Request<T> {
        self.inner.map(|_| body)
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// The framing of the request entity as declared by the headers.
    ///
    /// `Transfer-Encoding: chunked` wins over `Content-Length`; a missing
    /// or malformed `Content-Length` means no entity. Enforcing framing
    /// correctness is the codec's job, not this accessor's.
    pub fn payload_size(&self) -> PayloadSize {
        if let Some(te) = self.headers().get(TRANSFER_ENCODING) {
            if te.to_str().map(|v| v.to_ascii_lowercase().contains("chunked")).unwrap_or(false) {
                return PayloadSize::Chunked;
            }
        }
        match self
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            Some(0) | None => PayloadSize::Empty,
            Some(length) => PayloadSize::Length(length),
        }
    }

    /// True if the request declares an entity.
    pub fn is_entity_enclosing(&self) -> bool {
        !self.payload_size().is_empty()
    }

    /// True if the request asks for a `100 Continue` before sending its
    /// entity.
    pub fn expect_continue(&self) -> bool {
        match self.headers().get(EXPECT) {
            Some(value) => {
                let slice = value.as_bytes();
                slice.len() >= 4 && slice[0..4].eq_ignore_ascii_case(b"100-")
            }
            None => false,
        }
    }
}

impl Clone for RequestHead {
    fn clone(&self) -> Self {
        let mut builder = Request::builder()
            .method(self.method().clone())
            .uri(self.uri().clone())
            .version(self.version());
        if let Some(headers) = builder.headers_mut() {
            *headers = self.headers().clone();
        }
        // builder parts came from an already-valid request
        Self { inner: builder.body(()).unwrap() }
    }
}

/// Converts request parts into a RequestHead.
impl From<Parts> for RequestHead {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

/// Converts a bodyless request into a RequestHead.
impl From<Request<()>> for RequestHead {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(builder: http::request::Builder) -> RequestHead {
        builder.body(()).unwrap().into()
    }

    #[test]
    fn payload_size_from_content_length() {
        let get = head(Request::builder().method(Method::GET).uri("/"));
        assert_eq!(get.payload_size(), PayloadSize::Empty);
        assert!(!get.is_entity_enclosing());

        let post = head(Request::builder().method(Method::POST).uri("/e").header("content-length", "5"));
        assert_eq!(post.payload_size(), PayloadSize::Length(5));
        assert!(post.is_entity_enclosing());

        let zero = head(Request::builder().method(Method::POST).uri("/e").header("content-length", "0"));
        assert_eq!(zero.payload_size(), PayloadSize::Empty);
    }

    #[test]
    fn payload_size_chunked_wins() {
        let req = head(
            Request::builder()
                .method(Method::POST)
                .uri("/e")
                .header("transfer-encoding", "chunked")
                .header("content-length", "5"),
        );
        assert_eq!(req.payload_size(), PayloadSize::Chunked);
    }

    #[test]
    fn malformed_content_length_means_no_entity() {
        let req = head(Request::builder().method(Method::POST).uri("/e").header("content-length", "five"));
        assert_eq!(req.payload_size(), PayloadSize::Empty);
    }

    #[test]
    fn expect_continue_detection() {
        let req = head(
            Request::builder()
                .method(Method::POST)
                .uri("/e")
                .header("expect", "100-continue")
                .header("content-length", "5"),
        );
        assert!(req.expect_continue());

        let req = head(Request::builder().method(Method::POST).uri("/e").header("content-length", "5"));
        assert!(!req.expect_continue());
    }

    #[test]
    fn clone_preserves_head() {
        let req = head(
            Request::builder()
                .method(Method::PUT)
                .uri("/items/7?full=1")
                .version(Version::HTTP_11)
                .header("host", "example.org"),
        );
        let copy = req.clone();
        assert_eq!(copy.method(), &Method::PUT);
        assert_eq!(copy.uri().path(), "/items/7");
        assert_eq!(copy.version(), Version::HTTP_11);
        assert_eq!(copy.headers().get("host").unwrap(), "example.org");
    }
}
