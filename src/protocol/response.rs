//! HTTP response head handling.

use http::{Method, Response, StatusCode};

/// Type alias for HTTP response heads.
///
/// This type represents the header portion of an HTTP response, using
/// `http::Response<()>` with an empty body placeholder. The entity, when
/// present, is streamed separately through the connection's output buffer.
pub type ResponseHead = Response<()>;

/// Whether a response to the given request method may carry an entity.
///
/// HEAD responses and 1xx/204/304 statuses never carry one.
pub fn can_response_have_body(method: &Method, status: StatusCode) -> bool {
    if method == Method::HEAD {
        return false;
    }
    !(status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED)
}

/// Rebuilds a response head from its parts.
///
/// `http::Response` does not implement `Clone`; the status, version and
/// headers all do.
pub fn clone_response_head(head: &ResponseHead) -> ResponseHead {
    let mut copy = Response::new(());
    *copy.status_mut() = head.status();
    *copy.version_mut() = head.version();
    *copy.headers_mut() = head.headers().clone();
    copy
}
