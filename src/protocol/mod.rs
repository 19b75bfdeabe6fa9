//! Protocol-level vocabulary shared by the reactor side and the worker side.
//!
//! The types here wrap the `http` crate's message model the same way the
//! rest of the crate consumes it: heads are `http::Request`/`http::Response`
//! with a placeholder body, entity data travels as [`PayloadItem`] chunks,
//! and framing expectations are summarized by [`PayloadSize`].

pub mod body;
mod error;
mod message;
mod request;
mod response;

pub use error::{HttpError, ProtocolError};
pub use message::{PayloadItem, PayloadSize};
pub use request::RequestHead;
pub use response::{can_response_have_body, clone_response_head, ResponseHead};

use body::{ReqBody, RespBody};
use http::{Request, Response};

/// The request message a worker-side handler receives: parsed head plus an
/// optional blocking-readable entity.
pub type HttpRequest = Request<Option<ReqBody>>;

/// The response message a worker-side handler produces: head plus an
/// optional entity that will be streamed through the output buffer.
pub type HttpResponse = Response<Option<RespBody>>;
