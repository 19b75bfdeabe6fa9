//! Request and response entity types seen by worker-side handlers.
//!
//! [`ReqBody`] gives handlers ordinary blocking reads over the
//! connection's input buffer; [`RespBody`] is the entity a handler
//! attaches to its response, later streamed through the output buffer.

mod req_body;
mod resp_body;

pub use req_body::ReqBody;
pub use resp_body::RespBody;
