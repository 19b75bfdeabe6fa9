//! The service layer: per-connection state, the reactor-facing callbacks
//! and the worker-side request-processing routine.

mod conn_state;
mod reuse;
mod service_handler;

pub use conn_state::{InputState, OutputState, ServerConnState, StagedResponse};
pub use reuse::{ConnectionReuseStrategy, DefaultReuseStrategy};
pub use service_handler::{BuildError, ServiceHandler, ServiceHandlerBuilder};

use crate::context::HttpContext;
use crate::protocol::{HttpResponse, ProtocolError, RequestHead};

/// Policy consulted for requests that ask for `100 Continue`.
///
/// The verifier may leave the preliminary response untouched to accept the
/// expectation, raise its status to a final (≥ 200) one to reject it, or
/// fail with a protocol error that is mapped to an error response.
pub trait ExpectationVerifier: Send + Sync {
    fn verify(
        &self,
        request: &RequestHead,
        response: &mut HttpResponse,
        context: &HttpContext,
    ) -> Result<(), ProtocolError>;
}
