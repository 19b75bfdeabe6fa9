//! The consumed reactor contract.
//!
//! The event loop, the socket transport and the byte-level HTTP codec live
//! outside this crate. They reach in through the traits here: the reactor
//! drives the [`ServiceHandler`](crate::service::ServiceHandler) callbacks
//! with a [`ServerConnection`] handle, hands entity bytes over as a
//! [`ContentDecoder`] and takes them back through a [`ContentEncoder`],
//! and the content buffers throttle it through [`IoControl`].

use std::io;
use std::sync::Arc;

use crate::context::HttpContext;
use crate::protocol::{PayloadItem, PayloadSize, ProtocolError, RequestHead, ResponseHead};

/// Per-connection handle for registering and clearing I/O interest.
///
/// The content buffers hold a weak reference to this handle and use it for
/// flow-control signalling only; after the connection goes away the
/// signals become no-ops.
pub trait IoControl: Send + Sync {
    /// Resume polling the socket for readability.
    fn request_input(&self);

    /// Stop polling the socket for readability.
    fn suspend_input(&self);

    /// Resume polling the socket for writability.
    fn request_output(&self);

    /// Stop polling the socket for writability.
    fn suspend_output(&self);
}

/// A server-side HTTP connection as the reactor exposes it to the service
/// handler.
pub trait ServerConnection: IoControl {
    /// The connection-scoped attribute table.
    fn context(&self) -> &HttpContext;

    /// Takes the request head most recently parsed off the wire.
    fn take_request(&self) -> Option<RequestHead>;

    /// Hands a response head to the connection for transmission. The
    /// entity, if `payload` says one follows, is drained from the output
    /// buffer through `output_ready`.
    fn submit_response(&self, head: &ResponseHead, payload: PayloadSize) -> io::Result<()>;

    /// True while a previously submitted response is still being written.
    fn is_response_submitted(&self) -> bool;

    /// Discards any not-yet-consumed bytes of the current request entity.
    fn reset_input(&self);

    /// Orderly close once the current exchange completes.
    fn close(&self);

    /// Immediate teardown of the underlying transport.
    fn shutdown(&self);
}

/// Non-blocking source of decoded entity bytes, supplied by the codec.
pub trait ContentDecoder {
    /// Pulls the next piece of the entity without blocking. `max` bounds
    /// the chunk size the caller can accept; implementations must not
    /// exceed it. `Ok(None)` means no input is available right now.
    fn pull(&mut self, max: usize) -> io::Result<Option<PayloadItem>>;

    /// True once the whole entity has been delivered.
    fn is_completed(&self) -> bool;
}

/// Non-blocking sink of entity bytes, supplied by the codec.
pub trait ContentEncoder {
    /// Pushes entity bytes without blocking. Returns how many were
    /// accepted, possibly zero.
    fn push(&mut self, src: &[u8]) -> io::Result<usize>;

    /// Marks the entity complete, letting the codec emit trailing framing.
    fn complete(&mut self) -> io::Result<()>;

    /// True once the entity has been completed.
    fn is_completed(&self) -> bool;
}

/// Observer of connection lifecycle and fatal failures.
///
/// All methods default to no-ops so implementors override only what they
/// watch.
pub trait EventListener: Send + Sync {
    fn connection_open(&self, _conn: &dyn ServerConnection) {}

    fn connection_closed(&self, _conn: &dyn ServerConnection) {}

    fn fatal_io_error(&self, _err: &io::Error, _conn: &dyn ServerConnection) {}

    fn fatal_protocol_error(&self, _err: &ProtocolError, _conn: &dyn ServerConnection) {}
}

/// Context attribute wrapper for the connection handle, stored under
/// [`HTTP_CONNECTION`](crate::context::HTTP_CONNECTION).
#[derive(Clone)]
pub struct ConnectionHandle(pub Arc<dyn ServerConnection>);
