//! Bounded content buffers shared between the reactor and a worker thread.
//!
//! Each connection owns one [`SharedInputBuffer`] and one
//! [`SharedOutputBuffer`] of the same fixed capacity. The reactor side
//! never blocks: it fills the input buffer from a decoder and drains the
//! output buffer into an encoder. The worker side uses ordinary blocking
//! reads and writes. Whenever a buffer runs full or empty it signals the
//! connection's [`IoControl`](crate::reactor::IoControl) so the reactor
//! polls the socket only when the buffers can make progress; this is what
//! keeps per-connection memory bounded for entities of any size.
//!
//! The buffers hold a weak back-reference to the I/O control. After the
//! connection goes away the signals become no-ops.

mod content_stream;
mod shared_input;
mod shared_output;

pub use content_stream::ContentOutputStream;
pub use shared_input::SharedInputBuffer;
pub use shared_output::SharedOutputBuffer;

use std::io;

/// The error every blocked buffer or state wait fails with once the
/// connection shuts down.
pub(crate) fn interrupted() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "service interrupted")
}
