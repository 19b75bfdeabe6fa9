//! Blocking `std::io::Write` adapter over a connection's output buffer.

use std::io;
use std::io::Write;
use std::sync::Arc;

use crate::buffer::SharedOutputBuffer;

/// The stream a response entity writes itself through.
///
/// Writes park the worker while the buffer is full; [`close`](Self::close)
/// marks the entity complete, which lets the reactor finish the encoder.
pub struct ContentOutputStream {
    buffer: Arc<SharedOutputBuffer>,
}

impl ContentOutputStream {
    pub fn new(buffer: Arc<SharedOutputBuffer>) -> Self {
        Self { buffer }
    }

    /// Signals end-of-entity to the reactor-side producer.
    pub fn close(self) -> io::Result<()> {
        self.buffer.write_completed()
    }
}

impl Write for ContentOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buffer.flush()
    }
}
