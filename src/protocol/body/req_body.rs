use std::io;
use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;

use crate::buffer::SharedInputBuffer;

/// A request entity backed by the connection's shared input buffer.
///
/// Handlers read it like any other `std::io::Read` stream; reads park the
/// worker until the reactor feeds more bytes, return `Ok(0)` at the end of
/// the entity, and fail with `ErrorKind::Interrupted` if the connection
/// shuts down underneath.
pub struct ReqBody {
    buffer: Arc<SharedInputBuffer>,
}

impl ReqBody {
    pub(crate) fn new(buffer: Arc<SharedInputBuffer>) -> Self {
        Self { buffer }
    }

    /// Reads the remaining entity into a single `Bytes`.
    pub fn bytes(mut self) -> io::Result<Bytes> {
        let mut collected = Vec::new();
        self.read_to_end(&mut collected)?;
        Ok(Bytes::from(collected))
    }
}

impl Read for ReqBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.buffer.read(buf)
    }
}

impl std::fmt::Debug for ReqBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqBody").field("buffered", &self.buffer.len()).finish()
    }
}
