//! The outbound half of the reactor/worker bridge.

use std::cmp;
use std::io;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, Weak};

use bytes::{Buf, BytesMut};

use crate::buffer::interrupted;
use crate::reactor::{ContentEncoder, IoControl};

/// A bounded byte buffer fed by a worker thread and drained by the reactor.
///
/// The worker appends entity bytes through the blocking
/// [`write`](Self::write); the reactor drains them into an encoder through
/// [`produce_content`](Self::produce_content) without ever blocking. A
/// full buffer parks the worker until the reactor drains, an empty one
/// suspends reactor output interest, so a response of any size streams
/// through at most `capacity` bytes of memory.
pub struct SharedOutputBuffer {
    capacity: usize,
    io_control: Weak<dyn IoControl>,
    inner: Mutex<Inner>,
    cond: Condvar,
}

struct Inner {
    buffer: BytesMut,
    end_of_stream: bool,
    shutdown: bool,
}

impl SharedOutputBuffer {
    pub fn new(capacity: usize, io_control: Weak<dyn IoControl>) -> Self {
        Self {
            capacity,
            io_control,
            inner: Mutex::new(Inner {
                buffer: BytesMut::with_capacity(capacity),
                end_of_stream: false,
                shutdown: false,
            }),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocking write of entity bytes.
    ///
    /// Invoked by a worker thread. Parks on a full buffer until the
    /// reactor drains it or the connection shuts down
    /// (`ErrorKind::Interrupted`). The empty-to-non-empty transition
    /// requests reactor output interest. Writing after
    /// [`write_completed`](Self::write_completed) fails with
    /// `ErrorKind::BrokenPipe`.
    pub fn write(&self, src: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        if inner.shutdown {
            return Err(interrupted());
        }
        if inner.end_of_stream {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "buffer already closed for writing"));
        }
        let mut written = 0;
        while written < src.len() {
            if inner.buffer.len() >= self.capacity {
                self.signal(|c: &dyn IoControl| c.request_output());
                inner = self.cond.wait(inner).unwrap_or_else(PoisonError::into_inner);
                if inner.shutdown {
                    return Err(interrupted());
                }
                continue;
            }
            let was_empty = inner.buffer.is_empty();
            let room = self.capacity - inner.buffer.len();
            let chunk = cmp::min(room, src.len() - written);
            inner.buffer.extend_from_slice(&src[written..written + chunk]);
            written += chunk;
            if was_empty {
                self.signal(|c: &dyn IoControl| c.request_output());
            }
        }
        Ok(written)
    }

    /// Ensures the reactor has been signalled about pending content; does
    /// not wait for the drain.
    pub fn flush(&self) -> io::Result<()> {
        let inner = self.lock();
        if !inner.shutdown && !inner.buffer.is_empty() {
            self.signal(|c: &dyn IoControl| c.request_output());
        }
        Ok(())
    }

    /// Drains the buffer into the encoder without blocking.
    ///
    /// Invoked by the reactor thread. Once the buffer runs empty, a
    /// completed entity completes the encoder while an unfinished one
    /// suspends reactor output interest. Returns the number of bytes
    /// transferred.
    pub fn produce_content(&self, encoder: &mut dyn ContentEncoder) -> io::Result<usize> {
        let mut inner = self.lock();
        if inner.shutdown {
            return Err(interrupted());
        }
        let mut total = 0;
        while !inner.buffer.is_empty() {
            let pushed = encoder.push(&inner.buffer)?;
            if pushed == 0 {
                break;
            }
            inner.buffer.advance(pushed);
            total += pushed;
        }
        if inner.buffer.is_empty() {
            if inner.end_of_stream && !encoder.is_completed() {
                encoder.complete()?;
            }
            if !inner.end_of_stream {
                self.signal(|c: &dyn IoControl| c.suspend_output());
            }
        }
        self.cond.notify_all();
        Ok(total)
    }

    /// Worker-side end-of-entity signal.
    ///
    /// Requests reactor output interest so the encoder can be completed
    /// even if no bytes remain to drain. Idempotent.
    pub fn write_completed(&self) -> io::Result<()> {
        let mut inner = self.lock();
        if inner.shutdown || inner.end_of_stream {
            return Ok(());
        }
        inner.end_of_stream = true;
        self.signal(|c: &dyn IoControl| c.request_output());
        Ok(())
    }

    /// Clears contents and the end-of-entity mark for the next response.
    /// No-op after shutdown.
    pub fn reset(&self) {
        let mut inner = self.lock();
        if inner.shutdown {
            return;
        }
        inner.buffer.clear();
        inner.end_of_stream = false;
    }

    /// Wakes all waiters; subsequent operations fail with
    /// `ErrorKind::Interrupted`.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        inner.shutdown = true;
        self.cond.notify_all();
    }

    /// Number of bytes currently buffered.
    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn signal(&self, op: fn(&dyn IoControl)) {
        if let Some(ctrl) = self.io_control.upgrade() {
            op(&*ctrl);
        }
    }
}
