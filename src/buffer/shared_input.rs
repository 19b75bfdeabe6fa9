//! The inbound half of the reactor/worker bridge.

use std::cmp;
use std::io;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, Weak};

use bytes::BytesMut;

use crate::buffer::interrupted;
use crate::protocol::PayloadItem;
use crate::reactor::{ContentDecoder, IoControl};

/// A bounded byte buffer fed by the reactor and drained by a worker thread.
///
/// The reactor appends decoded entity bytes through
/// [`consume_content`](Self::consume_content) without ever blocking; the
/// worker drains them through the blocking [`read`](Self::read). A full
/// buffer suspends reactor input interest, a drain re-requests it, so the
/// peer is throttled to the worker's pace.
///
/// There is exactly one reactor-side feeder and at most one worker-side
/// reader per buffer.
pub struct SharedInputBuffer {
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

impl SharedInputBuffer {
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

    /// Fills the buffer from the decoder without blocking.
    ///
    /// Invoked by the reactor thread. Pulls chunks until the buffer is
    /// full or the decoder has nothing more; decoder completion marks the
    /// buffer EOF. A full buffer suspends reactor input interest. Returns
    /// the number of bytes transferred.
    pub fn consume_content(&self, decoder: &mut dyn ContentDecoder) -> io::Result<usize> {
        let mut inner = self.lock();
        if inner.shutdown {
            return Err(interrupted());
        }
        let mut total = 0;
        loop {
            let room = self.capacity.saturating_sub(inner.buffer.len());
            if room == 0 {
                break;
            }
            match decoder.pull(room)? {
                Some(PayloadItem::Chunk(chunk)) => {
                    total += chunk.len();
                    inner.buffer.extend_from_slice(&chunk);
                }
                Some(PayloadItem::Eof) => {
                    inner.end_of_stream = true;
                    break;
                }
                None => break,
            }
        }
        if decoder.is_completed() {
            inner.end_of_stream = true;
        }
        if inner.buffer.len() >= self.capacity {
            self.signal(|c: &dyn IoControl| c.suspend_input());
        }
        self.cond.notify_all();
        Ok(total)
    }

    /// Blocking read of buffered entity bytes.
    ///
    /// Invoked by a worker thread. Blocks until at least one byte is
    /// available, EOF is reached (`Ok(0)`), or the connection shuts down
    /// (`ErrorKind::Interrupted`). Draining bytes re-requests reactor
    /// input interest so the buffer refills.
    pub fn read(&self, dst: &mut [u8]) -> io::Result<usize> {
        if dst.is_empty() {
            return Ok(0);
        }
        let mut inner = self.lock();
        loop {
            if inner.shutdown {
                return Err(interrupted());
            }
            if !inner.buffer.is_empty() {
                break;
            }
            if inner.end_of_stream {
                return Ok(0);
            }
            inner = self.cond.wait(inner).unwrap_or_else(PoisonError::into_inner);
        }
        let chunk = cmp::min(dst.len(), inner.buffer.len());
        dst[..chunk].copy_from_slice(&inner.buffer.split_to(chunk));
        if !inner.end_of_stream {
            self.signal(|c: &dyn IoControl| c.request_input());
        }
        Ok(chunk)
    }

    /// Clears contents and EOF, returning the buffer to its empty
    /// accepting state for the next request. No-op after shutdown.
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

    /// True once the decoder has delivered the whole entity.
    pub fn is_eof(&self) -> bool {
        self.lock().end_of_stream
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
