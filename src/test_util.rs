//! Shared scaffolding for the concurrency tests: a flag-recording I/O
//! control and scripted codec halves.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use bytes::BytesMut;

use crate::protocol::PayloadItem;
use crate::reactor::{ContentDecoder, ContentEncoder, IoControl};

/// Records the most recent interest signal per direction.
#[derive(Default)]
pub(crate) struct RecordingIoControl {
    input_requested: AtomicBool,
    input_suspended: AtomicBool,
    output_requested: AtomicBool,
    output_suspended: AtomicBool,
}

impl RecordingIoControl {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn input_requested(&self) -> bool {
        self.input_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn input_suspended(&self) -> bool {
        self.input_suspended.load(Ordering::SeqCst)
    }

    pub(crate) fn output_requested(&self) -> bool {
        self.output_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn output_suspended(&self) -> bool {
        self.output_suspended.load(Ordering::SeqCst)
    }
}

impl IoControl for RecordingIoControl {
    fn request_input(&self) {
        self.input_requested.store(true, Ordering::SeqCst);
        self.input_suspended.store(false, Ordering::SeqCst);
    }

    fn suspend_input(&self) {
        self.input_suspended.store(true, Ordering::SeqCst);
        self.input_requested.store(false, Ordering::SeqCst);
    }

    fn request_output(&self) {
        self.output_requested.store(true, Ordering::SeqCst);
        self.output_suspended.store(false, Ordering::SeqCst);
    }

    fn suspend_output(&self) {
        self.output_suspended.store(true, Ordering::SeqCst);
        self.output_requested.store(false, Ordering::SeqCst);
    }
}

/// A decoder that hands out a fixed byte sequence in bounded chunks, then
/// an EOF marker.
pub(crate) struct SliceDecoder {
    data: BytesMut,
    chunk: usize,
    completed: bool,
}

impl SliceDecoder {
    pub(crate) fn new(data: &[u8], chunk: usize) -> Self {
        Self { data: BytesMut::from(data), chunk, completed: false }
    }
}

impl ContentDecoder for SliceDecoder {
    fn pull(&mut self, max: usize) -> io::Result<Option<PayloadItem>> {
        if self.completed {
            return Ok(None);
        }
        if self.data.is_empty() {
            self.completed = true;
            return Ok(Some(PayloadItem::Eof));
        }
        let n = max.min(self.chunk).min(self.data.len());
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(PayloadItem::Chunk(self.data.split_to(n).freeze())))
    }

    fn is_completed(&self) -> bool {
        self.completed
    }
}

/// An encoder that accepts at most `accept` bytes per push and collects
/// everything it is given.
pub(crate) struct CollectingEncoder {
    data: Mutex<Vec<u8>>,
    accept: usize,
    completed: AtomicBool,
}

impl CollectingEncoder {
    pub(crate) fn new(accept: usize) -> Self {
        Self { data: Mutex::new(Vec::new()), accept, completed: AtomicBool::new(false) }
    }

    pub(crate) fn data(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl ContentEncoder for CollectingEncoder {
    fn push(&mut self, src: &[u8]) -> io::Result<usize> {
        let n = self.accept.min(src.len());
        self.data.lock().unwrap().extend_from_slice(&src[..n]);
        Ok(n)
    }

    fn complete(&mut self) -> io::Result<()> {
        self.completed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}

/// Polls `cond` until it holds, panicking after two seconds.
pub(crate) fn wait_until<F: FnMut() -> bool>(what: &str, mut cond: F) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        if Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}
