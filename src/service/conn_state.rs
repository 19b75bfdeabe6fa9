//! Per-connection state shared between the reactor callbacks and the
//! worker thread.

use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};

use crate::buffer::{interrupted, SharedInputBuffer, SharedOutputBuffer};
use crate::protocol::{PayloadSize, RequestHead, ResponseHead};
use crate::reactor::IoControl;

/// Where the inbound half of the current exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Ready,
    RequestReceived,
    RequestBodyStream,
    RequestBodyDone,
    Shutdown,
}

/// Where the outbound half of the current exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Ready,
    ResponseSent,
    ResponseBodyStream,
    ResponseBodyDone,
    Shutdown,
}

/// A response committed by the worker, awaiting transmission.
///
/// Only the head plus the entity framing live here; the entity bytes
/// themselves flow through the output buffer.
pub struct StagedResponse {
    pub head: ResponseHead,
    pub payload: PayloadSize,
}

pub(crate) struct Inner {
    pub(crate) input_state: InputState,
    pub(crate) output_state: OutputState,
    pub(crate) request: Option<RequestHead>,
    pub(crate) response: Option<StagedResponse>,
}

/// The per-connection record: the two content buffers, the two state
/// variables, the current request and response, and the mutex/condvar used
/// for the reactor/worker handoff.
///
/// All transitions happen under the mutex and broadcast on the condvar;
/// waiters re-check their predicate after every wakeup. Buffer I/O is
/// never performed while holding this mutex from the worker side.
pub struct ServerConnState {
    inbuffer: Arc<SharedInputBuffer>,
    outbuffer: Arc<SharedOutputBuffer>,
    inner: Mutex<Inner>,
    cond: Condvar,
}

impl ServerConnState {
    /// Allocates the state record with two buffers of `capacity` bytes,
    /// both signalling through the given I/O control.
    pub fn new(capacity: usize, io_control: Weak<dyn IoControl>) -> Self {
        Self {
            inbuffer: Arc::new(SharedInputBuffer::new(capacity, io_control.clone())),
            outbuffer: Arc::new(SharedOutputBuffer::new(capacity, io_control)),
            inner: Mutex::new(Inner {
                input_state: InputState::Ready,
                output_state: OutputState::Ready,
                request: None,
                response: None,
            }),
            cond: Condvar::new(),
        }
    }

    pub fn inbuffer(&self) -> &Arc<SharedInputBuffer> {
        &self.inbuffer
    }

    pub fn outbuffer(&self) -> &Arc<SharedOutputBuffer> {
        &self.outbuffer
    }

    pub fn input_state(&self) -> InputState {
        self.lock().input_state
    }

    pub fn output_state(&self) -> OutputState {
        self.lock().output_state
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Broadcast a state transition to every waiter.
    pub(crate) fn notify_all(&self) {
        self.cond.notify_all();
    }

    /// Parks the worker until the output half reaches `expected`, failing
    /// with `ErrorKind::Interrupted` once the connection shuts down.
    pub(crate) fn wait_for_output_state(&self, expected: OutputState) -> io::Result<()> {
        let mut inner = self.lock();
        loop {
            if inner.output_state == expected {
                return Ok(());
            }
            if inner.output_state == OutputState::Shutdown {
                return Err(interrupted());
            }
            inner = self.cond.wait(inner).unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub(crate) fn reset_input_locked(&self, inner: &mut Inner) {
        if inner.input_state == InputState::Shutdown {
            return;
        }
        self.inbuffer.reset();
        inner.request = None;
        inner.input_state = InputState::Ready;
    }

    pub(crate) fn reset_output_locked(&self, inner: &mut Inner) {
        if inner.output_state == OutputState::Shutdown {
            return;
        }
        self.outbuffer.reset();
        inner.response = None;
        inner.output_state = OutputState::Ready;
    }

    /// Worker-side reset of the output half after a preliminary response
    /// has gone out.
    pub(crate) fn reset_output(&self) {
        let mut inner = self.lock();
        self.reset_output_locked(&mut inner);
        drop(inner);
        self.notify_all();
    }

    /// Moves both halves to their terminal state and releases every
    /// buffer and state waiter. Idempotent.
    pub fn shutdown(&self) {
        self.inbuffer.shutdown();
        self.outbuffer.shutdown();
        let mut inner = self.lock();
        inner.input_state = InputState::Shutdown;
        inner.output_state = OutputState::Shutdown;
        drop(inner);
        self.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::RecordingIoControl;
    use std::thread;
    use std::time::Duration;

    fn state() -> (Arc<ServerConnState>, Arc<RecordingIoControl>) {
        let ctrl = Arc::new(RecordingIoControl::new());
        let weak = Arc::downgrade(&ctrl) as Weak<dyn IoControl>;
        (Arc::new(ServerConnState::new(32, weak)), ctrl)
    }

    #[test]
    fn starts_ready() {
        let (state, _ctrl) = state();
        assert_eq!(state.input_state(), InputState::Ready);
        assert_eq!(state.output_state(), OutputState::Ready);
    }

    #[test]
    fn wait_returns_once_state_is_reached() {
        let (state, _ctrl) = state();
        let waiter = {
            let state = state.clone();
            thread::spawn(move || state.wait_for_output_state(OutputState::ResponseSent))
        };

        thread::sleep(Duration::from_millis(20));
        state.lock().output_state = OutputState::ResponseSent;
        state.notify_all();

        waiter.join().unwrap().unwrap();
    }

    #[test]
    fn shutdown_interrupts_waiters_and_sticks() {
        let (state, _ctrl) = state();
        let waiter = {
            let state = state.clone();
            thread::spawn(move || state.wait_for_output_state(OutputState::ResponseSent))
        };

        thread::sleep(Duration::from_millis(20));
        state.shutdown();

        let err = waiter.join().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);

        // terminal: resets no longer apply
        let mut inner = state.lock();
        state.reset_output_locked(&mut inner);
        state.reset_input_locked(&mut inner);
        drop(inner);
        assert_eq!(state.input_state(), InputState::Shutdown);
        assert_eq!(state.output_state(), OutputState::Shutdown);
        let mut buf = [0u8; 4];
        assert!(state.inbuffer().read(&mut buf).is_err());
    }
}
