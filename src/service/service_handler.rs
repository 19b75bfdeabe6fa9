//! The reactor-facing service handler and the worker-side request routine.
//!
//! The handler implements the six reactor callbacks. None of them blocks:
//! they move the per-connection state machine, shuttle bytes between the
//! codec and the content buffers, and commit staged responses. Actual
//! request processing runs on an [`Executor`] worker, one task per
//! request, reading and writing the buffers with ordinary blocking I/O.

use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode, Version};
use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::buffer::{interrupted, ContentOutputStream};
use crate::config::ServiceConfig;
use crate::context::{HttpContext, CONN_STATE, HTTP_CONNECTION, HTTP_REQUEST, HTTP_RESPONSE};
use crate::executor::Executor;
use crate::handler::{HandlerRegistry, HandlerResolver};
use crate::interceptor::{HttpProcessor, Interceptors};
use crate::protocol::body::{ReqBody, RespBody};
use crate::protocol::{
    can_response_have_body, clone_response_head, HttpError, HttpRequest, HttpResponse, PayloadSize, ProtocolError,
};
use crate::reactor::{ConnectionHandle, ContentDecoder, ContentEncoder, EventListener, IoControl, ServerConnection};
use crate::service::conn_state::{InputState, OutputState, ServerConnState, StagedResponse};
use crate::service::{ConnectionReuseStrategy, DefaultReuseStrategy, ExpectationVerifier};

/// Service handler bridging the non-blocking reactor and blocking worker
/// handlers through bounded content buffers.
///
/// Allocates content buffers of a fixed size per connection and throttles
/// I/O events so they can never overflow, keeping the memory footprint of
/// a connection constant while streaming entities of any size.
pub struct ServiceHandler {
    core: Arc<ServiceCore>,
    executor: Arc<dyn Executor>,
}

impl std::fmt::Debug for ServiceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandler").finish_non_exhaustive()
    }
}

struct ServiceCore {
    processor: Arc<dyn HttpProcessor>,
    resolver: Arc<dyn HandlerResolver>,
    reuse_strategy: Arc<dyn ConnectionReuseStrategy>,
    expectation_verifier: Option<Arc<dyn ExpectationVerifier>>,
    event_listener: Option<Arc<dyn EventListener>>,
    config: ServiceConfig,
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("executor must be set")]
    MissingExecutor,
}

pub struct ServiceHandlerBuilder {
    processor: Arc<dyn HttpProcessor>,
    resolver: Arc<dyn HandlerResolver>,
    reuse_strategy: Arc<dyn ConnectionReuseStrategy>,
    expectation_verifier: Option<Arc<dyn ExpectationVerifier>>,
    event_listener: Option<Arc<dyn EventListener>>,
    executor: Option<Arc<dyn Executor>>,
    config: ServiceConfig,
}

impl ServiceHandlerBuilder {
    fn new() -> Self {
        Self {
            processor: Arc::new(Interceptors::default()),
            resolver: Arc::new(HandlerRegistry::new()),
            reuse_strategy: Arc::new(DefaultReuseStrategy),
            expectation_verifier: None,
            event_listener: None,
            executor: None,
            config: ServiceConfig::default(),
        }
    }

    pub fn processor(mut self, processor: Arc<dyn HttpProcessor>) -> Self {
        self.processor = processor;
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn HandlerResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn reuse_strategy(mut self, strategy: Arc<dyn ConnectionReuseStrategy>) -> Self {
        self.reuse_strategy = strategy;
        self
    }

    pub fn expectation_verifier(mut self, verifier: Arc<dyn ExpectationVerifier>) -> Self {
        self.expectation_verifier = Some(verifier);
        self
    }

    pub fn event_listener(mut self, listener: Arc<dyn EventListener>) -> Self {
        self.event_listener = Some(listener);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<ServiceHandler, BuildError> {
        let executor = self.executor.ok_or(BuildError::MissingExecutor)?;
        Ok(ServiceHandler {
            core: Arc::new(ServiceCore {
                processor: self.processor,
                resolver: self.resolver,
                reuse_strategy: self.reuse_strategy,
                expectation_verifier: self.expectation_verifier,
                event_listener: self.event_listener,
                config: self.config,
            }),
            executor,
        })
    }
}

impl ServiceHandler {
    pub fn builder() -> ServiceHandlerBuilder {
        ServiceHandlerBuilder::new()
    }

    /// A connection has been accepted: allocate its state record and
    /// attach it to the connection context.
    pub fn connected(&self, conn: &Arc<dyn ServerConnection>) {
        let io_control: Arc<dyn IoControl> = conn.clone();
        let state = Arc::new(ServerConnState::new(
            self.core.config.content_buffer_size,
            Arc::downgrade(&io_control),
        ));
        conn.context().set_attribute(CONN_STATE, state);
        trace!("connection open");
        if let Some(listener) = &self.core.event_listener {
            listener.connection_open(&**conn);
        }
    }

    /// The connection is gone: release every waiter. Idempotent.
    pub fn closed(&self, conn: &Arc<dyn ServerConnection>) {
        if let Some(state) = conn_state(conn) {
            state.shutdown();
        }
        trace!("connection closed");
        if let Some(listener) = &self.core.event_listener {
            listener.connection_closed(&**conn);
        }
    }

    /// A request head has been parsed off the wire: record it and hand
    /// processing to a worker.
    pub fn request_received(&self, conn: &Arc<dyn ServerConnection>) {
        let Some(state) = conn_state(conn) else {
            warn!("request received on a connection without state");
            return;
        };
        let Some(head) = conn.take_request() else {
            warn!("request event without a parsed request");
            return;
        };
        {
            let mut inner = state.lock();
            if inner.input_state == InputState::Shutdown {
                return;
            }
            let content_expected = head.is_entity_enclosing();
            inner.request = Some(head);
            inner.input_state = InputState::RequestReceived;

            // no body reads will ever drain the input buffer
            if !content_expected {
                conn.suspend_input();
            }

            let core = self.core.clone();
            let worker_state = state.clone();
            let worker_conn = conn.clone();
            self.executor.execute(Box::new(move || {
                core.run_worker(worker_state, worker_conn);
            }));
        }
        state.notify_all();
    }

    /// Decoded request entity bytes are available.
    pub fn input_ready(&self, conn: &Arc<dyn ServerConnection>, decoder: &mut dyn ContentDecoder) {
        let Some(state) = conn_state(conn) else {
            return;
        };
        let result = {
            let mut inner = state.lock();
            match state.inbuffer().consume_content(decoder) {
                Ok(_) => {
                    inner.input_state = if decoder.is_completed() {
                        InputState::RequestBodyDone
                    } else {
                        InputState::RequestBodyStream
                    };
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        };
        state.notify_all();
        if let Err(err) = result {
            self.core.handle_failure(conn, err);
        }
    }

    /// The connection can accept a response head.
    pub fn response_ready(&self, conn: &Arc<dyn ServerConnection>) {
        let Some(state) = conn_state(conn) else {
            return;
        };
        let result = self.core.commit_response(&state, conn);
        state.notify_all();
        if let Err(err) = result {
            self.core.handle_failure(conn, err);
        }
    }

    /// The encoder can accept response entity bytes.
    pub fn output_ready(&self, conn: &Arc<dyn ServerConnection>, encoder: &mut dyn ContentEncoder) {
        let Some(state) = conn_state(conn) else {
            return;
        };
        let result = self.core.drain_response(&state, conn, encoder);
        state.notify_all();
        if let Err(err) = result {
            self.core.handle_failure(conn, err);
        }
    }

    /// The codec or the pipeline reported a protocol failure outside a
    /// worker: synthesize and stage the mapped error response.
    pub fn exception(&self, conn: &Arc<dyn ServerConnection>, err: ProtocolError) {
        let Some(state) = conn_state(conn) else {
            return;
        };
        let result = (|| -> Result<(), HttpError> {
            let mut response = synthesize_error_response(&err);
            // no worker will stream an entity for this exchange
            *response.body_mut() = None;
            self.core.processor.process_response(&mut response, conn.context())?;

            let (parts, _) = response.into_parts();
            let head = Response::from_parts(parts, ());
            {
                let mut inner = state.lock();
                if inner.output_state == OutputState::Shutdown {
                    return Err(interrupted().into());
                }
                inner.response = Some(StagedResponse { head, payload: PayloadSize::Empty });
                conn.request_output();
            }
            Ok(())
        })();
        state.notify_all();
        if let Err(err) = result {
            self.core.handle_failure(conn, err);
        }
    }
}

impl ServiceCore {
    /// Submits a staged response once the output half is ready.
    ///
    /// A final response without an entity completes the exchange on the
    /// spot: both halves reset and the connection either closes or starts
    /// polling for the next request, per the reuse strategy.
    fn commit_response(&self, state: &Arc<ServerConnState>, conn: &Arc<dyn ServerConnection>) -> Result<(), HttpError> {
        let mut inner = state.lock();
        if inner.output_state != OutputState::Ready || conn.is_response_submitted() {
            return Ok(());
        }
        let Some(staged) = inner.response.as_ref() else {
            return Ok(());
        };
        conn.submit_response(&staged.head, staged.payload)?;
        let status = staged.head.status();
        let payload = staged.payload;

        if status.as_u16() >= 200 && payload.is_empty() {
            let keep = self.reuse_strategy.keep_alive(&staged.head, conn.context());
            state.reset_output_locked(&mut inner);
            state.reset_input_locked(&mut inner);
            if keep {
                // ready for the next request
                conn.request_input();
            } else {
                conn.close();
            }
        } else {
            inner.output_state = OutputState::ResponseSent;
        }
        Ok(())
    }

    /// Drains the output buffer into the encoder; a completed encoder
    /// finishes the exchange.
    fn drain_response(
        &self,
        state: &Arc<ServerConnState>,
        conn: &Arc<dyn ServerConnection>,
        encoder: &mut dyn ContentEncoder,
    ) -> Result<(), HttpError> {
        let mut inner = state.lock();
        state.outbuffer().produce_content(encoder)?;
        if encoder.is_completed() {
            let keep = inner
                .response
                .as_ref()
                .map(|staged| self.reuse_strategy.keep_alive(&staged.head, conn.context()))
                .unwrap_or(false);
            state.reset_output_locked(&mut inner);
            state.reset_input_locked(&mut inner);
            if keep {
                // ready for the next request
                conn.request_input();
            } else {
                conn.close();
            }
        } else {
            inner.output_state = OutputState::ResponseBodyStream;
        }
        Ok(())
    }

    fn run_worker(self: Arc<Self>, state: Arc<ServerConnState>, conn: Arc<dyn ServerConnection>) {
        if let Err(err) = self.handle_request(&state, &conn) {
            self.handle_failure(&conn, err);
        }
    }

    /// The worker-thread body of one request/response exchange.
    fn handle_request(&self, state: &Arc<ServerConnState>, conn: &Arc<dyn ServerConnection>) -> Result<(), HttpError> {
        state.wait_for_output_state(OutputState::Ready)?;

        let head = { state.lock().request.take() }
            .ok_or_else(|| ProtocolError::failure("no request staged for processing"))?;

        let context = conn.context();
        context.set_attribute(HTTP_CONNECTION, Arc::new(ConnectionHandle(conn.clone())));
        context.set_attribute(HTTP_REQUEST, Arc::new(head.clone()));

        let mut version = head.version();
        if version > Version::HTTP_11 {
            // downgrade protocol version
            version = Version::HTTP_11;
        }

        let mut entity_expected = head.is_entity_enclosing();
        let mut response: Option<HttpResponse> = None;

        if entity_expected && head.expect_continue() {
            let mut interim = new_response(version, StatusCode::CONTINUE);
            if let Some(verifier) = &self.expectation_verifier {
                if let Err(err) = verifier.verify(&head, &mut interim, context) {
                    interim = synthesize_error_response(&err);
                }
            }
            if interim.status().as_u16() < 200 {
                // expectations met, send the preliminary response now
                let (parts, _) = interim.into_parts();
                {
                    let mut inner = state.lock();
                    if inner.output_state == OutputState::Shutdown {
                        return Err(interrupted().into());
                    }
                    inner.response =
                        Some(StagedResponse { head: Response::from_parts(parts, ()), payload: PayloadSize::Empty });
                    conn.request_output();
                }
                state.notify_all();
                state.wait_for_output_state(OutputState::ResponseSent)?;
                state.reset_output();
            } else {
                // expectation rejected, discard the entity
                conn.reset_input();
                entity_expected = false;
                response = Some(interim);
            }
        }

        let body = entity_expected.then(|| ReqBody::new(state.inbuffer().clone()));
        let mut request: HttpRequest = head.body(body);

        let mut response = match response {
            Some(response) => response,
            None => {
                let mut response = new_response(version, StatusCode::OK);
                if let Err(err) = self.process_and_dispatch(&mut request, &mut response, context) {
                    debug!(cause = %err, "request failed, mapping to error response");
                    response = synthesize_error_response(&err);
                }
                response
            }
        };

        self.processor.process_response(&mut response, context)?;

        if !can_response_have_body(request.method(), response.status()) {
            *response.body_mut() = None;
        }

        let (parts, entity) = response.into_parts();
        let head = Response::from_parts(parts, ());
        let payload = entity.as_ref().map(RespBody::payload_size).unwrap_or(PayloadSize::Empty);
        context.set_attribute(HTTP_RESPONSE, Arc::new(clone_response_head(&head)));
        {
            let mut inner = state.lock();
            if inner.output_state == OutputState::Shutdown {
                return Err(interrupted().into());
            }
            inner.response = Some(StagedResponse { head, payload });
            // response is ready to be committed
            conn.request_output();
        }
        state.notify_all();

        if let Some(entity) = entity {
            let mut out = ContentOutputStream::new(state.outbuffer().clone());
            entity.write_to(&mut out)?;
            std::io::Write::flush(&mut out)?;
            out.close()?;
        }
        Ok(())
    }

    fn process_and_dispatch(
        &self,
        request: &mut HttpRequest,
        response: &mut HttpResponse,
        context: &HttpContext,
    ) -> Result<(), ProtocolError> {
        self.processor.process_request(request, context)?;
        match self.resolver.lookup(request.uri().path()) {
            Some(handler) => handler.handle(request, response, context)?,
            None => *response.status_mut() = StatusCode::NOT_IMPLEMENTED,
        }
        Ok(())
    }

    /// Terminal failure handling shared by callbacks and workers.
    ///
    /// A shutdown-induced interruption is a clean early exit; everything
    /// else tears the connection down and notifies the event listener.
    fn handle_failure(&self, conn: &Arc<dyn ServerConnection>, err: HttpError) {
        if err.is_interrupted() {
            debug!("processing interrupted by connection shutdown");
            return;
        }
        match err {
            HttpError::Io { source } => {
                error!(cause = %source, "fatal i/o failure, shutting down connection");
                self.shutdown_connection(conn);
                if let Some(listener) = &self.event_listener {
                    listener.fatal_io_error(&source, &**conn);
                }
            }
            HttpError::Protocol { source } => {
                error!(cause = %source, "fatal protocol failure, shutting down connection");
                self.shutdown_connection(conn);
                if let Some(listener) = &self.event_listener {
                    listener.fatal_protocol_error(&source, &**conn);
                }
            }
        }
    }

    fn shutdown_connection(&self, conn: &Arc<dyn ServerConnection>) {
        conn.shutdown();
        if let Some(state) = conn_state(conn) {
            state.shutdown();
        }
    }
}

fn conn_state(conn: &Arc<dyn ServerConnection>) -> Option<Arc<ServerConnState>> {
    conn.context().attribute::<ServerConnState>(CONN_STATE)
}

fn new_response(version: Version, status: StatusCode) -> HttpResponse {
    let mut response = Response::new(None);
    *response.status_mut() = status;
    *response.version_mut() = version;
    response
}

/// Builds the mapped error response. Total: this is the last line of
/// defense before a fatal shutdown, so nothing in here can fail.
fn synthesize_error_response(err: &ProtocolError) -> HttpResponse {
    let message: String = err.to_string().chars().map(|c| if c.is_ascii() { c } else { '?' }).collect();
    let mut response = Response::new(Some(RespBody::from(message.into_bytes())));
    *response.status_mut() = err.status();
    // emitted at HTTP/1.0 so the reuse strategy closes the connection
    *response.version_mut() = Version::HTTP_10;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=US-ASCII"));
    response
}
