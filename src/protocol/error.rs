//! Error types for the connection handling layer.
//!
//! [`ProtocolError`] covers HTTP protocol failures raised by the pipeline,
//! the expectation verifier or a request handler; each variant maps to the
//! status code an error response carries on the wire. [`HttpError`] is the
//! top-level error surface of the worker routine, combining protocol
//! failures with I/O failures from the buffers and the connection.

use http::StatusCode;
use std::io;
use thiserror::Error;

/// An HTTP protocol failure.
///
/// The variant determines the status code of the synthesized error
/// response; the message becomes its body.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The request method is not supported, mapped to 501.
    #[error("{message}")]
    MethodNotSupported { message: String },

    /// The request HTTP version is not supported, mapped to 505.
    #[error("{message}")]
    UnsupportedVersion { message: String },

    /// A protocol violation in the message itself, mapped to 400.
    #[error("{message}")]
    Violation { message: String },

    /// Any other HTTP-level failure, mapped to 500.
    #[error("{message}")]
    Failure { message: String },
}

impl ProtocolError {
    /// Creates a new MethodNotSupported error
    pub fn method_not_supported<S: ToString>(message: S) -> Self {
        Self::MethodNotSupported { message: message.to_string() }
    }

    /// Creates a new UnsupportedVersion error
    pub fn unsupported_version<S: ToString>(message: S) -> Self {
        Self::UnsupportedVersion { message: message.to_string() }
    }

    /// Creates a new Violation error
    pub fn violation<S: ToString>(message: S) -> Self {
        Self::Violation { message: message.to_string() }
    }

    /// Creates a new Failure error
    pub fn failure<S: ToString>(message: S) -> Self {
        Self::Failure { message: message.to_string() }
    }

    /// The status code an error response for this failure carries.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotSupported { .. } => StatusCode::NOT_IMPLEMENTED,
            Self::UnsupportedVersion { .. } => StatusCode::HTTP_VERSION_NOT_SUPPORTED,
            Self::Violation { .. } => StatusCode::BAD_REQUEST,
            Self::Failure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The top-level error type of the worker routine.
#[derive(Debug, Error)]
pub enum HttpError {
    /// An HTTP protocol failure that escaped local recovery
    #[error("protocol error: {source}")]
    Protocol {
        #[from]
        source: ProtocolError,
    },

    /// An I/O failure from a buffer, the connection or the codec
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl HttpError {
    /// True if this error is the shutdown-induced wake of a blocked
    /// buffer or state wait, which the worker treats as a clean early exit.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Io { source } if source.kind() == io::ErrorKind::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ProtocolError::method_not_supported("x").status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(ProtocolError::unsupported_version("x").status(), StatusCode::HTTP_VERSION_NOT_SUPPORTED);
        assert_eq!(ProtocolError::violation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProtocolError::failure("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn message_is_display() {
        let err = ProtocolError::violation("bad");
        assert_eq!(err.to_string(), "bad");
    }

    #[test]
    fn interrupted_detection() {
        let err: HttpError = io::Error::new(io::ErrorKind::Interrupted, "service interrupted").into();
        assert!(err.is_interrupted());

        let err: HttpError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(!err.is_interrupted());
    }
}
