//! Error types for OxiXZ operations.
//!
//! This module provides the error type shared by the reader and the writers:
//! engine setup failures, mid-stream codec failures, I/O failures from the
//! underlying source or sink, and misuse of a closed component.

use crate::traits::Status;
use std::io;
use thiserror::Error;

/// The main error type for OxiXZ operations.
#[derive(Debug, Error)]
pub enum XzError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The engine could not create or re-arm a coder.
    #[error("Coder initialization failed: {status}")]
    Init {
        /// Status reported by the engine.
        status: Status,
    },

    /// The coder reported a fatal status while processing data.
    #[error("Codec error: {status}")]
    Codec {
        /// Status reported by the coder.
        status: Status,
    },

    /// The compressed input ended before the stream was complete.
    #[error("Compressed data is truncated")]
    Truncated,

    /// Invalid construction parameters.
    #[error("Invalid options: {message}")]
    InvalidOptions {
        /// Description of the rejected option.
        message: String,
    },

    /// The worker pool could not be built.
    #[error("Thread pool error: {message}")]
    ThreadPool {
        /// Message from the pool builder.
        message: String,
    },

    /// The component was used after `close`.
    #[error("Stream is closed")]
    Closed,
}

/// Result type alias for OxiXZ operations.
pub type Result<T> = std::result::Result<T, XzError>;

impl XzError {
    /// Create an initialization error.
    pub fn init(status: Status) -> Self {
        Self::Init { status }
    }

    /// Create a codec error.
    pub fn codec(status: Status) -> Self {
        Self::Codec { status }
    }

    /// Create an invalid options error.
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    /// Create a thread pool error.
    pub fn thread_pool(message: impl Into<String>) -> Self {
        Self::ThreadPool {
            message: message.into(),
        }
    }

    /// The coder status carried by this error, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Init { status } | Self::Codec { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<XzError> for io::Error {
    fn from(err: XzError) -> Self {
        match err {
            XzError::Io(e) => e,
            other => {
                let kind = match &other {
                    XzError::Truncated => io::ErrorKind::UnexpectedEof,
                    XzError::InvalidOptions { .. } => io::ErrorKind::InvalidInput,
                    XzError::Closed => io::ErrorKind::BrokenPipe,
                    XzError::Codec { .. } => io::ErrorKind::InvalidData,
                    _ => io::ErrorKind::Other,
                };
                io::Error::new(kind, other)
            }
        }
    }
}
