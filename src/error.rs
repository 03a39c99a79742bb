//! # Error Types
//!
//! Error handling for the log-message codec, the foreign boundary and the
//! socket transport.
//!
//! ## Error Categories
//! - **Codec Errors** ([`CodecError`]): a buffer is too short for a header field,
//!   or a trailing message fragment is truncated
//! - **Framing Errors**: bad magic bytes or an oversized frame on the transport
//! - **I/O Errors**: socket and file system failures
//! - **Configuration Errors**: unreadable or invalid configuration
//!
//! Encoding a [`Message`](crate::protocol::message::Message) never fails, so only
//! decoding paths produce [`CodecError`].
//!
//! ## Example Usage
//! ```rust
//! use xclog_message::error::CodecError;
//! use xclog_message::protocol::message::Message;
//!
//! match Message::decode(&[0u8; 3]) {
//!     Err(CodecError::BufferTooShort { field, .. }) => assert_eq!(field, "role"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Framing errors
    pub const ERR_INVALID_HEADER: &str = "Invalid frame header";
    pub const ERR_OVERSIZED_FRAME: &str = "Frame exceeds maximum size";

    /// Connection errors
    pub const ERR_CONNECTION_CLOSED: &str = "Connection closed";
    pub const ERR_TIMEOUT: &str = "Operation timed out";
    pub const ERR_ECHO_MISMATCH: &str = "Acknowledgement does not match the sent frame";
}

/// Failure to decode a wire buffer into a message.
///
/// Each variant corresponds to one detection point in the decoder, so callers can
/// tell a corrupt or short header apart from malformed trailing data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A fixed-width field, a length prefix, or a declared string body in the
    /// header would read past the end of the buffer.
    #[error("buffer too short while reading `{field}`: need {needed} bytes, {remaining} remaining")]
    BufferTooShort {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// The message fragment at `index` ends before its length prefix or body
    /// is complete.
    #[error("truncated message fragment #{index}: need {needed} bytes, {remaining} remaining")]
    TruncatedMessage {
        index: usize,
        needed: usize,
        remaining: usize,
    },
}

// XclogError is the primary error type for everything outside the pure codec
#[derive(Error, Debug)]
pub enum XclogError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}", constants::ERR_INVALID_HEADER)]
    InvalidHeader,

    #[error("{}: {0} bytes", constants::ERR_OVERSIZED_FRAME)]
    OversizedFrame(usize),

    #[error("{}", constants::ERR_CONNECTION_CLOSED)]
    ConnectionClosed,

    #[error("{}", constants::ERR_TIMEOUT)]
    Timeout,

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Type alias for Results using XclogError
pub type Result<T> = std::result::Result<T, XclogError>;
