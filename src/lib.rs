//! # xclog-message
//!
//! Compact binary codec for structured log records, with a C ABI for
//! constructing, transmitting and reconstructing them from another runtime.
//!
//! ## Modules
//! - [`protocol`]: the [`Message`] record
//! - [`core`]: wire codec, fingerprint and stream framing
//! - [`ffi`]: `extern "C"` boundary and its ownership contract
//! - [`transport`]: TCP server and client for framed messages
//! - [`config`], [`error`], [`utils`]: configuration, errors, logging and metrics
//!
//! ## Example
//! ```rust
//! use xclog_message::Message;
//!
//! let msg = Message::new("info", "test", "a.cc", "f")
//!     .with_time(1000)
//!     .with_ids(1, 2)
//!     .with_line(10)
//!     .push("hello")
//!     .push("world");
//!
//! let bytes = msg.encode();
//! assert_eq!(Message::decode(&bytes).unwrap(), msg);
//! assert_eq!(xclog_message::fingerprint(&bytes), msg.fingerprint());
//! ```
//!
//! ## Portability
//! The wire format stores integers at native width and byte order. Buffers are
//! only interchangeable between processes on the same architecture.

#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod ffi;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use crate::core::codec::{decode, encode, encoded_len};
pub use crate::core::fingerprint::hash as fingerprint;
pub use crate::error::{CodecError, Result, XclogError};
pub use crate::protocol::message::Message;
