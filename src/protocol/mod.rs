//! # Protocol Layer
//!
//! The log record carried by every codec, boundary and transport operation.

pub mod message;

pub use message::Message;
