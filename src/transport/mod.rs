//! # Transport Layer
//!
//! Moves encoded log messages over TCP using [`FrameCodec`](crate::core::frame::FrameCodec).
//!
//! The server decodes each frame, passes the [`Message`](crate::protocol::message::Message)
//! to a handler and echoes the frame back; the client treats the echo as its
//! acknowledgement.
//!
//! ## Components
//! - **LogServer**: accept loop with graceful shutdown and per-connection idle timeout
//! - **LogClient**: send-and-acknowledge connection

pub mod client;
pub mod server;

pub use client::LogClient;
pub use server::LogServer;
