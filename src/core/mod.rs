//! # Core Codec Components
//!
//! Wire encoding of log messages, their fingerprint, and the stream framing
//! used by the transport.
//!
//! ## Components
//! - **Codec**: native-width binary encoding with bounds-checked decode
//! - **Fingerprint**: 64-bit content hash over encoded bytes
//! - **Frame**: Tokio codec that wraps encoded messages for byte streams
//!
//! ## Wire Format
//! ```text
//! [len][role] [len][label] [len][file] [len][function]
//! [time] [process_id] [thread_id] [line] [level] ([len][message])*
//! ```
//!
//! ## Portability
//! Integers are written at native width and byte order. Producer and consumer
//! must share both; the format carries no marker to detect a mismatch.

pub mod codec;
pub mod fingerprint;
pub mod frame;
