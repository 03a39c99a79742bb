//! # Utility Modules
//!
//! Supporting utilities for the transport.
//!
//! ## Components
//! - **Logging**: `tracing-subscriber` setup from [`crate::config::LoggingConfig`]
//! - **Metrics**: Thread-safe counters for the log server

pub mod logging;
pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
