//! Monitoring Module
//!
//! Provides observability for strata:
//! - Structured logging

pub mod logging;

pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
