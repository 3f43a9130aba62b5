//! Core utilities and common types for strata.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
