//! Plugin Module
//!
//! Composable plugin hierarchies:
//! - Type declarations and handles
//! - Linearization of multiple inheritance
//! - Registry with per-root frontier and cached composite

pub mod config;
pub mod descriptor;
pub mod extended;
pub mod interface;
pub mod linearize;
pub mod registry;
pub mod snapshot;

pub use config::{LinearizationPolicy, RegistryConfig};
pub use descriptor::{TypeHandle, TypeKind, TypeSpec, RESERVED_FIELDS};
pub use extended::Extended;
pub use interface::{Behavior, Call};
pub use registry::Registry;
pub use snapshot::{RegistrySnapshot, RootSummary, TypeSummary};
