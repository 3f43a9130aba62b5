//! # strata - composable plugin hierarchies
//!
//! Declare a plugin root, let independent code declare plugin subtypes of it
//! (branching and re-merging through multiple inheritance), and get back one
//! composite type that combines every most-derived branch:
//! - **Registry**: tracks the frontier of most-derived types per root
//! - **Extended**: the cached composite, rebuilt only after new declarations
//! - **Linearization**: C3 ordering used for member lookup
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::{json, Value};
//! use strata::plugin::{Registry, TypeSpec};
//!
//! let registry = Registry::new();
//! let root = registry
//!     .declare(TypeSpec::root("Greeter").with_method("greet", |_, _| Ok(json!("hello"))))
//!     .unwrap();
//! let loud = registry
//!     .declare(TypeSpec::new("Loud").with_base(&root).with_method("greet", |call, args| {
//!         let base = call.next(args)?;
//!         Ok(json!(base.as_str().unwrap_or_default().to_uppercase()))
//!     }))
//!     .unwrap();
//!
//! let extended = loud.plugin_extended().unwrap();
//! assert_eq!(extended.name(), "GreeterPluginExtended");
//! assert_eq!(extended.invoke("greet", Value::Null).unwrap(), json!("HELLO"));
//! ```

pub mod core;
pub mod monitoring;
pub mod plugin;

pub use core::error::{Error, Result};
pub use plugin::{Extended, Registry, TypeHandle, TypeSpec};
