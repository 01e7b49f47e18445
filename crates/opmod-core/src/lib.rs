//! Core types and utilities for opmod modules
//!
//! # Modules
//!
//! - `args`: Argument intake (JSON, wrapped JSON, legacy `key=value`)
//! - `config`: Environment file configuration
//! - `de`: Lenient deserializers for framework-supplied values
//! - `error`: Error types and Result alias
//! - `logging`: Tracing subscriber setup (stderr only)
//! - `module`: The `Module` trait every adapter implements
//! - `registry`: Name to module lookup
//! - `report`: Module results and the JSON report printed to stdout
//! - `runner`: Executes one module invocation end to end
//! - `secret`: Redacted string parameters

pub mod args;
pub mod config;
pub mod de;
pub mod error;
pub mod logging;
pub mod module;
pub mod registry;
pub mod report;
pub mod runner;
pub mod secret;

// Re-exports
pub use args::ModuleArgs;
pub use error::{Error, Result};
pub use module::{BoxedModule, Module};
pub use registry::{ModuleInfo, ModuleRegistry};
pub use report::{Change, ChangeOperation, ModuleResult, Report};
pub use secret::Secret;

/// Prelude for module crates
pub mod prelude {
    pub use super::args::ModuleArgs;
    pub use super::de;
    pub use super::error::{Error, Result};
    pub use super::module::Module;
    pub use super::report::{Change, ChangeOperation, ModuleResult};
    pub use super::secret::Secret;
}
