//! Core module trait

use async_trait::async_trait;
use std::sync::Arc;

use crate::args::ModuleArgs;
use crate::error::Result;
use crate::report::ModuleResult;

/// A single-purpose adapter invoked once against one target.
///
/// `run` parses its own typed parameters from `args`, performs the external
/// call and maps the outcome to a [`ModuleResult`]. Returning `Err` produces a
/// failure report.
#[async_trait]
pub trait Module: Send + Sync {
    /// Unique name, also used as the binary-module file name
    fn name(&self) -> &str;

    /// One-line description shown by `opmod list`
    fn description(&self) -> &str;

    /// Whether the module honours `_ansible_check_mode`
    fn supports_check_mode(&self) -> bool {
        false
    }

    /// Parameters whose values are masked in the echoed invocation
    fn no_log_params(&self) -> &'static [&'static str] {
        &[]
    }

    async fn run(&self, args: &ModuleArgs) -> Result<ModuleResult>;
}

pub type BoxedModule = Arc<dyn Module>;
