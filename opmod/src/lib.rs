//! opmod binary support
//!
//! Builds the registry of bundled modules and resolves which module an
//! invocation targets, either from a subcommand or from the name the binary
//! was called by (`ln -s opmod ldap`).

pub mod registry;

pub use registry::default_registry;

use std::path::Path;

/// Module name implied by `argv[0]`, if it names a registered module.
pub fn module_from_program(program: &str, is_registered: impl Fn(&str) -> bool) -> Option<String> {
    let name = Path::new(program).file_name()?.to_str()?;
    is_registered(name).then(|| name.to_string())
}
