//! Module registry

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::module::{BoxedModule, Module};

/// Listing entry for a registered module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub description: String,
    pub supports_check_mode: bool,
}

/// Name to module map
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, BoxedModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module; names must be unique
    pub fn register<M: Module + 'static>(&mut self, module: M) -> Result<()> {
        self.register_boxed(Arc::new(module))
    }

    pub fn register_boxed(&mut self, module: BoxedModule) -> Result<()> {
        let name = module.name().to_string();
        if self.modules.contains_key(&name) {
            return Err(Error::DuplicateModule(name));
        }

        debug!("Registered module: {}", name);
        self.modules.insert(name, module);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<BoxedModule> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownModule(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Registered names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Metadata of all modules, sorted by name
    pub fn list_metadata(&self) -> Vec<ModuleInfo> {
        let mut infos: Vec<ModuleInfo> = self
            .modules
            .values()
            .map(|m| ModuleInfo {
                name: m.name().to_string(),
                description: m.description().to_string(),
                supports_check_mode: m.supports_check_mode(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
