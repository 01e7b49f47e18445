//! `mktemp` module: create a uniquely named directory or file and keep it

use async_trait::async_trait;
use opmod_core::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::SystemError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempKind {
    #[default]
    Directory,
    File,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MktempParams {
    #[serde(default)]
    pub state: TempKind,
    /// Parent directory, the system temporary directory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_prefix", deserialize_with = "de::string_like")]
    pub prefix: String,
    #[serde(default, deserialize_with = "de::string_like")]
    pub suffix: String,
}

fn default_prefix() -> String {
    "opmod.".to_string()
}

/// Create the entry under `parent` and return its path.
pub fn create(kind: TempKind, parent: &Path, prefix: &str, suffix: &str) -> crate::Result<PathBuf> {
    if !parent.is_dir() {
        return Err(SystemError::InvalidArgument(format!(
            "{} does not exist or is not a directory",
            parent.display()
        )));
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix).suffix(suffix);
    let context = || format!("Unable to create a temporary {} in {}", kind.noun(), parent.display());

    match kind {
        TempKind::Directory => builder
            .tempdir_in(parent)
            .map(|dir| dir.keep())
            .map_err(|e| SystemError::io(context(), e)),
        TempKind::File => builder
            .tempfile_in(parent)
            .map_err(|e| SystemError::io(context(), e))?
            .keep()
            .map(|(_, path)| path)
            .map_err(|e| SystemError::io(context(), e.error)),
    }
}

impl TempKind {
    fn noun(self) -> &'static str {
        match self {
            TempKind::Directory => "directory",
            TempKind::File => "file",
        }
    }
}

pub struct MktempModule;

#[async_trait]
impl Module for MktempModule {
    fn name(&self) -> &str {
        "mktemp"
    }

    fn description(&self) -> &str {
        "Create a unique temporary directory or file"
    }

    async fn run(&self, args: &ModuleArgs) -> Result<ModuleResult> {
        let params: MktempParams = args.parse(self.name())?;
        let parent = params.path.clone().unwrap_or_else(std::env::temp_dir);

        let path = tokio::task::spawn_blocking(move || {
            create(params.state, &parent, &params.prefix, &params.suffix)
        })
        .await
        .map_err(|e| Error::failed(format!("mktemp task failed: {}", e)))??;

        let path = path.display().to_string();
        info!("Created {}", path);
        Ok(ModuleResult::from_changes(vec![Change::create(&path, "create temporary entry")])
            .with_data("path", path))
    }
}
