//! `eselect` module

use async_trait::async_trait;
use opmod_core::prelude::*;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::SystemError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EselectParams {
    #[serde(alias = "module", deserialize_with = "de::string_like")]
    pub name: String,
    #[serde(deserialize_with = "de::string_like")]
    pub target: String,
    #[serde(default, deserialize_with = "de::opt_string_like")]
    pub scope: Option<String>,
    #[serde(default = "default_executable", deserialize_with = "de::string_like")]
    pub executable: String,
}

fn default_executable() -> String {
    "eselect".to_string()
}

/// Runs one eselect module, e.g. `java-vm`
pub struct Eselect {
    executable: String,
    module: String,
    scope: Option<String>,
}

impl Eselect {
    pub fn new(executable: &str, module: &str, scope: Option<&str>) -> Self {
        Self {
            executable: executable.to_string(),
            module: module.to_string(),
            scope: scope.filter(|s| !s.is_empty()).map(String::from),
        }
    }

    async fn run(&self, brief: bool, action: &str, extra: Option<&str>) -> crate::Result<String> {
        let mut cmd = Command::new(&self.executable);
        if brief {
            cmd.arg("--brief");
        }
        cmd.arg("--colour=no").arg(&self.module).arg(action);
        if let Some(scope) = &self.scope {
            cmd.arg(scope);
        }
        if let Some(extra) = extra {
            cmd.arg(extra);
        }

        let command = format!("{} {} {}", self.executable, self.module, action);
        debug!("Running {}", command);
        let output = cmd.output().await.map_err(|source| SystemError::Spawn {
            program: self.executable.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(SystemError::Command { command, message });
        }
        Ok(stdout)
    }

    /// Currently selected target(s)
    pub async fn show(&self) -> crate::Result<Vec<String>> {
        Ok(lines(&self.run(true, "show", None).await?))
    }

    /// Available targets in `list` order
    pub async fn list(&self) -> crate::Result<Vec<String>> {
        Ok(lines(&self.run(true, "list", None).await?))
    }

    pub async fn set(&self, target: &str) -> crate::Result<()> {
        self.run(false, "set", Some(target)).await.map(|_| ())
    }

    /// Map a 1-based index from `list` to its target name.
    pub async fn resolve_target(&self, target: &str) -> crate::Result<String> {
        let Ok(index) = target.parse::<usize>() else {
            return Ok(target.to_string());
        };

        let targets = self.list().await?;
        index
            .checked_sub(1)
            .and_then(|i| targets.get(i))
            .cloned()
            .ok_or_else(|| {
                SystemError::InvalidArgument(format!(
                    "target index {} is out of range, {} has {} targets",
                    index,
                    self.module,
                    targets.len()
                ))
            })
    }
}

/// Non-blank trimmed lines; a trailing `*` selection marker is dropped
fn lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|l| l.trim().trim_end_matches('*').trim_end())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

pub struct EselectModule;

#[async_trait]
impl Module for EselectModule {
    fn name(&self) -> &str {
        "eselect"
    }

    fn description(&self) -> &str {
        "Select a target of an eselect module"
    }

    fn supports_check_mode(&self) -> bool {
        true
    }

    async fn run(&self, args: &ModuleArgs) -> Result<ModuleResult> {
        let params: EselectParams = args.parse(self.name())?;
        let eselect = Eselect::new(&params.executable, &params.name, params.scope.as_deref());

        let previous = eselect.show().await?;
        let target = eselect.resolve_target(params.target.trim()).await?;

        let change = if previous.contains(&target) {
            Change::noop(&params.name, format!("{} already selected", target))
        } else {
            if !args.check_mode {
                eselect.set(&target).await?;
                info!("eselect {} set to {}", params.name, target);
            }
            Change::update(&params.name, format!("set {}", target))
        };

        Ok(ModuleResult::from_changes(vec![change])
            .with_data("target", target)
            .with_data("previous", previous))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tokio::sync::Mutex;

    // Writing a script while another test forks can fail the exec with ETXTBSY
    static STUB_LOCK: Mutex<()> = Mutex::const_new(());

    /// Fake eselect keeping the selection in a file next to the script
    fn stub(dir: &Path, current: &str) -> PathBuf {
        let state = dir.join("current");
        std::fs::write(&state, format!("{}\n", current)).unwrap();

        let script = dir.join("eselect");
        std::fs::write(
            &script,
            format!(
                r#"#!/bin/sh
[ "$1" = "--brief" ] && shift
[ "$1" = "--colour=no" ] && shift
[ "$1" = "java-vm" ] || {{ echo "!!! Error: Can't load module $1" >&2; exit 1; }}
case "$2" in
  show) cat "{state}" ;;
  list) printf '  openjdk-bin-11\n  openjdk-bin-17  *\n  icedtea-bin-8\n' ;;
  set) echo "$3" > "{state}" ;;
  *) exit 1 ;;
esac
"#,
                state = state.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    fn args(executable: &Path, target: &str) -> ModuleArgs {
        ModuleArgs::default()
            .with_param("name", "java-vm")
            .with_param("target", target)
            .with_param("executable", executable.to_str().unwrap())
    }

    fn current(dir: &Path) -> String {
        std::fs::read_to_string(dir.join("current")).unwrap().trim().to_string()
    }

    #[tokio::test]
    async fn test_already_selected() {
        let _guard = STUB_LOCK.lock().await;
        let dir = tempfile::tempdir().unwrap();
        let exe = stub(dir.path(), "openjdk-bin-17");

        let result = EselectModule.run(&args(&exe, "openjdk-bin-17")).await.unwrap();
        assert!(!result.changed);
        assert_eq!(result.data["previous"], serde_json::json!(["openjdk-bin-17"]));
    }

    #[tokio::test]
    async fn test_set_target() {
        let _guard = STUB_LOCK.lock().await;
        let dir = tempfile::tempdir().unwrap();
        let exe = stub(dir.path(), "openjdk-bin-17");

        let result = EselectModule.run(&args(&exe, "icedtea-bin-8")).await.unwrap();
        assert!(result.changed);
        assert_eq!(current(dir.path()), "icedtea-bin-8");
    }

    #[tokio::test]
    async fn test_numeric_target() {
        let _guard = STUB_LOCK.lock().await;
        let dir = tempfile::tempdir().unwrap();
        let exe = stub(dir.path(), "openjdk-bin-17");

        let result = EselectModule.run(&args(&exe, "1")).await.unwrap();
        assert_eq!(result.data["target"], "openjdk-bin-11");
        assert_eq!(current(dir.path()), "openjdk-bin-11");
    }

    #[tokio::test]
    async fn test_index_out_of_range() {
        let _guard = STUB_LOCK.lock().await;
        let dir = tempfile::tempdir().unwrap();
        let exe = stub(dir.path(), "openjdk-bin-17");

        let err = EselectModule.run(&args(&exe, "9")).await.unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[tokio::test]
    async fn test_check_mode_does_not_set() {
        let _guard = STUB_LOCK.lock().await;
        let dir = tempfile::tempdir().unwrap();
        let exe = stub(dir.path(), "openjdk-bin-17");

        let result = EselectModule
            .run(&args(&exe, "icedtea-bin-8").with_check_mode(true))
            .await
            .unwrap();
        assert!(result.changed);
        assert_eq!(current(dir.path()), "openjdk-bin-17");
    }

    #[tokio::test]
    async fn test_tool_error_is_reported() {
        let _guard = STUB_LOCK.lock().await;
        let dir = tempfile::tempdir().unwrap();
        let exe = stub(dir.path(), "openjdk-bin-17");

        let err = EselectModule
            .run(&args(&exe, "x").with_param("name", "kernel"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Can't load module kernel"));
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let err = EselectModule
            .run(&args(Path::new("/nonexistent/eselect"), "x"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to run /nonexistent/eselect"));
    }

    #[test]
    fn test_lines() {
        assert_eq!(lines("\n  a\n b *\n\n"), vec!["a", "b"]);
    }
}
