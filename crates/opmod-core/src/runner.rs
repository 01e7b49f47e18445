//! Single-invocation runner: arguments in, report out

use tracing::{info, info_span, warn, Instrument};

use crate::args::ModuleArgs;
use crate::module::Module;
use crate::registry::ModuleRegistry;
use crate::report::Report;

/// Look up `name`, parse `raw_args` and run the module.
pub async fn run_module(registry: &ModuleRegistry, name: &str, raw_args: &str) -> Report {
    let module = match registry.get(name) {
        Ok(module) => module,
        Err(e) => return Report::failure(&e, None),
    };

    let args = match ModuleArgs::from_text(raw_args) {
        Ok(args) => args,
        Err(e) => return Report::failure(&e, None),
    };

    execute(module.as_ref(), &args).await
}

/// Run an already resolved module with parsed arguments.
pub async fn execute(module: &dyn Module, args: &ModuleArgs) -> Report {
    let invocation = (!args.no_log).then(|| args.invocation(module.no_log_params()));

    if args.check_mode && !module.supports_check_mode() {
        return Report::skipped(
            format!(
                "remote module ({}) does not support check mode",
                module.name()
            ),
            invocation,
        );
    }

    let span = info_span!("module", name = module.name(), check_mode = args.check_mode);
    match module.run(args).instrument(span).await {
        Ok(result) => {
            info!(module = module.name(), changed = result.changed, "Module finished");
            Report::success(result, invocation)
        }
        Err(e) => {
            warn!(module = module.name(), error = %e, "Module failed");
            Report::failure(&e, invocation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::report::ModuleResult;
    use async_trait::async_trait;
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct EchoParams {
        value: String,
        #[serde(default)]
        password: Option<String>,
    }

    struct Echo {
        check_mode: bool,
    }

    #[async_trait]
    impl Module for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo a value"
        }
        fn supports_check_mode(&self) -> bool {
            self.check_mode
        }
        fn no_log_params(&self) -> &'static [&'static str] {
            &["password"]
        }
        async fn run(&self, args: &ModuleArgs) -> Result<ModuleResult> {
            let params: EchoParams = args.parse(self.name())?;
            if params.value == "fail" {
                return Err(Error::failed("asked to fail"));
            }
            Ok(ModuleResult::changed().with_data("value", params.value))
        }
    }

    fn registry(check_mode: bool) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register(Echo { check_mode }).unwrap();
        registry
    }

    #[tokio::test]
    async fn test_successful_run() {
        let report = run_module(&registry(false), "echo", r#"{"value": "hi", "password": "pw"}"#).await;
        assert!(!report.is_failed());
        assert_eq!(report.body()["value"], "hi");
        assert_eq!(
            report.body()["invocation"]["module_args"]["password"],
            crate::args::NO_LOG_PLACEHOLDER
        );
    }

    #[tokio::test]
    async fn test_module_failure() {
        let report = run_module(&registry(false), "echo", "value=fail").await;
        assert!(report.is_failed());
        assert_eq!(report.body()["msg"], "asked to fail");
    }

    #[tokio::test]
    async fn test_parameter_error_is_failure() {
        let report = run_module(&registry(false), "echo", r#"{"other": 1}"#).await;
        assert!(report.is_failed());
        assert_eq!(report.body()["msg"], "Unsupported parameters for (echo) module: other");
    }

    #[tokio::test]
    async fn test_check_mode_skipped_when_unsupported() {
        let report = run_module(
            &registry(false),
            "echo",
            r#"{"value": "hi", "_ansible_check_mode": true}"#,
        )
        .await;
        assert!(!report.is_failed());
        assert_eq!(report.body()["skipped"], true);
        assert_eq!(
            report.body()["msg"],
            "remote module (echo) does not support check mode"
        );
    }

    #[tokio::test]
    async fn test_check_mode_runs_when_supported() {
        let report = run_module(
            &registry(true),
            "echo",
            r#"{"value": "hi", "_ansible_check_mode": true}"#,
        )
        .await;
        assert_eq!(report.body()["changed"], true);
        assert!(!report.body().contains_key("skipped"));
    }

    #[tokio::test]
    async fn test_no_log_drops_invocation() {
        let report = run_module(
            &registry(false),
            "echo",
            r#"{"value": "hi", "_ansible_no_log": true}"#,
        )
        .await;
        assert!(!report.body().contains_key("invocation"));
    }

    #[tokio::test]
    async fn test_unknown_module() {
        let report = run_module(&registry(false), "nope", "{}").await;
        assert!(report.is_failed());
        assert_eq!(report.body()["msg"], "Unknown module: nope");
    }
}
