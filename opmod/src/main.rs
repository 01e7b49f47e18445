//! opmod: configuration-management modules in one binary
//!
//! Invoked as `opmod <module> [ARGS_FILE]` (or `opmod run ...`), or through a
//! symlink named after the module, in which case the first argument is the
//! arguments file.
//! The JSON report always goes to stdout; logs go to stderr.

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::debug;

use opmod::{default_registry, module_from_program};
use opmod_core::config::load_environment;
use opmod_core::logging::{init_logging, LogFormat};
use opmod_core::runner::run_module;
use opmod_core::{Error, ModuleArgs, Report};

#[derive(Parser, Debug)]
#[command(name = "opmod")]
#[command(about = "Run configuration-management modules and print a JSON report")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity on stderr
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List bundled modules
    List {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a module with arguments read from ARGS_FILE, or stdin
    Run {
        module: String,
        args_file: Option<PathBuf>,
    },
    /// `opmod <module> [ARGS_FILE]`
    #[command(external_subcommand)]
    Module(Vec<String>),
}

#[tokio::main]
async fn main() -> Result<()> {
    load_environment();
    let registry = default_registry()?;

    let mut argv = std::env::args();
    let program = argv.next().unwrap_or_default();

    // Multi-call: `ldap /tmp/args` behaves as `opmod run ldap /tmp/args`
    let (module, args_file, verbose, format) =
        match module_from_program(&program, |name| registry.contains(name)) {
            Some(module) => (module, argv.next().map(PathBuf::from), 0, LogFormat::from_env()),
            None => {
                let mut args = Args::parse();
                if let Commands::Module(words) = &mut args.command {
                    let trailing = TrailingFlags::strip(words);
                    args.verbose = args.verbose.saturating_add(trailing.verbose);
                    args.log_json |= trailing.log_json;
                }
                let format = if args.log_json {
                    LogFormat::Json
                } else {
                    LogFormat::from_env()
                };
                match args.command {
                    Commands::List { json } => {
                        init_logging(args.verbose, format);
                        print_listing(&registry, json)?;
                        return Ok(());
                    }
                    Commands::Run { module, args_file } => (module, args_file, args.verbose, format),
                    Commands::Module(words) => {
                        let mut words = words.into_iter();
                        let module = words.next().unwrap_or_default();
                        (module, words.next().map(PathBuf::from), args.verbose, format)
                    }
                }
            }
        };

    let report = match read_args(args_file.as_deref()).await {
        Ok(raw) => {
            let requested = ModuleArgs::from_text(&raw).map(|a| a.verbosity).unwrap_or(0);
            init_logging(verbose.max(requested), format);
            debug!("Running module {}", module);
            run_module(&registry, &module, &raw).await
        }
        Err(e) => {
            init_logging(verbose, format);
            Report::failure(&e, None)
        }
    };

    println!("{}", report.to_json_string());
    let code = report.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Global flags given after the module name, which clap leaves in the
/// external subcommand's words.
#[derive(Debug, Default, PartialEq, Eq)]
struct TrailingFlags {
    verbose: u8,
    log_json: bool,
}

impl TrailingFlags {
    /// Remove recognised flags from `words`, keeping everything else in order.
    fn strip(words: &mut Vec<String>) -> Self {
        let mut flags = Self::default();
        words.retain(|word| match word.as_str() {
            "--log-json" => {
                flags.log_json = true;
                false
            }
            "--verbose" => {
                flags.verbose = flags.verbose.saturating_add(1);
                false
            }
            w if w.len() > 1 && w.starts_with('-') && w[1..].chars().all(|c| c == 'v') => {
                flags.verbose = flags.verbose.saturating_add((w.len() - 1) as u8);
                false
            }
            _ => true,
        });
        flags
    }
}

/// Arguments text from `path`, or all of stdin when no path is given.
async fn read_args(path: Option<&Path>) -> opmod_core::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::failed(format!("Unable to read arguments from {}: {}", path.display(), e))
        }),
        None => {
            let mut raw = String::new();
            tokio::io::stdin().read_to_string(&mut raw).await?;
            Ok(raw)
        }
    }
}

fn print_listing(registry: &opmod_core::ModuleRegistry, json: bool) -> Result<()> {
    let modules = registry.list_metadata();
    if json {
        println!("{}", serde_json::to_string_pretty(&modules)?);
        return Ok(());
    }

    for info in modules {
        let check = if info.supports_check_mode { "check" } else { "-" };
        println!("{:<20} {:<6} {}", info.name, check, info.description);
    }
    Ok(())
}
