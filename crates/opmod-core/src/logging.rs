//! Tracing setup
//!
//! stdout carries the module report, so every log line goes to stderr.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{get_config_opt, LOG_FILTER_VAR, LOG_FORMAT_VAR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// `OPMOD_LOG_FORMAT=json` selects JSON, anything else plain text
    pub fn from_env() -> Self {
        match get_config_opt(LOG_FORMAT_VAR).as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Map `-v` occurrences to the default level used when `OPMOD_LOG` is unset.
pub fn default_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging(verbosity: u8, format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbosity).into())
        .with_env_var(LOG_FILTER_VAR)
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
