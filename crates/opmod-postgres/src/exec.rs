//! `postgresql_exec` module: run an SQL script
//!
//! The script is sent without bind arguments, so it goes through the simple
//! query protocol and may hold any number of statements. Idempotence is up to
//! the script.

use async_trait::async_trait;
use opmod_core::prelude::*;
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::{Connection, Executor};
use tracing::{debug, info, warn};

use crate::error::PostgresError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disable,
    Allow,
    #[default]
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl From<SslMode> for PgSslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Allow => PgSslMode::Allow,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
            SslMode::VerifyCa => PgSslMode::VerifyCa,
            SslMode::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecParams {
    #[serde(alias = "login_db", deserialize_with = "de::string_like")]
    pub db: String,
    #[serde(default = "default_host", deserialize_with = "de::string_like")]
    pub login_host: String,
    #[serde(default = "default_port", deserialize_with = "de::int_like")]
    pub login_port: u16,
    #[serde(default = "default_user", deserialize_with = "de::string_like")]
    pub login_user: String,
    #[serde(default)]
    pub login_password: Option<Secret>,
    #[serde(default)]
    pub ssl_mode: SslMode,
    #[serde(default, deserialize_with = "de::opt_string_like")]
    pub src: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_like")]
    pub content: Option<String>,
    #[serde(default = "default_true", deserialize_with = "de::bool_like")]
    pub single_transaction: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_true() -> bool {
    true
}

impl ExecParams {
    /// Hosts starting with `/` are Unix socket directories.
    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .port(self.login_port)
            .username(&self.login_user)
            .database(&self.db)
            .ssl_mode(self.ssl_mode.into())
            .application_name("opmod");

        options = if self.login_host.starts_with('/') {
            options.socket(&self.login_host)
        } else {
            options.host(&self.login_host)
        };

        match &self.login_password {
            Some(password) => options.password(password.expose()),
            None => options,
        }
    }

    pub async fn load_script(&self) -> crate::Result<String> {
        match (&self.content, &self.src) {
            (Some(content), None) => Ok(content.clone()),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .map_err(|source| PostgresError::Source {
                    path: path.clone(),
                    source,
                }),
            (Some(_), Some(_)) => Err(PostgresError::InvalidArgument(
                "parameters are mutually exclusive: content|src".into(),
            )),
            (None, None) => Err(PostgresError::InvalidArgument(
                "one of the following is required: content, src".into(),
            )),
        }
    }
}

/// Run `script`, inside one transaction when `single_transaction` is set.
pub async fn run_script(
    conn: &mut PgConnection,
    script: &str,
    single_transaction: bool,
) -> crate::Result<u64> {
    let result = if single_transaction {
        let mut tx = conn.begin().await?;
        let result = (&mut *tx).execute(script).await?;
        tx.commit().await?;
        result
    } else {
        (&mut *conn).execute(script).await?
    };
    Ok(result.rows_affected())
}

pub struct PostgresExecModule;

#[async_trait]
impl Module for PostgresExecModule {
    fn name(&self) -> &str {
        "postgresql_exec"
    }

    fn description(&self) -> &str {
        "Execute an SQL script against a PostgreSQL database"
    }

    fn no_log_params(&self) -> &'static [&'static str] {
        &["login_password"]
    }

    async fn run(&self, args: &ModuleArgs) -> Result<ModuleResult> {
        let params: ExecParams = args.parse(self.name())?;
        let script = params.load_script().await?;
        if script.trim().is_empty() {
            return Err(Error::invalid_argument("the SQL script is empty"));
        }

        debug!("Connecting to {} on {}:{}", params.db, params.login_host, params.login_port);
        let mut conn = PgConnection::connect_with(&params.connect_options())
            .await
            .map_err(|source| PostgresError::Connect {
                db: params.db.clone(),
                source,
            })?;

        let outcome = run_script(&mut conn, &script, params.single_transaction).await;
        if let Err(e) = conn.close().await {
            warn!("Failed to close connection: {}", e);
        }
        let rows_affected = outcome?;

        info!("Script executed on {}, {} rows affected", params.db, rows_affected);
        Ok(ModuleResult::from_changes(vec![Change::update(&params.db, "execute script")])
            .with_data("rows_affected", rows_affected))
    }
}
