//! opmod-postgres: `postgresql_exec` module

pub mod error;
pub mod exec;

pub use error::{PostgresError, Result};
pub use exec::{PostgresExecModule, SslMode};
