//! Error types for opmod

use serde_json::{Map, Value};
use thiserror::Error;

/// Main error type for module invocations
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Module '{0}' is already registered")]
    DuplicateModule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure reported by a module, optionally with extra keys for the report
    #[error("{msg}")]
    Failed {
        msg: String,
        data: Map<String, Value>,
    },
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create a module failure without payload
    pub fn failed(msg: impl Into<String>) -> Self {
        Error::Failed {
            msg: msg.into(),
            data: Map::new(),
        }
    }

    /// Create a module failure carrying extra report keys
    pub fn failed_with(msg: impl Into<String>, data: Map<String, Value>) -> Self {
        Error::Failed {
            msg: msg.into(),
            data,
        }
    }

    /// Extra report keys attached to this error, if any
    pub fn data(&self) -> Option<&Map<String, Value>> {
        match self {
            Error::Failed { data, .. } if !data.is_empty() => Some(data),
            _ => None,
        }
    }
}
