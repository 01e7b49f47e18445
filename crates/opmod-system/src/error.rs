use thiserror::Error;

#[derive(Error, Debug)]
pub enum SystemError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {message}")]
    Command { command: String, message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidArgument(String),
}

impl SystemError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SystemError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SystemError>;

impl From<SystemError> for opmod_core::Error {
    fn from(err: SystemError) -> Self {
        match err {
            SystemError::InvalidArgument(msg) => opmod_core::Error::InvalidArgument(msg),
            other => opmod_core::Error::failed(other.to_string()),
        }
    }
}
