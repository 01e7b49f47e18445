use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostgresError {
    #[error("unable to connect to database {db}: {source}")]
    Connect {
        db: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("Unable to read {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, PostgresError>;

impl From<PostgresError> for opmod_core::Error {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::InvalidArgument(msg) => opmod_core::Error::InvalidArgument(msg),
            other => opmod_core::Error::failed(other.to_string()),
        }
    }
}
