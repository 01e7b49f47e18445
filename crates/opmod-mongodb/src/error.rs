use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplsetError {
    #[error("unable to connect to database: {0}")]
    Connect(#[source] mongodb::error::Error),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    #[error("Unexpected server reply: {0}")]
    Reply(String),

    #[error("Invalid host `{0}`")]
    InvalidHost(String),

    #[error("{0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, ReplsetError>;

impl From<ReplsetError> for opmod_core::Error {
    fn from(err: ReplsetError) -> Self {
        match err {
            ReplsetError::InvalidHost(_) | ReplsetError::InvalidArgument(_) => {
                opmod_core::Error::InvalidArgument(err.to_string())
            }
            other => opmod_core::Error::failed(other.to_string()),
        }
    }
}
