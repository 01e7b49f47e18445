use thiserror::Error;

#[derive(Error, Debug)]
pub enum MavenError {
    #[error("Failed to fetch {url}: HTTP {status}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to fetch {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid maven-metadata.xml at {url}: {source}")]
    Metadata {
        url: String,
        #[source]
        source: quick_xml::de::DeError,
    },

    #[error("No version found for {0}")]
    NoVersion(String),

    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid checksum file at {0}")]
    InvalidChecksum(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidArgument(String),
}

impl MavenError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        MavenError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MavenError::Http { status, .. } if *status == reqwest::StatusCode::NOT_FOUND)
    }
}

pub type Result<T> = std::result::Result<T, MavenError>;

impl From<MavenError> for opmod_core::Error {
    fn from(err: MavenError) -> Self {
        match err {
            MavenError::InvalidArgument(msg) => opmod_core::Error::InvalidArgument(msg),
            other => opmod_core::Error::failed(other.to_string()),
        }
    }
}
