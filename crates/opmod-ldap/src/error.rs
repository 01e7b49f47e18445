use thiserror::Error;

use crate::ldif::LdifError;

#[derive(Error, Debug)]
pub enum LdapModuleError {
    #[error(transparent)]
    Ldif(#[from] LdifError),

    #[error("{0}")]
    Ldap(#[from] ldap3::LdapError),

    #[error("Unable to read {path}: {source}")]
    Source {
        path: String,
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, LdapModuleError>;

impl From<LdapModuleError> for opmod_core::Error {
    fn from(err: LdapModuleError) -> Self {
        match err {
            LdapModuleError::InvalidArgument(msg) => opmod_core::Error::InvalidArgument(msg),
            other => opmod_core::Error::failed(other.to_string()),
        }
    }
}
