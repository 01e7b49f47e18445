//! Login credentials, from parameters or `~/.mongodb.cnf`
//!
//! The file is INI with a `[client]` section:
//!
//! ```ini
//! [client]
//! user = admin
//! pass = secret
//! ```

use config::{Config, File, FileFormat};
use opmod_core::config::get_config_opt;
use opmod_core::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ReplsetError, Result};

/// Overrides the location of the credentials file
pub const CNF_PATH_VAR: &str = "OPMOD_MONGODB_CNF";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: Secret,
}

#[derive(Debug, Deserialize)]
struct MongoCnf {
    client: ClientSection,
}

#[derive(Debug, Deserialize)]
struct ClientSection {
    user: String,
    pass: String,
}

pub fn default_cnf_path() -> Option<PathBuf> {
    get_config_opt(CNF_PATH_VAR)
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".mongodb.cnf")))
}

/// Credentials from a `.mongodb.cnf` file; `None` when it is missing,
/// unreadable or lacks either key.
pub fn read_cnf(path: &Path) -> Option<Credentials> {
    let settings = Config::builder()
        .add_source(File::from(path).format(FileFormat::Ini))
        .build()
        .map_err(|e| debug!("No credentials from {}: {}", path.display(), e))
        .ok()?;

    let cnf: MongoCnf = settings
        .try_deserialize()
        .map_err(|e| debug!("No credentials from {}: {}", path.display(), e))
        .ok()?;

    debug!("Using credentials of {} from {}", cnf.client.user, path.display());
    Some(Credentials {
        user: cnf.client.user,
        password: Secret::new(cnf.client.pass),
    })
}

/// Resolve the login: both parameters, neither (fall back to the file), or
/// an error when only one is given.
pub fn resolve(user: Option<String>, password: Option<Secret>) -> Result<Option<Credentials>> {
    match (user, password) {
        (Some(user), Some(password)) => Ok(Some(Credentials { user, password })),
        (None, None) => Ok(default_cnf_path().and_then(|path| read_cnf(&path))),
        _ => Err(ReplsetError::InvalidArgument(
            "when supplying login arguments, both login_user and login_password must be provided"
                .into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cnf(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".cnf").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_cnf() {
        let file = cnf("[client]\nuser = admin\npass = s3cret\n");
        let creds = read_cnf(file.path()).unwrap();
        assert_eq!(creds.user, "admin");
        assert_eq!(creds.password.expose(), "s3cret");
    }

    #[test]
    fn test_read_cnf_incomplete() {
        let file = cnf("[client]\nuser = admin\n");
        assert!(read_cnf(file.path()).is_none());
    }

    #[test]
    fn test_read_cnf_missing_file() {
        assert!(read_cnf(Path::new("/nonexistent/.mongodb.cnf")).is_none());
    }

    #[test]
    fn test_resolve_explicit() {
        let creds = resolve(Some("root".into()), Some(Secret::new("pw")))
            .unwrap()
            .unwrap();
        assert_eq!(creds.user, "root");
    }

    #[test]
    fn test_resolve_requires_both() {
        assert!(resolve(Some("root".into()), None).is_err());
        assert!(resolve(None, Some(Secret::new("pw"))).is_err());
    }
}
