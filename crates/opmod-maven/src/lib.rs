//! opmod-maven: `maven_artifact` module
//!
//! Resolves `latest`, `release` and SNAPSHOT versions from
//! `maven-metadata.xml`, downloads the artifact next to its destination and
//! moves it into place once the checksum matches.

pub mod artifact;
pub mod checksum;
pub mod coordinates;
pub mod error;
pub mod metadata;
pub mod repository;

pub use artifact::{MavenArtifactModule, DEFAULT_REPOSITORY_URL, REPOSITORY_URL_VAR};
pub use checksum::{ChecksumAlg, Digester};
pub use coordinates::{Coordinates, VersionSpec};
pub use error::{MavenError, Result};
pub use metadata::Metadata;
pub use repository::Repository;
