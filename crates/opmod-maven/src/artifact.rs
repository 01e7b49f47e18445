//! `maven_artifact` module

use async_trait::async_trait;
use opmod_core::config::get_config;
use opmod_core::prelude::*;
use serde::Deserialize;
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::checksum::{digest_file, parse_checksum_file, ChecksumAlg};
use crate::coordinates::{is_snapshot, Coordinates, VersionSpec};
use crate::error::{MavenError, Result as MavenResult};
use crate::repository::Repository;

pub const DEFAULT_REPOSITORY_URL: &str = "https://repo1.maven.org/maven2";

/// Default for `repository_url`
pub const REPOSITORY_URL_VAR: &str = "OPMOD_MAVEN_REPOSITORY_URL";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactState {
    #[default]
    Present,
    Absent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyChecksum {
    Never,
    #[default]
    Download,
    Change,
    Always,
}

impl VerifyChecksum {
    /// Compare an existing destination against the remote checksum
    fn on_change(self) -> bool {
        matches!(self, VerifyChecksum::Change | VerifyChecksum::Always)
    }

    /// Verify freshly downloaded bytes
    fn on_download(self) -> bool {
        matches!(self, VerifyChecksum::Download | VerifyChecksum::Always)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactParams {
    #[serde(deserialize_with = "de::string_like")]
    pub group_id: String,
    #[serde(deserialize_with = "de::string_like")]
    pub artifact_id: String,
    #[serde(default = "default_version", deserialize_with = "de::string_like")]
    pub version: String,
    #[serde(default, deserialize_with = "de::opt_string_like")]
    pub classifier: Option<String>,
    #[serde(default = "default_extension", deserialize_with = "de::string_like")]
    pub extension: String,
    #[serde(default = "default_repository_url", deserialize_with = "de::string_like")]
    pub repository_url: String,
    #[serde(default, deserialize_with = "de::opt_string_like")]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret>,
    #[serde(deserialize_with = "de::string_like")]
    pub dest: String,
    #[serde(default)]
    pub state: ArtifactState,
    #[serde(default = "default_timeout", deserialize_with = "de::int_like")]
    pub timeout: u64,
    #[serde(default = "default_true", deserialize_with = "de::bool_like")]
    pub validate_certs: bool,
    #[serde(default)]
    pub verify_checksum: VerifyChecksum,
    #[serde(default)]
    pub checksum_alg: ChecksumAlg,
}

fn default_version() -> String {
    "latest".to_string()
}

fn default_extension() -> String {
    "jar".to_string()
}

fn default_repository_url() -> String {
    get_config(REPOSITORY_URL_VAR, DEFAULT_REPOSITORY_URL)
}

fn default_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

/// A concrete artifact file in the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub version: String,
    /// Repository path of the file
    pub path: String,
    /// File name used when `dest` is a directory
    pub file_name: String,
}

/// Resolve `latest`, `release` and SNAPSHOT versions to a concrete file.
pub async fn resolve(
    repo: &Repository,
    coords: &Coordinates,
    spec: &VersionSpec,
) -> MavenResult<ResolvedArtifact> {
    let version = match spec {
        VersionSpec::Fixed(version) => version.clone(),
        VersionSpec::Latest | VersionSpec::Release => {
            let metadata = repo
                .fetch_metadata(&format!("{}/maven-metadata.xml", coords.artifact_path()))
                .await?;
            let found = if *spec == VersionSpec::Latest {
                metadata.latest_version()
            } else {
                metadata.release_version()
            };
            found.ok_or_else(|| MavenError::NoVersion(format!("{} ({})", coords, spec)))?
        }
    };

    let file_version = if is_snapshot(&version) {
        let path = format!("{}/maven-metadata.xml", coords.version_path(&version));
        match repo.fetch_metadata(&path).await {
            Ok(metadata) => metadata
                .snapshot_file_version(&version, coords.classifier.as_deref(), &coords.extension)
                .unwrap_or_else(|| version.clone()),
            Err(e) if e.is_not_found() => {
                debug!("No snapshot metadata for {}", version);
                version.clone()
            }
            Err(e) => return Err(e),
        }
    } else {
        version.clone()
    };

    Ok(ResolvedArtifact {
        path: coords.file_path(&version, &file_version),
        file_name: coords.file_name(&version),
        version,
    })
}

/// `dest` itself, or `dest/<file_name>` when it names a directory.
pub fn destination(dest: &str, file_name: &str) -> PathBuf {
    let path = Path::new(dest);
    if dest.ends_with('/') || path.is_dir() {
        path.join(file_name)
    } else {
        path.to_path_buf()
    }
}

/// Download `url` next to `dest` and move it into place.
async fn download_to(
    repo: &Repository,
    url: &str,
    dest: &Path,
    alg: ChecksumAlg,
    verify: bool,
) -> MavenResult<()> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = tempfile::Builder::new()
        .prefix(".opmod-download-")
        .tempfile_in(parent)
        .map_err(|e| MavenError::io(format!("Unable to create a file in {}", parent.display()), e))?;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(temp.path())
        .await
        .map_err(|e| MavenError::io(format!("Unable to open {}", temp.path().display()), e))?;

    let mut digester = alg.digester();
    repo.download(url, &mut file, &mut digester).await?;
    drop(file);

    if verify {
        let checksum_url = format!("{}.{}", url, alg.extension());
        let expected = remote_checksum(repo, &checksum_url).await?;
        let actual = digester.finish();
        if expected != actual {
            return Err(MavenError::ChecksumMismatch {
                url: url.to_string(),
                expected,
                actual,
            });
        }
    }

    temp.as_file()
        .set_permissions(target_permissions(dest))
        .map_err(|e| MavenError::io(format!("Unable to set permissions on {}", temp.path().display()), e))?;
    temp.persist(dest)
        .map_err(|e| MavenError::io(format!("Unable to move download to {}", dest.display()), e.error))?;
    Ok(())
}

/// Mode of the file being replaced, 0644 for a new one.
fn target_permissions(dest: &Path) -> Permissions {
    std::fs::metadata(dest)
        .map(|m| m.permissions())
        .unwrap_or_else(|_| Permissions::from_mode(0o644))
}

async fn remote_checksum(repo: &Repository, url: &str) -> MavenResult<String> {
    let content = repo.fetch_text(url).await?;
    parse_checksum_file(&content).ok_or_else(|| MavenError::InvalidChecksum(url.to_string()))
}

pub struct MavenArtifactModule;

impl MavenArtifactModule {
    fn repository(params: &ArtifactParams) -> MavenResult<Repository> {
        let auth = params
            .username
            .clone()
            .map(|user| (user, params.password.clone().unwrap_or_else(|| Secret::new(""))));
        Repository::new(
            &params.repository_url,
            Duration::from_secs(params.timeout),
            params.validate_certs,
            auth,
        )
    }

    async fn absent(
        params: &ArtifactParams,
        coords: &Coordinates,
        check_mode: bool,
    ) -> MavenResult<ModuleResult> {
        let dest_is_dir = params.dest.ends_with('/') || Path::new(&params.dest).is_dir();
        let dest = if dest_is_dir {
            let repo = Self::repository(params)?;
            let artifact = resolve(&repo, coords, &VersionSpec::parse(&params.version)).await?;
            destination(&params.dest, &artifact.file_name)
        } else {
            PathBuf::from(&params.dest)
        };

        let dest_display = dest.display().to_string();
        if !dest.exists() {
            return Ok(ModuleResult::from_changes(vec![Change::noop(&dest_display, "absent")])
                .with_data("dest", dest_display));
        }

        if !check_mode {
            tokio::fs::remove_file(&dest)
                .await
                .map_err(|e| MavenError::io(format!("Unable to remove {}", dest_display), e))?;
            info!("Removed {}", dest_display);
        }
        Ok(ModuleResult::from_changes(vec![Change::delete(&dest_display, "remove artifact")])
            .with_data("dest", dest_display))
    }

    async fn present(
        params: &ArtifactParams,
        coords: &Coordinates,
        check_mode: bool,
    ) -> MavenResult<ModuleResult> {
        let repo = Self::repository(params)?;
        let artifact = resolve(&repo, coords, &VersionSpec::parse(&params.version)).await?;
        let url = repo.url(&artifact.path);
        let dest = destination(&params.dest, &artifact.file_name);
        let dest_display = dest.display().to_string();

        let result = |change: Change| {
            ModuleResult::from_changes(vec![change])
                .with_data("version", artifact.version.clone())
                .with_data("dest", dest_display.clone())
                .with_data("url", url.clone())
        };

        let exists = dest.is_file();
        if exists {
            if !params.verify_checksum.on_change() {
                return Ok(result(Change::noop(&dest_display, "already present")));
            }

            let alg = params.checksum_alg;
            let checksum_url = format!("{}.{}", url, alg.extension());
            let remote = remote_checksum(&repo, &checksum_url).await?;
            let local = digest_file(&dest, alg).await?;
            if remote == local {
                return Ok(result(Change::noop(&dest_display, "checksum matches")));
            }
            debug!("{} differs from {} ({} != {})", dest_display, url, local, remote);
        }

        let change = if exists {
            Change::update(&dest_display, format!("replace with {}", artifact.version))
        } else {
            Change::create(&dest_display, format!("download {}", artifact.version))
        };

        if !check_mode {
            download_to(
                &repo,
                &url,
                &dest,
                params.checksum_alg,
                params.verify_checksum.on_download(),
            )
            .await?;
            info!("Downloaded {} to {}", url, dest_display);
        }

        Ok(result(change))
    }
}

#[async_trait]
impl Module for MavenArtifactModule {
    fn name(&self) -> &str {
        "maven_artifact"
    }

    fn description(&self) -> &str {
        "Download an artifact from a Maven repository"
    }

    fn supports_check_mode(&self) -> bool {
        true
    }

    fn no_log_params(&self) -> &'static [&'static str] {
        &["password"]
    }

    async fn run(&self, args: &ModuleArgs) -> Result<ModuleResult> {
        let params: ArtifactParams = args.parse(self.name())?;
        let coords = Coordinates::new(&params.group_id, &params.artifact_id)
            .with_classifier(params.classifier.clone())
            .with_extension(params.extension.clone());

        let result = match params.state {
            ArtifactState::Present => Self::present(&params, &coords, args.check_mode).await?,
            ArtifactState::Absent => Self::absent(&params, &coords, args.check_mode).await?,
        };
        Ok(result)
    }
}
