//! Artifact checksums (`.md5` / `.sha256` companions)

use serde::Deserialize;
use sha2::{Digest as _, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::error::{MavenError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlg {
    #[default]
    Md5,
    Sha256,
}

impl ChecksumAlg {
    /// Suffix of the checksum file in the repository
    pub fn extension(self) -> &'static str {
        match self {
            ChecksumAlg::Md5 => "md5",
            ChecksumAlg::Sha256 => "sha256",
        }
    }

    pub fn digester(self) -> Digester {
        match self {
            ChecksumAlg::Md5 => Digester::Md5(md5::Context::new()),
            ChecksumAlg::Sha256 => Digester::Sha256(Sha256::new()),
        }
    }
}

/// Incremental hash over downloaded or local bytes
pub enum Digester {
    Md5(md5::Context),
    Sha256(Sha256),
}

impl Digester {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Digester::Md5(ctx) => ctx.consume(data),
            Digester::Sha256(hasher) => hasher.update(data),
        }
    }

    /// Lower-case hex digest
    pub fn finish(self) -> String {
        match self {
            Digester::Md5(ctx) => format!("{:x}", ctx.compute()),
            Digester::Sha256(hasher) => format!("{:x}", hasher.finalize()),
        }
    }
}

pub async fn digest_file(path: &Path, alg: ChecksumAlg) -> Result<String> {
    let context = || format!("Unable to read {}", path.display());
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| MavenError::io(context(), e))?;

    let mut digester = alg.digester();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| MavenError::io(context(), e))?;
        if n == 0 {
            break;
        }
        digester.update(&buf[..n]);
    }
    Ok(digester.finish())
}

/// Checksum files hold the hex digest, sometimes followed by the file name.
pub fn parse_checksum_file(content: &str) -> Option<String> {
    content
        .split_whitespace()
        .next()
        .filter(|digest| digest.chars().all(|c| c.is_ascii_hexdigit()))
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_digests() {
        let mut md5 = ChecksumAlg::Md5.digester();
        md5.update(b"hello ");
        md5.update(b"world");
        assert_eq!(md5.finish(), "5eb63bbbe01eeed093cb22bb8f5acdc3");

        let mut sha = ChecksumAlg::Sha256.digester();
        sha.update(b"hello world");
        assert_eq!(
            sha.finish(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn test_digest_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        assert_eq!(
            digest_file(file.path(), ChecksumAlg::Md5).await.unwrap(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn test_parse_checksum_file() {
        assert_eq!(
            parse_checksum_file("5EB63BBBE01EEED093CB22BB8F5ACDC3  grid-1.0.jar\n").as_deref(),
            Some("5eb63bbbe01eeed093cb22bb8f5acdc3")
        );
        assert_eq!(parse_checksum_file(""), None);
        assert_eq!(parse_checksum_file("<html>"), None);
    }
}
