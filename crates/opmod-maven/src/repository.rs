//! HTTP access to a Maven repository

use opmod_core::Secret;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::checksum::Digester;
use crate::error::{MavenError, Result};
use crate::metadata::Metadata;

pub struct Repository {
    client: Client,
    base_url: String,
    auth: Option<(String, Secret)>,
}

impl Repository {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        validate_certs: bool,
        auth: Option<(String, Secret)>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!validate_certs)
            .build()
            .map_err(|source| MavenError::Request {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Absolute URL of a repository path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get(&self, url: &str) -> Result<Response> {
        debug!("GET {}", url);
        let mut request = self.client.get(url);
        if let Some((user, password)) = &self.auth {
            request = request.basic_auth(user, Some(password.expose()));
        }

        let response = request.send().await.map_err(|source| MavenError::Request {
            url: url.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            return Err(MavenError::Http {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|source| MavenError::Request {
                url: url.to_string(),
                source,
            })
    }

    pub async fn fetch_metadata(&self, path: &str) -> Result<Metadata> {
        let url = self.url(path);
        let xml = self.fetch_text(&url).await?;
        Metadata::parse(&xml).map_err(|source| MavenError::Metadata { url, source })
    }

    /// Stream `url` into `file`, feeding every chunk to `digester`.
    pub async fn download(
        &self,
        url: &str,
        file: &mut tokio::fs::File,
        digester: &mut Digester,
    ) -> Result<u64> {
        let mut response = self.get(url).await?;
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await.map_err(|source| MavenError::Request {
            url: url.to_string(),
            source,
        })? {
            digester.update(&chunk);
            file.write_all(&chunk)
                .await
                .map_err(|e| MavenError::io("Unable to write download", e))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| MavenError::io("Unable to write download", e))?;
        debug!("Downloaded {} bytes from {}", written, url);
        Ok(written)
    }
}
