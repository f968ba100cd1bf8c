//! Remote tarball inspection
//!
//! Size and checksum of a published tarball are only known to the server that
//! hosts it: the size comes from `Content-Length`, the checksum from hashing
//! the whole download.

#[cfg(test)]
use mockall::automock;

use reqwest::header::CONTENT_LENGTH;
use tracing::{debug, info, warn};

use crate::tarball::checksum::{Checksum, ChecksumAlgorithm};
use crate::tarball::error::{FetchError, RegistryError};
use crate::tarball::identify::{FilenameParser, basename, date_added_now};
use crate::tarball::types::TarballDescription;

/// User agent sent with every request
const USER_AGENT: &str = "tarball-registry";

/// Trait for inspecting a tarball published at a URL
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Size in bytes announced by the server, 0 if not announced
    async fn fetch_size(&self, url: &str) -> Result<i64, FetchError>;

    /// Download the file and return its lowercase hex digest
    async fn fetch_and_hash(
        &self,
        url: &str,
        algorithm: ChecksumAlgorithm,
    ) -> Result<String, FetchError>;
}

/// [`RemoteFetcher`] issuing one plain GET per call
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }

        if !status.is_success() {
            warn!("Server returned status {}: {}", status, url);
            return Err(FetchError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch_size(&self, url: &str) -> Result<i64, FetchError> {
        let response = self.get(url).await?;

        let size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(0);
        debug!("{} is {} bytes", url, size);
        Ok(size)
    }

    async fn fetch_and_hash(
        &self,
        url: &str,
        algorithm: ChecksumAlgorithm,
    ) -> Result<String, FetchError> {
        let mut response = self.get(url).await?;

        let mut hasher = algorithm.hasher();
        while let Some(chunk) = response.chunk().await? {
            hasher.update(&chunk);
        }
        Ok(hasher.finalize_hex())
    }
}

/// Describe the tarball published at `url`.
///
/// Every property is recognized from the URL's basename before anything is
/// downloaded. The checksum is the MD5 of the full download.
pub async fn describe_url(
    url: &str,
    parser: &dyn FilenameParser,
    fetcher: &dyn RemoteFetcher,
) -> Result<TarballDescription, RegistryError> {
    let name = basename(url);
    let details = parser.parse(name)?;
    debug!("Identified {}: {:?}", name, details);

    let size = fetcher.fetch_size(url).await?;
    info!("Downloading {} to compute its checksum", url);
    let digest = fetcher.fetch_and_hash(url, ChecksumAlgorithm::Md5).await?;

    Ok(TarballDescription {
        name: name.to_string(),
        checksum: Checksum::new(ChecksumAlgorithm::Md5, digest).to_string(),
        operating_system: details.os.to_string(),
        arch: details.arch.to_string(),
        url: url.to_string(),
        flavor: details.flavor,
        minimal: details.minimal,
        size,
        short_version: details.short_version,
        version: details.version,
        date_added: date_added_now(),
        ..Default::default()
    })
}
