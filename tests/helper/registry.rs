//! Registry test utilities

use std::collections::HashMap;

use async_trait::async_trait;
use tempfile::TempDir;

use tarball_registry::tarball::checksum::ChecksumAlgorithm;
use tarball_registry::tarball::error::FetchError;
use tarball_registry::tarball::fetcher::RemoteFetcher;
use tarball_registry::tarball::{CollectionStore, TarballCollection, TarballDescription};
use tarball_registry::version::ordinal::short_version;

/// Fetcher serving canned sizes and digests keyed by URL
pub struct MockFetcher {
    files: HashMap<String, (i64, String)>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    pub fn with_file(mut self, url: &str, size: i64, digest: &str) -> Self {
        self.files
            .insert(url.to_string(), (size, digest.to_string()));
        self
    }
}

#[async_trait]
impl RemoteFetcher for MockFetcher {
    async fn fetch_size(&self, url: &str) -> Result<i64, FetchError> {
        self.files
            .get(url)
            .map(|(size, _)| *size)
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }

    async fn fetch_and_hash(
        &self,
        url: &str,
        _algorithm: ChecksumAlgorithm,
    ) -> Result<String, FetchError> {
        self.files
            .get(url)
            .map(|(_, digest)| digest.clone())
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

pub fn tarball(
    name: &str,
    flavor: &str,
    version: &str,
    os: &str,
    arch: &str,
    minimal: bool,
) -> TarballDescription {
    TarballDescription {
        name: name.to_string(),
        checksum: format!("SHA512:{:0>16}", name.len()),
        operating_system: os.to_string(),
        arch: arch.to_string(),
        url: format!("https://downloads.example.com/{name}"),
        flavor: flavor.to_string(),
        minimal,
        size: 1024,
        short_version: short_version(version),
        version: version.to_string(),
        ..Default::default()
    }
}

/// A small catalog covering several families, platforms and build variants
pub fn sample_collection() -> TarballCollection {
    TarballCollection::new(
        "1.0.0",
        vec![
            tarball(
                "mysql-8.4.1-linux-glibc2.17-x86_64-minimal.tar.xz",
                "mysql",
                "8.4.1",
                "linux",
                "amd64",
                true,
            ),
            tarball(
                "mysql-8.0.36-linux-glibc2.17-x86_64-minimal.tar.xz",
                "mysql",
                "8.0.36",
                "linux",
                "amd64",
                true,
            ),
            tarball(
                "mysql-8.0.37-linux-glibc2.17-x86_64-minimal.tar.xz",
                "mysql",
                "8.0.37",
                "linux",
                "amd64",
                true,
            ),
            tarball(
                "mysql-8.0.37-linux-glibc2.17-x86_64.tar.xz",
                "mysql",
                "8.0.37",
                "linux",
                "amd64",
                false,
            ),
            tarball(
                "mysql-8.0.37-linux-glibc2.17-aarch64.tar.xz",
                "mysql",
                "8.0.37",
                "linux",
                "arm64",
                false,
            ),
            tarball(
                "mysql-8.0.37-macos14-arm64.tar.gz",
                "mysql",
                "8.0.37",
                "darwin",
                "arm64",
                false,
            ),
            tarball(
                "Percona-Server-8.0.36-28-Linux.x86_64.glibc2.17-minimal.tar.gz",
                "percona",
                "8.0.36",
                "linux",
                "amd64",
                true,
            ),
            tarball(
                "mysql-5.7.44-linux-glibc2.12-x86_64.tar.gz",
                "mysql",
                "5.7.44",
                "linux",
                "amd64",
                false,
            ),
        ],
    )
}

/// A store in a fresh temporary directory; keep the `TempDir` alive while using it
pub fn create_test_store() -> (TempDir, CollectionStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = CollectionStore::new(temp_dir.path().join("config").join("tarball-list.json"));
    (temp_dir, store)
}
