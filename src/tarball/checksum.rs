//! Checksum fields and file digests
//!
//! A checksum field has the form `<ALGO>:<digest>` where ALGO is one of
//! MD5, SHA1, SHA256 or SHA512 and the digest is lowercase hex.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use md5::Md5;
use regex::Regex;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use tracing::debug;

use crate::tarball::error::RegistryError;
use crate::tarball::types::TarballDescription;

/// Buffer size for reading files during checksum calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

static CHECKSUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(MD5|SHA1|SHA256|SHA512)\s*:\s*(\S+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Md5 => "MD5",
            ChecksumAlgorithm::Sha1 => "SHA1",
            ChecksumAlgorithm::Sha256 => "SHA256",
            ChecksumAlgorithm::Sha512 => "SHA512",
        }
    }

    /// A fresh incremental hasher for this algorithm
    pub fn hasher(&self) -> Hasher {
        match self {
            ChecksumAlgorithm::Md5 => Hasher::Md5(Md5::new()),
            ChecksumAlgorithm::Sha1 => Hasher::Sha1(Sha1::new()),
            ChecksumAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            ChecksumAlgorithm::Sha512 => Hasher::Sha512(Sha512::new()),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MD5" => Ok(ChecksumAlgorithm::Md5),
            "SHA1" => Ok(ChecksumAlgorithm::Sha1),
            "SHA256" => Ok(ChecksumAlgorithm::Sha256),
            "SHA512" => Ok(ChecksumAlgorithm::Sha512),
            _ => Err(RegistryError::InvalidChecksumFormat(s.to_string())),
        }
    }
}

/// Incremental digest over one of the supported algorithms
pub enum Hasher {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl Hasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Md5(h) => h.update(data),
            Hasher::Sha1(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
        }
    }

    /// Lowercase hex digest
    pub fn finalize_hex(self) -> String {
        match self {
            Hasher::Md5(h) => hex::encode(h.finalize()),
            Hasher::Sha1(h) => hex::encode(h.finalize()),
            Hasher::Sha256(h) => hex::encode(h.finalize()),
            Hasher::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// A parsed `<ALGO>:<digest>` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub digest: String,
}

impl Checksum {
    pub fn new(algorithm: ChecksumAlgorithm, digest: impl Into<String>) -> Self {
        Self {
            algorithm,
            digest: digest.into(),
        }
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}

impl FromStr for Checksum {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = CHECKSUM_RE
            .captures(s)
            .ok_or_else(|| RegistryError::InvalidChecksumFormat(s.to_string()))?;
        Ok(Checksum::new(caps[1].parse()?, &caps[2]))
    }
}

/// Calculate the digest of a file with the given algorithm.
///
/// Returns the lowercase hexadecimal digest of the file contents.
pub fn file_checksum(path: &Path, algorithm: ChecksumAlgorithm) -> Result<String, RegistryError> {
    let mut file = File::open(path).map_err(|e| RegistryError::io(path, e))?;

    let mut hasher = algorithm.hasher();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| RegistryError::io(path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize_hex())
}

/// Verify a local file against the checksum recorded for a tarball.
///
/// An empty checksum field has nothing to verify and succeeds.
pub fn compare_tarball_checksum(
    tarball: &TarballDescription,
    path: &Path,
) -> Result<(), RegistryError> {
    if tarball.checksum.is_empty() {
        debug!("No checksum recorded for {}, skipping verification", tarball.name);
        return Ok(());
    }

    let expected: Checksum = tarball.checksum.parse()?;
    let actual = file_checksum(path, expected.algorithm)?;
    if !actual.eq_ignore_ascii_case(&expected.digest) {
        return Err(RegistryError::ChecksumMismatch {
            expected: expected.digest,
            actual,
        });
    }

    debug!("Checksum {} matched for {:?}", expected.algorithm, path);
    Ok(())
}
