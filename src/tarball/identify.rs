//! Tarball file name identification
//!
//! Recognizes flavor, OS, architecture, version and minimal build from a
//! published file name such as `mysql-8.0.37-linux-glibc2.17-x86_64-minimal.tar.xz`.

use std::fs;
use std::path::Path;

use chrono::Local;
use regex::Regex;
use tracing::debug;

use crate::tarball::checksum::{Checksum, ChecksumAlgorithm, file_checksum};
use crate::tarball::error::{IdentifyError, RegistryError};
use crate::tarball::platform::{Arch, OperatingSystem};
use crate::tarball::types::TarballDescription;
use crate::version::ordinal::short_version;

/// Layout of `date_added` stamps written by this crate
pub const DATE_ADDED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Details recognized in a tarball file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameDetails {
    pub flavor: String,
    pub os: OperatingSystem,
    pub arch: Arch,
    pub version: String,
    pub short_version: String,
    pub minimal: bool,
}

/// Recognizes tarball properties from a file name
pub trait FilenameParser: Send + Sync {
    fn flavor(&self, basename: &str) -> Result<String, IdentifyError>;

    fn os(&self, basename: &str) -> Result<OperatingSystem, IdentifyError>;

    fn arch(&self, basename: &str) -> Result<Arch, IdentifyError>;

    /// Returns `(version, short_version)`
    fn version(&self, basename: &str) -> Result<(String, String), IdentifyError>;

    fn minimal(&self, basename: &str) -> bool {
        basename.contains("minimal")
    }

    /// Recognize every property, failing on the first one that is missing
    fn parse(&self, basename: &str) -> Result<FilenameDetails, IdentifyError> {
        let flavor = self.flavor(basename)?;
        let os = self.os(basename)?;
        let (version, short_version) = self.version(basename)?;
        let arch = self.arch(basename)?;
        Ok(FilenameDetails {
            flavor,
            os,
            arch,
            version,
            short_version,
            minimal: self.minimal(basename),
        })
    }
}

/// Parser for MySQL, Percona Server, NDB Cluster and MySQL Shell tarballs
pub struct DefaultFilenameParser {
    /// Flavor by file name prefix, first match wins
    flavor_patterns: Vec<(Regex, &'static str)>,
    /// OS by name fragment, first match wins
    os_patterns: Vec<(Regex, OperatingSystem)>,
    arch_re: Regex,
    version_re: Regex,
}

impl DefaultFilenameParser {
    pub fn new() -> Self {
        Self {
            flavor_patterns: vec![
                (Regex::new(r"^mysql-5\.7").unwrap(), "mysql"),
                (Regex::new(r"^mysql-[89]").unwrap(), "mysql"),
                (Regex::new(r"^mysql-cluster-[89]").unwrap(), "ndb"),
                (Regex::new(r"^mysql-shell-").unwrap(), "shell"),
                (Regex::new(r"^Percona-Server-").unwrap(), "percona"),
            ],
            os_patterns: vec![
                (Regex::new(r"[Ll]inux").unwrap(), OperatingSystem::Linux),
                (Regex::new(r"macos").unwrap(), OperatingSystem::Darwin),
            ],
            arch_re: Regex::new(r"(aarch64|amd64|arm64|x86-64|x86_64)").unwrap(),
            // Match: 5.7.x, 8.0.x to 8.4.x, 9.x.y, 10.x.y
            version_re: Regex::new(r"(5\.7\.\d+|8\.[01234]\.\d+|9\.\d+\.\d+|10\.\d+\.\d+)")
                .unwrap(),
        }
    }
}

impl Default for DefaultFilenameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FilenameParser for DefaultFilenameParser {
    fn flavor(&self, basename: &str) -> Result<String, IdentifyError> {
        self.flavor_patterns
            .iter()
            .find(|(re, _)| re.is_match(basename))
            .map(|(_, flavor)| flavor.to_string())
            .ok_or_else(|| IdentifyError::Flavor(basename.to_string()))
    }

    fn os(&self, basename: &str) -> Result<OperatingSystem, IdentifyError> {
        self.os_patterns
            .iter()
            .find(|(re, _)| re.is_match(basename))
            .map(|(_, os)| os.clone())
            .ok_or_else(|| IdentifyError::OperatingSystem(basename.to_string()))
    }

    fn arch(&self, basename: &str) -> Result<Arch, IdentifyError> {
        self.arch_re
            .find(basename)
            .map(|m| Arch::parse(m.as_str()))
            .ok_or_else(|| IdentifyError::Arch(basename.to_string()))
    }

    fn version(&self, basename: &str) -> Result<(String, String), IdentifyError> {
        let version = self
            .version_re
            .find(basename)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| IdentifyError::Version(basename.to_string()))?;
        let short = short_version(&version);
        Ok((version, short))
    }
}

/// Last path segment of a file path or URL
pub fn basename(location: &str) -> &str {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(location)
}

/// Current local time in the `date_added` layout
pub fn date_added_now() -> String {
    Local::now().format(DATE_ADDED_FORMAT).to_string()
}

/// Describe a tarball that exists on the local file system.
///
/// Fields already set in `template` are kept. Checksum (SHA512), size and
/// name always come from the file. Missing flavor and version are recognized
/// from the file name; a missing OS or arch defaults to the host's.
pub fn describe_local_file(
    path: &Path,
    template: TarballDescription,
    parser: &dyn FilenameParser,
) -> Result<TarballDescription, RegistryError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            RegistryError::InvalidArgument(format!("{} is not a file name", path.display()))
        })?;

    let digest = file_checksum(path, ChecksumAlgorithm::Sha512)?;
    let metadata = fs::metadata(path).map_err(|e| RegistryError::io(path, e))?;

    let mut description = template;
    description.checksum = Checksum::new(ChecksumAlgorithm::Sha512, digest).to_string();
    description.size = i64::try_from(metadata.len()).unwrap_or(i64::MAX);

    if description.flavor.is_empty() {
        description.flavor = parser.flavor(&name)?;
    }
    if description.version.is_empty() {
        let (version, short) = parser.version(&name)?;
        description.version = version;
        if description.short_version.is_empty() {
            description.short_version = short;
        }
    }
    if description.short_version.is_empty() {
        description.short_version = short_version(&description.version);
    }
    if description.operating_system.is_empty() {
        description.operating_system = OperatingSystem::host().to_string();
    }
    if description.arch.is_empty() {
        description.arch = parser
            .arch(&name)
            .unwrap_or_else(|_| Arch::host())
            .to_string();
    }
    description.minimal = description.minimal || parser.minimal(&name);
    if description.date_added.is_empty() {
        description.date_added = date_added_now();
    }
    description.name = name;

    debug!("Described local tarball {} ({} bytes)", description.name, description.size);
    Ok(description)
}
