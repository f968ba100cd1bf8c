use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::template::TemplateError;

/// A single entity-level problem found while validating a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Name of the offending tarball, or a placeholder for collection-level issues
    pub name: String,
    pub issue: String,
}

impl ValidationIssue {
    pub fn new(name: impl Into<String>, issue: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            issue: issue.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{}", ambiguous_message(names, *same_version))]
    AmbiguousMatch {
        names: Vec<String>,
        /// True when the candidates tie on the newest version
        same_version: bool,
    },

    #[error("Can only guess versions {}; {short_version} is not one of them", allowed.join(", "))]
    UnsupportedGuess {
        short_version: String,
        allowed: Vec<String>,
    },

    #[error("No guess rule for operating system {os}; supported: {}", supported.join(", "))]
    UnsupportedGuessPlatform { os: String, supported: Vec<String> },

    #[error("Unmatched checksum: expected '{expected}' but found '{actual}'")]
    ChecksumMismatch { expected: String, actual: String },

    #[error(
        "Invalid checksum format '{0}'. Expected: (MD5|SHA1|SHA256|SHA512):CHECKSUM_STRING"
    )]
    InvalidChecksumFormat(String),

    #[error("Corrupt registry document {path:?}: {source}")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Validation errors\n{}", validation_message(.0))]
    ValidationFailed(Vec<ValidationIssue>),

    #[error("Tarball name {0} listed more than once")]
    DuplicateName(String),

    #[error(
        "Tarball with OS {os}-{arch}, flavor {flavor}, version {version}, and minimal {minimal} listed more than once"
    )]
    DuplicateCombination {
        os: String,
        arch: String,
        flavor: String,
        version: String,
        minimal: bool,
    },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Identify error: {0}")]
    Identify(#[from] IdentifyError),
}

impl RegistryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RegistryError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Remote file not found: {0}")]
    NotFound(String),

    #[error("Received status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },
}

#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("Unable to identify flavor of {0}")]
    Flavor(String),

    #[error("Unable to identify OS of {0}")]
    OperatingSystem(String),

    #[error("Unable to identify architecture of {0}")]
    Arch(String),

    #[error("Unable to identify version/short version of {0}")]
    Version(String),
}

fn ambiguous_message(names: &[String], same_version: bool) -> String {
    if same_version {
        format!(
            "Tarballs {} have the same version. Get the one you want by name",
            names.join(" and ")
        )
    } else {
        format!(
            "More than one tarball found with current search criteria ({}). Get it by name instead (or ask for the newest)",
            names.join(" ")
        )
    }
}

fn validation_message(issues: &[ValidationIssue]) -> String {
    serde_json::to_string_pretty(issues).unwrap_or_else(|_| format!("{issues:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_match_names_every_candidate() {
        let err = RegistryError::AmbiguousMatch {
            names: vec!["a.tar.gz".to_string(), "b.tar.gz".to_string()],
            same_version: false,
        };

        let message = err.to_string();
        assert!(message.contains("a.tar.gz"));
        assert!(message.contains("b.tar.gz"));
        assert!(message.contains("by name"));
    }

    #[test]
    fn validation_failed_lists_issues_as_json() {
        let err = RegistryError::ValidationFailed(vec![ValidationIssue::new(
            "mysql-8.0.37.tar.xz",
            "checksum is missing",
        )]);

        let message = err.to_string();
        assert!(message.starts_with("Validation errors\n"));
        assert!(message.contains(r#""name": "mysql-8.0.37.tar.xz""#));
        assert!(message.contains(r#""issue": "checksum is missing""#));
    }
}
