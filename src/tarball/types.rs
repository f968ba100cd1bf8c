//! Tarball entity model and its persisted JSON shape

use serde::{Deserialize, Serialize};

/// Flavor whose tarballs are published without a checksum
pub const CHECKSUM_OPTIONAL_FLAVOR: &str = "tidb";

/// Marker stored in `notes` for entries synthesized by guess mode
pub const GUESSED_NOTE: &str = "guessed";

/// Metadata of one published database server tarball
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TarballDescription {
    /// File basename, unique within a collection
    pub name: String,
    /// `<ALGO>:<digest>`, e.g. `SHA512:ab12...`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub checksum: String,
    #[serde(rename = "OS")]
    pub operating_system: String,
    pub arch: String,
    pub url: String,
    pub flavor: String,
    pub minimal: bool,
    pub size: i64,
    pub short_version: String,
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub updated_by: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub date_added: String,
}

impl TarballDescription {
    /// Key identifying the platform/build combination an entry provides
    pub fn combination_key(&self) -> (&str, &str, &str, &str, bool) {
        (
            &self.operating_system,
            &self.arch,
            &self.flavor,
            &self.version,
            self.minimal,
        )
    }

    /// True for entries synthesized by guess mode
    pub fn is_guessed(&self) -> bool {
        self.notes == GUESSED_NOTE
    }
}

/// The persisted set of known tarballs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TarballCollection {
    /// Version of the tool that produced the document
    #[serde(rename = "DbdeployerVersion")]
    pub schema_version: String,
    #[serde(rename = "updated_on", skip_serializing_if = "String::is_empty")]
    pub updated_on: String,
    #[serde(rename = "Tarballs")]
    pub tarballs: Vec<TarballDescription>,
}

impl TarballCollection {
    pub fn new(schema_version: impl Into<String>, tarballs: Vec<TarballDescription>) -> Self {
        Self {
            schema_version: schema_version.into(),
            updated_on: String::new(),
            tarballs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tarballs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tarballs.len()
    }
}
