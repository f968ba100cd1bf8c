//! Guess mode: synthesize the next, not yet cataloged, patch release
//!
//! Per-OS heuristics (forced minimal builds, archive extension by short
//! version, file name template) live in a policy table built from
//! [`GuessConfig`], so supporting another OS is a configuration change.

use tracing::{debug, warn};

use crate::config::{GuessConfig, PlatformGuessConfig};
use crate::tarball::error::RegistryError;
use crate::tarball::platform::OperatingSystem;
use crate::tarball::types::{GUESSED_NOTE, TarballDescription};
use crate::template::{TemplateData, fill_template, merge_data};
use crate::version::ordinal::VersionOrdinal;

const MINIMAL_SUFFIX: &str = "-minimal";

impl PlatformGuessConfig {
    /// Archive extension for a short version
    pub fn extension_for(&self, short_version: &str) -> &str {
        self.extension_overrides
            .get(short_version)
            .unwrap_or(&self.default_extension)
    }
}

/// Rules deciding whether and how a tarball may be guessed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuessPolicy {
    config: GuessConfig,
}

impl GuessPolicy {
    pub fn new(config: GuessConfig) -> Self {
        Self { config }
    }

    /// Fail unless `short_version` is on the allow-list
    pub fn check_allowed(&self, short_version: &str) -> Result<(), RegistryError> {
        if self
            .config
            .allowed_versions
            .iter()
            .any(|allowed| allowed == short_version)
        {
            return Ok(());
        }
        Err(RegistryError::UnsupportedGuess {
            short_version: short_version.to_string(),
            allowed: self.config.allowed_versions.clone(),
        })
    }

    /// Look up the rule row for an operating system
    pub fn platform(&self, os: &OperatingSystem) -> Result<&PlatformGuessConfig, RegistryError> {
        self.config
            .platforms
            .get(os.as_str())
            .ok_or_else(|| RegistryError::UnsupportedGuessPlatform {
                os: os.to_string(),
                supported: self.config.platforms.keys().cloned().collect(),
            })
    }

    /// Build the entry for the release following `newest`
    ///
    /// `newest` is the greatest published version of the family identified by
    /// `short_version`, `flavor` and `os`.
    pub fn synthesize(
        &self,
        newest: &VersionOrdinal,
        short_version: &str,
        flavor: &str,
        os: &OperatingSystem,
    ) -> Result<TarballDescription, RegistryError> {
        let Some((major, minor, patch)) = newest.triple() else {
            return Err(RegistryError::NotFound(format!(
                "no published patch version for {flavor} {short_version} on {os}"
            )));
        };
        let platform = self.platform(os)?;

        let version = format!("{}.{}.{}", major, minor, patch + 1);
        let minimal = platform.force_minimal;
        let computed = TemplateData::from([
            ("Version".to_string(), version.clone()),
            (
                "Ext".to_string(),
                platform.extension_for(short_version).to_string(),
            ),
            (
                "Minimal".to_string(),
                if minimal { MINIMAL_SUFFIX } else { "" }.to_string(),
            ),
        ]);
        let (data, shadowed) = merge_data(&platform.template_data, &computed);
        if !shadowed.is_empty() {
            warn!(
                "Guess template data for {} overrides computed fields: {:?}",
                os, shadowed
            );
        }

        let name = fill_template(os.as_str(), &platform.name_template, &data)?;
        let url = format!(
            "{}-{}/{}",
            self.config.download_url.trim_end_matches('/'),
            short_version,
            name
        );
        debug!("Guessed {} at {}", name, url);

        Ok(TarballDescription {
            name,
            operating_system: os.as_str().to_string(),
            url,
            flavor: flavor.to_string(),
            minimal,
            short_version: short_version.to_string(),
            version,
            notes: GUESSED_NOTE.to_string(),
            ..Default::default()
        })
    }
}
