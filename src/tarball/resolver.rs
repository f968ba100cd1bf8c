//! Resolution of search criteria to a single tarball

use tracing::debug;

use crate::tarball::error::RegistryError;
use crate::tarball::guess::GuessPolicy;
use crate::tarball::platform::{Arch, OperatingSystem};
use crate::tarball::types::TarballDescription;
use crate::version::ordinal::{VersionOrdinal, short_version};

/// What the caller is looking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Full (`8.0.37`) or short (`8.0`) version
    pub version: String,
    pub flavor: String,
    pub os: OperatingSystem,
    pub arch: Arch,
    /// Only accept minimal builds
    pub minimal: bool,
    /// Pick the newest version instead of failing on several matches
    pub prefer_newest: bool,
}

impl SearchCriteria {
    pub fn new(version: &str, flavor: &str, os: &str, arch: &str) -> Self {
        Self {
            version: version.trim().to_string(),
            flavor: flavor.trim().to_lowercase(),
            os: OperatingSystem::parse(os),
            arch: Arch::parse(arch),
            minimal: false,
            prefer_newest: false,
        }
    }

    pub fn minimal(mut self, minimal: bool) -> Self {
        self.minimal = minimal;
        self
    }

    pub fn prefer_newest(mut self, prefer_newest: bool) -> Self {
        self.prefer_newest = prefer_newest;
        self
    }

    /// Short version of the request ("8.0.37" -> "8.0", "8.0" stays "8.0")
    pub fn short_version(&self) -> String {
        if self.version.matches('.').count() >= 2 {
            short_version(&self.version)
        } else {
            self.version.clone()
        }
    }

    /// Returns true if `tarball` satisfies these criteria
    ///
    /// Entries without an architecture match any requested architecture.
    pub fn matches(&self, tarball: &TarballDescription) -> bool {
        let version_match =
            tarball.version == self.version || tarball.short_version == self.version;
        let arch_match =
            tarball.arch.is_empty() || tarball.arch.to_lowercase() == self.arch.as_str();

        version_match
            && tarball.flavor.to_lowercase() == self.flavor
            && tarball.operating_system.to_lowercase() == self.os.as_str()
            && arch_match
            && (!self.minimal || tarball.minimal)
    }

    fn describe(&self) -> String {
        format!(
            "version {}, flavor {}, OS {}, arch {}",
            self.version, self.flavor, self.os, self.arch
        )
    }
}

/// Returns every tarball matching `criteria`, in collection order
pub fn filter_tarballs<'a>(
    tarballs: &'a [TarballDescription],
    criteria: &SearchCriteria,
) -> Vec<&'a TarballDescription> {
    tarballs.iter().filter(|t| criteria.matches(t)).collect()
}

/// Resolve `criteria` to exactly one published tarball
pub fn resolve(
    tarballs: &[TarballDescription],
    criteria: &SearchCriteria,
) -> Result<TarballDescription, RegistryError> {
    let candidates = filter_tarballs(tarballs, criteria);
    debug!("{} candidate(s) for {}", candidates.len(), criteria.describe());

    match candidates.as_slice() {
        [] => Err(RegistryError::NotFound(format!(
            "tarball with {} not found",
            criteria.describe()
        ))),
        [single] => Ok((*single).clone()),
        _ if criteria.prefer_newest => newest_of(&candidates),
        _ => Err(RegistryError::AmbiguousMatch {
            names: candidates.iter().map(|t| t.name.clone()).collect(),
            same_version: false,
        }),
    }
}

/// Synthesize the tarball for the patch release after the newest published one
///
/// The family is every release sharing the request's short version, so a
/// full version such as "8.0.36" still guesses after the newest 8.0 release.
/// The `minimal` constraint is ignored when looking for the family; the
/// platform rule decides whether the guessed build is minimal.
pub fn resolve_guess(
    tarballs: &[TarballDescription],
    criteria: &SearchCriteria,
    policy: &GuessPolicy,
) -> Result<TarballDescription, RegistryError> {
    let short = criteria.short_version();
    policy.check_allowed(&short)?;

    let family_criteria = SearchCriteria {
        version: short.clone(),
        ..criteria.clone()
    }
    .minimal(false);
    let family = filter_tarballs(tarballs, &family_criteria);
    let Some(newest) = family
        .iter()
        .map(|t| VersionOrdinal::parse(&t.version))
        .reduce(|newest, current| if newest.less(&current) { current } else { newest })
    else {
        return Err(RegistryError::NotFound(format!(
            "no published tarball to guess from with {}",
            criteria.describe()
        )));
    };

    policy.synthesize(&newest, &family[0].short_version, &criteria.flavor, &criteria.os)
}

fn newest_of(candidates: &[&TarballDescription]) -> Result<TarballDescription, RegistryError> {
    let mut newest = candidates[0];
    let mut newest_version = VersionOrdinal::parse(&newest.version);
    for &candidate in &candidates[1..] {
        let version = VersionOrdinal::parse(&candidate.version);
        if newest_version.less(&version) {
            newest = candidate;
            newest_version = version;
        }
    }

    let tied: Vec<String> = candidates
        .iter()
        .filter(|t| {
            t.name != newest.name && VersionOrdinal::parse(&t.version).equal(&newest_version)
        })
        .map(|t| t.name.clone())
        .collect();
    if !tied.is_empty() {
        let mut names = vec![newest.name.clone()];
        names.extend(tied);
        return Err(RegistryError::AmbiguousMatch {
            names,
            same_version: true,
        });
    }

    Ok(newest.clone())
}
