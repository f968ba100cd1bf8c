//! Dotted version ordinals
//!
//! Tarball versions are plain dotted numbers (`8.0.37`, `5.7`, `10.11.2`), so
//! they are compared as tuples of integers rather than as semver. A segment
//! that does not parse as an integer counts as `0`.

use std::fmt;

/// A version string split into its numeric segments
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VersionOrdinal(Vec<u64>);

impl VersionOrdinal {
    /// Parse a dotted version string. Never fails.
    ///
    /// Examples:
    /// - "8.0.37" -> [8, 0, 37]
    /// - "5.7" -> [5, 7]
    /// - "8.0.x" -> [8, 0, 0]
    pub fn parse(version: &str) -> Self {
        Self(version.split('.').map(segment_value).collect())
    }

    pub fn segments(&self) -> &[u64] {
        &self.0
    }

    /// Returns true if `self` sorts strictly before `other`
    ///
    /// Segments are compared left to right and the first differing segment
    /// decides. Once either side runs out of segments the answer is "not
    /// less", so "5.6" and "5.6.1" are not less than each other in either
    /// direction.
    pub fn less(&self, other: &Self) -> bool {
        for (i, segment) in self.0.iter().enumerate() {
            let Some(other_segment) = other.0.get(i) else {
                return false;
            };
            if segment < other_segment {
                return true;
            }
            if segment > other_segment {
                return false;
            }
        }
        false
    }

    /// Returns true if both versions have the same number of segments and
    /// every segment is equal
    pub fn equal(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a == b)
    }

    /// The `major.minor.patch` triple, if the version has at least three segments
    pub fn triple(&self) -> Option<(u64, u64, u64)> {
        match self.0.as_slice() {
            [major, minor, patch, ..] => Some((*major, *minor, *patch)),
            _ => None,
        }
    }
}

impl fmt::Display for VersionOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

fn segment_value(segment: &str) -> u64 {
    segment.trim().parse().unwrap_or(0)
}

/// Returns true if version string `a` sorts strictly before `b`
pub fn version_less(a: &str, b: &str) -> bool {
    VersionOrdinal::parse(a).less(&VersionOrdinal::parse(b))
}

/// Returns true if version strings `a` and `b` denote the same version
pub fn version_equal(a: &str, b: &str) -> bool {
    VersionOrdinal::parse(a).equal(&VersionOrdinal::parse(b))
}

/// Drop the last dot-segment of a version ("8.0.37" -> "8.0")
///
/// A version without any dot is returned unchanged.
pub fn short_version(version: &str) -> String {
    match version.rfind('.') {
        Some(index) => version[..index].to_string(),
        None => version.to_string(),
    }
}
