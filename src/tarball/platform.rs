//! Operating system and architecture names used in search criteria
//!
//! User input is normalized once, here, so matching code only sees canonical
//! lower-case names.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperatingSystem {
    Linux,
    /// macOS (also accepted as `osx`, `macos`, `os x`)
    Darwin,
    Other(String),
}

impl OperatingSystem {
    /// Normalize a user-supplied OS name. Never fails.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "linux" => OperatingSystem::Linux,
            "darwin" | "osx" | "macos" | "os x" => OperatingSystem::Darwin,
            other => OperatingSystem::Other(other.to_string()),
        }
    }

    /// The OS of the running host
    pub fn host() -> Self {
        Self::parse(std::env::consts::OS)
    }

    pub fn as_str(&self) -> &str {
        match self {
            OperatingSystem::Linux => "linux",
            OperatingSystem::Darwin => "darwin",
            OperatingSystem::Other(name) => name,
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    /// x86-64 (also accepted as `x86_64`, `x86-64`)
    Amd64,
    /// 64-bit ARM (also accepted as `aarch64`)
    Arm64,
    Other(String),
}

impl Arch {
    /// Normalize a user-supplied architecture name. Never fails.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "amd64" | "x86_64" | "x86-64" => Arch::Amd64,
            "arm64" | "aarch64" => Arch::Arm64,
            other => Arch::Other(other.to_string()),
        }
    }

    /// The architecture of the running host
    pub fn host() -> Self {
        Self::parse(std::env::consts::ARCH)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::Other(name) => name,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
