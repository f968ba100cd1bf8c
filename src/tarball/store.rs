//! Persistence and integrity rules for tarball collections
//!
//! The collection is stored as one pretty-printed JSON document. Writes go to
//! a temp file in the same directory which is then renamed over the target,
//! so an interrupted write never leaves a truncated document behind.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use tracing::{debug, info};

use crate::tarball::error::{RegistryError, ValidationIssue};
use crate::tarball::sort::{SortCriteria, sorted_tarball_list};
use crate::tarball::types::{CHECKSUM_OPTIONAL_FLAVOR, TarballCollection, TarballDescription};

/// Version stamped on collections this crate produces
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// File-backed store for a [`TarballCollection`]
#[derive(Debug, Clone)]
pub struct CollectionStore {
    path: PathBuf,
}

impl CollectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location in the configuration directory
    pub fn open_default() -> Self {
        Self::new(crate::config::registry_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the persisted collection.
    ///
    /// A missing document is an empty collection, not an error.
    pub fn load(&self) -> Result<TarballCollection, RegistryError> {
        if !self.exists() {
            debug!("No registry document at {:?}", self.path);
            return Ok(TarballCollection::default());
        }

        let text = fs::read(&self.path).map_err(|e| RegistryError::io(&self.path, e))?;
        let collection: TarballCollection =
            serde_json::from_slice(&text).map_err(|source| RegistryError::CorruptState {
                path: self.path.clone(),
                source,
            })?;
        debug!("Loaded {} tarballs from {:?}", collection.len(), self.path);
        Ok(collection)
    }

    /// Number of tarballs in the persisted collection, 0 if it cannot be read
    pub fn count(&self) -> usize {
        self.load().map(|c| c.len()).unwrap_or(0)
    }

    /// Write the collection, sorted by all fields.
    ///
    /// Fails without touching the file if names or build combinations repeat,
    /// or if the collection would not pass [`validate_collection`] on load.
    pub fn persist(&self, collection: &TarballCollection) -> Result<(), RegistryError> {
        check_tarball_list(&collection.tarballs)?;
        validate_collection(collection)?;

        let sorted = TarballCollection {
            tarballs: sorted_tarball_list(collection.tarballs.clone(), SortCriteria::AllFields),
            ..collection.clone()
        };
        let text = serde_json::to_string_pretty(&sorted).map_err(|source| {
            RegistryError::CorruptState {
                path: self.path.clone(),
                source,
            }
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_config_dir(parent)?;
        }
        self.write_atomically(text.as_bytes())?;

        info!("Wrote {} tarballs to {:?}", sorted.len(), self.path);
        Ok(())
    }

    fn write_atomically(&self, contents: &[u8]) -> Result<(), RegistryError> {
        let temp_path = self.path.with_extension(format!("json.{}.tmp", process::id()));

        let result = write_synced(&temp_path, contents).and_then(|()| {
            fs::rename(&temp_path, &self.path).map_err(|e| RegistryError::io(&self.path, e))
        });
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

fn write_synced(path: &Path, contents: &[u8]) -> Result<(), RegistryError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| RegistryError::io(path, e))?;
    file.write_all(contents).map_err(|e| RegistryError::io(path, e))?;
    file.sync_all().map_err(|e| RegistryError::io(path, e))
}

/// Create the configuration directory, readable by its owner only, if missing
fn ensure_config_dir(dir: &Path) -> Result<(), RegistryError> {
    if dir.is_dir() {
        return Ok(());
    }

    debug!("Creating configuration directory {:?}", dir);
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(|e| RegistryError::io(dir, e))
}

/// Check that no two tarballs share a name or an
/// OS + arch + flavor + version + minimal combination
pub fn check_tarball_list(tarballs: &[TarballDescription]) -> Result<(), RegistryError> {
    let mut names = HashSet::new();
    let mut combinations = HashSet::new();
    for tarball in tarballs {
        if !names.insert(tarball.name.as_str()) {
            return Err(RegistryError::DuplicateName(tarball.name.clone()));
        }
        if !combinations.insert(tarball.combination_key()) {
            return Err(RegistryError::DuplicateCombination {
                os: tarball.operating_system.clone(),
                arch: tarball.arch.clone(),
                flavor: tarball.flavor.clone(),
                version: tarball.version.clone(),
                minimal: tarball.minimal,
            });
        }
    }
    Ok(())
}

/// Validate every entity-level rule of a collection.
///
/// All issues are collected into one [`RegistryError::ValidationFailed`],
/// except a repeated name, which fails immediately.
pub fn validate_collection(collection: &TarballCollection) -> Result<(), RegistryError> {
    let mut issues = Vec::new();
    if collection.schema_version.is_empty() {
        issues.push(ValidationIssue::new("collection version", "collection version not set"));
    }

    let mut names = HashSet::new();
    let mut combinations = HashSet::new();
    for tarball in &collection.tarballs {
        if !names.insert(tarball.name.as_str()) {
            return Err(RegistryError::DuplicateName(tarball.name.clone()));
        }
        issues.extend(tarball_issues(tarball));
        if !combinations.insert(tarball.combination_key()) {
            issues.push(ValidationIssue::new(
                &tarball.name,
                format!(
                    "OS {}-{}, flavor {}, version {}, minimal {} listed more than once",
                    tarball.operating_system,
                    tarball.arch,
                    tarball.flavor,
                    tarball.version,
                    tarball.minimal
                ),
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::ValidationFailed(issues))
    }
}

fn tarball_issues(tarball: &TarballDescription) -> Vec<ValidationIssue> {
    let name = if tarball.name.is_empty() {
        "No Name"
    } else {
        tarball.name.as_str()
    };

    let required = [
        (&tarball.name, "name is missing"),
        (&tarball.url, "url is missing"),
        (&tarball.short_version, "short version is missing"),
        (&tarball.version, "version is missing"),
        (&tarball.operating_system, "operating system is missing"),
    ];
    let mut issues: Vec<ValidationIssue> = required
        .into_iter()
        .filter(|(value, _)| value.is_empty())
        .map(|(_, issue)| ValidationIssue::new(name, issue))
        .collect();

    if tarball.checksum.is_empty() && tarball.flavor != CHECKSUM_OPTIONAL_FLAVOR {
        issues.push(ValidationIssue::new(name, "checksum is missing"));
    }
    issues
}

/// Combine two collections without duplicating names.
///
/// Entries of `incoming` whose name is not in `base` are appended in their
/// original order. The result is stamped with this crate's version.
pub fn merge_collections(
    base: &TarballCollection,
    incoming: &TarballCollection,
) -> Result<TarballCollection, RegistryError> {
    if base.is_empty() {
        return Err(RegistryError::InvalidArgument(
            "empty origin collection".to_string(),
        ));
    }
    if incoming.is_empty() {
        return Err(RegistryError::InvalidArgument(
            "empty additional collection".to_string(),
        ));
    }

    let mut merged = base.clone();
    merged.schema_version = TOOL_VERSION.to_string();

    let mut seen: HashSet<String> = base.tarballs.iter().map(|t| t.name.clone()).collect();
    for tarball in &incoming.tarballs {
        if seen.insert(tarball.name.clone()) {
            merged.tarballs.push(tarball.clone());
        }
    }

    debug!("Merged {} new tarballs", merged.len() - base.len());
    Ok(merged)
}

/// Remove the tarball called `name`
pub fn delete_tarball(
    tarballs: &[TarballDescription],
    name: &str,
) -> Result<Vec<TarballDescription>, RegistryError> {
    if !tarballs.iter().any(|t| t.name == name) {
        return Err(RegistryError::NotFound(format!("tarball {name} not found")));
    }
    Ok(tarballs.iter().filter(|t| t.name != name).cloned().collect())
}
