//! In-memory view of a tarball collection and the operations on it

use tracing::{debug, info};

use crate::tarball::error::RegistryError;
use crate::tarball::guess::GuessPolicy;
use crate::tarball::resolver::{SearchCriteria, resolve, resolve_guess};
use crate::tarball::sort::tarball_tree;
use crate::tarball::store::{
    CollectionStore, TOOL_VERSION, check_tarball_list, delete_tarball, merge_collections,
    validate_collection,
};
use crate::tarball::types::{TarballCollection, TarballDescription};
use indexmap::IndexMap;

/// A loaded collection together with the guess policy used to extend it
#[derive(Debug, Clone, Default)]
pub struct TarballRegistry {
    collection: TarballCollection,
    policy: GuessPolicy,
}

impl TarballRegistry {
    pub fn new(policy: GuessPolicy) -> Self {
        Self {
            collection: TarballCollection::new(TOOL_VERSION, Vec::new()),
            policy,
        }
    }

    pub fn from_collection(collection: TarballCollection, policy: GuessPolicy) -> Self {
        Self { collection, policy }
    }

    /// Load and validate the collection held by `store`.
    ///
    /// A store without a document gives an empty registry.
    pub fn load(store: &CollectionStore, policy: GuessPolicy) -> Result<Self, RegistryError> {
        if !store.exists() {
            debug!("Starting with an empty registry");
            return Ok(Self::new(policy));
        }

        let collection = store.load()?;
        validate_collection(&collection)?;
        info!("Registry loaded with {} tarballs", collection.len());
        Ok(Self::from_collection(collection, policy))
    }

    pub fn collection(&self) -> &TarballCollection {
        &self.collection
    }

    pub fn into_collection(self) -> TarballCollection {
        self.collection
    }

    pub fn tarballs(&self) -> &[TarballDescription] {
        &self.collection.tarballs
    }

    pub fn policy(&self) -> &GuessPolicy {
        &self.policy
    }

    pub fn find_by_name(&self, name: &str) -> Result<&TarballDescription, RegistryError> {
        self.tarballs()
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| RegistryError::NotFound(format!("tarball {name} not found")))
    }

    pub fn find_by_url(&self, url: &str) -> Result<&TarballDescription, RegistryError> {
        self.tarballs()
            .iter()
            .find(|t| t.url == url)
            .ok_or_else(|| RegistryError::NotFound(format!("tarball with URL {url} not found")))
    }

    /// Resolve to one published tarball
    pub fn resolve(&self, criteria: &SearchCriteria) -> Result<TarballDescription, RegistryError> {
        resolve(self.tarballs(), criteria)
    }

    /// Synthesize the next patch release of the matching family
    pub fn resolve_guess(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<TarballDescription, RegistryError> {
        resolve_guess(self.tarballs(), criteria, &self.policy)
    }

    /// Tarballs grouped by short version
    pub fn tree(&self) -> IndexMap<String, Vec<TarballDescription>> {
        tarball_tree(self.tarballs())
    }

    /// Add a tarball, rejecting a repeated name or build combination
    pub fn add(&mut self, tarball: TarballDescription) -> Result<(), RegistryError> {
        let mut tarballs = self.collection.tarballs.clone();
        tarballs.push(tarball);
        check_tarball_list(&tarballs)?;

        debug!("Added {}", tarballs[tarballs.len() - 1].name);
        self.collection.tarballs = tarballs;
        Ok(())
    }

    /// Remove the tarball called `name`
    pub fn remove(&mut self, name: &str) -> Result<(), RegistryError> {
        self.collection.tarballs = delete_tarball(&self.collection.tarballs, name)?;
        debug!("Removed {}", name);
        Ok(())
    }

    /// Merge another collection in, keeping existing entries on name conflicts.
    ///
    /// Returns the number of tarballs added.
    pub fn merge(&mut self, incoming: &TarballCollection) -> Result<usize, RegistryError> {
        let merged = merge_collections(&self.collection, incoming)?;
        let added = merged.len() - self.collection.len();
        self.collection = merged;
        Ok(added)
    }

    /// Write the collection through `store`.
    ///
    /// Refuses to write anything [`TarballRegistry::load`] would reject, such
    /// as a guessed entry still lacking its checksum.
    pub fn persist(&self, store: &CollectionStore) -> Result<(), RegistryError> {
        store.persist(&self.collection)
    }
}
