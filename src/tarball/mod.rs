//! Tarball catalog: entity model, lookup, guessing and persistence
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Store    │────▶│  Registry   │────▶│  Resolver   │
//! │ (load/save) │◀────│ (in memory) │     │(match/pick) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            ▲                   │
//!                            │                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Fetcher   │────▶│  Identify   │     │    Guess    │
//! │(size, hash) │     │ (file name) │     │  (policy)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`]: `TarballDescription` and `TarballCollection`
//! - [`sort`]: Ordering strategies and the short-version tree
//! - [`resolver`]: Search criteria, exact resolution and guess resolution
//! - [`guess`]: Per-OS rules for synthesizing the next patch release
//! - [`store`]: JSON persistence, validation and merging
//! - [`registry`]: Owned registry combining a collection and a guess policy
//! - [`checksum`]: Checksum fields and file digests
//! - [`identify`]: File name recognition and local file descriptions
//! - [`fetcher`]: Remote size and checksum lookups
//! - [`platform`]: Normalized operating system and architecture names
//! - [`error`]: Error types

pub mod checksum;
pub mod error;
pub mod fetcher;
pub mod guess;
pub mod identify;
pub mod platform;
pub mod registry;
pub mod resolver;
pub mod sort;
pub mod store;
pub mod types;

pub use error::RegistryError;
pub use registry::TarballRegistry;
pub use resolver::SearchCriteria;
pub use store::CollectionStore;
pub use types::{TarballCollection, TarballDescription};
