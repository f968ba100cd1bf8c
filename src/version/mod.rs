//! Version comparison for tarball catalogs
//!
//! - [`ordinal`]: dotted numeric versions, their ordering and short versions

pub mod ordinal;
