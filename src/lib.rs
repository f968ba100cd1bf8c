pub mod config;
pub mod logging;
pub mod tarball;
pub mod template;
pub mod version;
