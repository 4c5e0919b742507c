//! commit-history - dependency change detection for commit diffs
//!
//! This crate classifies the package additions, removals and version
//! updates contained in unified diffs of Composer and npm manifests and
//! lock files (composer.json, composer.lock, package.json,
//! package-lock.json).

pub mod change;
pub mod commit;
pub mod config;
pub mod parsers;
pub mod patch;
pub mod registry;
pub mod reports;
pub mod utils;

pub use change::{ChangeType, DependencyChange};
pub use config::Config;
pub use registry::DiffParserRegistry;
