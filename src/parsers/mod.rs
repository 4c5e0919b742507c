//! Parsers for dependency manifest diffs (composer.json, package-lock.json, etc.)

use crate::change::DependencyChange;
use crate::utils::basename;

/// Trait for extracting dependency changes from one file's unified diff
pub trait DiffParser: Send + Sync {
    /// Manifest basenames this parser understands
    fn file_patterns(&self) -> &[&str];

    /// Whether this parser handles `filename` (basename match, any directory)
    fn supports(&self, filename: &str) -> bool {
        let name = basename(filename);
        self.file_patterns().iter().any(|pattern| *pattern == name)
    }

    /// Parse the diff text of `filename` and classify every changed package.
    ///
    /// Never fails: lines that match no known layout are ignored.
    fn parse(&self, diff: &str, filename: &str) -> Vec<DependencyChange>;
}

pub mod builder;
pub mod composer;
pub mod line;
pub mod node;

pub use composer::ComposerDiffParser;
pub use node::NodeDiffParser;

/// Split diff text into lines, keeping any `\r` on the line it belongs to
pub(crate) fn diff_lines(diff: &str) -> Vec<&str> {
    diff.split('\n').collect()
}
