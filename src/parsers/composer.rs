//! Parser for PHP Composer diffs (composer.json, composer.lock)

use super::builder::ChangeSet;
use super::line::{self, Marker};
use super::{DiffParser, diff_lines};
use crate::change::DependencyChange;
use crate::config::Config;
use crate::utils::basename;

/// Parser for composer.json and composer.lock diffs
#[derive(Debug)]
pub struct ComposerDiffParser {
    reserved_keys: Vec<String>,
    window: usize,
}

impl ComposerDiffParser {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            reserved_keys: config.composer.reserved_keys.clone(),
            window: config.window,
        }
    }

    /// composer.json: one `"vendor/package": "constraint"` pair per line
    fn parse_manifest(&self, lines: &[&str]) -> ChangeSet {
        let mut changes = ChangeSet::new();

        for line in lines {
            let Some(kv) = line::key_value(line) else {
                continue;
            };

            if self.reserved_keys.iter().any(|k| k == kv.key) {
                tracing::trace!("Skipping reserved composer key {}", kv.key);
                continue;
            }

            // `php`, `ext-json` and friends are platform requirements
            if !kv.key.contains('/') {
                continue;
            }

            changes.record(kv.marker, kv.key, kv.value);
        }

        changes
    }

    /// composer.lock: `name` and `version` sit on separate lines of a
    /// package block, so each name line is paired with the nearest
    /// version line carrying the same marker.
    fn parse_lock(&self, lines: &[&str]) -> ChangeSet {
        let mut changes = ChangeSet::new();

        for (idx, line) in lines.iter().enumerate() {
            if let Some((marker, name)) = line::marked_field(line, "name") {
                if let Some(version) = find_version_nearby(lines, idx, marker, self.window) {
                    changes.record(marker, name, version);
                }
                continue;
            }

            // Untouched name line with the version bumped underneath it
            if let Some(name) = line::context_field(line, "name") {
                let old = find_version_nearby(lines, idx, Marker::Removed, self.window);
                let new = find_version_nearby(lines, idx, Marker::Added, self.window);
                if let (Some(old), Some(new)) = (old, new) {
                    if old != new {
                        changes.record_if_absent(Marker::Removed, name, old);
                        changes.record_if_absent(Marker::Added, name, new);
                    }
                }
            }
        }

        changes
    }
}

impl Default for ComposerDiffParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffParser for ComposerDiffParser {
    fn file_patterns(&self) -> &[&str] {
        &["composer.json", "composer.lock"]
    }

    fn parse(&self, diff: &str, filename: &str) -> Vec<DependencyChange> {
        let lines = diff_lines(diff);
        let changes = if basename(filename) == "composer.lock" {
            self.parse_lock(&lines)
        } else {
            self.parse_manifest(&lines)
        };

        if changes.is_empty() {
            tracing::trace!("No dependency lines in {filename}");
            return Vec::new();
        }

        let changes = changes.into_changes(filename);
        tracing::debug!("Found {} dependency changes in {filename}", changes.len());
        changes
    }
}

/// First `"version"` line with `marker` in `[index - window, index + window)`,
/// clamped to the bounds of `lines`.
fn find_version_nearby<'a>(
    lines: &[&'a str],
    index: usize,
    marker: Marker,
    window: usize,
) -> Option<&'a str> {
    let start = index.saturating_sub(window);
    let end = index.saturating_add(window).min(lines.len());

    (start..end).find_map(|i| match line::marked_field(lines[i], "version") {
        Some((m, version)) if m == marker => Some(version),
        _ => None,
    })
}
