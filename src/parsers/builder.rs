//! Reconciles removed/added version maps into classified change records

use std::collections::{BTreeSet, HashMap};

use super::line::Marker;
use crate::change::DependencyChange;

/// Versions seen on `-` and `+` lines while scanning one file's diff
#[derive(Debug, Default)]
pub struct ChangeSet {
    removed: HashMap<String, String>,
    added: HashMap<String, String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `version` for `name` on the side given by `marker`,
    /// replacing any earlier value.
    pub fn record(&mut self, marker: Marker, name: &str, version: &str) {
        self.side_mut(marker)
            .insert(name.to_string(), version.to_string());
    }

    /// Record `version` for `name` only if that side has no value yet
    pub fn record_if_absent(&mut self, marker: Marker, name: &str, version: &str) {
        self.side_mut(marker)
            .entry(name.to_string())
            .or_insert_with(|| version.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// Classify every recorded package, sorted by name
    pub fn into_changes(self, source_file: &str) -> Vec<DependencyChange> {
        build_changes(&self.removed, &self.added, source_file)
    }

    fn side_mut(&mut self, marker: Marker) -> &mut HashMap<String, String> {
        match marker {
            Marker::Added => &mut self.added,
            Marker::Removed => &mut self.removed,
        }
    }
}

/// Turn parallel name→version maps into change records.
///
/// Names appearing in both maps with different versions are updates, equal
/// versions produce nothing, and names on one side only are additions or
/// removals. Output is sorted by name so it never depends on the order of
/// lines in the diff.
pub fn build_changes(
    removed: &HashMap<String, String>,
    added: &HashMap<String, String>,
    source_file: &str,
) -> Vec<DependencyChange> {
    let names: BTreeSet<&String> = removed.keys().chain(added.keys()).collect();

    names
        .into_iter()
        .filter_map(|name| {
            match (removed.get(name), added.get(name)) {
                (Some(old), Some(new)) if old != new => {
                    Some(DependencyChange::updated(name, old, new, source_file))
                }
                (Some(_), Some(_)) => None,
                (None, Some(new)) => Some(DependencyChange::added(name, new, source_file)),
                (Some(old), None) => Some(DependencyChange::removed(name, old, source_file)),
                (None, None) => None,
            }
        })
        .collect()
}
