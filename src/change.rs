//! Dependency change records produced by the diff parsers

use std::fmt;

use serde::Serialize;

/// Kind of change detected for a single package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Updated,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
            ChangeType::Updated => "updated",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package whose declared version changed in a manifest diff.
///
/// Records can only be built through [`DependencyChange::added`],
/// [`DependencyChange::removed`] and [`DependencyChange::updated`], so the
/// version fields always agree with the change type: an added package has
/// no old version, a removed package has no new version, and an update
/// carries both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyChange {
    name: String,
    #[serde(rename = "type")]
    change_type: ChangeType,
    old_version: Option<String>,
    new_version: Option<String>,
    source_file: String,
}

impl DependencyChange {
    pub fn added(
        name: impl Into<String>,
        new_version: impl Into<String>,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            change_type: ChangeType::Added,
            old_version: None,
            new_version: Some(new_version.into()),
            source_file: source_file.into(),
        }
    }

    pub fn removed(
        name: impl Into<String>,
        old_version: impl Into<String>,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            change_type: ChangeType::Removed,
            old_version: Some(old_version.into()),
            new_version: None,
            source_file: source_file.into(),
        }
    }

    pub fn updated(
        name: impl Into<String>,
        old_version: impl Into<String>,
        new_version: impl Into<String>,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            change_type: ChangeType::Updated,
            old_version: Some(old_version.into()),
            new_version: Some(new_version.into()),
            source_file: source_file.into(),
        }
    }

    /// Package identifier (e.g. `symfony/http-client`, `lodash`)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    /// Version before the change, `None` for added packages
    pub fn old_version(&self) -> Option<&str> {
        self.old_version.as_deref()
    }

    /// Version after the change, `None` for removed packages
    pub fn new_version(&self) -> Option<&str> {
        self.new_version.as_deref()
    }

    /// File the change was detected in, exactly as given by the caller
    pub fn source_file(&self) -> &str {
        &self.source_file
    }
}
