//! Parser for npm diffs (package.json, package-lock.json)

use regex::Regex;

use super::builder::ChangeSet;
use super::line;
use super::{DiffParser, diff_lines};
use crate::change::DependencyChange;
use crate::config::Config;
use crate::utils::basename;

/// Parser for package.json and package-lock.json diffs
#[derive(Debug)]
pub struct NodeDiffParser {
    reserved_keys: Vec<String>,
    skipped_value_prefixes: Vec<String>,
    version_pattern: Regex,
}

impl NodeDiffParser {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            reserved_keys: config.node.reserved_keys.clone(),
            skipped_value_prefixes: config.node.skipped_value_prefixes.clone(),
            version_pattern: config.node.version_pattern.clone(),
        }
    }

    /// package.json: one `"package": "range"` pair per line
    fn parse_manifest(&self, lines: &[&str]) -> ChangeSet {
        let mut changes = ChangeSet::new();

        for line in lines {
            let Some(kv) = line::key_value(line) else {
                continue;
            };

            if self.reserved_keys.iter().any(|k| k == kv.key) {
                tracing::trace!("Skipping reserved package.json key {}", kv.key);
                continue;
            }

            // git+https://..., file:../local, github urls: not a version range
            if self
                .skipped_value_prefixes
                .iter()
                .any(|prefix| kv.value.starts_with(prefix.as_str()))
            {
                tracing::trace!("Skipping source specifier for {}: {}", kv.key, kv.value);
                continue;
            }

            // Script commands and other free text under nested objects
            if !self.version_pattern.is_match(kv.value) {
                tracing::trace!("Skipping non-version value for {}: {}", kv.key, kv.value);
                continue;
            }

            changes.record(kv.marker, kv.key, kv.value);
        }

        changes
    }

    /// package-lock.json: a `"node_modules/pkg": {` anchor opens a block
    /// and the marked `version` lines that follow belong to it, until the
    /// next anchor or hunk header.
    fn parse_lock(&self, lines: &[&str]) -> ChangeSet {
        let mut changes = ChangeSet::new();
        let mut current: Option<&str> = None;

        for line in lines {
            if let Some((_, name)) = line::block_anchor(line) {
                // Transitive copies nested under another package
                if name.contains("/node_modules/") {
                    continue;
                }
                current = Some(name);
            } else if let Some(package) = current {
                if let Some((marker, version)) = line::marked_field(line, "version") {
                    changes.record(marker, package, version);
                } else if line::is_hunk_header(line) {
                    current = None;
                }
            }
        }

        changes
    }
}

impl Default for NodeDiffParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffParser for NodeDiffParser {
    fn file_patterns(&self) -> &[&str] {
        &["package.json", "package-lock.json"]
    }

    fn parse(&self, diff: &str, filename: &str) -> Vec<DependencyChange> {
        let lines = diff_lines(diff);
        let changes = if basename(filename) == "package-lock.json" {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeType;

    #[test]
    fn test_supports() {
        let parser = NodeDiffParser::new();
        assert!(parser.supports("package.json"));
        assert!(parser.supports("package-lock.json"));
        assert!(parser.supports("apps/web/package.json"));
        assert!(!parser.supports("composer.json"));
        assert!(!parser.supports("yarn.lock"));
    }

    #[test]
    fn test_manifest_update() {
        let parser = NodeDiffParser::new();
        let diff = r#"@@ -12,8 +12,8 @@
   "dependencies": {
-    "react": "^17.0.2",
-    "react-dom": "^17.0.2",
+    "react": "^18.2.0",
+    "react-dom": "^18.2.0",
     "axios": "^1.6.0"
   },"#;

        let changes = parser.parse(diff, "package.json");
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0],
            DependencyChange::updated("react", "^17.0.2", "^18.2.0", "package.json")
        );
        assert_eq!(changes[1].name(), "react-dom");
    }

    #[test]
    fn test_manifest_scoped_packages() {
        let parser = NodeDiffParser::new();
        let diff = r#"+    "@types/node": "^20.0.0",
-    "@babel/core": "^7.22.0","#;

        let changes = parser.parse(diff, "package.json");
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].name(), "@babel/core");
        assert_eq!(changes[0].change_type(), ChangeType::Removed);
        assert_eq!(changes[1].name(), "@types/node");
        assert_eq!(changes[1].change_type(), ChangeType::Added);
    }

    #[test]
    fn test_manifest_skips_reserved_keys() {
        let parser = NodeDiffParser::new();
        let diff = r#"-  "version": "1.0.0",
+  "version": "1.1.0",
-  "description": "old",
+  "description": "new",
+  "homepage": "https://example.com",
+  "license": "MIT","#;

        assert!(parser.parse(diff, "package.json").is_empty());
    }

    #[test]
    fn test_manifest_skips_source_specifiers() {
        let parser = NodeDiffParser::new();
        let diff = r#"+    "my-package": "https://github.com/user/repo.git",
+    "from-git": "git+ssh://git@github.com/user/repo.git",
+    "github-short": "github:user/repo",
+    "local": "file:../local",
+    "express": "^4.18.0","#;

        let changes = parser.parse(diff, "package.json");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name(), "express");
    }

    #[test]
    fn test_manifest_skips_script_entries() {
        let parser = NodeDiffParser::new();
        let diff = r#"   "scripts": {
-    "build": "webpack --mode production",
+    "build": "vite build",
-    "test": "jest",
+    "test": "vitest run",
   },"#;

        assert!(parser.parse(diff, "package.json").is_empty());
    }

    #[test]
    fn test_manifest_accepts_range_forms() {
        let parser = NodeDiffParser::new();
        let diff = r#"+    "a": "1.2.3",
+    "b": "~1.2.3",
+    "c": ">=1.0.0 <2.0.0",
+    "d": "<3",
+    "e": "*",
+    "f": "workspace:^",
+    "g": "latest","#;

        let changes = parser.parse(diff, "package.json");
        let names: Vec<&str> = changes.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_manifest_custom_version_pattern() {
        let mut config = Config::default();
        config.node.version_pattern = Regex::new("^(latest|next)$").unwrap();
        let parser = NodeDiffParser::from_config(&config);

        let diff = r#"+    "react": "next",
+    "vue": "^3.4.0","#;
        let changes = parser.parse(diff, "package.json");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name(), "react");
    }

    #[test]
    fn test_lock_removed_package() {
        let parser = NodeDiffParser::new();
        let diff = r#"-    "node_modules/lodash": {
-      "version": "4.17.21",
-      "resolved": "https://registry.npmjs.org/lodash/-/lodash-4.17.21.tgz",
-      "integrity": "sha512-v2kDEe57lecTulaDIuNTPy3Ry4gLGJ6Z1O3vE1krgXZNrsQ+LFTGHVxVjcXPs17LhbZVGedAJv8XZ1tvj5FvSg=="
-    },"#;

        let changes = parser.parse(diff, "package-lock.json");
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0],
            DependencyChange::removed("lodash", "4.17.21", "package-lock.json")
        );
    }

    #[test]
    fn test_lock_version_bump_inside_block() {
        let parser = NodeDiffParser::new();
        let diff = r#"-    "node_modules/axios": {
-      "version": "1.6.0",
+    "node_modules/axios": {
+      "version": "1.7.2","#;

        let changes = parser.parse(diff, "package-lock.json");
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0],
            DependencyChange::updated("axios", "1.6.0", "1.7.2", "package-lock.json")
        );
    }

    #[test]
    fn test_lock_scoped_package() {
        let parser = NodeDiffParser::new();
        let diff = r#"+    "node_modules/@types/node": {
+      "version": "20.11.5",
+      "dev": true,"#;

        let changes = parser.parse(diff, "package-lock.json");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name(), "@types/node");
    }

    #[test]
    fn test_lock_skips_nested_node_modules() {
        let parser = NodeDiffParser::new();
        let diff = r#"+    "node_modules/a/node_modules/b": {
+      "version": "1.0.0","#;

        assert!(parser.parse(diff, "package-lock.json").is_empty());
    }

    #[test]
    fn test_lock_nested_block_keeps_previous_package() {
        let parser = NodeDiffParser::new();
        let diff = r#"+    "node_modules/a": {
+    "node_modules/a/node_modules/b": {
+      "version": "2.0.0","#;

        let changes = parser.parse(diff, "package-lock.json");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0], DependencyChange::added("a", "2.0.0", "package-lock.json"));
    }

    #[test]
    fn test_lock_hunk_header_resets_package() {
        let parser = NodeDiffParser::new();
        let diff = r#"@@ -100,7 +100,7 @@
+    "node_modules/express": {
+      "version": "4.19.2",
@@ -400,7 +400,7 @@
       "dev": true,
-      "version": "0.9.0",
+      "version": "1.0.0","#;

        let changes = parser.parse(diff, "package-lock.json");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name(), "express");
    }

    #[test]
    fn test_lock_context_anchor_is_ignored() {
        let parser = NodeDiffParser::new();
        let diff = r#"     "node_modules/chalk": {
-      "version": "4.1.2",
+      "version": "5.3.0","#;

        // Only marked anchors open a block
        assert!(parser.parse(diff, "package-lock.json").is_empty());
    }

    #[test]
    fn test_lock_version_before_any_anchor() {
        let parser = NodeDiffParser::new();
        let diff = r#"-  "version": "1.0.0",
+  "version": "1.1.0","#;

        assert!(parser.parse(diff, "package-lock.json").is_empty());
    }

    #[test]
    fn test_garbage_input() {
        let parser = NodeDiffParser::new();
        for diff in ["", "@@", "+{", "-\"node_modules/\": {", "+\"a\": {\n+\"version\": \""] {
            assert!(parser.parse(diff, "package-lock.json").is_empty());
            assert!(parser.parse(diff, "package.json").is_empty());
        }
    }
}
