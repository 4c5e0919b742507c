//! Routes manifest diffs to the parser for their file format

use crate::change::DependencyChange;
use crate::config::Config;
use crate::parsers::{ComposerDiffParser, DiffParser, NodeDiffParser};

/// Ordered collection of diff parsers.
///
/// The first parser whose [`DiffParser::supports`] accepts a filename
/// handles it; files no parser accepts contribute nothing.
pub struct DiffParserRegistry {
    parsers: Vec<Box<dyn DiffParser>>,
    max_diff_lines: usize,
}

impl DiffParserRegistry {
    /// Registry with the Composer and npm parsers and default settings
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        let parsers: Vec<Box<dyn DiffParser>> = vec![
            Box::new(ComposerDiffParser::from_config(config)),
            Box::new(NodeDiffParser::from_config(config)),
        ];
        Self {
            parsers,
            max_diff_lines: config.max_diff_lines,
        }
    }

    /// Registry over a custom parser list, tried in the given order
    pub fn with_parsers(parsers: Vec<Box<dyn DiffParser>>) -> Self {
        Self {
            parsers,
            max_diff_lines: Config::default().max_diff_lines,
        }
    }

    /// Cap on scanned lines per file (0 disables the cap)
    pub fn with_max_diff_lines(mut self, max_diff_lines: usize) -> Self {
        self.max_diff_lines = max_diff_lines;
        self
    }

    /// Whether any registered parser handles `filename`
    pub fn supports(&self, filename: &str) -> bool {
        self.parsers.iter().any(|p| p.supports(filename))
    }

    /// Classify the dependency changes in one file's diff
    pub fn parse(&self, diff: &str, filename: &str) -> Vec<DependencyChange> {
        let Some(parser) = self.parsers.iter().find(|p| p.supports(filename)) else {
            tracing::trace!("No diff parser for {filename}");
            return Vec::new();
        };

        parser.parse(self.bounded(diff, filename), filename)
    }

    /// Parse every `(filename, diff)` pair in iteration order and
    /// concatenate the results. The same package may appear once per file.
    pub fn parse_all<I, K, V>(&self, diffs: I) -> Vec<DependencyChange>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut changes = Vec::new();
        for (filename, diff) in diffs {
            changes.extend(self.parse(diff.as_ref(), filename.as_ref()));
        }
        changes
    }

    /// First `max_diff_lines` lines of `diff`. A trailing newline does not
    /// count as an extra line.
    fn bounded<'a>(&self, diff: &'a str, filename: &str) -> &'a str {
        if self.max_diff_lines == 0 {
            return diff;
        }

        match diff.match_indices('\n').nth(self.max_diff_lines - 1) {
            Some((cut, _)) if cut + 1 < diff.len() => {
                tracing::warn!(
                    "Diff for {filename} exceeds {0} lines, scanning only the first {0}",
                    self.max_diff_lines
                );
                &diff[..cut]
            }
            _ => diff,
        }
    }
}

impl Default for DiffParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeType;
    use indexmap::IndexMap;

    struct Everything;

    impl DiffParser for Everything {
        fn file_patterns(&self) -> &[&str] {
            &[]
        }

        fn supports(&self, _filename: &str) -> bool {
            true
        }

        fn parse(&self, _diff: &str, filename: &str) -> Vec<DependencyChange> {
            vec![DependencyChange::added("catch-all", "1", filename)]
        }
    }

    #[test]
    fn test_supports() {
        let registry = DiffParserRegistry::new();
        assert!(registry.supports("composer.json"));
        assert!(registry.supports("composer.lock"));
        assert!(registry.supports("package.json"));
        assert!(registry.supports("frontend/package-lock.json"));
        assert!(!registry.supports("README.md"));
        assert!(!registry.supports("yarn.lock"));
    }

    #[test]
    fn test_parse_dispatches_by_basename() {
        let registry = DiffParserRegistry::new();
        let diff = r#"+        "monolog/monolog": "^3.0","#;

        let changes = registry.parse(diff, "api/composer.json");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].source_file(), "api/composer.json");
    }

    #[test]
    fn test_parse_unsupported_file() {
        let registry = DiffParserRegistry::new();
        assert!(registry.parse("+\"a/b\": \"1.0\"", "README.md").is_empty());
    }

    #[test]
    fn test_first_matching_parser_wins() {
        let registry = DiffParserRegistry::with_parsers(vec![
            Box::new(NodeDiffParser::new()),
            Box::new(Everything),
        ]);

        let changes = registry.parse(r#"+    "lodash": "4.17.21","#, "package.json");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name(), "lodash");

        let changes = registry.parse("anything", "Gemfile");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name(), "catch-all");
    }

    #[test]
    fn test_empty_registry() {
        let registry = DiffParserRegistry::with_parsers(Vec::new());
        assert!(!registry.supports("composer.json"));
        assert!(registry.parse("+\"a/b\": \"1\"", "composer.json").is_empty());
    }

    #[test]
    fn test_parse_all_keeps_input_order() {
        let registry = DiffParserRegistry::new();
        let mut diffs = IndexMap::new();
        diffs.insert("package.json", r#"+    "zod": "^3.22.0","#);
        diffs.insert("README.md", "+Some text");
        diffs.insert("composer.json", r#"+        "acme/zzz": "^1.0","#);

        let changes = registry.parse_all(diffs);
        let names: Vec<&str> = changes.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["zod", "acme/zzz"]);
    }

    #[test]
    fn test_parse_all_no_cross_file_dedup() {
        let registry = DiffParserRegistry::new();
        let diffs = [
            ("package.json", r#"+    "lodash": "^4.17.21","#),
            ("web/package.json", r#"+    "lodash": "^4.17.21","#),
        ];

        let changes = registry.parse_all(diffs);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].source_file(), "package.json");
        assert_eq!(changes[1].source_file(), "web/package.json");
    }

    #[test]
    fn test_max_diff_lines_truncates() {
        let registry = DiffParserRegistry::new().with_max_diff_lines(2);
        let diff = "+    \"a\": \"1\",\n+    \"b\": \"1\",\n+    \"c\": \"1\",";

        let changes = registry.parse(diff, "package.json");
        let names: Vec<&str> = changes.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_max_diff_lines_trailing_newline_is_not_truncated() {
        let registry = DiffParserRegistry::new().with_max_diff_lines(2);

        let diff = "+    \"a\": \"1\",\n+    \"b\": \"1\",\n";
        assert_eq!(registry.bounded(diff, "package.json"), diff);

        let diff = "+    \"a\": \"1\",\n+    \"b\": \"1\",";
        assert_eq!(registry.bounded(diff, "package.json"), diff);

        let diff = "+    \"a\": \"1\",\n+    \"b\": \"1\",\n+";
        assert_eq!(
            registry.bounded(diff, "package.json"),
            "+    \"a\": \"1\",\n+    \"b\": \"1\","
        );
    }

    #[test]
    fn test_max_diff_lines_zero_is_unlimited() {
        let registry = DiffParserRegistry::new().with_max_diff_lines(0);
        let diff: String = (0..50)
            .map(|i| format!("+    \"pkg-{i:02}\": \"1.0.0\",\n"))
            .collect();

        let changes = registry.parse(&diff, "package.json");
        assert_eq!(changes.len(), 50);
        assert!(changes.iter().all(|c| c.change_type() == ChangeType::Added));
    }

    #[test]
    fn test_from_config_passes_window() {
        let mut config = Config::default();
        config.window = 1;
        let registry = DiffParserRegistry::from_config(&config);

        let diff = r#"+            "name": "monolog/monolog",
+            "description": "Logging",
+            "version": "3.0.0","#;
        // window [0, 1) cannot reach the version two lines down
        assert!(registry.parse(diff, "composer.lock").is_empty());
        assert_eq!(DiffParserRegistry::new().parse(diff, "composer.lock").len(), 1);
    }
}
