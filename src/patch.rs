//! Splitting multi-file patches into per-file diff bodies
//!
//! Git hosting APIs hand out one diff per changed file, but `git diff` and
//! `git format-patch` produce a single stream. This module cuts such a
//! stream back into `(path, body)` pairs so each body can go through the
//! parser registry on its own.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

static DIFF_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^diff --git a/(.*?) b/(.*?)\s*$").expect("diff header pattern is valid")
});

const DEV_NULL: &str = "/dev/null";

/// Split a patch into an ordered map of file path to diff body.
///
/// Files are keyed by their post-change path; deleted files (new side
/// `/dev/null`) use the old path. The body is every line after the
/// `diff --git` header up to the next header, joined with `\n`. A patch
/// without `diff --git` headers is treated as a single file named by its
/// `+++` (or `---`) header. If the same path appears twice the bodies are
/// concatenated.
pub fn split_patch(patch: &str) -> IndexMap<String, String> {
    let mut files: IndexMap<String, String> = IndexMap::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in patch.split('\n') {
        if let Some(captures) = DIFF_HEADER.captures(line) {
            if let Some((path, body)) = current.take() {
                push_file(&mut files, path, &body);
            }
            let old_path = captures.get(1).map_or("", |m| m.as_str());
            let new_path = captures.get(2).map_or("", |m| m.as_str());
            current = Some((pick_path(old_path, new_path).to_string(), Vec::new()));
            continue;
        }

        if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }

    if let Some((path, body)) = current.take() {
        push_file(&mut files, path, &body);
    }

    if files.is_empty() {
        if let Some(path) = bare_diff_path(patch) {
            files.insert(path, patch.trim_end_matches('\n').to_string());
        }
    }

    tracing::debug!("Split patch into {} file diffs", files.len());
    files
}

fn push_file(files: &mut IndexMap<String, String>, path: String, body: &[&str]) {
    let mut text = body.join("\n");
    while text.ends_with('\n') {
        text.pop();
    }

    files
        .entry(path)
        .and_modify(|existing| {
            existing.push('\n');
            existing.push_str(&text);
        })
        .or_insert(text);
}

fn pick_path<'a>(old_path: &'a str, new_path: &'a str) -> &'a str {
    if new_path == DEV_NULL || new_path.is_empty() {
        old_path
    } else {
        new_path
    }
}

/// Path from the `+++ b/x` (or `--- a/x`) header of a single-file diff
fn bare_diff_path(patch: &str) -> Option<String> {
    header_path(patch, "+++ ")
        .or_else(|| header_path(patch, "--- "))
        .map(str::to_string)
}

fn header_path<'a>(patch: &'a str, prefix: &str) -> Option<&'a str> {
    patch
        .split('\n')
        .find_map(|line| line.strip_prefix(prefix))
        .map(|rest| rest.split('\t').next().unwrap_or(rest).trim())
        .filter(|path| !path.is_empty() && *path != DEV_NULL)
        .map(strip_side_prefix)
}

fn strip_side_prefix(path: &str) -> &str {
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FILES: &str = r#"diff --git a/composer.json b/composer.json
index 3f1c2e0..9a7b1d4 100644
--- a/composer.json
+++ b/composer.json
@@ -5,7 +5,7 @@
     "require": {
-        "symfony/http-client": "^6.4",
+        "symfony/http-client": "^7.0",
     },
diff --git a/frontend/package.json b/frontend/package.json
index 1111111..2222222 100644
--- a/frontend/package.json
+++ b/frontend/package.json
@@ -1,3 +1,4 @@
+    "lodash": "^4.17.21",
"#;

    #[test]
    fn test_split_two_files() {
        let files = split_patch(TWO_FILES);
        let paths: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["composer.json", "frontend/package.json"]);

        let composer = &files["composer.json"];
        assert!(composer.starts_with("index 3f1c2e0"));
        assert!(composer.contains("+        \"symfony/http-client\": \"^7.0\","));
        assert!(!composer.contains("lodash"));

        let package = &files["frontend/package.json"];
        assert!(package.ends_with("+    \"lodash\": \"^4.17.21\","));
    }

    #[test]
    fn test_deleted_file_uses_old_path() {
        assert_eq!(pick_path("package-lock.json", "/dev/null"), "package-lock.json");
        assert_eq!(pick_path("old.json", "new.json"), "new.json");
    }

    #[test]
    fn test_renamed_file_uses_new_path() {
        let patch = "diff --git a/old/composer.json b/new/composer.json\nsimilarity index 90%\n";
        let files = split_patch(patch);
        assert!(files.contains_key("new/composer.json"));
    }

    #[test]
    fn test_bare_single_file_diff() {
        let patch = "--- a/package.json\n+++ b/package.json\n@@ -1 +1 @@\n+    \"zod\": \"^3.0.0\",\n";
        let files = split_patch(patch);
        assert_eq!(files.len(), 1);
        assert!(files["package.json"].contains("zod"));
    }

    #[test]
    fn test_bare_diff_new_file() {
        let patch = "--- /dev/null\n+++ b/composer.lock\n+{\n";
        let files = split_patch(patch);
        assert!(files.contains_key("composer.lock"));
    }

    #[test]
    fn test_no_headers() {
        assert!(split_patch("").is_empty());
        assert!(split_patch("just some text\n+more").is_empty());
    }

    #[test]
    fn test_repeated_path_concatenates() {
        let patch = "diff --git a/package.json b/package.json\n+a\ndiff --git a/package.json b/package.json\n+b\n";
        let files = split_patch(patch);
        assert_eq!(files.len(), 1);
        assert_eq!(files["package.json"], "+a\n+b");
    }

    #[test]
    fn test_preamble_before_first_header_is_dropped() {
        let patch = "From 1234 Mon Sep 17 00:00:00 2001\nSubject: bump\n\ndiff --git a/composer.json b/composer.json\n+x\n";
        let files = split_patch(patch);
        assert_eq!(files["composer.json"], "+x");
    }
}
