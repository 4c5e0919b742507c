//! Common utility functions used across the crate.

/// Returns the last path component of `path`.
///
/// Both `/` and `\` are treated as separators so paths reported by
/// Windows-hosted repositories route the same way. A path ending in a
/// separator yields an empty string.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Truncates a string to a maximum character count with ellipsis.
///
/// This function properly handles UTF-8 strings by counting characters,
/// not bytes. If the string needs truncation, an ellipsis ("...") is
/// appended and counted toward the maximum length.
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        return s.to_string();
    }

    let keep_chars = max_chars.saturating_sub(3);
    let truncated: String = s.chars().take(keep_chars).collect();
    format!("{truncated}...")
}
