//! Recognisers for the single-line layouts found in manifest diffs
//!
//! Each function looks at exactly one diff line. A line either matches the
//! whole layout or yields `None`; nothing here can panic on odd input since
//! every split point is an ASCII byte.

/// Unified-diff marker at column 0 of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `+` line
    Added,
    /// `-` line
    Removed,
}

impl Marker {
    pub fn of(line: &str) -> Option<Self> {
        match line.as_bytes().first() {
            Some(b'+') => Some(Marker::Added),
            Some(b'-') => Some(Marker::Removed),
            _ => None,
        }
    }
}

/// A marked `"key": "value"` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyValue<'a> {
    pub marker: Marker,
    pub key: &'a str,
    pub value: &'a str,
}

/// Matches `+"key": "value"` / `-"key": "value"` with optional whitespace
/// after the marker and after the colon. Both key and value must be
/// non-empty; anything after the closing quote of the value is ignored.
pub fn key_value(line: &str) -> Option<KeyValue<'_>> {
    let marker = Marker::of(line)?;
    let (key, value) = quoted_pair(skip_ws(&line[1..]))?;
    Some(KeyValue { marker, key, value })
}

/// Matches a marked line whose key is exactly `field`, returning its value
pub fn marked_field<'a>(line: &'a str, field: &str) -> Option<(Marker, &'a str)> {
    key_value(line)
        .filter(|kv| kv.key == field)
        .map(|kv| (kv.marker, kv.value))
}

/// Matches an unmarked (context) `"field": "value"` line.
///
/// The first non-whitespace character must be the opening quote, so
/// marked lines never match.
pub fn context_field<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let (key, value) = quoted_pair(skip_ws(line))?;
    (key == field).then_some(value)
}

/// Matches a marked lock-file block anchor: `+"node_modules/pkg": {` or
/// `-"pkg": {`. A single leading `node_modules/` is stripped from the key.
pub fn block_anchor(line: &str) -> Option<(Marker, &str)> {
    let marker = Marker::of(line)?;
    let (key, rest) = quoted(skip_ws(&line[1..]))?;
    let rest = skip_ws(rest.strip_prefix(':')?);
    if !rest.starts_with('{') {
        return None;
    }

    let name = match key.strip_prefix("node_modules/") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => key,
    };
    Some((marker, name))
}

/// `@@ -a,b +c,d @@` hunk header
pub fn is_hunk_header(line: &str) -> bool {
    line.starts_with("@@")
}

/// `"key":<ws>"value"` at the start of `s`
fn quoted_pair(s: &str) -> Option<(&str, &str)> {
    let (key, rest) = quoted(s)?;
    let rest = skip_ws(rest.strip_prefix(':')?);
    let (value, _) = quoted(rest)?;
    Some((key, value))
}

/// Non-empty double-quoted string at the start of `s`, and the text after it
fn quoted(s: &str) -> Option<(&str, &str)> {
    let inner = s.strip_prefix('"')?;
    let end = inner.find('"')?;
    if end == 0 {
        return None;
    }
    Some((&inner[..end], &inner[end + 1..]))
}

fn skip_ws(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_ascii_whitespace())
}
