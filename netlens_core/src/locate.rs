//! Structured match locator
//!
//! [`locate`] walks a JSON value depth-first and records key and value
//! matches with the key path they occurred at. [`search_body`] is the entry
//! point used for rendering: it runs the structured walk when the body parses
//! as JSON, but the positions it hands back always come from a flat scan over
//! the raw body text, which is what gets highlighted and navigated.

use crate::text::find_all;
use serde::Serialize;
use serde_json::Value;

/// Depth at which the walk stops descending
pub const MAX_DEPTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Key,
    Value,
}

/// A match inside a JSON structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredMatch {
    /// Key chain such as `data.items[2].name`
    pub path: String,
    pub kind: MatchKind,
    /// Byte offset inside the key or leaf text; always 0 for key matches
    pub position: usize,
    pub length: usize,
    pub text: String,
}

/// A match inside flat text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextMatch {
    pub position: usize,
    pub length: usize,
    pub text: String,
}

/// Outcome of searching one body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BodySearch {
    /// Flat-text matches over the raw body; the positions to render
    pub matches: Vec<TextMatch>,
    /// Structured matches, present only when the body parsed as JSON
    pub structured: Option<Vec<StructuredMatch>>,
}

impl BodySearch {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Structured search over a JSON value, sorted by path
pub fn locate(data: &Value, query: &str, case_sensitive: bool) -> Vec<StructuredMatch> {
    locate_with_depth(data, query, case_sensitive, MAX_DEPTH)
}

/// [`locate`] with an explicit depth cap
pub fn locate_with_depth(
    data: &Value,
    query: &str,
    case_sensitive: bool,
    max_depth: usize,
) -> Vec<StructuredMatch> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let mut walker = Walker {
        query,
        case_sensitive,
        max_depth,
        results: Vec::new(),
        truncated: false,
    };
    walker.walk(data, String::new(), 0);

    if walker.truncated {
        tracing::warn!("Maximum search depth {} reached, deeper values skipped", max_depth);
    }

    let mut results = walker.results;
    results.sort_by(|a, b| a.path.cmp(&b.path));
    results
}

struct Walker<'q> {
    query: &'q str,
    case_sensitive: bool,
    max_depth: usize,
    results: Vec<StructuredMatch>,
    truncated: bool,
}

impl Walker<'_> {
    fn walk(&mut self, node: &Value, path: String, depth: usize) {
        if depth > self.max_depth {
            self.truncated = true;
            return;
        }

        match node {
            Value::Null => {}
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    self.walk(item, format!("{}[{}]", path, idx), depth + 1);
                }
            }
            Value::Object(fields) => {
                for (key, value) in fields {
                    let key_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };

                    if !find_all(key, self.query, self.case_sensitive).is_empty() {
                        self.results.push(StructuredMatch {
                            path: key_path.clone(),
                            kind: MatchKind::Key,
                            position: 0,
                            length: key.len(),
                            text: key.clone(),
                        });
                    }

                    if let Some(leaf) = scalar_text(value) {
                        self.match_leaf(&leaf, &key_path);
                    }

                    if value.is_array() || value.is_object() {
                        self.walk(value, key_path, depth + 1);
                    }
                }
            }
            leaf => {
                if let Some(text) = scalar_text(leaf) {
                    self.match_leaf(&text, &path);
                }
            }
        }
    }

    fn match_leaf(&mut self, text: &str, path: &str) {
        for (position, length) in find_all(text, self.query, self.case_sensitive) {
            self.results.push(StructuredMatch {
                path: path.to_string(),
                kind: MatchKind::Value,
                position,
                length,
                text: text[position..position + length].to_string(),
            });
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Flat substring scan, non-overlapping, in byte offsets
pub fn find_text_matches(text: &str, query: &str, case_sensitive: bool) -> Vec<TextMatch> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    // Resumes after each hit, so "aa" in "aaaa" is 2 matches rather than 3;
    // overlapping hits would be dropped by the highlight merger anyway.
    find_all(text, query, case_sensitive)
        .into_iter()
        .map(|(position, length)| TextMatch {
            position,
            length,
            text: text[position..position + length].to_string(),
        })
        .collect()
}

/// Search a request or response body for rendering.
///
/// JSON bodies also get a structured walk, reported in
/// [`BodySearch::structured`]; non-JSON bodies fall back to the flat scan
/// alone. Either way [`BodySearch::matches`] holds raw-text positions.
pub fn search_body(body: &str, query: &str, case_sensitive: bool) -> BodySearch {
    if query.trim().is_empty() || body.is_empty() {
        return BodySearch::default();
    }

    let structured = match serde_json::from_str::<Value>(body) {
        Ok(data) => Some(locate(&data, query, case_sensitive)),
        Err(e) => {
            tracing::debug!("Falling back to text search, body is not JSON: {}", e);
            None
        }
    };

    BodySearch {
        matches: find_text_matches(body, query, case_sensitive),
        structured,
    }
}
