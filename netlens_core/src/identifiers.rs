//! Identifier token detection
//!
//! Finds UUID-shaped tokens (8-4-4-4-12 hex digits, any case) in arbitrary
//! text. Every call is a fresh scan; nothing is remembered between calls.

use crate::text::floor_boundary;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("Failed to compile identifier regex")
});

static IDENTIFIER_EXACT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("Failed to compile identifier regex")
});

/// Bytes of context kept before a match
const CONTEXT_BEFORE: usize = 20;
/// Bytes of context kept from the match start onwards
const CONTEXT_AFTER: usize = 40;

/// One detected identifier token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierMatch {
    pub token: String,
    /// Byte offset of the token in the scanned text
    pub position: usize,
    /// Surrounding excerpt for display
    pub context: String,
}

impl IdentifierMatch {
    pub fn len(&self) -> usize {
        self.token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

/// Every non-overlapping identifier token in `text`, ordered by position
pub fn detect_identifiers(text: &str) -> Vec<IdentifierMatch> {
    IDENTIFIER_REGEX
        .find_iter(text)
        .map(|m| {
            let start = floor_boundary(text, m.start().saturating_sub(CONTEXT_BEFORE));
            let end = floor_boundary(text, m.start() + CONTEXT_AFTER);
            IdentifierMatch {
                token: m.as_str().to_string(),
                position: m.start(),
                context: text[start..end].to_string(),
            }
        })
        .collect()
}

/// Identifier tokens found in a URL
pub fn identifiers_in_url(url: &str) -> Vec<String> {
    detect_identifiers(url).into_iter().map(|m| m.token).collect()
}

/// Whether the whole string is one identifier token
pub fn is_identifier(candidate: &str) -> bool {
    IDENTIFIER_EXACT_REGEX.is_match(candidate)
}

/// Lowercase and re-hyphenate a 32-hex-digit identifier.
///
/// Anything that is not 32 hex digits once hyphens are removed comes back
/// unchanged.
pub fn format_identifier(raw: &str) -> String {
    let clean: String = raw.chars().filter(|c| *c != '-').collect::<String>().to_lowercase();

    if clean.len() != 32 || !clean.chars().all(|c| c.is_ascii_hexdigit()) {
        return raw.to_string();
    }

    format!(
        "{}-{}-{}-{}-{}",
        &clean[0..8],
        &clean[8..12],
        &clean[12..16],
        &clean[16..20],
        &clean[20..]
    )
}
