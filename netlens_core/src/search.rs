//! Free-text search across the fields of a call

use crate::call::CallRecord;
use crate::text::contains_lower;
use serde::{Deserialize, Serialize};

/// Global query plus the optional fields it reaches into.
///
/// The URL is always searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    pub query: String,
    pub search_in_headers: bool,
    pub search_in_payload: bool,
    pub search_in_response: bool,
    pub search_in_errors: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: String::new(),
            search_in_headers: true,
            search_in_payload: true,
            search_in_response: true,
            search_in_errors: true,
        }
    }
}

impl SearchConfig {
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Trimmed, lowercased query; `None` when there is nothing to search for
    pub fn normalized_query(&self) -> Option<String> {
        let query = self.query.trim();
        (!query.is_empty()).then(|| query.to_lowercase())
    }

    /// Back to an empty query with every field enabled
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether `call` matches an already-normalized query
    pub fn matches(&self, call: &CallRecord, query: &str) -> bool {
        if contains_lower(&call.url, query) {
            return true;
        }

        if self.search_in_errors {
            if let Some(error) = &call.error {
                if contains_lower(error, query) {
                    return true;
                }
            }
        }

        if self.search_in_headers && contains_lower(&call.request_headers.to_json(), query) {
            return true;
        }

        if self.search_in_payload {
            if let Some(body) = &call.request_body {
                if contains_lower(body, query) {
                    return true;
                }
            }
        }

        if self.search_in_response {
            if let Some(body) = &call.response_body {
                if contains_lower(body, query) {
                    return true;
                }
            }
        }

        false
    }
}

/// Calls matching the configured query, in their original order.
///
/// A blank query returns the input unchanged.
pub fn evaluate(calls: &[CallRecord], config: &SearchConfig) -> Vec<CallRecord> {
    let Some(query) = config.normalized_query() else {
        return calls.to_vec();
    };

    calls
        .iter()
        .filter(|call| config.matches(call, &query))
        .cloned()
        .collect()
}
