//! The canonical call record every capture source is normalized into

use crate::headers::HeaderMap;
use serde::{Deserialize, Serialize};

/// One observed network exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    /// Stable per request; unique within a call list
    pub id: String,

    pub url: String,

    pub method: String,

    /// HTTP status, 0 when the exchange never resolved
    pub status: u16,

    pub status_text: String,

    #[serde(default)]
    pub request_headers: HeaderMap,

    #[serde(default)]
    pub response_headers: HeaderMap,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,

    /// `None` means not loaded yet, `Some("")` means loaded and empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,

    /// Epoch milliseconds
    pub timestamp: i64,

    /// Milliseconds, never negative
    pub duration: f64,

    /// Set exactly when `status >= 400`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallRecord {
    /// Whether the call counts as an error for filtering
    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.status >= 400
    }

    /// A full copy of this record with the response body resolved
    pub fn with_response_body(&self, body: impl Into<String>) -> Self {
        Self {
            response_body: Some(body.into()),
            ..self.clone()
        }
    }

    /// Whether the response body has been delivered by the source
    pub fn has_response_body(&self) -> bool {
        self.response_body.is_some()
    }
}

/// Error description for a status, present only for 4xx/5xx
pub fn status_error(status: u16) -> Option<String> {
    (status >= 400).then(|| format!("HTTP {}", status))
}


#[cfg(test)]
mod tests {
    use super::fixtures::call;
    use super::*;

    #[test]
    fn test_status_error_threshold() {
        assert_eq!(status_error(399), None);
        assert_eq!(status_error(400), Some("HTTP 400".to_string()));
        assert_eq!(status_error(503), Some("HTTP 503".to_string()));
    }

    #[test]
    fn test_with_response_body_keeps_other_fields() {
        let original = call("1", "GET", "/a", 200);
        let resolved = original.with_response_body("");

        assert!(!original.has_response_body());
        assert_eq!(resolved.response_body.as_deref(), Some(""));
        assert_eq!(resolved.id, original.id);
        assert_eq!(resolved.url, original.url);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(call("1", "GET", "/a", 404)).unwrap();
        assert_eq!(json["statusText"], "");
        assert_eq!(json["error"], "HTTP 404");
        assert!(json.get("responseBody").is_none());
    }
}
