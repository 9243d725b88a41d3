//! Call normalizer
//!
//! Turns live capture events and HAR entries into [`CallRecord`]s. Both
//! inputs arrive as loosely shaped JSON, so every field is read defensively
//! and a malformed input yields `None` with a log line instead of an error.

use crate::call::{status_error, CallRecord};
use crate::headers::normalize_headers;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::Value;

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Normalize one entry of a HAR document.
///
/// Returns `None` unless the entry carries both a `request` and a `response`
/// object.
pub fn from_har_entry(entry: &Value) -> Option<CallRecord> {
    let request = entry.get("request").filter(|v| v.is_object());
    let response = entry.get("response").filter(|v| v.is_object());

    if request.is_none() || response.is_none() {
        tracing::warn!("Invalid HAR entry - missing request or response");
        return None;
    }

    let id = request_id(entry).unwrap_or_else(|| format!("historical_{}", synthesize_id()));
    Some(build(entry, id))
}

/// Normalize one live "request finished" event.
///
/// Live events may be partial (a response that never arrived), so only an
/// event lacking both sections is rejected.
pub fn from_capture_event(event: &Value) -> Option<CallRecord> {
    let has_request = event.get("request").is_some_and(Value::is_object);
    let has_response = event.get("response").is_some_and(Value::is_object);

    if !has_request && !has_response {
        tracing::warn!("Dropping capture event without request or response");
        return None;
    }

    let id = request_id(event).unwrap_or_else(synthesize_id);
    Some(build(event, id))
}

fn build(raw: &Value, id: String) -> CallRecord {
    let request = raw.get("request").unwrap_or(&Value::Null);
    let response = raw.get("response").unwrap_or(&Value::Null);

    let status = response
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .unwrap_or(0);

    CallRecord {
        id,
        url: str_field(request, "url").unwrap_or_default(),
        method: str_field(request, "method")
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "GET".to_string()),
        status,
        status_text: str_field(response, "statusText").unwrap_or_default(),
        request_headers: normalize_headers(request.get("headers").unwrap_or(&Value::Null)),
        response_headers: normalize_headers(response.get("headers").unwrap_or(&Value::Null)),
        request_body: request
            .get("postData")
            .and_then(|p| p.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string),
        response_body: inline_content(raw, response),
        timestamp: raw
            .get("startedDateTime")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or_else(|| Utc::now().timestamp_millis()),
        duration: raw
            .get("time")
            .and_then(Value::as_f64)
            .filter(|t| t.is_finite())
            .map(|t| t.max(0.0))
            .unwrap_or(0.0),
        error: status_error(status),
    }
}

/// Source-provided identifier: `_requestId` on HAR entries, `request.requestId`
/// on live events.
fn request_id(raw: &Value) -> Option<String> {
    raw.get("_requestId")
        .or_else(|| raw.get("request").and_then(|r| r.get("requestId")))
        .and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Body content already carried by the source, if any.
///
/// A top-level `content` string (live events) wins over the HAR
/// `response.content.text` slot.
fn inline_content(raw: &Value, response: &Value) -> Option<String> {
    if let Some(text) = raw.get("content").and_then(Value::as_str) {
        return Some(text.to_string());
    }

    let content = response.get("content")?;
    let text = content.get("text").and_then(Value::as_str)?;
    let encoding = content.get("encoding").and_then(Value::as_str);

    Some(decode_content(text, encoding))
}

/// Decode base64 bodies to text, keeping the raw text when that fails
pub fn decode_content(text: &str, encoding: Option<&str>) -> String {
    if encoding != Some("base64") {
        return text.to_string();
    }

    match STANDARD.decode(text.trim()) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| {
            tracing::debug!("Base64 body is not UTF-8, keeping encoded text");
            text.to_string()
        }),
        Err(e) => {
            tracing::debug!("Failed to decode base64 body: {}", e);
            text.to_string()
        }
    }
}

fn str_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
}

/// `<epoch millis>_<9 random base36 chars>`
pub fn synthesize_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn har_entry() -> Value {
        json!({
            "_requestId": "1234.56",
            "startedDateTime": "2024-03-01T12:00:00.000Z",
            "time": 42.5,
            "request": {
                "method": "POST",
                "url": "https://api.example.com/orders",
                "headers": [
                    {"name": "Content-Type", "value": "application/json"},
                    {"name": "X-Id", "value": "a1b2c3d4-e5f6-7890-abcd-ef1234567890"}
                ],
                "postData": {"mimeType": "application/json", "text": "{\"qty\":1}"}
            },
            "response": {
                "status": 201,
                "statusText": "Created",
                "headers": [{"name": "Content-Length", "value": "2"}],
                "content": {"size": 2, "text": "{}"}
            }
        })
    }

    #[test]
    fn test_har_entry_fields() {
        let call = from_har_entry(&har_entry()).unwrap();

        assert_eq!(call.id, "1234.56");
        assert_eq!(call.method, "POST");
        assert_eq!(call.url, "https://api.example.com/orders");
        assert_eq!(call.status, 201);
        assert_eq!(call.status_text, "Created");
        assert_eq!(call.request_headers.len(), 2);
        assert_eq!(call.request_body.as_deref(), Some("{\"qty\":1}"));
        assert_eq!(call.response_body.as_deref(), Some("{}"));
        assert_eq!(call.timestamp, 1_709_294_400_000);
        assert_eq!(call.duration, 42.5);
        assert_eq!(call.error, None);
    }

    #[test]
    fn test_har_entry_requires_both_sections() {
        assert!(from_har_entry(&json!({"request": {"url": "/a"}})).is_none());
        assert!(from_har_entry(&json!({"response": {"status": 200}})).is_none());
        assert!(from_har_entry(&json!({})).is_none());
        assert!(from_har_entry(&json!("not an entry")).is_none());
    }

    #[test]
    fn test_capture_event_without_either_section_is_none() {
        assert!(from_capture_event(&json!({})).is_none());
        assert!(from_capture_event(&json!({"time": 3})).is_none());
        assert!(from_capture_event(&Value::Null).is_none());
    }

    #[test]
    fn test_capture_event_with_partial_sections() {
        let call = from_capture_event(&json!({"request": {"url": "/pending"}})).unwrap();
        assert_eq!(call.url, "/pending");
        assert_eq!(call.method, "GET");
        assert_eq!(call.status, 0);
        assert!(call.response_body.is_none());
        assert!(call.error.is_none());
    }

    #[test]
    fn test_capture_event_map_headers_and_inline_content() {
        let call = from_capture_event(&json!({
            "request": {"requestId": "live-1", "url": "/x", "headers": {"Accept": "*/*"}},
            "response": {"status": 500, "headers": {"Server": "nginx"}},
            "content": "boom"
        }))
        .unwrap();

        assert_eq!(call.id, "live-1");
        assert_eq!(call.request_headers.get("Accept"), Some("*/*"));
        assert_eq!(call.response_headers.get("Server"), Some("nginx"));
        assert_eq!(call.response_body.as_deref(), Some("boom"));
        assert_eq!(call.error.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn test_identifier_in_request_header_value() {
        let call = from_har_entry(&har_entry()).unwrap();
        let value = call.request_headers.get("X-Id").unwrap();

        let found = crate::identifiers::detect_identifiers(value);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position, 0);
        assert_eq!(found[0].len(), 36);
        assert_eq!(found[0].token, "a1b2c3d4-e5f6-7890-abcd-ef1234567890");
    }

    #[test]
    fn test_synthesized_ids_are_unique() {
        let mut entry = har_entry();
        entry.as_object_mut().unwrap().remove("_requestId");

        let a = from_har_entry(&entry).unwrap();
        let b = from_har_entry(&entry).unwrap();
        assert!(a.id.starts_with("historical_"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_negative_time_clamps_to_zero() {
        let mut entry = har_entry();
        entry["time"] = json!(-1);
        assert_eq!(from_har_entry(&entry).unwrap().duration, 0.0);
    }

    #[test]
    fn test_base64_content_is_decoded() {
        let mut entry = har_entry();
        entry["response"]["content"] = json!({"text": "aGVsbG8=", "encoding": "base64"});
        assert_eq!(from_har_entry(&entry).unwrap().response_body.as_deref(), Some("hello"));

        assert_eq!(decode_content("not base64!", Some("base64")), "not base64!");
    }
}
