//! Header normalization
//!
//! Capture sources hand over headers as `{name, value}` arrays, `{key, value}`
//! arrays, `[name, value]` pairs or plain JSON objects. [`normalize_headers`]
//! is the single adapter that turns any of those into a [`HeaderMap`].

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Ordered header map; inserting an existing name replaces its value in place
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, last write wins
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Exact-name lookup
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Case-insensitive lookup, first match wins
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Compact JSON object text, e.g. `{"Accept":"*/*"}`
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for HeaderMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for HeaderMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HeaderMapVisitor;

        impl<'de> Visitor<'de> for HeaderMapVisitor {
            type Value = HeaderMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of header names to string values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = HeaderMap::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    map.insert(k, v);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(HeaderMapVisitor)
    }
}

/// Collapse any supported header shape into a [`HeaderMap`].
///
/// Entries without a usable name or value are skipped. Scalar values are
/// stringified; `null` and nested values are dropped.
pub fn normalize_headers(input: &Value) -> HeaderMap {
    let mut map = HeaderMap::new();

    match input {
        Value::Array(items) => {
            for item in items {
                if let Some((name, value)) = header_entry(item) {
                    map.insert(name, value);
                }
            }
        }
        Value::Object(fields) => {
            for (name, value) in fields {
                if name.is_empty() {
                    continue;
                }
                if let Some(value) = header_value(value) {
                    map.insert(name.clone(), value);
                }
            }
        }
        _ => {}
    }

    map
}

fn header_entry(item: &Value) -> Option<(String, String)> {
    match item {
        Value::Object(fields) => {
            let name = fields
                .get("name")
                .or_else(|| fields.get("key"))
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())?;
            let value = fields.get("value").and_then(header_value)?;
            Some((name.to_string(), value))
        }
        Value::Array(pair) if pair.len() == 2 => {
            let name = pair[0].as_str().filter(|n| !n.is_empty())?;
            let value = header_value(&pair[1])?;
            Some((name.to_string(), value))
        }
        _ => None,
    }
}

fn header_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_name_value_array() {
        let headers = normalize_headers(&json!([
            {"name": "Content-Type", "value": "application/json"},
            {"name": "Accept", "value": "*/*"},
        ]));
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_normalize_key_value_array_and_pairs() {
        let headers = normalize_headers(&json!([
            {"key": "X-Trace", "value": "abc"},
            ["X-Pair", "def"],
        ]));
        assert_eq!(headers.get("X-Trace"), Some("abc"));
        assert_eq!(headers.get("X-Pair"), Some("def"));
    }

    #[test]
    fn test_normalize_skips_incomplete_entries() {
        let headers = normalize_headers(&json!([
            {"name": "Missing-Value"},
            {"value": "missing name"},
            {"name": "", "value": "empty name"},
            {"name": "Ok", "value": "yes"},
        ]));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Ok"), Some("yes"));
    }

    #[test]
    fn test_duplicate_names_last_write_wins_in_place() {
        let headers = normalize_headers(&json!([
            {"name": "A", "value": "1"},
            {"name": "B", "value": "2"},
            {"name": "A", "value": "3"},
        ]));
        let collected: Vec<_> = headers.iter().collect();
        assert_eq!(collected, vec![("A", "3"), ("B", "2")]);
    }

    #[test]
    fn test_normalize_plain_object() {
        let headers = normalize_headers(&json!({"X-Count": 3, "X-Null": null, "Host": "a.b"}));
        assert_eq!(headers.get("X-Count"), Some("3"));
        assert_eq!(headers.get("X-Null"), None);
        assert_eq!(headers.get_ignore_case("host"), Some("a.b"));
    }

    #[test]
    fn test_normalize_other_shapes_are_empty() {
        assert!(normalize_headers(&Value::Null).is_empty());
        assert!(normalize_headers(&json!("Accept: */*")).is_empty());
    }

    #[test]
    fn test_to_json_is_compact_object() {
        let headers: HeaderMap = [("X-Id", "42")].into_iter().collect();
        assert_eq!(headers.to_json(), r#"{"X-Id":"42"}"#);

        let parsed: HeaderMap = serde_json::from_str(&headers.to_json()).unwrap();
        assert_eq!(parsed, headers);
    }
}
