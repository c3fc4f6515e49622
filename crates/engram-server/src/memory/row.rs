//! Helpers for pulling typed values back out of a [`crate::collaborators::Row`].
//!
//! The reference `SqliteGraphBackend` stores bitemporal columns
//! (`id`, `vt_start`, `vt_end`, `tt_start`, `tt_end`, `org_id`, `label`) as
//! top-level row fields and everything else inside a JSON-encoded `props`
//! string — these helpers bridge that shape back to plain Rust values so the
//! memory service never has to know the storage encoding.

use crate::collaborators::Row;
use sha2::{Digest, Sha256};

pub fn row_get_str(row: &Row, key: &str) -> Option<String> {
    row.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

pub fn row_get_i64(row: &Row, key: &str) -> Option<i64> {
    row.get(key).and_then(|v| v.as_i64())
}

/// Parses the `props` column into its JSON object, if present and well-formed.
pub fn props(row: &Row) -> Option<serde_json::Value> {
    let raw = row.get("props")?.as_str()?;
    serde_json::from_str(raw).ok()
}

pub fn prop_str(props: &serde_json::Value, key: &str) -> Option<String> {
    props.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

pub fn prop_f64(props: &serde_json::Value, key: &str) -> Option<f64> {
    props.get(key).and_then(|v| v.as_f64())
}

pub fn prop_bool(props: &serde_json::Value, key: &str) -> Option<bool> {
    props.get(key).and_then(|v| v.as_bool())
}

pub fn prop_string_array(props: &serde_json::Value, key: &str) -> Vec<String> {
    props
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// `SHA-256(content)`, hex-encoded (§4.6.1 step 1).
pub fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Renders an epoch-millisecond timestamp as RFC 3339, for vector hits that
/// only carry a numeric timestamp rather than the ISO snapshot `remember`
/// stores on the graph-backed path.
pub fn format_timestamp_ms(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .unwrap_or_else(|| chrono::DateTime::from_timestamp_millis(0).unwrap())
        .to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_is_deterministic() {
        assert_eq!(sha256_hex("hello"), sha256_hex("hello"));
        assert_ne!(sha256_hex("hello"), sha256_hex("world"));
    }
}
