//! Conversion between HTTP header maps and envelope header mappings.

use hoard_core::Headers;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Headers that describe a single connection hop and must not be relayed.
pub const HOP_BY_HOP: &[&str] =
    &["connection", "keep-alive", "proxy-connection", "te", "trailer", "transfer-encoding", "upgrade"];

/// Whether `name` is a hop-by-hop header (case-insensitive).
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Flatten a header map, joining repeated values with `", "`.
///
/// Values that are not visible ASCII are decoded lossily.
pub fn to_fields(map: &HeaderMap) -> Headers {
    let mut fields = Headers::new();
    for (name, value) in map {
        let value = String::from_utf8_lossy(value.as_bytes());
        fields
            .entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    fields
}

/// Build a header map from envelope fields, skipping any that are not valid
/// HTTP header names or values.
pub fn to_header_map<'a>(fields: impl IntoIterator<Item = (&'a String, &'a String)>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in fields {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "dropping invalid header"),
        }
    }
    map
}
