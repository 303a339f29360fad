//! The flat `name=value; name=value` representation exchanged with a host.
//!
//! There is no escaping: a `=` or `"; "` inside a name or value does not survive a
//! round trip. Segments without a `=` are kept as a name with an empty value.

use crate::cookies::CookieMapping;

/// Separator between two `name=value` pairs.
pub const SEPARATOR: &str = "; ";

/// Parses a flat cookie string. Empty segments are dropped and a repeated name keeps
/// the last value.
pub fn parse(flat: &str) -> CookieMapping {
    let mut mapping = CookieMapping::new();

    for segment in flat.split(SEPARATOR).filter(|s| !s.is_empty()) {
        match segment.split_once('=') {
            Some((name, value)) => mapping.insert(name, value),
            None => mapping.insert(segment, ""),
        };
    }

    mapping
}

/// Serializes a mapping in its iteration order.
pub fn serialize(mapping: &CookieMapping) -> String {
    mapping
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}
