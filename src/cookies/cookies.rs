//! Cookie core types.
//!
//! This module defines the serializable [`CookieItem`] record, the [`DeletedCookie`]
//! marker used in change notifications and the [`CookieMapping`] that holds the
//! canonical state of a store.
//!
//! Only name/value pairs are modeled. Attributes such as `Path`, `Domain` or
//! `Expires` never reach this layer.
//!
//! ```rust
//! use gosub_cookie_store::cookies::{CookieItem, CookieMapping};
//!
//! let mut mapping = CookieMapping::new();
//! mapping.insert("session", "abc123");
//! mapping.insert("theme", "dark");
//!
//! assert_eq!(mapping.get("session"), Some("abc123"));
//! assert_eq!(mapping.items()[1], CookieItem::new("theme", "dark"));
//! ```

use serde::{Deserialize, Serialize};

/// A single cookie as exposed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CookieItem {
    /// Cookie name (case-sensitive, unique within a store).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,
}

impl CookieItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A cookie that was removed. Only the name survives a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeletedCookie {
    pub name: String,
}

impl DeletedCookie {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Ordered name → value mapping.
///
/// Inserting a name that already exists replaces its value in place, a new name is
/// appended. Cookie jars are small, so entries are kept in a vector and looked up
/// linearly, which keeps iteration order equal to the order of the flat string the
/// mapping was parsed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieMapping {
    entries: Vec<CookieItem>,
}

impl CookieMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|c| c.name == name)
    }

    /// Inserts or overwrites `name`. Returns the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let cookie = CookieItem::new(name, value);

        // Replace existing cookie with same name
        if let Some(existing) = self.entries.iter_mut().find(|c| c.name == cookie.name) {
            return Some(std::mem::replace(&mut existing.value, cookie.value));
        }

        self.entries.push(cookie);
        None
    }

    /// Removes `name`. Returns the removed value, or `None` when it was absent.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.entries.iter().position(|c| c.name == name)?;
        Some(self.entries.remove(idx).value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in mapping order.
    pub fn items(&self) -> &[CookieItem] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|c| (c.name.as_str(), c.value.as_str()))
    }

    /// Order-insensitive comparison of two mappings.
    pub fn same_entries(&self, other: &CookieMapping) -> bool {
        self.len() == other.len() && self.iter().all(|(name, value)| other.get(name) == Some(value))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for CookieMapping {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut mapping = CookieMapping::new();
        for (name, value) in iter {
            mapping.insert(name, value);
        }
        mapping
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites_in_place() {
        let mut m = CookieMapping::new();
        assert_eq!(m.insert("a", "1"), None);
        assert_eq!(m.insert("b", "2"), None);

        // overwrite keeps len and position
        assert_eq!(m.insert("a", "ONE"), Some("1".to_string()));
        assert_eq!(m.len(), 2);
        assert_eq!(m.items()[0], CookieItem::new("a", "ONE"));
        assert_eq!(m.items()[1], CookieItem::new("b", "2"));
    }

    #[test]
    fn remove_returns_old_value() {
        let mut m: CookieMapping = [("a", "1"), ("b", "2")].into_iter().collect();

        assert_eq!(m.remove("a"), Some("1".to_string()));
        assert_eq!(m.remove("a"), None);
        assert!(!m.contains("a"));
        assert_eq!(m.len(), 1);

        m.remove("b");
        assert!(m.is_empty());
    }

    #[test]
    fn same_entries_ignores_order() {
        let a: CookieMapping = [("foo", "bar"), ("fizz", "buzz")].into_iter().collect();
        let b: CookieMapping = [("fizz", "buzz"), ("foo", "bar")].into_iter().collect();
        let c: CookieMapping = [("fizz", "buzz"), ("foo", "baz")].into_iter().collect();

        assert_ne!(a, b);
        assert!(a.same_entries(&b));
        assert!(!a.same_entries(&c));
    }

    #[test]
    fn cookie_item_serializes_as_name_value_object() {
        let item = CookieItem::new("hello", "world");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "hello", "value": "world" }));

        let deleted = serde_json::to_value(DeletedCookie::new("hello")).unwrap();
        assert_eq!(deleted, serde_json::json!({ "name": "hello" }));
    }
}
