#![forbid(unsafe_code)]

//! String attribute bags.
//!
//! Components accept their configuration either through typed builders or
//! through string key/value pairs (the markup-style surface). This module
//! holds the latter and the small parsing rules shared by all components:
//! missing or empty values fall back to defaults, and boolean flags are
//! `true` unless spelled exactly `"false"`.

use std::collections::BTreeMap;

/// An ordered map of attribute name to raw string value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<String, String>,
}

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    /// Raw value; empty strings count as missing.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Value or `default` when missing.
    #[must_use]
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Flag that is on unless the attribute is exactly `"false"`.
    #[must_use]
    pub fn flag_default_on(&self, name: &str) -> bool {
        self.get(name) != Some("false")
    }

    /// Flag that is off unless the attribute is exactly `"true"`.
    #[must_use]
    pub fn flag_default_off(&self, name: &str) -> bool {
        self.get(name) == Some("true")
    }

    /// Parse a numeric attribute, falling back on missing or invalid input.
    #[must_use]
    pub fn parse_or<T: std::str::FromStr>(&self, name: &str, default: T) -> T {
        self.get(name)
            .and_then(|v| v.trim().trim_end_matches("px").parse().ok())
            .unwrap_or(default)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.set(k, v);
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_are_missing() {
        let attrs: Attributes = [("mode", "")].into_iter().collect();
        assert_eq!(attrs.get("mode"), None);
        assert_eq!(attrs.get_or("mode", "center"), "center");
    }

    #[test]
    fn boolean_flags() {
        let attrs: Attributes = [("a", "false"), ("b", "yes"), ("c", "true")]
            .into_iter()
            .collect();
        assert!(!attrs.flag_default_on("a"));
        assert!(attrs.flag_default_on("b"));
        assert!(attrs.flag_default_on("missing"));
        assert!(!attrs.flag_default_off("b"));
        assert!(attrs.flag_default_off("c"));
    }

    #[test]
    fn numeric_parse_accepts_px_suffix() {
        let attrs: Attributes = [("max", "200px"), ("bad", "wide")].into_iter().collect();
        assert_eq!(attrs.parse_or("max", 0u16), 200);
        assert_eq!(attrs.parse_or("bad", 7u16), 7);
    }
}
