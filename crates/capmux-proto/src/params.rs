//! Multiplexing parameters.
//!
//! A `MultiParams` maps a parameter name to the ordered collection of
//! candidate values it multiplexes over, e.g.
//! `{host: [h1, h2], disk: [sda, sdb]}`. The matrix builder expands this
//! into the cartesian product of combinations, one capture group each.
//! Insertion order is preserved; it determines output ordering only.

use serde::{Deserialize, Serialize};

/// Insertion-ordered mapping from parameter name to candidate values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiParams {
    entries: Vec<(String, Vec<String>)>,
}

impl MultiParams {
    /// Creates an empty parameter set.
    ///
    /// An empty set expands to exactly one capture group with no parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter and its candidate values, replacing any previous
    /// entry with the same name (the original insertion position is kept).
    pub fn insert<N, V, I>(&mut self, name: N, values: I) -> &mut Self
    where
        N: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = V>,
    {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = values;
        } else {
            self.entries.push((name, values));
        }
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<N, V, I>(mut self, name: N, values: I) -> Self
    where
        N: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = V>,
    {
        self.insert(name, values);
        self
    }

    /// Iterates parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Returns the candidate values for a parameter.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no parameters are defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let params = MultiParams::new()
            .with("host", ["h1", "h2"])
            .with("disk", ["sda"]);

        let names: Vec<&str> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["host", "disk"]);
        assert_eq!(params.get("host"), Some(["h1".to_string(), "h2".to_string()].as_slice()));
    }

    #[test]
    fn test_reinsert_replaces_values_keeps_position() {
        let mut params = MultiParams::new();
        params.insert("host", ["h1"]).insert("disk", ["sda"]);
        params.insert("host", ["h3"]);

        let names: Vec<&str> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["host", "disk"]);
        assert_eq!(params.get("host"), Some(["h3".to_string()].as_slice()));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_empty() {
        let params = MultiParams::new();
        assert!(params.is_empty());
        assert_eq!(params.get("host"), None);
    }
}
