//! Ordered query-parameter maps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Result, SiloError};

/// An insertion-ordered mapping of query-parameter names to values.
///
/// Used both for caller-supplied base parameters and for the partition
/// descriptors returned by the metadata endpoint. Key order is preserved:
/// for descriptors it determines the natural partition-path segment order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    /// Creates an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the map holds no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Merges `other` into `self`; values from `other` win on key conflicts.
    ///
    /// Merge precedence across the orchestrator is: base params < partition
    /// descriptor < forced overrides (`transactionId`, `format`), expressed
    /// as successive calls to this method.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Renders the entries as query pairs, omitting `null`-valued parameters.
    ///
    /// Strings are rendered verbatim; other values use their JSON encoding.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), render_value(value)))
            .collect()
    }

    /// Builds `key=value` partition-path segments from this descriptor.
    ///
    /// With an explicit `order`, segments are emitted in that key order and
    /// keys outside the ordering are ignored; otherwise the descriptor's
    /// natural key order is used.
    ///
    /// # Errors
    ///
    /// Returns [`SiloError::Metadata`] if an ordered key is absent from the
    /// descriptor.
    pub fn path_segments(&self, order: Option<&[String]>) -> Result<Vec<String>> {
        match order {
            Some(keys) => keys
                .iter()
                .map(|key| {
                    let value = self.0.get(key).ok_or_else(|| {
                        SiloError::Metadata(format!("partition descriptor missing key '{key}'"))
                    })?;
                    Ok(format!("{key}={}", render_value(value)))
                })
                .collect(),
            None => Ok(self
                .0
                .iter()
                .map(|(key, value)| format!("{key}={}", render_value(value)))
                .collect()),
        }
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Renders a JSON value the way it appears in a URL or path segment.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_precedence() {
        let mut params = Params::new().with("ccy", "eur").with("stamp", "2026-01-30");
        let descriptor = Params::new().with("stamp", "2026-02-27").with("mod_20", 3);
        params.merge(&descriptor);

        assert_eq!(params.get("ccy"), Some(&json!("eur")));
        assert_eq!(params.get("stamp"), Some(&json!("2026-02-27")));
        assert_eq!(params.get("mod_20"), Some(&json!(3)));
    }

    #[test]
    fn test_query_pairs_skip_null() {
        let params = Params::new()
            .with("from", "2019-01-01")
            .with("to", Value::Null)
            .with("mod_20", 7);

        let pairs = params.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("from".to_string(), "2019-01-01".to_string()),
                ("mod_20".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_path_segments_natural_order() {
        let descriptor = Params::new().with("stamp", "2026-01-30").with("mod_20", 3);
        let segments = descriptor.path_segments(None).unwrap();
        assert_eq!(segments, vec!["stamp=2026-01-30", "mod_20=3"]);
    }

    #[test]
    fn test_path_segments_explicit_order_ignores_extras() {
        let descriptor = Params::new()
            .with("other", "x")
            .with("mod_20", 3)
            .with("stamp", "2026-01-30");
        let order = vec!["stamp".to_string(), "mod_20".to_string()];
        let segments = descriptor.path_segments(Some(&order)).unwrap();
        assert_eq!(segments, vec!["stamp=2026-01-30", "mod_20=3"]);
    }

    #[test]
    fn test_path_segments_missing_ordered_key() {
        let descriptor = Params::new().with("stamp", "2026-01-30");
        let order = vec!["stamp".to_string(), "mod_20".to_string()];
        let err = descriptor.path_segments(Some(&order)).unwrap_err();
        assert!(matches!(err, SiloError::Metadata(_)));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let params = Params::new().with("b", 1).with("a", 2).with("c", 3);
        let keys: Vec<_> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
