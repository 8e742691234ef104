//! The filter object posted to `set_filter`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A set of filter keys and values. Absent keys are not filtered on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(BTreeMap<String, Value>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter holding a single key.
    pub fn single(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut filter = Self::new();
        filter.insert(key, value);
        filter
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overlay `other` on top of `self`, key by key.
    ///
    /// Returns the keys that were already present and got overridden.
    pub fn merge(&mut self, other: &Filter) -> Vec<String> {
        let mut collisions = Vec::new();
        for (key, value) in other.iter() {
            if self.0.insert(key.clone(), value.clone()).is_some() {
                collisions.push(key.clone());
            }
        }
        collisions
    }

    /// Render as `key=value` pairs, the way the filter is shown to users.
    pub fn to_text(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, crate::explorer::value_label(v)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromIterator<(String, Value)> for Filter {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Filter(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::Filter;
    use serde_json::json;

    #[test]
    fn test_merge_reports_collisions() {
        let mut base = Filter::single("var", "B12101");
        let other: Filter = [
            ("var".to_string(), json!("B13011")),
            ("rep_memo".to_string(), json!("synop")),
        ]
        .into_iter()
        .collect();
        let collisions = base.merge(&other);
        assert_eq!(collisions, vec!["var".to_string()]);
        assert_eq!(base.get("var"), Some(&json!("B13011")));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut filter = Filter::new();
        filter.insert("ana_id", 3);
        filter.insert("rep_memo", "synop");
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"ana_id": 3, "rep_memo": "synop"})
        );
        assert_eq!(filter.to_text(), "ana_id=3 rep_memo=synop");
    }
}
