//! Insertion-ordered column → value mappings

use crate::Value;
use std::collections::{BTreeMap, HashMap};

/// An ordered mapping from column name to value.
///
/// Used as a filter (a conjunction of `column = value` predicates) and as row
/// data for inserts and updates. Iteration order is insertion order, which is
/// also the order values are bound in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

/// Equality predicates for select, update and delete
pub type Filter = Fields;

/// Column values for insert and update
pub type RowData = Fields;

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column's value. An existing column keeps its position.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Builder form of [`Fields::set`]
    ///
    /// # Examples
    /// ```
    /// use crudkit::Fields;
    ///
    /// let filter = Fields::new().with("status", "active").with("age", 30);
    /// assert_eq!(filter.len(), 2);
    /// ```
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (column, value) in iter {
            fields.set(column, value);
        }
        fields
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Fields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K, V> From<Vec<(K, V)>> for Fields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(entries: Vec<(K, V)>) -> Self {
        entries.into_iter().collect()
    }
}

// HashMap iteration order is arbitrary but stable for one instance, so columns
// and values still line up.
impl From<HashMap<String, Value>> for Fields {
    fn from(map: HashMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl From<BTreeMap<String, Value>> for Fields {
    fn from(map: BTreeMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let fields = Fields::new().with("b", 1).with("a", 2).with("c", 3);
        let cols: Vec<&str> = fields.columns().collect();
        assert_eq!(cols, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut fields = Fields::from([("x", 1), ("y", 2)]);
        fields.set("x", 10);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("x"), Some(&Value::I32(10)));
        let cols: Vec<&str> = fields.columns().collect();
        assert_eq!(cols, vec!["x", "y"]);
    }

    #[test]
    fn test_default_is_empty() {
        let fields = Filter::default();
        assert!(fields.is_empty());
        assert_eq!(fields.iter().count(), 0);
    }

    #[test]
    fn test_from_hash_map_aligns_columns_and_values() {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::from("John"));
        map.insert("age".to_string(), Value::from(30));
        let fields = Fields::from(map);
        assert_eq!(fields.get("name"), Some(&Value::from("John")));
        assert_eq!(fields.get("age"), Some(&Value::from(30)));
    }

    #[test]
    fn test_from_btree_map_is_sorted() {
        let mut map = BTreeMap::new();
        map.insert("zeta".to_string(), Value::Null);
        map.insert("alpha".to_string(), Value::Bool(true));
        let fields = Fields::from(map);
        let cols: Vec<&str> = fields.columns().collect();
        assert_eq!(cols, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_mixed_value_types() {
        let fields = Fields::from(vec![
            ("name", Value::from("Ann")),
            ("score", Value::from(9.5)),
        ]);
        let values: Vec<&Value> = fields.values().collect();
        assert_eq!(values, vec![&Value::from("Ann"), &Value::F64(9.5)]);
    }
}
