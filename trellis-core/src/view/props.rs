//! Immutable props passed from a parent's render output to a child.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// An immutable, insertion-ordered mapping of named values.
///
/// Built once by the parent, read by the child, never mutated. Compared
/// by value when the runtime decides whether a child needs re-rendering.
///
/// # Example
///
/// ```rust,ignore
/// let props = Props::new()
///     .with("label", "Counter A")
///     .with("initial", 0);
/// assert_eq!(props.string("label"), Some("Counter A"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Props {
    entries: IndexMap<String, Value>,
}

impl Props {
    /// Create an empty props map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value, consuming and returning the map.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Look up a string value by name.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(Value::as_str)
    }

    /// Look up a numeric value by name, widened to `f64`.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.entries.get(name).and_then(Value::as_f64)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn props_preserve_insertion_order() {
        let props = Props::new().with("b", 1).with("a", 2).with("c", 3);
        let names: Vec<&str> = props.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn props_compare_by_value() {
        let left = Props::new().with("label", "x").with("count", 2);
        let right = Props::new().with("label", "x").with("count", 2);
        assert_eq!(left, right);

        let changed = Props::new().with("label", "x").with("count", 3);
        assert_ne!(left, changed);
    }

    #[test]
    fn typed_accessors() {
        let props = Props::new()
            .with("label", "total")
            .with("price", 10.5)
            .with("quantity", 2)
            .with("items", json!([{ "id": 1 }]));

        assert_eq!(props.string("label"), Some("total"));
        assert_eq!(props.number("price"), Some(10.5));
        assert_eq!(props.number("quantity"), Some(2.0));
        assert!(props.get("items").is_some());
        assert!(props.get("missing").is_none());
        assert_eq!(props.len(), 4);
    }
}
