//! Request field model.
//!
//! A [`FieldMap`] is an ordered mapping from field name to [`FieldValue`].
//! Inserting a key that already exists replaces the value in place, so the
//! map never holds duplicate keys and the last writer wins. Requests are
//! assembled by merging maps in a fixed order (event base fields, then caller
//! options) and are flattened to `application/x-www-form-urlencoded` pairs
//! right before dispatch.

use crate::errors::ClientError;
use serde_json::Value;

/// A single request field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Line-item data such as the `items` of a trade event.
    List(Vec<FieldMap>),
}

impl FieldValue {
    /// Loose truthiness as understood by the remote service's switches.
    ///
    /// Empty text, `"0"`, zero, `false` and an empty list are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty() && s != "0",
            FieldValue::Integer(n) => *n != 0,
            FieldValue::Float(n) => *n != 0.0,
            FieldValue::Bool(b) => *b,
            FieldValue::List(items) => !items.is_empty(),
        }
    }

    /// Returns the text content if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn append_form_pairs(&self, key: &str, out: &mut Vec<(String, String)>) {
        match self {
            FieldValue::Text(s) => out.push((key.to_string(), s.clone())),
            FieldValue::Integer(n) => out.push((key.to_string(), n.to_string())),
            FieldValue::Float(n) => out.push((key.to_string(), n.to_string())),
            FieldValue::Bool(b) => {
                let flag = if *b { "1" } else { "0" };
                out.push((key.to_string(), flag.to_string()));
            }
            // An empty list still sends its key.
            FieldValue::List(items) if items.is_empty() => {
                out.push((key.to_string(), String::new()));
            }
            FieldValue::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    for (sub_key, sub_value) in item.iter() {
                        let nested = format!("{}[{}][{}]", key, index, sub_key);
                        sub_value.append_form_pairs(&nested, out);
                    }
                }
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Text(value.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Vec<FieldMap>> for FieldValue {
    fn from(value: Vec<FieldMap>) -> Self {
        FieldValue::List(value)
    }
}

impl TryFrom<Value> for FieldValue {
    type Error = ClientError;

    /// Converts a decoded JSON value.
    ///
    /// Arrays must contain only objects (line items). `null` and bare
    /// objects have no form representation and are rejected.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(FieldValue::Text(s)),
            Value::Bool(b) => Ok(FieldValue::Bool(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(FieldValue::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(FieldValue::Float(f))
                } else {
                    Err(ClientError::InvalidField(format!(
                        "number {} is out of range",
                        n
                    )))
                }
            }
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(_) => FieldMap::try_from(item),
                    other => Err(ClientError::InvalidField(format!(
                        "list items must be objects, got {}",
                        other
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::List),
            Value::Null => Err(ClientError::InvalidField(
                "null has no form representation".to_string(),
            )),
            Value::Object(_) => Err(ClientError::InvalidField(
                "nested objects must be wrapped in a list".to_string(),
            )),
        }
    }
}

/// Ordered field mapping with last-write-wins insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `key`. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Inserts `value` only when `key` is `Some`.
    pub fn insert_opt<V: Into<FieldValue>>(&mut self, key: &str, value: Option<V>) {
        if let Some(v) = value {
            self.insert(key, v);
        }
    }

    /// Inserts `key` only if it is not present yet. Returns whether it was inserted.
    pub fn insert_if_absent(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, value.into()));
        true
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Applies every entry of `other` over `self`, in order.
    pub fn merge(&mut self, other: FieldMap) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Flattens the map into form pairs.
    ///
    /// List values expand to `key[index][field]` entries so that line-item
    /// data keeps its structure on the wire. An empty list is sent as `key=`.
    pub fn to_form_pairs(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            value.append_form_pairs(key, &mut out);
        }
        out
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl TryFrom<Value> for FieldMap {
    type Error = ClientError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(object) = value else {
            return Err(ClientError::InvalidField(
                "expected a JSON object of fields".to_string(),
            ));
        };

        let mut map = FieldMap::new();
        for (key, value) in object {
            if value.is_null() {
                continue;
            }
            let field = FieldValue::try_from(value).map_err(|e| {
                ClientError::InvalidField(format!("field '{}': {}", key, e))
            })?;
            map.insert(key, field);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut map = FieldMap::new();
        map.insert("a", "1");
        map.insert("b", "2");
        map.insert("a", "3");

        assert_eq!(map.len(), 2);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&FieldValue::Text("3".to_string())));
    }

    #[test]
    fn test_merge_last_writer_wins() {
        let mut base = FieldMap::new().with("state", 0).with("account_login", "alice");
        let options = FieldMap::new().with("state", 1).with("rem_code", "XYZ");
        base.merge(options);

        assert_eq!(base.get("state"), Some(&FieldValue::Integer(1)));
        assert_eq!(base.get("account_login").and_then(|v| v.as_str()), Some("alice"));
        assert!(base.contains_key("rem_code"));
    }

    #[test]
    fn test_truthiness() {
        assert!(FieldValue::from("1.2.3.4").is_truthy());
        assert!(FieldValue::from(true).is_truthy());
        assert!(FieldValue::from(7).is_truthy());
        assert!(!FieldValue::from("").is_truthy());
        assert!(!FieldValue::from("0").is_truthy());
        assert!(!FieldValue::from(0).is_truthy());
        assert!(!FieldValue::from(false).is_truthy());
        assert!(!FieldValue::from(Vec::<FieldMap>::new()).is_truthy());
    }

    #[test]
    fn test_form_pairs_flatten_line_items() {
        let items = vec![
            FieldMap::new().with("name", "book").with("price", 12.5),
            FieldMap::new().with("name", "pen").with("count", 3),
        ];
        let map = FieldMap::new()
            .with("event_id", "trade_professional_web")
            .with("items", items)
            .with("gift", false);

        let pairs = map.to_form_pairs();
        assert_eq!(
            pairs,
            vec![
                ("event_id".to_string(), "trade_professional_web".to_string()),
                ("items[0][name]".to_string(), "book".to_string()),
                ("items[0][price]".to_string(), "12.5".to_string()),
                ("items[1][name]".to_string(), "pen".to_string()),
                ("items[1][count]".to_string(), "3".to_string()),
                ("gift".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_list_keeps_key() {
        let map = FieldMap::new()
            .with("items", Vec::<FieldMap>::new())
            .with("items_count", 0);

        assert_eq!(
            map.to_form_pairs(),
            vec![
                ("items".to_string(), String::new()),
                ("items_count".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_json_object() {
        let map = FieldMap::try_from(json!({
            "account_login": "bob",
            "state": 1,
            "pay_amount": 99.9,
            "skipped": null,
            "items": [{"sku": "A1"}]
        }))
        .unwrap();

        assert_eq!(map.get("state"), Some(&FieldValue::Integer(1)));
        assert_eq!(map.get("pay_amount"), Some(&FieldValue::Float(99.9)));
        assert!(!map.contains_key("skipped"));
        match map.get("items") {
            Some(FieldValue::List(items)) => assert_eq!(items.len(), 1),
            other => panic!("unexpected items value: {:?}", other),
        }
    }

    #[test]
    fn test_from_json_rejects_scalar_list() {
        let result = FieldMap::try_from(json!({ "items": [1, 2] }));
        assert!(result.is_err());
        assert!(FieldMap::try_from(json!("not an object")).is_err());
    }
}
