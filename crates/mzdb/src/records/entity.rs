use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::Record;

/// A database row kept as a plain JSON object so unknown fields survive edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRecord(Map<String, Value>);

impl EntityRecord {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn name(&self) -> &str {
        self.0.get("name").and_then(Value::as_str).unwrap_or("")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Overlays `fields` onto the record. `id` is identity and never merged.
    pub fn merge(&mut self, fields: &Map<String, Value>) {
        for (key, value) in fields {
            if key == "id" {
                continue;
            }
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl Record for EntityRecord {
    fn id(&self) -> Option<usize> {
        self.0
            .get("id")
            .and_then(Value::as_u64)
            .and_then(|id| usize::try_from(id).ok())
    }

    fn set_id(&mut self, id: usize) {
        self.0.insert("id".to_string(), Value::from(id));
    }

    fn is_blank(&self) -> bool {
        self.name().trim().is_empty()
    }

    // Older or hand-trimmed files omit template keys; a missing key is not authored data.
    fn matches_template(&self, template: &Self) -> bool {
        self.0.iter().filter(|(key, _)| key.as_str() != "id").all(|(key, value)| {
            template
                .0
                .get(key)
                .is_some_and(|expected| same_value(value, expected))
        })
    }
}

/// JSON equality that treats `0` and `0.0` as the same number.
fn same_value(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.as_f64() == right.as_f64(),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left.iter().zip(right).all(|(left, right)| same_value(left, right))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(key, value)| right.get(key).is_some_and(|other| same_value(value, other)))
        }
        _ => left == right,
    }
}
