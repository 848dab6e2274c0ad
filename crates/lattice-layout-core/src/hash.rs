//! Structural hashing of component attributes.
//!
//! The hash is a SHA-256 digest of the canonical JSON text of the attributes:
//! object keys are sorted recursively and output is compact, so two attribute
//! maps hash equal exactly when they hold the same values, whatever order the
//! keys were authored in.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::component::Attributes;

/// Hash a component's attributes, returned as lowercase hex.
pub fn attribute_hash(attributes: &Attributes) -> String {
    let canonical = Value::Object(canonical_map(attributes));
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn canonical_map(map: &Attributes) -> Attributes {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(key, value)| (key.clone(), canonical(value)))
        .collect()
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(canonical_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}
