//! # Case Normalization
//!
//! Repairs sloppy casing in a document before validation. Every object key
//! that matches a declared property case-insensitively is rewritten to the
//! schema's spelling, and every string that matches a member of its field's
//! `enum` case-insensitively is rewritten to that member. The walk descends
//! into nested objects and arrays wherever the schema declares
//! `"type": "object"` or `"type": "array"` with `items`.
//!
//! ## Guarantees
//!
//! - Key order of every object is preserved.
//! - No key is added or removed; values that are not enum strings are
//!   untouched.
//! - Idempotent: normalizing the output again yields the same output.
//!
//! Two input keys that resolve to the same canonical key (e.g. `model` and
//! `MODEL`) are rejected with [`NormalizeError::KeyCollision`] instead of
//! silently dropping one of them.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::conformance::pointer_segment;
use crate::node::{NodeType, Property, SchemaNode};

/// Errors raised while normalizing a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Two differently-cased keys in one object map to the same declared
    /// property.
    #[error("keys \"{first}\" and \"{second}\" in {} both resolve to \"{canonical}\"", display_path(.path))]
    KeyCollision {
        /// JSON Pointer to the object holding both keys.
        path: String,
        /// The declared property name both keys resolve to.
        canonical: String,
        /// The key seen first, in document order.
        first: String,
        /// The key seen second.
        second: String,
    },
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "(root)"
    } else {
        path
    }
}

/// Normalize the keys and enum values of `data` against `schema`.
///
/// # Errors
///
/// Returns [`NormalizeError::KeyCollision`] if two keys of the same object
/// resolve to one declared property.
pub fn normalize(
    data: &Map<String, Value>,
    schema: &SchemaNode,
) -> Result<Map<String, Value>, NormalizeError> {
    normalize_object(data, schema, "")
}

/// Like [`normalize`], but accepts any JSON value. Only objects are
/// rewritten; every other value is returned unchanged.
pub fn normalize_value(value: &Value, schema: &SchemaNode) -> Result<Value, NormalizeError> {
    match value {
        Value::Object(map) => normalize(map, schema).map(Value::Object),
        other => Ok(other.clone()),
    }
}

fn normalize_object(
    data: &Map<String, Value>,
    schema: &SchemaNode,
    path: &str,
) -> Result<Map<String, Value>, NormalizeError> {
    let mut out = Map::with_capacity(data.len());
    // canonical key -> input key that claimed it
    let mut claimed: HashMap<&str, &str> = HashMap::with_capacity(data.len());

    for (key, value) in data {
        let property = canonical_property(schema, key);
        let canonical = property.map_or(key.as_str(), |p| p.name());

        if let Some(first) = claimed.insert(canonical, key.as_str()) {
            return Err(NormalizeError::KeyCollision {
                path: path.to_string(),
                canonical: canonical.to_string(),
                first: first.to_string(),
                second: key.clone(),
            });
        }

        let child_path = format!("{path}/{}", pointer_segment(canonical));
        if canonical != key {
            tracing::debug!(path = %child_path, from = %key, "repaired key casing");
        }

        let value = match property {
            Some(p) => normalize_field(value, p.node(), &child_path)?,
            None => value.clone(),
        };
        out.insert(canonical.to_string(), value);
    }

    Ok(out)
}

fn normalize_field(value: &Value, def: &SchemaNode, path: &str) -> Result<Value, NormalizeError> {
    match (value, def.node_type()) {
        (Value::String(s), _) => {
            let repaired = def
                .enum_values()
                .and_then(|members| canonical_member(members, s));
            match repaired {
                Some(member) => {
                    if member != s {
                        tracing::debug!(path, from = %s, to = %member, "repaired enum casing");
                    }
                    Ok(Value::String(member.to_string()))
                }
                None => Ok(value.clone()),
            }
        }
        (Value::Object(map), NodeType::Object) => {
            normalize_object(map, def, path).map(Value::Object)
        }
        (Value::Array(elements), NodeType::Array) => match def.items() {
            Some(item_schema) => elements
                .iter()
                .enumerate()
                .map(|(i, element)| match element {
                    Value::Object(map) => {
                        normalize_object(map, item_schema, &format!("{path}/{i}"))
                            .map(Value::Object)
                    }
                    other => Ok(other.clone()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            None => Ok(value.clone()),
        },
        _ => Ok(value.clone()),
    }
}

/// Exact match first, then the first case-insensitive match in schema order.
fn canonical_property<'s>(schema: &'s SchemaNode, key: &str) -> Option<&'s Property> {
    let properties = schema.properties();
    properties
        .iter()
        .find(|p| p.name() == key)
        .or_else(|| properties.iter().find(|p| eq_fold(p.name(), key)))
}

fn canonical_member<'s>(members: &'s [String], value: &str) -> Option<&'s str> {
    members
        .iter()
        .find(|m| m.as_str() == value)
        .or_else(|| members.iter().find(|m| eq_fold(m, value)))
        .map(String::as_str)
}

fn eq_fold(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}
