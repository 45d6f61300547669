//! Response normalization
//!
//! The vendor API wraps collections inconsistently: a bare array, an object
//! with the list under `data`, or under an endpoint-specific key such as
//! `subscriptions`. Every list endpoint goes through `extract_list` so callers
//! see one shape.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Envelope keys tried for plan listings.
pub const PLAN_LIST_KEYS: &[&str] = &["data", "subscriptions", "plans"];

/// Envelope keys tried for company subscription listings.
pub const SUBSCRIPTION_LIST_KEYS: &[&str] = &["data", "subscriptions", "companySubscriptions"];

/// Envelope keys tried for user search.
pub const USER_LIST_KEYS: &[&str] = &["data", "users"];

/// Envelope keys tried for flow search.
pub const FLOW_LIST_KEYS: &[&str] = &["data", "flows"];

/// Envelope keys tried for asset search.
pub const ASSET_LIST_KEYS: &[&str] = &["data", "assets"];

/// Pull the list of items out of a response body.
///
/// - arrays are returned as is;
/// - objects yield the first of `keys` holding an array, or a single item when
///   that key holds an object;
/// - any other object with a field besides the envelope keys is treated as
///   the single item;
/// - `null`, scalars, empty objects and objects holding only empty envelope
///   keys yield nothing.
pub fn extract_list(value: &Value, keys: &[&str]) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => {
            for key in keys {
                match map.get(*key) {
                    Some(Value::Array(items)) => return items.clone(),
                    Some(item @ Value::Object(_)) => return vec![item.clone()],
                    _ => continue,
                }
            }
            if map.keys().all(|key| keys.contains(&key.as_str())) {
                Vec::new()
            } else {
                vec![value.clone()]
            }
        }
        _ => Vec::new(),
    }
}

/// Unwrap a single-entity response that may be wrapped in `data`.
pub fn extract_item(value: &Value) -> Option<&Value> {
    match value.get("data") {
        Some(inner @ Value::Object(_)) => Some(inner),
        _ if value.as_object().is_some_and(|map| !map.is_empty()) => Some(value),
        _ => None,
    }
}

/// Identifier of a created entity: `id`, then `planId`, then `data.id`.
pub fn extract_id(value: &Value) -> Option<String> {
    string_field(value, "id")
        .or_else(|| string_field(value, "planId"))
        .or_else(|| value.get("data").and_then(|data| string_field(data, "id")))
}

/// Read `key` as a non-empty string, stringifying numeric values.
pub fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Human-readable error text carried by an error body.
pub fn message_from_body(value: &Value) -> Option<String> {
    ["message", "error", "title"]
        .iter()
        .find_map(|key| string_field(value, key))
}

/// Decode every item of a normalized list, skipping items that do not fit `T`.
pub fn decode_list<T: DeserializeOwned>(value: &Value, keys: &[&str]) -> Vec<T> {
    extract_list(value, keys)
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    item_type = std::any::type_name::<T>(),
                    "Skipping item that does not match the expected shape"
                );
                None
            }
        })
        .collect()
}
