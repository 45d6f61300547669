//! Null- and type-tolerant pieces shared by the `Raw*` wire shapes.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Identifier sent either as a string or as a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    fn into_id(self) -> Option<String> {
        match self {
            RawId::Text(s) if !s.trim().is_empty() => Some(s),
            RawId::Text(_) => None,
            RawId::Number(n) => Some(n.to_string()),
        }
    }
}

/// First usable identifier among the candidates, in order.
pub(crate) fn first_id<I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<RawId>>,
{
    candidates.into_iter().flatten().find_map(RawId::into_id)
}

/// Decode a list that may be missing or null, skipping entries that do not fit `T`.
pub(crate) fn list_of<T: DeserializeOwned>(items: Option<Vec<Value>>) -> Vec<T> {
    items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}
