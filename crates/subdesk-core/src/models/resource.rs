use super::lenient::{first_id, RawId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of vendor entity a subscription can grant access to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Flow,
    Asset,
    Layout,
    #[serde(other)]
    Unknown,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Flow => "Flow",
            ResourceType::Asset => "Asset",
            ResourceType::Layout => "Layout",
            ResourceType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flow" => Ok(ResourceType::Flow),
            "asset" => Ok(ResourceType::Asset),
            "layout" => Ok(ResourceType::Layout),
            other => Err(format!(
                "Unknown resource type '{}'. Must be: Flow, Asset, or Layout",
                other
            )),
        }
    }
}

/// A resource grant inside a plan or subscription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "RawResource")]
pub struct Resource {
    pub origin_id: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub features: Vec<String>,
}

/// Wire shape of a resource; the vendor spells the id several ways.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResource {
    origin_id: Option<RawId>,
    resource_id: Option<RawId>,
    id: Option<RawId>,
    #[serde(rename = "type")]
    resource_type: Option<ResourceType>,
    features: Option<Vec<String>>,
}

impl TryFrom<RawResource> for Resource {
    type Error = String;

    fn try_from(raw: RawResource) -> Result<Self, Self::Error> {
        let origin_id = first_id([raw.origin_id, raw.resource_id, raw.id])
            .ok_or_else(|| "resource has no originId".to_string())?;

        Ok(Self {
            origin_id,
            resource_type: raw.resource_type.unwrap_or(ResourceType::Unknown),
            features: raw.features.unwrap_or_default(),
        })
    }
}

/// A flow or asset returned by resource search.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResourceMatch {
    pub id: String,
    pub name: String,
    pub resource_type: ResourceType,
}

impl ResourceMatch {
    /// Build a match from a raw search item; id comes from `resourceId`, `id`
    /// or `originId`, name from `name` or `displayName`.
    pub fn from_value(item: &serde_json::Value, resource_type: ResourceType) -> Option<Self> {
        let id = ["resourceId", "id", "originId"]
            .iter()
            .find_map(|key| crate::normalize::string_field(item, key))?;

        let name = ["name", "displayName"]
            .iter()
            .find_map(|key| crate::normalize::string_field(item, key))
            .unwrap_or_else(|| "Unnamed".to_string());

        Some(Self {
            id,
            name,
            resource_type,
        })
    }
}
