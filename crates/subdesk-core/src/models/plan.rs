use super::lenient::{first_id, list_of, RawId};
use super::resource::Resource;
use super::status::SubscriptionStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription template in the vendor catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "RawPlan")]
pub struct Plan {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub features: serde_json::Value,
    pub resources: Vec<Resource>,
    pub status: Option<SubscriptionStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlan {
    id: Option<RawId>,
    plan_id: Option<RawId>,
    display_name: Option<String>,
    name: Option<String>,
    description: Option<String>,
    features: Option<serde_json::Value>,
    resources: Option<Vec<serde_json::Value>>,
    status: Option<SubscriptionStatus>,
}

impl TryFrom<RawPlan> for Plan {
    type Error = String;

    fn try_from(raw: RawPlan) -> Result<Self, Self::Error> {
        let id = first_id([raw.id, raw.plan_id]).ok_or_else(|| "plan has no id".to_string())?;

        Ok(Self {
            display_name: raw
                .display_name
                .or(raw.name)
                .unwrap_or_else(|| id.clone()),
            id,
            description: raw.description,
            features: raw.features.unwrap_or_else(|| serde_json::json!({})),
            resources: list_of(raw.resources),
            status: raw.status,
        })
    }
}

/// Body of the create-plan call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub environment_id: Uuid,
    pub display_name: String,
    pub description: String,
    pub features: serde_json::Value,
    pub status: i64,
    pub resources: Vec<Resource>,
}

impl CreatePlanRequest {
    /// New active plan granting `resources`, described after its display name.
    pub fn new(environment_id: Uuid, display_name: &str, resources: Vec<Resource>) -> Self {
        Self {
            environment_id,
            display_name: display_name.to_string(),
            description: format!("Subscription for {}", display_name),
            features: serde_json::json!({}),
            status: SubscriptionStatus::Active.code().unwrap_or(1),
            resources,
        }
    }
}

/// Body of the assign call linking a plan to a company.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPlanRequest {
    pub plan_id: String,
    pub company_id: Uuid,
    pub duration_days: u32,
}
