use super::lenient::{first_id, list_of, RawId};
use super::resource::Resource;
use super::status::SubscriptionStatus;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Assignment of a plan to a company for a bounded duration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "RawCompanySubscription")]
pub struct CompanySubscription {
    pub id: String,
    pub plan_id: String,
    pub company_id: Option<String>,
    pub environment_id: Option<String>,
    pub display_name: Option<String>,
    pub status: SubscriptionStatus,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub resources: Vec<Resource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompanySubscription {
    id: Option<RawId>,
    subscription_id: Option<RawId>,
    plan_id: Option<RawId>,
    plan: Option<serde_json::Value>,
    company_id: Option<RawId>,
    environment_id: Option<RawId>,
    display_name: Option<String>,
    status: Option<SubscriptionStatus>,
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
    resources: Option<Vec<serde_json::Value>>,
}

impl TryFrom<RawCompanySubscription> for CompanySubscription {
    type Error = String;

    fn try_from(raw: RawCompanySubscription) -> Result<Self, Self::Error> {
        let id = first_id([raw.id, raw.subscription_id])
            .ok_or_else(|| "subscription has no id".to_string())?;

        // Some responses embed the plan instead of referencing it.
        let embedded_plan = raw.plan.as_ref();
        let plan_id = first_id([raw.plan_id])
            .or_else(|| embedded_plan.and_then(|plan| crate::normalize::string_field(plan, "id")))
            .ok_or_else(|| format!("subscription {} has no planId", id))?;
        let display_name = raw.display_name.or_else(|| {
            embedded_plan.and_then(|plan| crate::normalize::string_field(plan, "displayName"))
        });

        Ok(Self {
            id,
            plan_id,
            company_id: first_id([raw.company_id]),
            environment_id: first_id([raw.environment_id]),
            display_name,
            status: raw
                .status
                .unwrap_or_else(|| SubscriptionStatus::Unknown("unspecified".to_string())),
            valid_from: raw.valid_from,
            valid_to: raw.valid_to,
            resources: list_of(raw.resources),
        })
    }
}

/// Fields a status write may echo back without the full subscription.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdate {
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
}

impl SubscriptionUpdate {
    /// Read whatever of status and validity `value` carries; unreadable
    /// bodies yield an empty update.
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

impl CompanySubscription {
    /// Overwrite the fields present in `update`.
    pub fn apply(&mut self, update: &SubscriptionUpdate) {
        if let Some(status) = &update.status {
            self.status = status.clone();
        }
        if update.valid_from.is_some() {
            self.valid_from = update.valid_from;
        }
        if update.valid_to.is_some() {
            self.valid_to = update.valid_to;
        }
    }

    /// Whole days left until `valid_to`; negative once expired, `None` when open-ended.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.valid_to.map(|valid_to| (valid_to - now).num_days())
    }

    /// Whether this subscription belongs to `company_id`. A subscription that
    /// does not report its company is assumed to belong to the queried one.
    pub fn belongs_to(&self, company_id: &str) -> bool {
        match &self.company_id {
            Some(own) => own.eq_ignore_ascii_case(company_id),
            None => true,
        }
    }

    /// Local stand-in for an assignment the server acknowledged without a body.
    pub fn assigned_placeholder(
        plan_id: &str,
        company_id: &str,
        duration_days: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("pending-{}", plan_id),
            plan_id: plan_id.to_string(),
            company_id: Some(company_id.to_string()),
            environment_id: None,
            display_name: None,
            status: SubscriptionStatus::Active,
            valid_from: Some(now),
            valid_to: Some(now + Duration::days(i64::from(duration_days))),
            resources: Vec::new(),
        }
    }
}
