//! Domain methods for the vendor API client.
//!
//! Listings go through `subdesk_core::normalize` so every envelope the vendor
//! uses (`data`, `subscriptions`, bare arrays) decodes the same way.

use crate::{ApiClient, API_PREFIX};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use subdesk_core::company::{company_from_users, email_domain};
use subdesk_core::error::{AppError, Result};
use subdesk_core::models::{
    AssignPlanRequest, Company, CompanySubscription, CreatePlanRequest, Plan, ResourceMatch,
    ResourceType, SubscriptionStatus, SubscriptionUpdate, User,
};
use subdesk_core::normalize::{
    decode_list, extract_id, extract_item, extract_list, ASSET_LIST_KEYS, FLOW_LIST_KEYS,
    PLAN_LIST_KEYS, SUBSCRIPTION_LIST_KEYS, USER_LIST_KEYS,
};
use subdesk_core::reconcile::{reconcile, CompanyOverview};
use subdesk_core::validation::{validate_email, SubscriptionDraft};
use uuid::Uuid;

/// Pause between creating a user and looking up its company.
pub const ONBOARD_LOOKUP_DELAY: Duration = Duration::from_millis(500);

/// Shortest query sent to resource search.
pub const MIN_SEARCH_CHARS: usize = 2;

/// Status change requested for a company subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    Cancel,
    Activate,
}

impl SubscriptionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionAction::Cancel => "cancel",
            SubscriptionAction::Activate => "activate",
        }
    }

    /// Status the subscription is expected to have once the call succeeds.
    pub fn target_status(&self) -> SubscriptionStatus {
        match self {
            SubscriptionAction::Cancel => SubscriptionStatus::Archived,
            SubscriptionAction::Activate => SubscriptionStatus::Active,
        }
    }
}

/// Result of creating and assigning a subscription.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionOutcome {
    pub plan_id: String,
    pub company_id: Uuid,
    pub duration_days: u32,
    pub summary: String,
    /// Subscription echoed by the assign call, else a local placeholder.
    pub subscription: CompanySubscription,
}

/// A user created through onboarding and the company it resolved to.
#[derive(Debug, Clone, Serialize)]
pub struct Onboarding {
    pub email: String,
    pub company: Company,
}

impl ApiClient {
    fn plans_path(&self) -> String {
        format!(
            "{}/environment/{}/subscriptions",
            API_PREFIX,
            urlencoding::encode(self.workspace())
        )
    }

    /// Create a user placeholder for `email`.
    pub async fn create_user_placeholder(&self, email: &str) -> Result<Value> {
        let email = validate_email(email)?;
        let path = format!(
            "{}/user/userPlaceholder/{}",
            API_PREFIX,
            urlencoding::encode(&email)
        );

        let result = self
            .post_json(&path, &[("isGroup", "false".to_string())], &json!({}))
            .await?;
        tracing::info!(email = %email, "User placeholder created");
        Ok(result)
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        let data = self
            .get(
                &format!("{}/user/search", API_PREFIX),
                &[("searchString", query.to_string())],
            )
            .await?;
        Ok(decode_list(&data, USER_LIST_KEYS))
    }

    /// Find the company of `email` through any user on the same domain.
    pub async fn find_company(&self, email: &str) -> Result<Company> {
        let email = validate_email(email)?;
        let domain = email_domain(&email)
            .ok_or_else(|| AppError::InvalidInput("Please enter a valid email address".to_string()))?;

        let users = self.search_users(&format!("@{}", domain)).await?;
        tracing::debug!(domain = %domain, users = users.len(), "User search finished");

        company_from_users(&users, &email)
    }

    /// Create the user, give the vendor a moment, then resolve its company.
    pub async fn onboard_user(&self, email: &str) -> Result<Onboarding> {
        self.onboard_user_with_delay(email, ONBOARD_LOOKUP_DELAY).await
    }

    pub async fn onboard_user_with_delay(&self, email: &str, delay: Duration) -> Result<Onboarding> {
        let email = validate_email(email)?;
        self.create_user_placeholder(&email).await?;
        tokio::time::sleep(delay).await;
        let company = self.find_company(&email).await?;
        Ok(Onboarding { email, company })
    }

    async fn search_by_name(
        &self,
        endpoint: &str,
        name: &str,
        keys: &[&str],
        resource_type: ResourceType,
    ) -> Result<Vec<ResourceMatch>> {
        let data = self
            .get(
                &format!("{}/{}", API_PREFIX, endpoint),
                &[("name", name.to_string())],
            )
            .await?;

        Ok(extract_list(&data, keys)
            .iter()
            .filter_map(|item| ResourceMatch::from_value(item, resource_type))
            .collect())
    }

    pub async fn search_flows(&self, name: &str) -> Result<Vec<ResourceMatch>> {
        self.search_by_name("flows", name, FLOW_LIST_KEYS, ResourceType::Flow)
            .await
    }

    pub async fn search_assets(&self, name: &str) -> Result<Vec<ResourceMatch>> {
        self.search_by_name("assets", name, ASSET_LIST_KEYS, ResourceType::Asset)
            .await
    }

    /// Search flows and assets together. Short queries return nothing without
    /// calling the API, and a failing side contributes no matches.
    pub async fn search_resources(&self, query: &str) -> Vec<ResourceMatch> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_CHARS {
            return Vec::new();
        }

        let (flows, assets) =
            futures::future::join(self.search_flows(query), self.search_assets(query)).await;

        let mut matches = Vec::new();
        for (kind, result) in [("flows", flows), ("assets", assets)] {
            match result {
                Ok(found) => matches.extend(found),
                Err(e) => tracing::warn!(kind, error = %e, "Resource search failed"),
            }
        }
        matches
    }

    /// List the plan templates of the workspace.
    pub async fn list_plans(&self) -> Result<Vec<Plan>> {
        let data = self.get(&self.plans_path(), &[]).await?;
        Ok(decode_list(&data, PLAN_LIST_KEYS))
    }

    pub async fn get_plan(&self, plan_id: &str) -> Result<Plan> {
        let path = format!("{}/{}", self.plans_path(), urlencoding::encode(plan_id));
        let data = self.get(&path, &[]).await?;

        let item = extract_item(&data)
            .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", plan_id)))?;
        serde_json::from_value(item.clone()).map_err(AppError::from)
    }

    /// Create the plan described by `draft`. Returns the new plan id.
    pub async fn create_plan(&self, draft: &SubscriptionDraft) -> Result<String> {
        let body = CreatePlanRequest::new(
            self.environment_id(),
            &draft.display_name,
            draft.vendor_resources(),
        );

        let result = self
            .post_json(&format!("{}/environment/subscriptions", API_PREFIX), &[], &body)
            .await?;

        let plan_id = extract_id(&result)
            .ok_or_else(|| AppError::MissingId("Plan created but no ID returned".to_string()))?;
        tracing::info!(plan_id = %plan_id, name = %draft.display_name, "Plan created");
        Ok(plan_id)
    }

    /// Assign a plan to a company for `duration_days`.
    pub async fn assign_plan(
        &self,
        plan_id: &str,
        company_id: Uuid,
        duration_days: u32,
    ) -> Result<Value> {
        let body = AssignPlanRequest {
            plan_id: plan_id.to_string(),
            company_id,
            duration_days,
        };

        let result = self
            .post_json(&format!("{}/subscription/assign", API_PREFIX), &[], &body)
            .await?;
        tracing::info!(
            plan_id = %plan_id,
            company_id = %company_id,
            duration_days,
            "Plan assigned"
        );
        Ok(result)
    }

    /// Validate `draft`, create its plan and assign it to the company.
    pub async fn create_subscription(&self, draft: &SubscriptionDraft) -> Result<SubscriptionOutcome> {
        draft.check()?;

        let plan_id = self.create_plan(draft).await?;
        let assigned = match self
            .assign_plan(&plan_id, draft.company_id, draft.duration_days)
            .await
        {
            Ok(assigned) => assigned,
            Err(e) => {
                tracing::warn!(
                    plan_id = %plan_id,
                    company_id = %draft.company_id,
                    error = %e,
                    "Plan created but assignment failed"
                );
                return Err(AppError::PartialSubscription {
                    plan_id,
                    source: Box::new(e),
                });
            }
        };

        let subscription = extract_item(&assigned)
            .and_then(|item| serde_json::from_value::<CompanySubscription>(item.clone()).ok())
            .unwrap_or_else(|| {
                CompanySubscription::assigned_placeholder(
                    &plan_id,
                    &draft.company_id.to_string(),
                    draft.duration_days,
                    Utc::now(),
                )
            });

        Ok(SubscriptionOutcome {
            plan_id,
            company_id: draft.company_id,
            duration_days: draft.duration_days,
            summary: draft.summary(),
            subscription,
        })
    }

    pub async fn list_company_subscriptions(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<CompanySubscription>> {
        let path = format!("{}/subscription/company/{}", API_PREFIX, company_id);
        let data = self.get(&path, &[]).await?;
        Ok(decode_list(&data, SUBSCRIPTION_LIST_KEYS))
    }

    /// Cancel or activate a subscription.
    pub async fn change_subscription_status(
        &self,
        subscription_id: &str,
        action: SubscriptionAction,
    ) -> Result<Value> {
        let path = format!(
            "{}/subscription/{}/{}",
            API_PREFIX,
            urlencoding::encode(subscription_id),
            action.as_str()
        );

        let result = self.post_json(&path, &[], &json!({})).await?;
        tracing::info!(subscription_id = %subscription_id, action = action.as_str(), "Subscription updated");
        Ok(result)
    }

    pub async fn cancel_subscription(&self, subscription_id: &str) -> Result<Value> {
        self.change_subscription_status(subscription_id, SubscriptionAction::Cancel)
            .await
    }

    pub async fn activate_subscription(&self, subscription_id: &str) -> Result<Value> {
        self.change_subscription_status(subscription_id, SubscriptionAction::Activate)
            .await
    }

    /// Fetch plans and the company's subscriptions concurrently and join them.
    pub async fn company_overview(&self, company_id: Uuid) -> Result<CompanyOverview> {
        let (plans, subscriptions) = futures::future::try_join(
            self.list_plans(),
            self.list_company_subscriptions(company_id),
        )
        .await?;

        Ok(reconcile(plans, subscriptions, &company_id.to_string()))
    }

    /// Change a subscription's status and return the company overview with
    /// the write applied, whether or not the listing reflects it yet.
    ///
    /// A full subscription in the response replaces the listed one. A partial
    /// body updates the fields it carries, and the expected status fills in
    /// when the server sends none or no body at all.
    pub async fn change_status_with_overview(
        &self,
        subscription_id: &str,
        action: SubscriptionAction,
        company_id: Uuid,
    ) -> Result<CompanyOverview> {
        let result = self
            .change_subscription_status(subscription_id, action)
            .await?;

        let mut overview = self.company_overview(company_id).await?;

        let listed = match extract_item(&result) {
            None => overview.set_status(subscription_id, action.target_status()),
            Some(item) => match serde_json::from_value::<CompanySubscription>(item.clone()) {
                Ok(sub) => {
                    overview.merge_subscription(sub);
                    true
                }
                Err(_) => {
                    let mut update = SubscriptionUpdate::from_value(item);
                    if update.status.is_none() {
                        update.status = Some(action.target_status());
                    }
                    overview.apply_update(subscription_id, &update)
                }
            },
        };

        if !listed {
            tracing::warn!(
                subscription_id = %subscription_id,
                "Updated subscription is not listed for this company"
            );
        }
        Ok(overview)
    }
}
