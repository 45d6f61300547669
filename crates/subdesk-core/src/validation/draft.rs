//! Subscription drafts
//!
//! A draft is everything needed to create a plan and assign it to a company
//! in one go. Messages mirror what the operator sees for each missing piece.

use crate::error::{AppError, Result};
use crate::models::{Resource, ResourceType};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

/// Duration choices offered for new subscriptions, in days.
pub const DURATION_PRESETS: &[u32] = &[30, 90, 180, 365];

pub const DEFAULT_DURATION_DAYS: u32 = 365;

/// Permissions granted when none are given.
pub const DEFAULT_FEATURES: &str = "View, Start";

/// Split a comma separated permission list, dropping blanks.
pub fn parse_features(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// One flow/asset grant of a draft.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Validate)]
pub struct ResourceGrant {
    pub resource_type: ResourceType,
    #[validate(length(min = 1, message = "Please search and select all flows/assets"))]
    pub origin_id: String,
    #[validate(length(min = 1, message = "Each resource needs at least one permission"))]
    pub features: Vec<String>,
}

impl ResourceGrant {
    pub fn new(resource_type: ResourceType, origin_id: &str, features: &str) -> Self {
        Self {
            resource_type,
            origin_id: origin_id.trim().to_string(),
            features: parse_features(features),
        }
    }

    /// Parse `Type:originId[:features]`, e.g. `Flow:3f2a...:View,Start`.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut parts = spec.splitn(3, ':');
        let resource_type = parts
            .next()
            .unwrap_or_default()
            .parse::<ResourceType>()
            .map_err(AppError::InvalidInput)?;
        let origin_id = parts.next().unwrap_or_default();
        let features = parts.next().unwrap_or(DEFAULT_FEATURES);

        Ok(Self::new(resource_type, origin_id, features))
    }
}

impl From<&ResourceGrant> for Resource {
    fn from(grant: &ResourceGrant) -> Self {
        Resource {
            origin_id: grant.origin_id.clone(),
            resource_type: grant.resource_type,
            features: grant.features.clone(),
        }
    }
}

/// Plan-and-assign request for one company.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct SubscriptionDraft {
    pub company_id: Uuid,
    #[validate(length(min = 1, message = "Please fill in all required fields"))]
    pub display_name: String,
    #[validate(range(min = 1, message = "Duration must be at least one day"))]
    pub duration_days: u32,
    #[validate(length(min = 1, message = "Please add at least one resource (flow or asset)"))]
    pub resources: Vec<ResourceGrant>,
}

impl SubscriptionDraft {
    pub fn new(
        company_id: Uuid,
        display_name: &str,
        duration_days: u32,
        resources: Vec<ResourceGrant>,
    ) -> Self {
        Self {
            company_id,
            display_name: display_name.trim().to_string(),
            duration_days,
            resources,
        }
    }

    /// Validate the draft and every grant in it.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        for grant in &self.resources {
            grant.validate()?;
        }
        Ok(())
    }

    pub fn vendor_resources(&self) -> Vec<Resource> {
        self.resources.iter().map(Resource::from).collect()
    }

    /// Confirmation line shown once the subscription exists.
    pub fn summary(&self) -> String {
        let count = self.resources.len();
        format!(
            "{} can now access {} resource{} for {} days.",
            self.display_name,
            count,
            if count == 1 { "" } else { "s" },
            self.duration_days
        )
    }
}
