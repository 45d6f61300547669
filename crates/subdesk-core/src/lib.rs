//! Subdesk Core Library
//!
//! Domain models, vendor payload normalization, plan/subscription
//! reconciliation, validation, configuration and error types shared by the
//! API client, the CLI and the proxy.

pub mod company;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod validation;

// Re-export commonly used types
pub use company::{company_from_users, email_domain};
pub use config::{mask_api_key, ClientConfig, ProxyConfig, Settings};
pub use error::{AppError, ErrorMetadata, LogLevel, Result};
pub use models::{
    AssignPlanRequest, Company, CompanySubscription, CreatePlanRequest, Plan, Resource,
    ResourceMatch, ResourceType, SubscriptionStatus, User,
};
pub use reconcile::{reconcile, CompanyOverview, PlanAssignment};
pub use validation::{validate_email, ResourceGrant, SubscriptionDraft};
