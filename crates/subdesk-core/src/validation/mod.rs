//! Validation modules

pub mod draft;
pub mod email;

pub use draft::{
    parse_features, ResourceGrant, SubscriptionDraft, DEFAULT_DURATION_DAYS, DEFAULT_FEATURES,
    DURATION_PRESETS,
};
pub use email::{validate_email, INVALID_EMAIL_MESSAGE};

/// First human-readable message of a validation failure, by field name.
pub fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field))
            })
        })
        .unwrap_or_else(|| "Validation failed".to_string())
}
