//! Company discovery helpers
//!
//! The vendor has no company lookup by name. A company is found through any
//! user sharing the email domain, and named after that domain.

use crate::error::{AppError, Result};
use crate::models::{Company, User};
use uuid::Uuid;

/// Separators that end the company part of a display name ("Acme - Jane").
const DISPLAY_NAME_SEPARATORS: &[&str] = &[" - ", "|", "(", ":"];

/// Domain part of an email address, if any.
pub fn email_domain(email: &str) -> Option<&str> {
    email
        .split_once('@')
        .map(|(_, domain)| domain.trim())
        .filter(|domain| !domain.is_empty())
}

/// Company name derived from the first label of a domain (`acme.co.uk` -> `Acme`).
pub fn company_name_from_domain(domain: &str) -> String {
    let label = domain.split('.').next().unwrap_or_default();
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Company name taken from the prefix of a display name.
pub fn company_name_from_display_name(display_name: &str) -> Option<String> {
    let cut = DISPLAY_NAME_SEPARATORS
        .iter()
        .filter_map(|sep| display_name.find(sep))
        .min()?;
    let prefix = display_name[..cut].trim();
    (!prefix.is_empty()).then(|| prefix.to_string())
}

/// Resolve the company of `email` from user search results.
pub fn company_from_users(users: &[User], email: &str) -> Result<Company> {
    let user = users
        .iter()
        .find(|user| {
            user.company_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty())
        })
        .ok_or_else(|| AppError::NotFound("No company found. Try creating the user first.".to_string()))?;

    let raw_id = user.company_id.as_deref().unwrap_or_default().trim();
    let id = Uuid::parse_str(raw_id).map_err(|_| {
        AppError::Decode(format!("Company ID '{}' is not a valid UUID", raw_id))
    })?;

    let name = match email_domain(email) {
        Some(domain) => company_name_from_domain(domain),
        None => user
            .display_name
            .as_deref()
            .and_then(company_name_from_display_name)
            .unwrap_or_else(|| id.to_string()),
    };

    Ok(Company { id, name })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(company_id: Option<&str>) -> User {
        User {
            email: Some("someone@acme.com".to_string()),
            company_id: company_id.map(str::to_string),
            display_name: Some("Acme Marine - Someone".to_string()),
        }
    }

    #[test]
    fn domain_and_name() {
        assert_eq!(email_domain("jane@acme.co.uk"), Some("acme.co.uk"));
        assert_eq!(email_domain("jane"), None);
        assert_eq!(email_domain("jane@"), None);
        assert_eq!(company_name_from_domain("acme.co.uk"), "Acme");
        assert_eq!(company_name_from_domain("ümlaut.de"), "Ümlaut");
        assert_eq!(company_name_from_domain(""), "");
    }

    #[test]
    fn display_name_prefix() {
        assert_eq!(
            company_name_from_display_name("Acme Marine - Jane Doe"),
            Some("Acme Marine".to_string())
        );
        assert_eq!(
            company_name_from_display_name("Fleetco (Ops)"),
            Some("Fleetco".to_string())
        );
        assert_eq!(company_name_from_display_name("Jane Doe"), None);
        assert_eq!(company_name_from_display_name(" - Jane"), None);
    }

    #[test]
    fn first_user_with_company_wins() {
        let id = "0b7e7dc2-56c4-4a45-9b53-3b0f0c1f8a11";
        let users = vec![user(None), user(Some("")), user(Some(id))];
        let company = company_from_users(&users, "jane@acme.com").unwrap();
        assert_eq!(company.id.to_string(), id);
        assert_eq!(company.name, "Acme");
    }

    #[test]
    fn no_company_is_not_found() {
        let err = company_from_users(&[user(None)], "jane@acme.com").unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg.contains("creating the user")));
        assert!(company_from_users(&[], "jane@acme.com").is_err());
    }

    #[test]
    fn invalid_company_uuid_is_decode_error() {
        let err = company_from_users(&[user(Some("not-a-uuid"))], "jane@acme.com").unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[test]
    fn display_name_used_without_domain() {
        let id = "0b7e7dc2-56c4-4a45-9b53-3b0f0c1f8a11";
        let company = company_from_users(&[user(Some(id))], "no-domain").unwrap();
        assert_eq!(company.name, "Acme Marine");
    }
}
