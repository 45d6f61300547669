use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vendor user record as returned by user search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Company a user belongs to. The name follows a naming convention and is
/// not authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
}
