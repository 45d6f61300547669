use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Lifecycle status shared by plans and company subscriptions.
///
/// The vendor API reports status either as a label (`"Active"`) or as a
/// numeric code (`1`). Both forms decode; serialization always uses the label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Archived,
    Expired,
    Unknown(String),
}

impl SubscriptionStatus {
    /// Numeric code the vendor API expects in write bodies.
    pub fn code(&self) -> Option<i64> {
        match self {
            SubscriptionStatus::Active => Some(1),
            SubscriptionStatus::Archived => Some(2),
            SubscriptionStatus::Expired => Some(3),
            SubscriptionStatus::Unknown(_) => None,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => SubscriptionStatus::Active,
            2 => SubscriptionStatus::Archived,
            3 => SubscriptionStatus::Expired,
            other => SubscriptionStatus::Unknown(other.to_string()),
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "active" => SubscriptionStatus::Active,
            "archived" | "cancelled" | "canceled" => SubscriptionStatus::Archived,
            "expired" => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Unknown(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Archived => "Archived",
            SubscriptionStatus::Expired => "Expired",
            SubscriptionStatus::Unknown(label) => label.as_str(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubscriptionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStatus {
    Code(i64),
    Label(String),
}

impl<'de> Deserialize<'de> for SubscriptionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawStatus::deserialize(deserializer)? {
            RawStatus::Code(code) => SubscriptionStatus::from_code(code),
            RawStatus::Label(label) => SubscriptionStatus::from_label(&label),
        })
    }
}
