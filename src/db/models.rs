use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Donation {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub composite_key: Option<String>,
    pub donated_at: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DonatedBack {
    pub id: String,
    pub organization_name: String,
    pub count: i64,
    pub items: String,
    pub type_of_items: ItemType,
    pub total: f64,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Material,
    Financial,
    Services,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Material => "Material",
            ItemType::Financial => "Financial",
            ItemType::Services => "Services",
        }
    }

    /// Lenient parse of user- or database-supplied category text.
    /// Unrecognized values fall back to `Material`.
    pub fn parse_lenient(value: &str) -> ItemType {
        match value.trim().to_lowercase().as_str() {
            "financial" => ItemType::Financial,
            "services" => ItemType::Services,
            _ => ItemType::Material,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DonationKey {
    pub id: String,
    pub unique_key: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub status: KeyStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Pending,
    Verified,
}

impl KeyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyStatus::Pending => "pending",
            KeyStatus::Verified => "verified",
        }
    }

    pub fn parse_lenient(value: &str) -> KeyStatus {
        match value.trim().to_lowercase().as_str() {
            "verified" => KeyStatus::Verified,
            _ => KeyStatus::Pending,
        }
    }
}
