//! Property domain model.
//!
//! A property is a managed building or listing owned by exactly one
//! manager principal. Every tenant-scoped record hangs off a property.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::PropertyId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropertyStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    /// User id of the owning manager.
    pub owner_id: Uuid,
    pub name: String,
    /// Unique portal label used to map a request origin (e.g. the `pat`
    /// in `pat.localhost`) to this property. Stored normalized.
    pub portal_label: Option<String>,
    pub status: PropertyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProperty {
    pub owner_id: Uuid,
    pub name: String,
    /// Normalized with [`normalize_label`] before storage.
    pub portal_label: Option<String>,
}

/// Normalize an origin label or property name for comparison.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_label("  Sunset-Towers "), "sunset-towers");
    }
}
