//! Tenant domain model.
//!
//! A tenant is the renter profile of a user. The optional property
//! reference is a denormalized affiliation used for quick authorization
//! checks; leases remain the authoritative link to units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{PropertyId, TenantId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    /// The linked principal.
    pub user_id: Uuid,
    pub property_id: Option<PropertyId>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Whether this tenant may be placed in units of `property_id`.
    ///
    /// Tenants without a denormalized property are unaffiliated and may be
    /// assigned anywhere.
    pub fn belongs_to(&self, property_id: PropertyId) -> bool {
        self.property_id.is_none_or(|p| p == property_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub user_id: Uuid,
    pub property_id: Option<PropertyId>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}
