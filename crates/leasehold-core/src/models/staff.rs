//! Staff-to-property binding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::PropertyId;

/// Scopes a staff user to a single property. Staff without a binding are
/// unscoped and only ever receive read-only access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffBinding {
    pub user_id: Uuid,
    pub property_id: PropertyId,
    pub created_at: DateTime<Utc>,
}
