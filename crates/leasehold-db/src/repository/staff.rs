//! SurrealDB implementation of [`StaffRepository`].
//!
//! Bindings are keyed by the staff user's id, so a user has at most one.

use chrono::{DateTime, Utc};
use leasehold_core::error::LeaseholdResult;
use leasehold_core::models::ids::PropertyId;
use leasehold_core::models::staff::StaffBinding;
use leasehold_core::repository::StaffRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::codec::classify;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct StaffBindingRow {
    property_id: i64,
    created_at: DateTime<Utc>,
}

impl StaffBindingRow {
    fn into_binding(self, user_id: Uuid) -> StaffBinding {
        StaffBinding {
            user_id,
            property_id: PropertyId(self.property_id),
            created_at: self.created_at,
        }
    }
}

#[derive(Clone)]
pub struct SurrealStaffRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStaffRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> StaffRepository for SurrealStaffRepository<C> {
    async fn bind(&self, user_id: Uuid, property_id: PropertyId) -> LeaseholdResult<StaffBinding> {
        let result = self
            .db
            .query(
                "UPSERT type::record('staff_binding', $user_id) SET \
                 property_id = $property_id, created_at = time::now()",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("property_id", property_id.get()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(classify)?;

        let rows: Vec<StaffBindingRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "staff_binding".into(),
            id: user_id.to_string(),
        })?;

        Ok(row.into_binding(user_id))
    }

    async fn find_by_user(&self, user_id: Uuid) -> LeaseholdResult<Option<StaffBinding>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('staff_binding', $user_id)")
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StaffBindingRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(|row| row.into_binding(user_id)))
    }
}
