//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use leasehold_core::error::LeaseholdResult;
use leasehold_core::models::ids::{PropertyId, TenantId};
use leasehold_core::models::tenant::{CreateTenant, Tenant};
use leasehold_core::repository::TenantRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::codec::{classify, next_id, uuid_from_db};
use crate::error::DbError;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: i64,
    user_id: String,
    property_id: Option<i64>,
    email: Option<String>,
    phone_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id: TenantId(self.record_id),
            user_id: uuid_from_db("user", &self.user_id)?,
            property_id: self.property_id.map(PropertyId),
            email: self.email,
            phone_number: self.phone_number,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Tenant registry.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> LeaseholdResult<Tenant> {
        let id = next_id(&self.db, "tenant").await?;

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 user_id = $user_id, property_id = $property_id, \
                 email = $email, phone_number = $phone_number; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('tenant', $id)",
            )
            .bind(("id", id))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("property_id", input.property_id.map(|p| p.get())))
            .bind(("email", input.email))
            .bind(("phone_number", input.phone_number))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(classify)?;

        let rows: Vec<TenantRowWithId> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn get_by_id(&self, id: TenantId) -> LeaseholdResult<Tenant> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('tenant', $id)",
            )
            .bind(("id", id.get()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn find_by_user(&self, user_id: Uuid) -> LeaseholdResult<Option<Tenant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE user_id = $user_id",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(TenantRowWithId::try_into_tenant)
            .transpose()?)
    }
}
