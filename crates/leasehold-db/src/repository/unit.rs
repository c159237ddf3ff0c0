//! SurrealDB implementation of [`UnitRepository`].

use chrono::{DateTime, Utc};
use leasehold_core::error::LeaseholdResult;
use leasehold_core::models::ids::{PropertyId, UnitId};
use leasehold_core::models::unit::{CreateUnit, Unit, UnitStatus};
use leasehold_core::money::{from_cents, to_cents};
use leasehold_core::repository::UnitRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::codec::{classify, next_id};
use crate::error::DbError;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UnitRowWithId {
    record_id: i64,
    property_id: i64,
    unit_number: String,
    status: String,
    monthly_rent_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<UnitStatus, DbError> {
    match s {
        "Vacant" => Ok(UnitStatus::Vacant),
        "Occupied" => Ok(UnitStatus::Occupied),
        other => Err(DbError::Decode(format!("unknown unit status: {other}"))),
    }
}

impl UnitRowWithId {
    fn try_into_unit(self) -> Result<Unit, DbError> {
        Ok(Unit {
            id: UnitId(self.record_id),
            property_id: PropertyId(self.property_id),
            unit_number: self.unit_number,
            status: parse_status(&self.status)?,
            monthly_rent: from_cents(self.monthly_rent_cents),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Unit repository.
#[derive(Clone)]
pub struct SurrealUnitRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUnitRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UnitRepository for SurrealUnitRepository<C> {
    async fn create(&self, input: CreateUnit) -> LeaseholdResult<Unit> {
        let rent_cents = to_cents("monthly_rent", input.monthly_rent)?;
        let id = next_id(&self.db, "unit").await?;

        let result = self
            .db
            .query(
                "CREATE type::record('unit', $id) SET \
                 property_id = $property_id, unit_number = $unit_number, \
                 status = 'Vacant', monthly_rent_cents = $rent; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('unit', $id)",
            )
            .bind(("id", id))
            .bind(("property_id", input.property_id.get()))
            .bind(("unit_number", input.unit_number))
            .bind(("rent", rent_cents))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(classify)?;

        let rows: Vec<UnitRowWithId> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "unit".into(),
            id: id.to_string(),
        })?;

        Ok(row.try_into_unit()?)
    }

    async fn get_by_id(&self, property_id: PropertyId, id: UnitId) -> LeaseholdResult<Unit> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('unit', $id) \
                 WHERE property_id = $property_id",
            )
            .bind(("id", id.get()))
            .bind(("property_id", property_id.get()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UnitRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "unit".into(),
            id: id.to_string(),
        })?;

        Ok(row.try_into_unit()?)
    }

    async fn list_by_property(&self, property_id: PropertyId) -> LeaseholdResult<Vec<Unit>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM unit \
                 WHERE property_id = $property_id \
                 ORDER BY record_id ASC",
            )
            .bind(("property_id", property_id.get()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UnitRowWithId> = result.take(0).map_err(DbError::from)?;

        let units = rows
            .into_iter()
            .map(UnitRowWithId::try_into_unit)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(units)
    }
}
