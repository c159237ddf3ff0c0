//! SurrealDB implementation of [`PropertyRepository`].

use chrono::{DateTime, Utc};
use leasehold_core::error::{LeaseholdError, LeaseholdResult};
use leasehold_core::models::ids::PropertyId;
use leasehold_core::models::property::{CreateProperty, Property, PropertyStatus, normalize_label};
use leasehold_core::repository::PropertyRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::codec::{next_id, transaction_error, uuid_from_db};
use crate::error::DbError;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PropertyRowWithId {
    record_id: i64,
    owner_id: String,
    name: String,
    portal_label: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<PropertyStatus, DbError> {
    match s {
        "Active" => Ok(PropertyStatus::Active),
        "Inactive" => Ok(PropertyStatus::Inactive),
        other => Err(DbError::Decode(format!("unknown property status: {other}"))),
    }
}

impl PropertyRowWithId {
    fn try_into_property(self) -> Result<Property, DbError> {
        Ok(Property {
            id: PropertyId(self.record_id),
            owner_id: uuid_from_db("owner", &self.owner_id)?,
            name: self.name,
            portal_label: self.portal_label,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_PROPERTY: &str = "SELECT meta::id(id) AS record_id, * FROM property";

/// Creates the label reservation and the property together so a label can
/// never point at a missing property or be claimed twice.
const CREATE_PROPERTY_TX: &str = "\
BEGIN TRANSACTION;
IF $portal_label != NONE {
    IF record::exists(type::record('portal_label', $portal_label)) {
        THROW 'leasehold_conflict: portal label is already taken';
    };
    CREATE type::record('portal_label', $portal_label) SET property_id = $id;
};
CREATE type::record('property', $id) SET
    owner_id = $owner_id,
    name = $name,
    name_normalized = $name_normalized,
    portal_label = $portal_label,
    status = 'Active';
COMMIT TRANSACTION;
";

/// SurrealDB implementation of the Property registry.
#[derive(Clone)]
pub struct SurrealPropertyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPropertyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn select(
        &self,
        filter: &str,
        binding: (&'static str, String),
    ) -> Result<Vec<Property>, DbError> {
        let query = format!("{SELECT_PROPERTY} WHERE {filter} ORDER BY record_id ASC");
        let mut result = self
            .db
            .query(&query)
            .bind(binding)
            .await?;

        let rows: Vec<PropertyRowWithId> = result.take(0)?;
        rows.into_iter()
            .map(PropertyRowWithId::try_into_property)
            .collect()
    }
}

impl<C: Connection> PropertyRepository for SurrealPropertyRepository<C> {
    async fn create(&self, input: CreateProperty) -> LeaseholdResult<Property> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(LeaseholdError::validation(
                "property name must not be empty",
            ));
        }
        let portal_label = input
            .portal_label
            .as_deref()
            .map(normalize_label)
            .filter(|label| !label.is_empty());

        let id = next_id(&self.db, "property").await?;

        let mut response = self
            .db
            .query(CREATE_PROPERTY_TX)
            .bind(("id", id))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("name_normalized", normalize_label(&name)))
            .bind(("name", name))
            .bind(("portal_label", portal_label))
            .await
            .map_err(DbError::from)?;

        let errors = response.take_errors();
        if !errors.is_empty() {
            return Err(transaction_error(errors.into_values()).into());
        }

        self.get_by_id(PropertyId(id)).await
    }

    async fn get_by_id(&self, id: PropertyId) -> LeaseholdResult<Property> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('property', $id)",
            )
            .bind(("id", id.get()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PropertyRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "property".into(),
            id: id.to_string(),
        })?;

        Ok(row.try_into_property()?)
    }

    async fn find_by_portal_label(&self, label: &str) -> LeaseholdResult<Option<Property>> {
        let label = normalize_label(label);
        if label.is_empty() {
            return Ok(None);
        }

        let mut result = self
            .db
            .query("SELECT VALUE property_id FROM type::record('portal_label', $label)")
            .bind(("label", label))
            .await
            .map_err(DbError::from)?;

        let ids: Vec<i64> = result.take(0).map_err(DbError::from)?;
        match ids.first() {
            Some(&id) => Ok(Some(self.get_by_id(PropertyId(id)).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_normalized_name(&self, name: &str) -> LeaseholdResult<Vec<Property>> {
        Ok(self
            .select("name_normalized = $name", ("name", normalize_label(name)))
            .await?)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> LeaseholdResult<Vec<Property>> {
        Ok(self
            .select("owner_id = $owner_id", ("owner_id", owner_id.to_string()))
            .await?)
    }
}
