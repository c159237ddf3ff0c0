//! SurrealDB implementation of [`LeaseRepository`].
//!
//! Every mutation that can change which leases occupy a unit runs as one
//! transaction that first bumps the unit's `lock_version`. Two writers on
//! the same unit therefore touch the same row and the store rejects one of
//! them with a write conflict, while the overlap check inside the
//! transaction sees a consistent view of the unit's leases.

use chrono::{DateTime, NaiveDate, Utc};
use leasehold_core::error::LeaseholdResult;
use leasehold_core::models::ids::{LeaseId, PropertyId, TenantId, UnitId};
use leasehold_core::models::lease::{DateWindow, Lease, NewLease, Renewal, Termination};
use leasehold_core::money::from_cents;
use leasehold_core::repository::LeaseRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::codec::{
    OPEN_END, classify, date_from_db, date_to_db, next_id, opt_date_from_db, transaction_error,
};
use crate::error::DbError;

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct LeaseRowWithId {
    record_id: i64,
    tenant_id: i64,
    unit_id: i64,
    property_id: i64,
    move_in_date: String,
    move_out_date: Option<String>,
    monthly_rent_cents: i64,
    security_deposit_cents: Option<i64>,
    renewal_count: i64,
    renewed_at: Option<DateTime<Utc>>,
    notice_date: Option<String>,
    terminated_on: Option<String>,
    termination_reason: Option<String>,
    deposit_return_cents: Option<i64>,
    deposit_return_date: Option<String>,
    move_in_notes: Option<String>,
    move_out_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LeaseRowWithId {
    fn try_into_lease(self) -> Result<Lease, DbError> {
        let renewal_count = u32::try_from(self.renewal_count)
            .map_err(|_| DbError::Decode(format!("invalid renewal count {}", self.renewal_count)))?;
        Ok(Lease {
            id: LeaseId(self.record_id),
            tenant_id: TenantId(self.tenant_id),
            unit_id: UnitId(self.unit_id),
            property_id: PropertyId(self.property_id),
            move_in_date: date_from_db(&self.move_in_date)?,
            move_out_date: opt_date_from_db(self.move_out_date.as_deref())?,
            monthly_rent: from_cents(self.monthly_rent_cents),
            security_deposit: self.security_deposit_cents.map(from_cents),
            renewal_count,
            renewed_at: self.renewed_at,
            notice_date: opt_date_from_db(self.notice_date.as_deref())?,
            terminated_on: opt_date_from_db(self.terminated_on.as_deref())?,
            termination_reason: self.termination_reason,
            deposit_return_amount: self.deposit_return_cents.map(from_cents),
            deposit_return_date: opt_date_from_db(self.deposit_return_date.as_deref())?,
            move_in_notes: self.move_in_notes,
            move_out_notes: self.move_out_notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn into_leases(rows: Vec<LeaseRowWithId>) -> Result<Vec<Lease>, DbError> {
    rows.into_iter().map(LeaseRowWithId::try_into_lease).collect()
}

const ASSIGN_TX: &str = "\
BEGIN TRANSACTION;
UPDATE type::record('unit', $unit_id) SET lock_version += 1;
LET $overlapping = (
    SELECT VALUE meta::id(id) FROM lease
    WHERE unit_id = $unit_id
      AND move_in_date <= $window_end
      AND (move_out_date = NONE OR move_out_date >= $move_in_date)
      AND (move_out_date = NONE OR move_out_date >= move_in_date)
);
IF array::len($overlapping) > 0 {
    THROW 'leasehold_conflict: unit already has a lease overlapping the requested dates';
};
CREATE type::record('lease', $id) SET
    tenant_id = $tenant_id,
    unit_id = $unit_id,
    property_id = $property_id,
    move_in_date = $move_in_date,
    move_out_date = $move_out_date,
    monthly_rent_cents = $rent,
    security_deposit_cents = $deposit,
    move_in_notes = $notes;
UPDATE type::record('unit', $unit_id) SET status = 'Occupied', updated_at = time::now();
COMMIT TRANSACTION;
";

const TERMINATE_TX: &str = "\
BEGIN TRANSACTION;
UPDATE type::record('unit', $unit_id) SET lock_version += 1;
LET $closed = (
    UPDATE type::record('lease', $id) SET
        move_out_date = $effective_date,
        terminated_on = $effective_date,
        termination_reason = $reason,
        deposit_return_cents = $deposit_return,
        deposit_return_date = $deposit_return_date,
        move_out_notes = $notes,
        updated_at = time::now()
    WHERE property_id = $property_id AND terminated_on = NONE
    RETURN AFTER
);
IF array::len($closed) = 0 {
    THROW 'leasehold_conflict: lease is already terminated';
};
LET $still_active = (
    SELECT VALUE meta::id(id) FROM lease
    WHERE unit_id = $unit_id
      AND id != type::record('lease', $id)
      AND move_in_date <= $effective_date
      AND (move_out_date = NONE OR move_out_date >= $effective_date)
);
IF array::len($still_active) = 0 {
    UPDATE type::record('unit', $unit_id) SET status = 'Vacant', updated_at = time::now();
};
COMMIT TRANSACTION;
";

const RENEW_TX_HEAD: &str = "\
BEGIN TRANSACTION;
UPDATE type::record('unit', $unit_id) SET lock_version += 1;
LET $overlapping = (
    SELECT VALUE meta::id(id) FROM lease
    WHERE unit_id = $unit_id
      AND id != type::record('lease', $id)
      AND move_in_date <= $new_move_out_date
      AND (move_out_date = NONE OR move_out_date >= $move_in_date)
      AND (move_out_date = NONE OR move_out_date >= move_in_date)
);
IF array::len($overlapping) > 0 {
    THROW 'leasehold_conflict: renewal would overlap another lease on the unit';
};
";

const RENEW_TX_TAIL: &str = "\
IF array::len($renewed) = 0 {
    THROW 'leasehold_conflict: lease was terminated';
};
COMMIT TRANSACTION;
";

/// SurrealDB implementation of the Lease repository.
#[derive(Clone)]
pub struct SurrealLeaseRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealLeaseRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> LeaseRepository for SurrealLeaseRepository<C> {
    async fn create_exclusive(&self, input: NewLease) -> LeaseholdResult<Lease> {
        let id = next_id(&self.db, "lease").await?;
        let property_id = input.property_id;
        let window_end = input
            .move_out_date
            .map(date_to_db)
            .unwrap_or_else(|| OPEN_END.to_string());

        let mut response = self
            .db
            .query(ASSIGN_TX)
            .bind(("id", id))
            .bind(("tenant_id", input.tenant_id.get()))
            .bind(("unit_id", input.unit_id.get()))
            .bind(("property_id", property_id.get()))
            .bind(("move_in_date", date_to_db(input.move_in_date)))
            .bind(("move_out_date", input.move_out_date.map(date_to_db)))
            .bind(("window_end", window_end))
            .bind(("rent", input.monthly_rent_cents))
            .bind(("deposit", input.security_deposit_cents))
            .bind(("notes", input.move_in_notes))
            .await
            .map_err(DbError::from)?;

        let errors = response.take_errors();
        if !errors.is_empty() {
            return Err(transaction_error(errors.into_values()).into());
        }

        self.get_by_id(property_id, LeaseId(id)).await
    }

    async fn get_by_id(&self, property_id: PropertyId, id: LeaseId) -> LeaseholdResult<Lease> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('lease', $id) \
                 WHERE property_id = $property_id",
            )
            .bind(("id", id.get()))
            .bind(("property_id", property_id.get()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LeaseRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "lease".into(),
            id: id.to_string(),
        })?;

        Ok(row.try_into_lease()?)
    }

    async fn terminate(
        &self,
        property_id: PropertyId,
        lease: &Lease,
        termination: Termination,
    ) -> LeaseholdResult<Lease> {
        let effective_date = date_to_db(termination.effective_date);
        let deposit_return_date = termination
            .deposit_return_cents
            .map(|_| effective_date.clone());

        let mut response = self
            .db
            .query(TERMINATE_TX)
            .bind(("id", lease.id.get()))
            .bind(("unit_id", lease.unit_id.get()))
            .bind(("property_id", property_id.get()))
            .bind(("effective_date", effective_date))
            .bind(("reason", termination.reason))
            .bind(("deposit_return", termination.deposit_return_cents))
            .bind(("deposit_return_date", deposit_return_date))
            .bind(("notes", termination.move_out_notes))
            .await
            .map_err(DbError::from)?;

        let errors = response.take_errors();
        if !errors.is_empty() {
            return Err(transaction_error(errors.into_values()).into());
        }

        self.get_by_id(property_id, lease.id).await
    }

    async fn renew(
        &self,
        property_id: PropertyId,
        lease: &Lease,
        renewal: Renewal,
    ) -> LeaseholdResult<Lease> {
        let mut sets = vec!["move_out_date = $new_move_out_date"];
        if renewal.new_monthly_rent_cents.is_some() {
            sets.push("monthly_rent_cents = $rent");
        }
        sets.push("renewal_count += 1");
        sets.push("renewed_at = time::now()");
        sets.push("updated_at = time::now()");

        let query = format!(
            "{RENEW_TX_HEAD}\
             LET $renewed = (UPDATE type::record('lease', $id) SET {} \
             WHERE property_id = $property_id AND terminated_on = NONE \
             RETURN AFTER);\n\
             {RENEW_TX_TAIL}",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", lease.id.get()))
            .bind(("unit_id", lease.unit_id.get()))
            .bind(("property_id", property_id.get()))
            .bind(("move_in_date", date_to_db(renewal.move_in_date)))
            .bind(("new_move_out_date", date_to_db(renewal.new_move_out_date)));

        if let Some(rent) = renewal.new_monthly_rent_cents {
            builder = builder.bind(("rent", rent));
        }

        let mut response = builder.await.map_err(DbError::from)?;

        let errors = response.take_errors();
        if !errors.is_empty() {
            return Err(transaction_error(errors.into_values()).into());
        }

        self.get_by_id(property_id, lease.id).await
    }

    async fn record_notice(
        &self,
        property_id: PropertyId,
        id: LeaseId,
        notice_date: NaiveDate,
    ) -> LeaseholdResult<Lease> {
        let result = self
            .db
            .query(
                "UPDATE type::record('lease', $id) SET \
                 notice_date = $notice_date, updated_at = time::now() \
                 WHERE property_id = $property_id AND terminated_on = NONE \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id.get()))
            .bind(("property_id", property_id.get()))
            .bind(("notice_date", date_to_db(notice_date)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(classify)?;

        let rows: Vec<LeaseRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "lease".into(),
            id: id.to_string(),
        })?;

        Ok(row.try_into_lease()?)
    }

    async fn list_by_tenant(
        &self,
        property_id: PropertyId,
        tenant_id: TenantId,
    ) -> LeaseholdResult<Vec<Lease>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM lease \
                 WHERE property_id = $property_id AND tenant_id = $tenant_id \
                 ORDER BY move_in_date DESC, record_id DESC",
            )
            .bind(("property_id", property_id.get()))
            .bind(("tenant_id", tenant_id.get()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LeaseRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(into_leases(rows)?)
    }

    async fn list_overlapping(
        &self,
        property_id: PropertyId,
        window: DateWindow,
    ) -> LeaseholdResult<Vec<Lease>> {
        let window_end = window
            .end
            .map(date_to_db)
            .unwrap_or_else(|| OPEN_END.to_string());

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM lease \
                 WHERE unit_id IN (SELECT VALUE meta::id(id) FROM unit \
                                   WHERE property_id = $property_id) \
                 AND move_in_date <= $window_end \
                 AND (move_out_date = NONE OR move_out_date >= $window_start) \
                 AND (move_out_date = NONE OR move_out_date >= move_in_date) \
                 ORDER BY record_id ASC",
            )
            .bind(("property_id", property_id.get()))
            .bind(("window_start", date_to_db(window.start)))
            .bind(("window_end", window_end))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LeaseRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(into_leases(rows)?)
    }
}
