//! Unit domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{PropertyId, UnitId};

/// Occupancy status cached on the unit row.
///
/// The lease ledger is the source of truth; this flag is flipped by the
/// ledger inside the same transaction that changes the assignments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UnitStatus {
    Vacant,
    Occupied,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub property_id: PropertyId,
    pub unit_number: String,
    pub status: UnitStatus,
    /// Nominal (advertised) monthly rent.
    pub monthly_rent: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUnit {
    pub property_id: PropertyId,
    pub unit_number: String,
    pub monthly_rent: Decimal,
}
