//! Lease (tenant-unit assignment) domain model.
//!
//! A lease binds a tenant to a unit over an inclusive date range. An
//! unset move-out date means the lease is open-ended. Whether a lease is
//! active on a given day is decided by one predicate,
//! [`DateWindow::contains`], and nothing else: there is no stored
//! "is active" flag.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{LeaseId, PropertyId, TenantId, UnitId};

/// Average month length used for duration rounding.
const DAYS_PER_MONTH: f64 = 30.44;

// ---------------------------------------------------------------------------
// Date windows
// ---------------------------------------------------------------------------

/// An inclusive date range; `end == None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// A single-day window, used for "as of" queries.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: Some(date),
        }
    }

    /// The calendar month `year-month`, or `None` for an invalid month.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start,
            end: next.pred_opt(),
        })
    }

    /// `start <= date` and (`end` unset or `end >= date`).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && self.end.is_none_or(|end| end >= date)
    }

    /// True when the window ends before it starts, as a lease cancelled
    /// before move-in does. An empty window overlaps nothing.
    pub fn is_empty(&self) -> bool {
        self.end.is_some_and(|end| end < self.start)
    }

    /// Inclusive overlap of two windows.
    pub fn overlaps(&self, other: &DateWindow) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let starts_before_other_ends = other.end.is_none_or(|end| self.start <= end);
        let ends_after_other_starts = self.end.is_none_or(|end| end >= other.start);
        starts_before_other_ends && ends_after_other_starts
    }
}

/// Step a `(year, month)` pair back by `months` calendar months.
pub fn months_back(year: i32, month: u32, months: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - months as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// The `(year, month)` a date falls in.
pub fn month_of(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

// ---------------------------------------------------------------------------
// Lease
// ---------------------------------------------------------------------------

/// Lifecycle state of a lease on a given day.
///
/// `Renewed` is transient: a renewal moves the lease through it straight
/// back to `Active`, which is recorded in [`Lease::renewal_count`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LeaseState {
    Prospective,
    Active,
    Terminated,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub id: LeaseId,
    pub tenant_id: TenantId,
    pub unit_id: UnitId,
    /// Denormalized from the unit at assignment time.
    pub property_id: PropertyId,
    pub move_in_date: NaiveDate,
    pub move_out_date: Option<NaiveDate>,
    pub monthly_rent: Decimal,
    pub security_deposit: Option<Decimal>,
    pub renewal_count: u32,
    pub renewed_at: Option<DateTime<Utc>>,
    pub notice_date: Option<NaiveDate>,
    pub terminated_on: Option<NaiveDate>,
    pub termination_reason: Option<String>,
    pub deposit_return_amount: Option<Decimal>,
    pub deposit_return_date: Option<NaiveDate>,
    pub move_in_notes: Option<String>,
    pub move_out_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lease {
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.move_in_date, self.move_out_date)
    }

    pub fn is_active(&self, as_of: NaiveDate) -> bool {
        self.window().contains(as_of)
    }

    /// Whether the lease counts toward the window (e.g. a reporting month).
    pub fn overlaps(&self, window: &DateWindow) -> bool {
        self.window().overlaps(window)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated_on.is_some()
    }

    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.move_out_date.is_some_and(|end| end < as_of)
    }

    /// Days from `as_of` until the move-out date (negative once past),
    /// `None` for open-ended leases.
    pub fn days_until_expiry(&self, as_of: NaiveDate) -> Option<i64> {
        self.move_out_date.map(|end| (end - as_of).num_days())
    }

    /// Lease length in whole months, `None` for open-ended leases.
    pub fn duration_months(&self) -> Option<i64> {
        self.move_out_date.map(|end| {
            let days = (end - self.move_in_date).num_days() as f64;
            (days / DAYS_PER_MONTH).round() as i64
        })
    }

    pub fn state(&self, as_of: NaiveDate) -> LeaseState {
        if self.is_active(as_of) {
            LeaseState::Active
        } else if self.is_terminated() {
            LeaseState::Terminated
        } else if as_of < self.move_in_date {
            LeaseState::Prospective
        } else {
            LeaseState::Expired
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Request to assign a unit to a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignLease {
    pub tenant_id: TenantId,
    pub unit_id: UnitId,
    pub move_in_date: NaiveDate,
    pub move_out_date: Option<NaiveDate>,
    pub monthly_rent: Decimal,
    pub security_deposit: Option<Decimal>,
    pub move_in_notes: Option<String>,
}

impl AssignLease {
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.move_in_date, self.move_out_date)
    }
}

/// Fully validated lease row handed to the repository. The property id
/// is always the unit's property.
#[derive(Debug, Clone)]
pub struct NewLease {
    pub tenant_id: TenantId,
    pub unit_id: UnitId,
    pub property_id: PropertyId,
    pub move_in_date: NaiveDate,
    pub move_out_date: Option<NaiveDate>,
    pub monthly_rent_cents: i64,
    pub security_deposit_cents: Option<i64>,
    pub move_in_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerminateLease {
    pub reason: Option<String>,
    /// Defaults to today.
    pub effective_date: Option<NaiveDate>,
    pub deposit_return_amount: Option<Decimal>,
    pub move_out_notes: Option<String>,
}

/// Validated termination handed to the repository.
#[derive(Debug, Clone)]
pub struct Termination {
    pub effective_date: NaiveDate,
    pub reason: Option<String>,
    pub deposit_return_cents: Option<i64>,
    pub move_out_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewLease {
    pub new_move_out_date: NaiveDate,
    pub new_monthly_rent: Option<Decimal>,
}

/// Validated renewal handed to the repository.
#[derive(Debug, Clone)]
pub struct Renewal {
    pub move_in_date: NaiveDate,
    pub new_move_out_date: NaiveDate,
    pub new_monthly_rent_cents: Option<i64>,
}
