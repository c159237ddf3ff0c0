//! Occupancy and revenue figures for an authorized property.
//!
//! A lease counts toward a window when it overlaps it: for a single day
//! that is exactly "active on that day", for a month it is "move-in no
//! later than the month's end and move-out, if any, no earlier than its
//! start".
//!
//! Each store sub-query is retried once on a transient failure. If it
//! still fails the figures it feeds are reported as zero and the
//! sub-query's name is listed in `degraded`; non-transient failures are
//! returned as errors.
//!
//! Figures include property-wide revenue, so tenant principals are
//! refused even though the guard grants them read access.

use std::collections::HashSet;

use chrono::NaiveDate;
use leasehold_auth::guard::RequestContext;
use leasehold_core::error::{LeaseholdError, LeaseholdResult};
use leasehold_core::models::ids::PropertyId;
use leasehold_core::models::lease::{DateWindow, Lease, months_back};
use leasehold_core::models::principal::Principal;
use leasehold_core::repository::{LeaseRepository, UnitRepository};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

/// Longest trend a caller may ask for, in months.
const MAX_TREND_MONTHS: u32 = 120;

const UNITS_QUERY: &str = "total_units";
const LEASES_QUERY: &str = "leases";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancyFigures {
    pub total_units: u64,
    pub occupied_units: u64,
    pub available_units: u64,
    /// Percentage, rounded to two decimal places.
    pub occupancy_rate: Decimal,
    pub total_revenue: Decimal,
    pub distinct_tenant_count: u64,
}

/// Figures as of one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancySummary {
    pub property_id: PropertyId,
    pub as_of: NaiveDate,
    #[serde(flatten)]
    pub figures: OccupancyFigures,
    /// Sub-queries that failed and were reported as zero.
    pub degraded: Vec<&'static str>,
}

/// Figures over one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyOccupancy {
    pub property_id: PropertyId,
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub figures: OccupancyFigures,
    pub degraded: Vec<&'static str>,
}

/// `occupied / total * 100` rounded to two decimals; zero for an empty
/// property.
pub fn occupancy_rate(total_units: u64, occupied_units: u64) -> Decimal {
    if total_units == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(occupied_units) * Decimal::ONE_HUNDRED / Decimal::from(total_units)).round_dp(2)
}

/// Fold the leases of a property into figures for `window`.
///
/// Leases outside the window are ignored, so callers may pass a superset.
pub fn fold_figures(
    property_id: PropertyId,
    total_units: u64,
    leases: &[Lease],
    window: &DateWindow,
) -> OccupancyFigures {
    let mut units = HashSet::new();
    let mut tenants = HashSet::new();
    let mut total_revenue = Decimal::ZERO;

    for lease in leases.iter().filter(|lease| lease.overlaps(window)) {
        if lease.property_id != property_id {
            warn!(
                lease_id = %lease.id,
                lease_property_id = %lease.property_id,
                unit_property_id = %property_id,
                "DataIntegrityWarning: lease property disagrees with its unit"
            );
        }
        units.insert(lease.unit_id);
        tenants.insert(lease.tenant_id);
        total_revenue += lease.monthly_rent;
    }

    let occupied_units = (units.len() as u64).min(total_units);
    OccupancyFigures {
        total_units,
        occupied_units,
        available_units: total_units - occupied_units,
        occupancy_rate: occupancy_rate(total_units, occupied_units),
        total_revenue,
        distinct_tenant_count: tenants.len() as u64,
    }
}

/// Run `op`, retrying once if the first attempt fails transiently.
async fn with_retry<T, F, Fut>(name: &'static str, op: F) -> LeaseholdResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = LeaseholdResult<T>>,
{
    match op().await {
        Err(e) if e.is_transient() => {
            debug!(query = name, error = %e, "Retrying aggregate sub-query");
            op().await
        }
        other => other,
    }
}

/// Swap a transient failure for the zero value, recording `name`.
fn degrade<T: Default>(
    name: &'static str,
    property_id: PropertyId,
    result: LeaseholdResult<T>,
    degraded: &mut Vec<&'static str>,
) -> LeaseholdResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_transient() => {
            warn!(
                query = name,
                property_id = %property_id,
                error = %e,
                "Aggregate sub-query failed; reporting zero"
            );
            degraded.push(name);
            Ok(T::default())
        }
        Err(e) => Err(e),
    }
}

fn ensure_may_read_figures(ctx: &RequestContext) -> LeaseholdResult<()> {
    if let Principal::Tenant(user_id) = ctx.principal() {
        warn!(
            user_id = %user_id,
            property_id = %ctx.property_id(),
            "Tenant denied occupancy figures"
        );
        return Err(LeaseholdError::PropertyAccessDenied {
            reason: "occupancy and revenue figures are not available to tenants".into(),
        });
    }
    Ok(())
}

pub struct OccupancyAggregator<U, L> {
    units: U,
    leases: L,
}

impl<U, L> OccupancyAggregator<U, L>
where
    U: UnitRepository,
    L: LeaseRepository,
{
    pub fn new(units: U, leases: L) -> Self {
        Self { units, leases }
    }

    pub async fn summary(
        &self,
        ctx: &RequestContext,
        as_of: NaiveDate,
    ) -> LeaseholdResult<OccupancySummary> {
        ensure_may_read_figures(ctx)?;
        let property_id = ctx.property_id();
        let (figures, degraded) = self.figures(property_id, DateWindow::day(as_of)).await?;
        Ok(OccupancySummary {
            property_id,
            as_of,
            figures,
            degraded,
        })
    }

    pub async fn monthly(
        &self,
        ctx: &RequestContext,
        year: i32,
        month: u32,
    ) -> LeaseholdResult<MonthlyOccupancy> {
        ensure_may_read_figures(ctx)?;
        let property_id = ctx.property_id();
        let window = DateWindow::month(year, month)
            .ok_or_else(|| LeaseholdError::validation(format!("invalid month {year}-{month}")))?;
        let (figures, degraded) = self.figures(property_id, window).await?;
        Ok(MonthlyOccupancy {
            property_id,
            year,
            month,
            figures,
            degraded,
        })
    }

    /// One record per month for the `months` months ending with
    /// `end_year-end_month`, oldest first.
    pub async fn revenue_trend(
        &self,
        ctx: &RequestContext,
        end_year: i32,
        end_month: u32,
        months: u32,
    ) -> LeaseholdResult<Vec<MonthlyOccupancy>> {
        ensure_may_read_figures(ctx)?;
        if months == 0 || months > MAX_TREND_MONTHS {
            return Err(LeaseholdError::validation(format!(
                "trend length must be between 1 and {MAX_TREND_MONTHS} months"
            )));
        }
        if DateWindow::month(end_year, end_month).is_none() {
            return Err(LeaseholdError::validation(format!(
                "invalid month {end_year}-{end_month}"
            )));
        }

        let mut trend = Vec::with_capacity(months as usize);
        for back in (0..months).rev() {
            let (year, month) = months_back(end_year, end_month, back);
            trend.push(self.monthly(ctx, year, month).await?);
        }
        Ok(trend)
    }

    async fn figures(
        &self,
        property_id: PropertyId,
        window: DateWindow,
    ) -> LeaseholdResult<(OccupancyFigures, Vec<&'static str>)> {
        let mut degraded = Vec::new();

        let total_units = degrade(
            UNITS_QUERY,
            property_id,
            with_retry(UNITS_QUERY, || async {
                self.units
                    .list_by_property(property_id)
                    .await
                    .map(|units| units.len() as u64)
            })
            .await,
            &mut degraded,
        )?;

        let leases = degrade(
            LEASES_QUERY,
            property_id,
            with_retry(LEASES_QUERY, || self.leases.list_overlapping(property_id, window)).await,
            &mut degraded,
        )?;

        Ok((
            fold_figures(property_id, total_units, &leases, &window),
            degraded,
        ))
    }
}
