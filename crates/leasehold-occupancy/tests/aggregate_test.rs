//! Occupancy aggregation against in-memory SurrealDB.

use chrono::NaiveDate;
use leasehold_auth::guard::{OwnershipGuard, RequestContext};
use leasehold_core::models::ids::{PropertyId, UnitId};
use leasehold_core::models::lease::{AssignLease, DateWindow, TerminateLease};
use leasehold_core::models::principal::Principal;
use leasehold_core::models::property::CreateProperty;
use leasehold_core::models::tenant::CreateTenant;
use leasehold_core::models::unit::CreateUnit;
use leasehold_core::repository::{
    LeaseRepository, PropertyRepository, TenantRepository, UnitRepository,
};
use leasehold_db::repository::{
    SurrealLeaseRepository, SurrealPropertyRepository, SurrealStaffRepository,
    SurrealTenantRepository, SurrealUnitRepository,
};
use leasehold_occupancy::aggregate::OccupancyAggregator;
use leasehold_occupancy::events::TracingEventSink;
use leasehold_occupancy::ledger::TenancyLedger;
use rust_decimal::Decimal;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

struct Fixture {
    db: Surreal<Db>,
    ledger: TenancyLedger<
        SurrealUnitRepository<Db>,
        SurrealTenantRepository<Db>,
        SurrealLeaseRepository<Db>,
        TracingEventSink,
    >,
    aggregator: OccupancyAggregator<SurrealUnitRepository<Db>, SurrealLeaseRepository<Db>>,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    leasehold_db::run_migrations(&db).await.unwrap();

    Fixture {
        ledger: TenancyLedger::new(
            SurrealUnitRepository::new(db.clone()),
            SurrealTenantRepository::new(db.clone()),
            SurrealLeaseRepository::new(db.clone()),
            TracingEventSink,
        ),
        aggregator: OccupancyAggregator::new(
            SurrealUnitRepository::new(db.clone()),
            SurrealLeaseRepository::new(db.clone()),
        ),
        db,
    }
}

impl Fixture {
    async fn managed_property(&self, name: &str) -> RequestContext {
        let owner = Uuid::new_v4();
        let property_id = SurrealPropertyRepository::new(self.db.clone())
            .create(CreateProperty {
                owner_id: owner,
                name: name.into(),
                portal_label: None,
            })
            .await
            .unwrap()
            .id;
        OwnershipGuard::new(
            SurrealPropertyRepository::new(self.db.clone()),
            SurrealTenantRepository::new(self.db.clone()),
            SurrealStaffRepository::new(self.db.clone()),
            SurrealLeaseRepository::new(self.db.clone()),
        )
        .authorize(Principal::Manager(owner), property_id)
        .await
        .unwrap()
    }

    async fn units(&self, property_id: PropertyId, count: usize) -> Vec<UnitId> {
        let repo = SurrealUnitRepository::new(self.db.clone());
        let mut ids = Vec::with_capacity(count);
        for n in 0..count {
            let unit = repo
                .create(CreateUnit {
                    property_id,
                    unit_number: format!("{}", 101 + n),
                    monthly_rent: Decimal::new(1000, 0),
                })
                .await
                .unwrap();
            ids.push(unit.id);
        }
        ids
    }

    /// Lease `unit` to a fresh tenant from `move_in`, open-ended.
    async fn lease(&self, ctx: &RequestContext, unit_id: UnitId, move_in: NaiveDate, rent: i64) {
        let tenant = SurrealTenantRepository::new(self.db.clone())
            .create(CreateTenant {
                user_id: Uuid::new_v4(),
                property_id: Some(ctx.property_id()),
                email: None,
                phone_number: None,
            })
            .await
            .unwrap();
        self.ledger
            .assign(
                ctx,
                AssignLease {
                    tenant_id: tenant.id,
                    unit_id,
                    move_in_date: move_in,
                    move_out_date: None,
                    monthly_rent: Decimal::new(rent, 0),
                    security_deposit: None,
                    move_in_notes: None,
                },
            )
            .await
            .unwrap();
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn summary_counts_active_leases() {
    let fx = setup().await;
    let ctx = fx.managed_property("Maple Court").await;
    let units = fx.units(ctx.property_id(), 10).await;

    for (unit, rent) in units.iter().zip([1000, 1200, 1500, 900]) {
        fx.lease(&ctx, *unit, date(2024, 1, 1), rent).await;
    }

    let summary = fx.aggregator.summary(&ctx, date(2024, 6, 1)).await.unwrap();
    assert_eq!(summary.figures.total_units, 10);
    assert_eq!(summary.figures.occupied_units, 4);
    assert_eq!(summary.figures.available_units, 6);
    assert_eq!(summary.figures.occupancy_rate, Decimal::new(4000, 2));
    assert_eq!(summary.figures.total_revenue, Decimal::new(4600, 0));
    assert_eq!(summary.figures.distinct_tenant_count, 4);
    assert!(summary.degraded.is_empty());

    // Nothing had moved in yet.
    let before = fx.aggregator.summary(&ctx, date(2023, 12, 31)).await.unwrap();
    assert_eq!(before.figures.occupied_units, 0);
    assert_eq!(before.figures.total_revenue, Decimal::ZERO);
}

#[tokio::test]
async fn empty_property_reports_zero_rate() {
    let fx = setup().await;
    let ctx = fx.managed_property("Vacant Lot").await;

    let summary = fx.aggregator.summary(&ctx, date(2024, 6, 1)).await.unwrap();
    assert_eq!(summary.figures.total_units, 0);
    assert_eq!(summary.figures.occupancy_rate, Decimal::ZERO);
    assert_eq!(summary.figures.total_revenue, Decimal::ZERO);
}

#[tokio::test]
async fn figures_stay_within_their_property() {
    let fx = setup().await;
    let ours = fx.managed_property("Maple Court").await;
    let theirs = fx.managed_property("Oak Row").await;

    let our_units = fx.units(ours.property_id(), 2).await;
    let their_units = fx.units(theirs.property_id(), 3).await;
    fx.lease(&ours, our_units[0], date(2024, 1, 1), 800).await;
    for unit in &their_units {
        fx.lease(&theirs, *unit, date(2024, 1, 1), 2000).await;
    }

    let summary = fx.aggregator.summary(&ours, date(2024, 6, 1)).await.unwrap();
    assert_eq!(summary.figures.total_units, 2);
    assert_eq!(summary.figures.occupied_units, 1);
    assert_eq!(summary.figures.occupancy_rate, Decimal::new(5000, 2));
    assert_eq!(summary.figures.total_revenue, Decimal::new(800, 0));
}

#[tokio::test]
async fn monthly_and_trend_follow_move_ins_and_terminations() {
    let fx = setup().await;
    let ctx = fx.managed_property("Maple Court").await;
    let units = fx.units(ctx.property_id(), 4).await;

    fx.lease(&ctx, units[0], date(2024, 1, 10), 1000).await;
    fx.lease(&ctx, units[1], date(2024, 2, 20), 1000).await;
    fx.lease(&ctx, units[2], date(2024, 3, 1), 1000).await;

    let january = SurrealLeaseRepository::new(fx.db.clone())
        .list_overlapping(ctx.property_id(), DateWindow::day(date(2024, 1, 15)))
        .await
        .unwrap();
    assert_eq!(january.len(), 1);
    fx.ledger
        .terminate(
            &ctx,
            january[0].id,
            TerminateLease {
                effective_date: Some(date(2024, 2, 29)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let february = fx.aggregator.monthly(&ctx, 2024, 2).await.unwrap();
    assert_eq!((february.year, february.month), (2024, 2));
    assert_eq!(february.figures.occupied_units, 2);

    let trend = fx.aggregator.revenue_trend(&ctx, 2024, 4, 4).await.unwrap();
    let months: Vec<(i32, u32)> = trend.iter().map(|m| (m.year, m.month)).collect();
    assert_eq!(months, vec![(2024, 1), (2024, 2), (2024, 3), (2024, 4)]);
    let occupied: Vec<u64> = trend.iter().map(|m| m.figures.occupied_units).collect();
    assert_eq!(occupied, vec![1, 2, 2, 2]);
    let revenue: Vec<Decimal> = trend.iter().map(|m| m.figures.total_revenue).collect();
    assert_eq!(
        revenue,
        vec![
            Decimal::new(1000, 0),
            Decimal::new(2000, 0),
            Decimal::new(2000, 0),
            Decimal::new(2000, 0)
        ]
    );

    let err = fx
        .aggregator
        .revenue_trend(&ctx, 2024, 4, 0)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
    let err = fx.aggregator.monthly(&ctx, 2024, 13).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn tenants_cannot_read_property_figures() {
    let fx = setup().await;
    let ctx = fx.managed_property("Maple Court").await;
    let units = fx.units(ctx.property_id(), 2).await;
    fx.lease(&ctx, units[0], date(2024, 1, 1), 1000).await;

    let user = Uuid::new_v4();
    SurrealTenantRepository::new(fx.db.clone())
        .create(CreateTenant {
            user_id: user,
            property_id: Some(ctx.property_id()),
            email: None,
            phone_number: None,
        })
        .await
        .unwrap();
    let tenant_ctx = OwnershipGuard::new(
        SurrealPropertyRepository::new(fx.db.clone()),
        SurrealTenantRepository::new(fx.db.clone()),
        SurrealStaffRepository::new(fx.db.clone()),
        SurrealLeaseRepository::new(fx.db.clone()),
    )
    .authorize(Principal::Tenant(user), ctx.property_id())
    .await
    .unwrap();

    let err = fx
        .aggregator
        .summary(&tenant_ctx, date(2024, 6, 1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PROPERTY_ACCESS_DENIED");
    let err = fx.aggregator.monthly(&tenant_ctx, 2024, 6).await.unwrap_err();
    assert_eq!(err.code(), "PROPERTY_ACCESS_DENIED");
    let err = fx
        .aggregator
        .revenue_trend(&tenant_ctx, 2024, 6, 6)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PROPERTY_ACCESS_DENIED");
}

#[tokio::test]
async fn unbound_staff_may_read_figures() {
    let fx = setup().await;
    let ctx = fx.managed_property("Maple Court").await;
    fx.units(ctx.property_id(), 3).await;

    let staff_ctx = OwnershipGuard::new(
        SurrealPropertyRepository::new(fx.db.clone()),
        SurrealTenantRepository::new(fx.db.clone()),
        SurrealStaffRepository::new(fx.db.clone()),
        SurrealLeaseRepository::new(fx.db.clone()),
    )
    .authorize(Principal::Staff(Uuid::new_v4()), ctx.property_id())
    .await
    .unwrap();

    let summary = fx.aggregator.summary(&staff_ctx, date(2024, 6, 1)).await.unwrap();
    assert_eq!(summary.figures.total_units, 3);
}
