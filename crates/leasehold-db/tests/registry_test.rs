//! Integration tests for the property, unit, tenant and staff registries
//! using in-memory SurrealDB.

use leasehold_core::LeaseholdError;
use leasehold_core::models::ids::{PropertyId, TenantId, UnitId};
use leasehold_core::models::property::CreateProperty;
use leasehold_core::models::tenant::CreateTenant;
use leasehold_core::models::unit::{CreateUnit, UnitStatus};
use leasehold_core::repository::{
    PropertyRepository, StaffRepository, TenantRepository, UnitRepository,
};
use leasehold_db::repository::{
    SurrealPropertyRepository, SurrealStaffRepository, SurrealTenantRepository,
    SurrealUnitRepository,
};
use rust_decimal::Decimal;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    leasehold_db::run_migrations(&db).await.unwrap();
    db
}

fn property(owner_id: Uuid, name: &str, label: Option<&str>) -> CreateProperty {
    CreateProperty {
        owner_id,
        name: name.into(),
        portal_label: label.map(Into::into),
    }
}

// -----------------------------------------------------------------------
// Properties
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_property() {
    let db = setup().await;
    let repo = SurrealPropertyRepository::new(db);
    let owner = Uuid::new_v4();

    let created = repo
        .create(property(owner, "Sunset Towers", Some("  Sunset ")))
        .await
        .unwrap();
    assert!(created.id.get() > 0);
    assert_eq!(created.portal_label.as_deref(), Some("sunset"));
    assert!(created.is_owned_by(owner));

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, "Sunset Towers");
}

#[tokio::test]
async fn property_ids_are_sequential() {
    let db = setup().await;
    let repo = SurrealPropertyRepository::new(db);
    let owner = Uuid::new_v4();

    let a = repo.create(property(owner, "A", None)).await.unwrap();
    let b = repo.create(property(owner, "B", None)).await.unwrap();
    assert_eq!(b.id.get(), a.id.get() + 1);
}

#[tokio::test]
async fn missing_property_is_not_found() {
    let db = setup().await;
    let repo = SurrealPropertyRepository::new(db);

    let err = repo.get_by_id(PropertyId(999)).await.unwrap_err();
    assert!(matches!(err, LeaseholdError::NotFound { .. }));
}

#[tokio::test]
async fn portal_label_lookup_is_exact_and_case_insensitive() {
    let db = setup().await;
    let repo = SurrealPropertyRepository::new(db);
    let owner = Uuid::new_v4();

    let pat = repo
        .create(property(owner, "Pat's Place", Some("pat")))
        .await
        .unwrap();

    let found = repo.find_by_portal_label("PAT").await.unwrap();
    assert_eq!(found.map(|p| p.id), Some(pat.id));
    assert!(repo.find_by_portal_label("pa").await.unwrap().is_none());
    assert!(repo.find_by_portal_label("  ").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_portal_label_conflicts() {
    let db = setup().await;
    let repo = SurrealPropertyRepository::new(db);
    let owner = Uuid::new_v4();

    repo.create(property(owner, "First", Some("harbor")))
        .await
        .unwrap();
    let err = repo
        .create(property(owner, "Second", Some("Harbor")))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaseholdError::Conflict { .. }), "{err:?}");

    // The failed create must not leave a property behind.
    let owned = repo.list_by_owner(owner).await.unwrap();
    assert_eq!(owned.len(), 1);
}

#[tokio::test]
async fn find_by_normalized_name_returns_all_matches() {
    let db = setup().await;
    let repo = SurrealPropertyRepository::new(db);

    let a = repo
        .create(property(Uuid::new_v4(), "Maple Court", None))
        .await
        .unwrap();
    let b = repo
        .create(property(Uuid::new_v4(), "maple court", None))
        .await
        .unwrap();
    repo.create(property(Uuid::new_v4(), "Oak Court", None))
        .await
        .unwrap();

    let matches = repo.find_by_normalized_name(" MAPLE COURT").await.unwrap();
    let ids: Vec<_> = matches.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![a.id, b.id]);
}

#[tokio::test]
async fn empty_property_name_is_rejected() {
    let db = setup().await;
    let repo = SurrealPropertyRepository::new(db);

    let err = repo
        .create(property(Uuid::new_v4(), "   ", None))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaseholdError::Validation { .. }));
}

// -----------------------------------------------------------------------
// Units
// -----------------------------------------------------------------------

#[tokio::test]
async fn units_are_scoped_to_their_property() {
    let db = setup().await;
    let properties = SurrealPropertyRepository::new(db.clone());
    let units = SurrealUnitRepository::new(db);
    let owner = Uuid::new_v4();

    let p1 = properties.create(property(owner, "One", None)).await.unwrap();
    let p2 = properties.create(property(owner, "Two", None)).await.unwrap();

    let unit = units
        .create(CreateUnit {
            property_id: p1.id,
            unit_number: "1A".into(),
            monthly_rent: Decimal::new(125050, 2),
        })
        .await
        .unwrap();
    assert_eq!(unit.status, UnitStatus::Vacant);
    assert_eq!(unit.monthly_rent, Decimal::new(125050, 2));

    assert_eq!(units.get_by_id(p1.id, unit.id).await.unwrap().id, unit.id);

    let err = units.get_by_id(p2.id, unit.id).await.unwrap_err();
    assert!(matches!(err, LeaseholdError::NotFound { .. }));
    assert!(units.list_by_property(p2.id).await.unwrap().is_empty());
    assert_eq!(units.list_by_property(p1.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_unit_number_conflicts() {
    let db = setup().await;
    let units = SurrealUnitRepository::new(db);

    let input = CreateUnit {
        property_id: PropertyId(1),
        unit_number: "12".into(),
        monthly_rent: Decimal::new(1000, 0),
    };
    units.create(input.clone()).await.unwrap();
    let err = units.create(input).await.unwrap_err();
    assert!(matches!(err, LeaseholdError::Conflict { .. }), "{err:?}");
}

#[tokio::test]
async fn negative_rent_is_rejected() {
    let db = setup().await;
    let units = SurrealUnitRepository::new(db);

    let err = units
        .create(CreateUnit {
            property_id: PropertyId(1),
            unit_number: "12".into(),
            monthly_rent: Decimal::new(-1, 0),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LeaseholdError::Validation { .. }));

    let missing = units.get_by_id(PropertyId(1), UnitId(1)).await;
    assert!(missing.is_err());
}

// -----------------------------------------------------------------------
// Tenants and staff
// -----------------------------------------------------------------------

#[tokio::test]
async fn tenant_lookup_by_user() {
    let db = setup().await;
    let tenants = SurrealTenantRepository::new(db);
    let user = Uuid::new_v4();

    let tenant = tenants
        .create(CreateTenant {
            user_id: user,
            property_id: Some(PropertyId(7)),
            email: Some("tenant@example.com".into()),
            phone_number: None,
        })
        .await
        .unwrap();
    assert_eq!(tenant.property_id, Some(PropertyId(7)));
    assert!(tenant.belongs_to(PropertyId(7)));
    assert!(!tenant.belongs_to(PropertyId(9)));

    let found = tenants.find_by_user(user).await.unwrap().unwrap();
    assert_eq!(found.id, tenant.id);
    assert!(tenants.find_by_user(Uuid::new_v4()).await.unwrap().is_none());

    let err = tenants.get_by_id(TenantId(404)).await.unwrap_err();
    assert!(matches!(err, LeaseholdError::NotFound { .. }));
}

#[tokio::test]
async fn one_tenant_profile_per_user() {
    let db = setup().await;
    let tenants = SurrealTenantRepository::new(db);
    let user = Uuid::new_v4();

    let input = CreateTenant {
        user_id: user,
        property_id: None,
        email: None,
        phone_number: None,
    };
    tenants.create(input.clone()).await.unwrap();
    let err = tenants.create(input).await.unwrap_err();
    assert!(matches!(err, LeaseholdError::Conflict { .. }), "{err:?}");
}

#[tokio::test]
async fn staff_binding_is_replaced() {
    let db = setup().await;
    let staff = SurrealStaffRepository::new(db);
    let user = Uuid::new_v4();

    assert!(staff.find_by_user(user).await.unwrap().is_none());

    staff.bind(user, PropertyId(3)).await.unwrap();
    let rebound = staff.bind(user, PropertyId(4)).await.unwrap();
    assert_eq!(rebound.property_id, PropertyId(4));

    let found = staff.find_by_user(user).await.unwrap().unwrap();
    assert_eq!(found.user_id, user);
    assert_eq!(found.property_id, PropertyId(4));
}
