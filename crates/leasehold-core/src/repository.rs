//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Property-scoped repositories take
//! the `property_id` as their first parameter and never expose a query
//! that spans properties; lookups of a record that exists under a
//! different property report `NotFound`.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::LeaseholdResult;
use crate::models::{
    ids::{LeaseId, PropertyId, TenantId, UnitId},
    lease::{DateWindow, Lease, NewLease, Renewal, Termination},
    property::{CreateProperty, Property},
    staff::StaffBinding,
    tenant::{CreateTenant, Tenant},
    unit::{CreateUnit, Unit},
};

// ---------------------------------------------------------------------------
// Registries (global scope)
// ---------------------------------------------------------------------------

pub trait PropertyRepository: Send + Sync {
    fn create(&self, input: CreateProperty) -> impl Future<Output = LeaseholdResult<Property>> + Send;
    fn get_by_id(&self, id: PropertyId) -> impl Future<Output = LeaseholdResult<Property>> + Send;
    /// Exact lookup on the unique, normalized portal label.
    fn find_by_portal_label(
        &self,
        label: &str,
    ) -> impl Future<Output = LeaseholdResult<Option<Property>>> + Send;
    /// All properties whose normalized name equals `name`, ordered by id.
    fn find_by_normalized_name(
        &self,
        name: &str,
    ) -> impl Future<Output = LeaseholdResult<Vec<Property>>> + Send;
    fn list_by_owner(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = LeaseholdResult<Vec<Property>>> + Send;
}

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = LeaseholdResult<Tenant>> + Send;
    fn get_by_id(&self, id: TenantId) -> impl Future<Output = LeaseholdResult<Tenant>> + Send;
    /// The tenant profile linked to a user, if any.
    fn find_by_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = LeaseholdResult<Option<Tenant>>> + Send;
}

pub trait StaffRepository: Send + Sync {
    /// Bind a staff user to a property, replacing any previous binding.
    fn bind(
        &self,
        user_id: Uuid,
        property_id: PropertyId,
    ) -> impl Future<Output = LeaseholdResult<StaffBinding>> + Send;
    fn find_by_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = LeaseholdResult<Option<StaffBinding>>> + Send;
}

// ---------------------------------------------------------------------------
// Property-scoped repositories
// ---------------------------------------------------------------------------

pub trait UnitRepository: Send + Sync {
    fn create(&self, input: CreateUnit) -> impl Future<Output = LeaseholdResult<Unit>> + Send;
    fn get_by_id(
        &self,
        property_id: PropertyId,
        id: UnitId,
    ) -> impl Future<Output = LeaseholdResult<Unit>> + Send;
    fn list_by_property(
        &self,
        property_id: PropertyId,
    ) -> impl Future<Output = LeaseholdResult<Vec<Unit>>> + Send;
}

pub trait LeaseRepository: Send + Sync {
    /// Insert a lease unless another lease on the same unit overlaps its
    /// window, and mark the unit occupied. Check, insert and unit update
    /// are one transaction; an overlap fails with `Conflict`.
    fn create_exclusive(&self, input: NewLease) -> impl Future<Output = LeaseholdResult<Lease>> + Send;

    fn get_by_id(
        &self,
        property_id: PropertyId,
        id: LeaseId,
    ) -> impl Future<Output = LeaseholdResult<Lease>> + Send;

    /// Close a lease at the effective date. Fails with `Conflict` if the
    /// lease is already terminated. The unit is flipped to vacant only if
    /// no other lease on it is active at the effective date, re-checked
    /// in the same transaction.
    fn terminate(
        &self,
        property_id: PropertyId,
        lease: &Lease,
        termination: Termination,
    ) -> impl Future<Output = LeaseholdResult<Lease>> + Send;

    /// Extend a lease. Fails with `Conflict` if the extended window would
    /// overlap another lease on the unit or the lease was terminated.
    fn renew(
        &self,
        property_id: PropertyId,
        lease: &Lease,
        renewal: Renewal,
    ) -> impl Future<Output = LeaseholdResult<Lease>> + Send;

    fn record_notice(
        &self,
        property_id: PropertyId,
        id: LeaseId,
        notice_date: NaiveDate,
    ) -> impl Future<Output = LeaseholdResult<Lease>> + Send;

    /// Leases of a tenant on this property's units, newest move-in first.
    fn list_by_tenant(
        &self,
        property_id: PropertyId,
        tenant_id: TenantId,
    ) -> impl Future<Output = LeaseholdResult<Vec<Lease>>> + Send;

    /// Leases on this property's units whose window overlaps `window`.
    /// Units are resolved through the unit table, not the denormalized
    /// lease column.
    fn list_overlapping(
        &self,
        property_id: PropertyId,
        window: DateWindow,
    ) -> impl Future<Output = LeaseholdResult<Vec<Lease>>> + Send;
}
