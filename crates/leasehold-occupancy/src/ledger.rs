//! The tenancy ledger: assigning units to tenants and moving leases
//! through their lifecycle.
//!
//! A lease is `Prospective` until its move-in date, `Active` while the
//! date lies inside its window, and ends `Terminated` or `Expired`.
//! Renewal extends the window and returns the lease to `Active`.
//!
//! Mutations on one unit are serialized in-process by a per-unit lock
//! and, across processes, by the store transaction behind
//! [`LeaseRepository::create_exclusive`] and friends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, Utc};
use leasehold_auth::guard::RequestContext;
use leasehold_core::error::{LeaseholdError, LeaseholdResult};
use leasehold_core::models::ids::{LeaseId, TenantId, UnitId};
use leasehold_core::models::lease::{
    AssignLease, Lease, NewLease, RenewLease, Renewal, TerminateLease, Termination,
};
use leasehold_core::models::principal::Principal;
use leasehold_core::money::to_cents;
use leasehold_core::repository::{LeaseRepository, TenantRepository, UnitRepository};
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

use crate::events::{LeaseEvent, LeaseEventSink};

type UnitLock = Arc<tokio::sync::Mutex<()>>;

/// One async mutex per unit, created on first use and dropped once the
/// last holder or waiter releases it.
#[derive(Default)]
struct UnitLocks {
    inner: Mutex<HashMap<UnitId, UnitLock>>,
}

impl UnitLocks {
    async fn acquire(&self, unit_id: UnitId) -> HeldUnit<'_> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.entry(unit_id).or_default().clone()
        };
        let guard = lock.clone().lock_owned().await;
        HeldUnit {
            locks: self,
            unit_id,
            lock,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct HeldUnit<'a> {
    locks: &'a UnitLocks,
    unit_id: UnitId,
    lock: UnitLock,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for HeldUnit<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut map = self
            .locks
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Clones are only handed out under the map lock, so a count of two
        // (the map and this holder) means nobody else is waiting.
        if Arc::strong_count(&self.lock) == 2 {
            map.remove(&self.unit_id);
        }
    }
}

pub struct TenancyLedger<U, T, L, E> {
    units: U,
    tenants: T,
    leases: L,
    events: E,
    locks: UnitLocks,
}

impl<U, T, L, E> TenancyLedger<U, T, L, E>
where
    U: UnitRepository,
    T: TenantRepository,
    L: LeaseRepository,
    E: LeaseEventSink,
{
    pub fn new(units: U, tenants: T, leases: L, events: E) -> Self {
        Self {
            units,
            tenants,
            leases,
            events,
            locks: UnitLocks::default(),
        }
    }

    /// Bind a tenant to a unit of the context's property.
    pub async fn assign(&self, ctx: &RequestContext, input: AssignLease) -> LeaseholdResult<Lease> {
        ctx.require_manage()?;
        let property_id = ctx.property_id();

        if input
            .move_out_date
            .is_some_and(|out| out < input.move_in_date)
        {
            return Err(LeaseholdError::validation(
                "move-out date must not precede move-in date",
            ));
        }
        let monthly_rent_cents = to_cents("monthly_rent", input.monthly_rent)?;
        let security_deposit_cents = input
            .security_deposit
            .map(|deposit| to_cents("security_deposit", deposit))
            .transpose()?;

        let unit = self.units.get_by_id(property_id, input.unit_id).await?;
        let tenant = self.tenants.get_by_id(input.tenant_id).await?;
        if !tenant.belongs_to(property_id) {
            return Err(LeaseholdError::not_found("tenant", input.tenant_id));
        }

        let lease = {
            let _held = self.locks.acquire(unit.id).await;
            self.leases
                .create_exclusive(NewLease {
                    tenant_id: tenant.id,
                    unit_id: unit.id,
                    property_id: unit.property_id,
                    move_in_date: input.move_in_date,
                    move_out_date: input.move_out_date,
                    monthly_rent_cents,
                    security_deposit_cents,
                    move_in_notes: input.move_in_notes,
                })
                .await?
        };

        info!(
            lease_id = %lease.id,
            property_id = %property_id,
            unit_id = %lease.unit_id,
            tenant_id = %lease.tenant_id,
            move_in = %lease.move_in_date,
            move_out = ?lease.move_out_date,
            by = %ctx.principal(),
            "Lease assigned"
        );
        self.publish(LeaseEvent::assigned(&lease)).await;
        Ok(lease)
    }

    /// End a lease at the effective date (today when unset).
    pub async fn terminate(
        &self,
        ctx: &RequestContext,
        lease_id: LeaseId,
        input: TerminateLease,
    ) -> LeaseholdResult<Lease> {
        ctx.require_manage()?;
        let property_id = ctx.property_id();
        let effective_date = input
            .effective_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let lease = self.load(ctx, lease_id).await?;
        if lease.is_terminated() {
            return Err(LeaseholdError::Conflict {
                reason: format!("lease {lease_id} is already terminated"),
            });
        }
        if lease.move_out_date.is_some_and(|end| effective_date > end) {
            return Err(LeaseholdError::validation(
                "termination date is after the lease's move-out date",
            ));
        }
        let deposit_return_cents = input
            .deposit_return_amount
            .map(|amount| to_cents("deposit_return_amount", amount))
            .transpose()?;

        let closed = {
            let _held = self.locks.acquire(lease.unit_id).await;
            self.leases
                .terminate(
                    property_id,
                    &lease,
                    Termination {
                        effective_date,
                        reason: input.reason,
                        deposit_return_cents,
                        move_out_notes: input.move_out_notes,
                    },
                )
                .await?
        };

        info!(
            lease_id = %closed.id,
            property_id = %property_id,
            unit_id = %closed.unit_id,
            effective_date = %effective_date,
            reason = ?closed.termination_reason,
            by = %ctx.principal(),
            "Lease terminated"
        );
        self.publish(LeaseEvent::terminated(&closed)).await;
        Ok(closed)
    }

    /// Extend a fixed-term lease to a later move-out date.
    pub async fn renew(
        &self,
        ctx: &RequestContext,
        lease_id: LeaseId,
        input: RenewLease,
    ) -> LeaseholdResult<Lease> {
        ctx.require_manage()?;
        let property_id = ctx.property_id();

        let lease = self.load(ctx, lease_id).await?;
        if lease.is_terminated() {
            return Err(LeaseholdError::Conflict {
                reason: format!("lease {lease_id} was terminated and cannot be renewed"),
            });
        }
        let Some(current_end) = lease.move_out_date else {
            return Err(LeaseholdError::validation(
                "open-ended lease cannot be renewed",
            ));
        };
        if input.new_move_out_date <= current_end {
            return Err(LeaseholdError::validation(format!(
                "new move-out date must be after {current_end}"
            )));
        }
        let new_monthly_rent_cents = input
            .new_monthly_rent
            .map(|rent| to_cents("new_monthly_rent", rent))
            .transpose()?;

        let renewed = {
            let _held = self.locks.acquire(lease.unit_id).await;
            self.leases
                .renew(
                    property_id,
                    &lease,
                    Renewal {
                        move_in_date: lease.move_in_date,
                        new_move_out_date: input.new_move_out_date,
                        new_monthly_rent_cents,
                    },
                )
                .await?
        };

        info!(
            lease_id = %renewed.id,
            property_id = %property_id,
            previous_move_out = %current_end,
            new_move_out = %input.new_move_out_date,
            renewal_count = renewed.renewal_count,
            by = %ctx.principal(),
            "Lease renewed"
        );
        self.publish(LeaseEvent::renewed(&renewed)).await;
        Ok(renewed)
    }

    /// Record that notice to vacate was given.
    pub async fn give_notice(
        &self,
        ctx: &RequestContext,
        lease_id: LeaseId,
        notice_date: NaiveDate,
    ) -> LeaseholdResult<Lease> {
        ctx.require_manage()?;

        let lease = self.load(ctx, lease_id).await?;
        if lease.is_terminated() {
            return Err(LeaseholdError::Conflict {
                reason: format!("lease {lease_id} is already terminated"),
            });
        }
        if notice_date < lease.move_in_date {
            return Err(LeaseholdError::validation(
                "notice date must not precede move-in date",
            ));
        }

        let noticed = self
            .leases
            .record_notice(ctx.property_id(), lease_id, notice_date)
            .await?;
        info!(
            lease_id = %lease_id,
            property_id = %ctx.property_id(),
            notice_date = %notice_date,
            "Lease notice recorded"
        );
        Ok(noticed)
    }

    /// The tenant's active lease in this property as of `as_of`; the
    /// latest move-in wins when there are several.
    pub async fn current_assignment(
        &self,
        ctx: &RequestContext,
        tenant_id: TenantId,
        as_of: NaiveDate,
    ) -> LeaseholdResult<Option<Lease>> {
        Ok(self
            .history(ctx, tenant_id)
            .await?
            .into_iter()
            .find(|lease| lease.is_active(as_of)))
    }

    /// All of the tenant's leases in this property, newest move-in first.
    pub async fn history(
        &self,
        ctx: &RequestContext,
        tenant_id: TenantId,
    ) -> LeaseholdResult<Vec<Lease>> {
        self.ensure_may_read_tenant(ctx, tenant_id).await?;
        self.leases
            .list_by_tenant(ctx.property_id(), tenant_id)
            .await
    }

    pub async fn get(&self, ctx: &RequestContext, lease_id: LeaseId) -> LeaseholdResult<Lease> {
        let lease = self.load(ctx, lease_id).await?;
        self.ensure_may_read_tenant(ctx, lease.tenant_id).await?;
        Ok(lease)
    }

    /// Fetch a lease of the context's property, checking that its unit
    /// agrees. The unit's property is authoritative.
    async fn load(&self, ctx: &RequestContext, lease_id: LeaseId) -> LeaseholdResult<Lease> {
        let property_id = ctx.property_id();
        let lease = self.leases.get_by_id(property_id, lease_id).await?;

        match self.units.get_by_id(property_id, lease.unit_id).await {
            Ok(_) => Ok(lease),
            Err(LeaseholdError::NotFound { .. }) => {
                warn!(
                    lease_id = %lease.id,
                    lease_property_id = %lease.property_id,
                    unit_id = %lease.unit_id,
                    "DataIntegrityWarning: lease property disagrees with its unit"
                );
                Err(LeaseholdError::not_found("lease", lease_id))
            }
            Err(e) => Err(e),
        }
    }

    /// Tenants may only read their own leases.
    async fn ensure_may_read_tenant(
        &self,
        ctx: &RequestContext,
        tenant_id: TenantId,
    ) -> LeaseholdResult<()> {
        let Principal::Tenant(user_id) = ctx.principal() else {
            return Ok(());
        };
        let own = self.tenants.find_by_user(user_id).await?;
        if own.is_some_and(|tenant| tenant.id == tenant_id) {
            Ok(())
        } else {
            Err(LeaseholdError::PropertyAccessDenied {
                reason: "tenants may only read their own leases".into(),
            })
        }
    }

    async fn publish(&self, event: LeaseEvent) {
        let kind = event.kind();
        let lease_id = event.lease_id();
        if let Err(e) = self.events.publish(event).await {
            warn!(
                kind,
                lease_id = %lease_id,
                error = %e,
                "Failed to publish lease event"
            );
        }
    }
}
