//! Ownership guard: decides whether a principal may act on a property.
//!
//! The guard fails closed. A [`RequestContext`] can only be produced
//! here, so every property-scoped operation downstream is provably
//! preceded by an allow decision.

use chrono::{NaiveDate, Utc};
use leasehold_core::error::{LeaseholdError, LeaseholdResult};
use leasehold_core::models::ids::PropertyId;
use leasehold_core::models::lease::DateWindow;
use leasehold_core::models::principal::Principal;
use leasehold_core::repository::{
    LeaseRepository, PropertyRepository, StaffRepository, TenantRepository,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// What the principal may do within the authorized property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Mutations allowed (owning manager, bound staff).
    Manage,
    /// Reads only (tenants, unbound staff).
    ReadOnly,
}

/// Authorized scope of a single operation. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    property_id: PropertyId,
    principal: Principal,
    access: AccessLevel,
}

impl RequestContext {
    pub(crate) fn new(property_id: PropertyId, principal: Principal, access: AccessLevel) -> Self {
        Self {
            property_id,
            principal,
            access,
        }
    }

    pub fn property_id(&self) -> PropertyId {
        self.property_id
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    pub fn access(&self) -> AccessLevel {
        self.access
    }

    pub fn can_manage(&self) -> bool {
        self.access == AccessLevel::Manage
    }

    /// Reject unless the context grants [`AccessLevel::Manage`].
    pub fn require_manage(&self) -> LeaseholdResult<()> {
        if self.can_manage() {
            Ok(())
        } else {
            Err(LeaseholdError::PropertyAccessDenied {
                reason: format!(
                    "{} has read-only access to property {}",
                    self.principal.role(),
                    self.property_id
                ),
            })
        }
    }
}

pub struct OwnershipGuard<P, T, S, L> {
    properties: P,
    tenants: T,
    staff: S,
    leases: L,
}

impl<P, T, S, L> OwnershipGuard<P, T, S, L>
where
    P: PropertyRepository,
    T: TenantRepository,
    S: StaffRepository,
    L: LeaseRepository,
{
    pub fn new(properties: P, tenants: T, staff: S, leases: L) -> Self {
        Self {
            properties,
            tenants,
            staff,
            leases,
        }
    }

    /// Authorize `principal` against `property_id` as of today.
    pub async fn authorize(
        &self,
        principal: Principal,
        property_id: PropertyId,
    ) -> LeaseholdResult<RequestContext> {
        self.authorize_as_of(principal, property_id, Utc::now().date_naive())
            .await
    }

    /// Authorize with an explicit "today", used for lease-derived tenant
    /// affiliation.
    pub async fn authorize_as_of(
        &self,
        principal: Principal,
        property_id: PropertyId,
        today: NaiveDate,
    ) -> LeaseholdResult<RequestContext> {
        let property = match self.properties.get_by_id(property_id).await {
            Ok(property) => property,
            Err(LeaseholdError::NotFound { .. }) => {
                warn!(
                    user_id = %principal.user_id(),
                    role = principal.role(),
                    property_id = %property_id,
                    "Property access denied: property does not exist"
                );
                return Err(LeaseholdError::PropertyNotFound(property_id));
            }
            Err(e) => return Err(e),
        };

        let decision = match principal {
            Principal::Manager(user_id) => {
                if property.is_owned_by(user_id) {
                    Ok(AccessLevel::Manage)
                } else {
                    Err("manager does not own the property".to_string())
                }
            }
            Principal::Tenant(user_id) => self.tenant_decision(user_id, property_id, today).await?,
            Principal::Staff(user_id) => match self.staff.find_by_user(user_id).await? {
                Some(binding) if binding.property_id == property_id => Ok(AccessLevel::Manage),
                Some(binding) => Err(format!(
                    "staff is bound to property {}",
                    binding.property_id
                )),
                None => Ok(AccessLevel::ReadOnly),
            },
        };

        match decision {
            Ok(access) => {
                info!(
                    user_id = %principal.user_id(),
                    role = principal.role(),
                    property_id = %property_id,
                    ?access,
                    "Property access granted"
                );
                Ok(RequestContext::new(property_id, principal, access))
            }
            Err(reason) => {
                warn!(
                    user_id = %principal.user_id(),
                    role = principal.role(),
                    property_id = %property_id,
                    reason = %reason,
                    "Property access denied"
                );
                Err(LeaseholdError::PropertyAccessDenied { reason })
            }
        }
    }

    async fn tenant_decision(
        &self,
        user_id: Uuid,
        property_id: PropertyId,
        today: NaiveDate,
    ) -> LeaseholdResult<Result<AccessLevel, String>> {
        let Some(tenant) = self.tenants.find_by_user(user_id).await? else {
            return Ok(Err("no tenant record for user".into()));
        };

        match tenant.property_id {
            Some(affiliated) if affiliated == property_id => Ok(Ok(AccessLevel::ReadOnly)),
            Some(affiliated) => Ok(Err(format!(
                "tenant is affiliated with property {affiliated}"
            ))),
            None => {
                // No denormalized affiliation: fall back to a lease on one of
                // this property's units that is active today.
                let active = self
                    .leases
                    .list_overlapping(property_id, DateWindow::day(today))
                    .await?
                    .into_iter()
                    .any(|lease| lease.tenant_id == tenant.id);
                if active {
                    Ok(Ok(AccessLevel::ReadOnly))
                } else {
                    Ok(Err("tenant has no active lease in the property".into()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_context_cannot_manage() {
        let ctx = RequestContext::new(
            PropertyId(4),
            Principal::Tenant(Uuid::new_v4()),
            AccessLevel::ReadOnly,
        );
        let err = ctx.require_manage().unwrap_err();
        assert_eq!(err.code(), "PROPERTY_ACCESS_DENIED");
    }

    #[test]
    fn manage_context_passes() {
        let ctx = RequestContext::new(
            PropertyId(4),
            Principal::Manager(Uuid::new_v4()),
            AccessLevel::Manage,
        );
        assert!(ctx.require_manage().is_ok());
        assert_eq!(ctx.property_id(), PropertyId(4));
    }
}
