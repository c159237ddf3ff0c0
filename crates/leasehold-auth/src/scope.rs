//! Establishing the scope of an operation.

use leasehold_core::error::{LeaseholdError, LeaseholdResult};
use leasehold_core::models::principal::Principal;
use leasehold_core::repository::{
    LeaseRepository, PropertyRepository, StaffRepository, TenantRepository,
};
use tracing::warn;

use crate::context::{OperationInputs, PropertyContextResolver};
use crate::guard::{OwnershipGuard, RequestContext};

/// Resolve the property for `inputs`, reject explicit signals that
/// contradict the session claim, then authorize `principal`.
///
/// This is the only path from raw inputs to a [`RequestContext`].
pub async fn establish<R, P, T, S, L>(
    resolver: &PropertyContextResolver<R>,
    guard: &OwnershipGuard<P, T, S, L>,
    principal: Principal,
    inputs: &OperationInputs,
) -> LeaseholdResult<RequestContext>
where
    R: PropertyRepository,
    P: PropertyRepository,
    T: TenantRepository,
    S: StaffRepository,
    L: LeaseRepository,
{
    let Some(resolved) = resolver.resolve(inputs).await? else {
        warn!(
            user_id = %principal.user_id(),
            role = principal.role(),
            "No property context for operation"
        );
        return Err(LeaseholdError::PropertyContextRequired);
    };

    if resolved.source.is_explicit() {
        let derived = inputs.claims.as_ref().and_then(|c| c.property_id());
        if let Some(derived) = derived.filter(|d| *d != resolved.property_id) {
            warn!(
                user_id = %principal.user_id(),
                explicit = %resolved.property_id,
                derived = %derived,
                source = ?resolved.source,
                "Explicit property signal contradicts session claim"
            );
            return Err(LeaseholdError::PropertyMismatch {
                explicit: resolved.property_id,
                derived,
            });
        }
    }

    guard.authorize(principal, resolved.property_id).await
}
