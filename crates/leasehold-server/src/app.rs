//! Application state shared by every request.

use leasehold_auth::scope::establish;
use leasehold_auth::token::validate_access_token;
use leasehold_auth::{
    AuthConfig, ContextConfig, OperationInputs, OwnershipGuard, PropertyContextResolver,
    RequestContext,
};
use leasehold_core::error::{LeaseholdError, LeaseholdResult};
use leasehold_db::repository::{
    SurrealLeaseRepository, SurrealPropertyRepository, SurrealStaffRepository,
    SurrealTenantRepository, SurrealUnitRepository,
};
use leasehold_occupancy::{ChannelEventSink, OccupancyAggregator, TenancyLedger};
use surrealdb::{Connection, Surreal};

pub type Ledger<C> = TenancyLedger<
    SurrealUnitRepository<C>,
    SurrealTenantRepository<C>,
    SurrealLeaseRepository<C>,
    ChannelEventSink,
>;

pub type Aggregator<C> = OccupancyAggregator<SurrealUnitRepository<C>, SurrealLeaseRepository<C>>;

type Guard<C> = OwnershipGuard<
    SurrealPropertyRepository<C>,
    SurrealTenantRepository<C>,
    SurrealStaffRepository<C>,
    SurrealLeaseRepository<C>,
>;

pub struct AppState<C: Connection> {
    auth: Option<AuthConfig>,
    resolver: PropertyContextResolver<SurrealPropertyRepository<C>>,
    guard: Guard<C>,
    ledger: Ledger<C>,
    aggregator: Aggregator<C>,
}

impl<C: Connection> AppState<C> {
    /// Build every service over one store handle. Without `auth` no
    /// session token is accepted and [`AppState::scope`] always fails.
    pub fn new(
        db: Surreal<C>,
        context: ContextConfig,
        auth: Option<AuthConfig>,
        events: ChannelEventSink,
    ) -> Self {
        Self {
            auth,
            resolver: PropertyContextResolver::new(
                SurrealPropertyRepository::new(db.clone()),
                context,
            ),
            guard: OwnershipGuard::new(
                SurrealPropertyRepository::new(db.clone()),
                SurrealTenantRepository::new(db.clone()),
                SurrealStaffRepository::new(db.clone()),
                SurrealLeaseRepository::new(db.clone()),
            ),
            ledger: TenancyLedger::new(
                SurrealUnitRepository::new(db.clone()),
                SurrealTenantRepository::new(db.clone()),
                SurrealLeaseRepository::new(db.clone()),
                events,
            ),
            aggregator: OccupancyAggregator::new(
                SurrealUnitRepository::new(db.clone()),
                SurrealLeaseRepository::new(db),
            ),
        }
    }

    /// Verify the bearer token, then resolve and authorize the property
    /// the inputs name. Claims already present in `inputs` are replaced by
    /// the verified ones.
    pub async fn scope(
        &self,
        bearer: &str,
        mut inputs: OperationInputs,
    ) -> LeaseholdResult<RequestContext> {
        let auth = self
            .auth
            .as_ref()
            .ok_or_else(|| LeaseholdError::AuthenticationFailed {
                reason: "session tokens are not configured".into(),
            })?;
        let claims = validate_access_token(bearer, auth)?;
        let principal = claims.principal()?;
        inputs.claims = Some(claims);
        establish(&self.resolver, &self.guard, principal, &inputs).await
    }

    pub fn context_config(&self) -> &ContextConfig {
        self.resolver.config()
    }

    pub fn ledger(&self) -> &Ledger<C> {
        &self.ledger
    }

    pub fn aggregator(&self) -> &Aggregator<C> {
        &self.aggregator
    }
}
