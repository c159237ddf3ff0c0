//! SurrealDB repository implementations.

mod lease;
mod property;
mod staff;
mod tenant;
mod unit;

pub use lease::SurrealLeaseRepository;
pub use property::SurrealPropertyRepository;
pub use staff::SurrealStaffRepository;
pub use tenant::SurrealTenantRepository;
pub use unit::SurrealUnitRepository;
