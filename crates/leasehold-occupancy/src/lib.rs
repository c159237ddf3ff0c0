//! Leasehold Occupancy: the tenancy ledger that binds tenants to units
//! over date ranges, the occupancy aggregator built on top of it, and
//! the lease lifecycle events the ledger publishes.
//!
//! Everything here takes a [`RequestContext`](leasehold_auth::RequestContext)
//! and only ever touches the property it names.

pub mod aggregate;
pub mod events;
pub mod ledger;

pub use aggregate::{
    MonthlyOccupancy, OccupancyAggregator, OccupancyFigures, OccupancySummary, occupancy_rate,
};
pub use events::{ChannelEventSink, EventError, LeaseEvent, LeaseEventSink, TracingEventSink};
pub use ledger::TenancyLedger;
