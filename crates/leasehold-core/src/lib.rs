//! Leasehold Core: domain models, the error taxonomy and repository
//! traits shared by the storage, authorization and occupancy crates.

pub mod error;
pub mod models;
pub mod money;
pub mod repository;

pub use error::{LeaseholdError, LeaseholdResult};
