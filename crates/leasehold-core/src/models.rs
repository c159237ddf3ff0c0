//! Domain models for Leasehold.
//!
//! These are the core types shared across all crates.

pub mod ids;
pub mod lease;
pub mod principal;
pub mod property;
pub mod staff;
pub mod tenant;
pub mod unit;
