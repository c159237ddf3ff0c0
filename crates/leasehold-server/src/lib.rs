//! Leasehold Server: the assembled, property-scoped services behind the
//! `leasehold` binary.

pub mod app;

pub use app::AppState;
