//! Leasehold Auth: session token issuance/validation, property context
//! resolution and the ownership guard that produces a [`RequestContext`].
//!
//! The pipeline for every property-scoped operation is
//! [`PropertyContextResolver::resolve`] → mismatch check →
//! [`OwnershipGuard::authorize`], wrapped up by [`establish`].

pub mod config;
pub mod context;
pub mod error;
pub mod guard;
pub mod scope;
pub mod token;

pub use config::{AuthConfig, ContextConfig};
pub use context::{ContextSource, OperationInputs, PropertyContextResolver, ResolvedProperty};
pub use error::AuthError;
pub use guard::{AccessLevel, OwnershipGuard, RequestContext};
pub use scope::establish;
pub use token::{AccessTokenClaims, ValidatedClaims};
