//! Error types for the Leasehold system.
//!
//! Every variant carries a stable machine-readable code (see
//! [`LeaseholdError::code`]) that the routing layer surfaces to callers.

use thiserror::Error;

use crate::models::ids::PropertyId;

#[derive(Debug, Error)]
pub enum LeaseholdError {
    /// No usable property signal was found for the operation.
    #[error("Property context is required")]
    PropertyContextRequired,

    #[error("Property not found: {0}")]
    PropertyNotFound(PropertyId),

    /// Ownership or affiliation mismatch, or insufficient access level.
    #[error("Property access denied: {reason}")]
    PropertyAccessDenied { reason: String },

    /// An explicitly supplied property id conflicts with the one carried
    /// by the signed session claim.
    #[error("Property mismatch: explicit {explicit} conflicts with session {derived}")]
    PropertyMismatch {
        explicit: PropertyId,
        derived: PropertyId,
    },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// Overlapping assignment, concurrent termination race, or a
    /// store-level write conflict.
    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LeaseholdError {
    /// Stable result code exposed to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PropertyContextRequired => "PROPERTY_CONTEXT_REQUIRED",
            Self::PropertyNotFound(_) => "PROPERTY_NOT_FOUND",
            Self::PropertyAccessDenied { .. } => "PROPERTY_ACCESS_DENIED",
            Self::PropertyMismatch { .. } => "PROPERTY_MISMATCH",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::AuthenticationFailed { .. } => "AUTHENTICATION_FAILED",
            Self::Database(_) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP-equivalent status for the routing layer.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::PropertyContextRequired
            | Self::PropertyMismatch { .. }
            | Self::Validation { .. } => 400,
            Self::AuthenticationFailed { .. } => 401,
            Self::PropertyAccessDenied { .. } => 403,
            Self::PropertyNotFound(_) | Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Whether the failure may succeed on a retry. Only store errors
    /// qualify; authorization and context failures are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type LeaseholdResult<T> = Result<T, LeaseholdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_codes_are_stable() {
        assert_eq!(
            LeaseholdError::PropertyContextRequired.code(),
            "PROPERTY_CONTEXT_REQUIRED"
        );
        assert_eq!(
            LeaseholdError::PropertyNotFound(PropertyId(3)).code(),
            "PROPERTY_NOT_FOUND"
        );
        assert_eq!(
            LeaseholdError::PropertyAccessDenied {
                reason: "x".into()
            }
            .code(),
            "PROPERTY_ACCESS_DENIED"
        );
        assert_eq!(
            LeaseholdError::PropertyMismatch {
                explicit: PropertyId(1),
                derived: PropertyId(2),
            }
            .code(),
            "PROPERTY_MISMATCH"
        );
    }

    #[test]
    fn only_store_errors_are_transient() {
        assert!(LeaseholdError::Database("timeout".into()).is_transient());
        assert!(!LeaseholdError::PropertyContextRequired.is_transient());
        assert!(
            !LeaseholdError::PropertyAccessDenied {
                reason: "owner".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn denial_maps_to_forbidden() {
        let err = LeaseholdError::PropertyAccessDenied {
            reason: "not owner".into(),
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(LeaseholdError::PropertyContextRequired.status_code(), 400);
    }
}
