//! Authentication error types.

use leasehold_core::error::LeaseholdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for LeaseholdError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired | AuthError::TokenInvalid(_) | AuthError::UnknownRole(_) => {
                LeaseholdError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::Crypto(msg) => LeaseholdError::Internal(format!("cryptography: {msg}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_are_authentication_failures() {
        let err: LeaseholdError = AuthError::TokenExpired.into();
        assert_eq!(err.code(), "AUTHENTICATION_FAILED");
        let err: LeaseholdError = AuthError::UnknownRole("admin".into()).into();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn crypto_failure_is_internal() {
        let err: LeaseholdError = AuthError::Crypto("bad key".into()).into();
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
