//! Authentication and context-resolution configuration.

/// Configuration for session token issuance and verification.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for JWT signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for JWT verification.
    pub jwt_public_key_pem: String,
    /// Access token lifetime in seconds (default: 900 = 15 minutes).
    pub access_token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            access_token_lifetime_secs: 900,
            jwt_issuer: "leasehold".into(),
        }
    }
}

/// Names of the inbound property signals and the portal domain used for
/// origin-label matching.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Trusted header carrying an explicit property id.
    pub header_name: String,
    /// Query parameter carrying a property id.
    pub query_param: String,
    /// Top-level JSON body field carrying a property id.
    pub body_field: String,
    /// Base domain under which each property portal is a direct
    /// sub-domain (`<label>.<base>`).
    pub portal_base_domain: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            header_name: "X-Property-ID".into(),
            query_param: "property_id".into(),
            body_field: "property_id".into(),
            portal_base_domain: "localhost".into(),
        }
    }
}
