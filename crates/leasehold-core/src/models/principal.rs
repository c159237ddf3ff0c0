//! The acting principal of an operation.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of principal kinds the authorization layer knows about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "role", content = "user_id", rename_all = "lowercase")]
pub enum Principal {
    Manager(Uuid),
    Tenant(Uuid),
    Staff(Uuid),
}

impl Principal {
    /// Build a principal from the `role` claim of a session token.
    pub fn from_role(role: &str, user_id: Uuid) -> Option<Self> {
        match role.trim().to_ascii_lowercase().as_str() {
            "manager" | "property_manager" => Some(Self::Manager(user_id)),
            "tenant" => Some(Self::Tenant(user_id)),
            "staff" => Some(Self::Staff(user_id)),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Uuid {
        match self {
            Self::Manager(id) | Self::Tenant(id) | Self::Staff(id) => *id,
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Self::Manager(_) => "manager",
            Self::Tenant(_) => "tenant",
            Self::Staff(_) => "staff",
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role(), self.user_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_claim_name() {
        let id = Uuid::new_v4();
        for principal in [
            Principal::Manager(id),
            Principal::Tenant(id),
            Principal::Staff(id),
        ] {
            assert_eq!(Principal::from_role(principal.role(), id), Some(principal));
        }
    }

    #[test]
    fn legacy_manager_role_is_accepted() {
        let id = Uuid::new_v4();
        assert_eq!(
            Principal::from_role("Property_Manager", id),
            Some(Principal::Manager(id))
        );
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert_eq!(Principal::from_role("admin", Uuid::new_v4()), None);
    }
}
