//! Integer record identifiers.
//!
//! Properties, units, tenants and leases are keyed by positive integers
//! allocated by the store. Each gets its own newtype so a unit id can
//! never be passed where a property id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

record_id!(
    /// Identifier of a [`Property`](super::property::Property).
    PropertyId
);
record_id!(
    /// Identifier of a [`Unit`](super::unit::Unit).
    UnitId
);
record_id!(
    /// Identifier of a [`Tenant`](super::tenant::Tenant).
    TenantId
);
record_id!(
    /// Identifier of a [`Lease`](super::lease::Lease) (tenant-unit assignment).
    LeaseId
);

impl PropertyId {
    /// Parse a property identifier from an untrusted signal.
    ///
    /// Accepts a base-10 integer greater than zero, surrounded by optional
    /// whitespace. Anything else is not a well-formed identifier.
    pub fn parse_signal(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_signal_accepts_positive_integers() {
        assert_eq!(PropertyId::parse_signal("42"), Some(PropertyId(42)));
        assert_eq!(PropertyId::parse_signal(" 7 "), Some(PropertyId(7)));
    }

    #[test]
    fn parse_signal_rejects_malformed_values() {
        assert_eq!(PropertyId::parse_signal(""), None);
        assert_eq!(PropertyId::parse_signal("0"), None);
        assert_eq!(PropertyId::parse_signal("-3"), None);
        assert_eq!(PropertyId::parse_signal("7a"), None);
        assert_eq!(PropertyId::parse_signal("all"), None);
        assert_eq!(PropertyId::parse_signal("3.5"), None);
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&UnitId(12)).unwrap();
        assert_eq!(json, "12");
    }
}
