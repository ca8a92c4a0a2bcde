use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID-backed identifier newtype.
///
/// Each identifier gets its own type so a plot id can never be passed where a
/// species id is expected, while sharing the same wire form (a plain UUID string).
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Identifies a user: a sponsor on the reservation side, a wallet owner on the payment side.
    UserId
);

uuid_id!(
    /// Identifies a tree species in the catalog.
    SpeciesId
);

uuid_id!(
    /// Identifies a plot of land with finite planting capacity.
    PlotId
);

uuid_id!(
    /// Identifies an adoption intent (one attempt of the adoption saga).
    IntentId
);

uuid_id!(
    /// Identifies a materialized tree.
    TreeId
);

uuid_id!(
    /// Identifies an entry in a tree's care log.
    LogEntryId
);

uuid_id!(
    /// Identifies a payment transaction. Doubles as the invoice external id.
    TransactionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(IntentId::new(), IntentId::new());
    }

    #[test]
    fn parse_accepts_uuid_and_trims_whitespace() {
        let uuid = Uuid::new_v4();
        let parsed: PlotId = format!(" {uuid} ").parse().unwrap();
        assert_eq!(parsed.as_uuid(), uuid);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!("not-a-uuid".parse::<SpeciesId>().is_err());
        assert!("".parse::<TransactionId>().is_err());
    }

    #[test]
    fn serializes_as_plain_uuid_string() {
        let id = TransactionId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}
