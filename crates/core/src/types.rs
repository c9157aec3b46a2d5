use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! newtype_u64 {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create a new id from a raw numeric value.
            #[must_use]
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Return the raw numeric value.
            #[must_use]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

macro_rules! newtype_string_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an id from an existing string value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a fresh UUID-v4 id.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Return the inner string as a str slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_u64!(AccountId, "An advertising account (cabinet) identifier.");
newtype_u64!(BannerId, "An individual ad creative identifier.");
newtype_u64!(AdGroupId, "An ad group identifier (the unit of budgets and duplication).");
newtype_u64!(CampaignId, "A campaign identifier.");
newtype_u64!(EntityId, "A generic entity identifier: the banner or ad group a rule acted on.");

newtype_string_id!(RuleId, "A unique rule identifier.");
newtype_string_id!(RunId, "A unique rule-run identifier.");

impl From<BannerId> for EntityId {
    fn from(id: BannerId) -> Self {
        Self(id.0)
    }
}

impl From<AdGroupId> for EntityId {
    fn from(id: AdGroupId) -> Self {
        Self(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_id_roundtrip() {
        let id = BannerId::new(42);
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: BannerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn numeric_ids_order() {
        let a = AdGroupId::new(1);
        let b = AdGroupId::new(2);
        assert!(a < b);
    }

    #[test]
    fn generated_rule_ids_are_unique() {
        let a = RuleId::generate();
        let b = RuleId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn string_id_serde_roundtrip() {
        let id = RunId::new("run-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"run-123\"");
        let back: RunId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn entity_id_from_banner_and_group() {
        let banner = BannerId::new(7);
        let group = AdGroupId::new(7);
        assert_eq!(EntityId::from(banner), EntityId::from(group));
    }
}
