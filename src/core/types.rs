//! Strongly-typed wrappers for game concepts
//!
//! Instead of using bare Strings for different concepts, we wrap them in
//! distinct types that cannot be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                $name(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

string_newtype!(
    /// Card subtype (creature type, land type, etc.)
    ///
    /// Examples: "Goblin", "Warrior", "Island"
    Subtype
);

string_newtype!(
    /// Card name (distinct from other string types)
    ///
    /// The legend rule and planeswalker uniqueness compare these exactly.
    CardName
);

string_newtype!(
    /// Player name (distinct from other string types)
    PlayerName
);

string_newtype!(
    /// Counter type (e.g., "+1/+1", "-1/-1", "loyalty")
    CounterType
);

string_newtype!(
    /// Identifier of an activated ability, unique on its source card
    ///
    /// Tracked per turn in a player's used-ability set.
    AbilityId
);

impl CounterType {
    pub fn plus_one_plus_one() -> Self {
        CounterType("+1/+1".to_string())
    }

    pub fn minus_one_minus_one() -> Self {
        CounterType("-1/-1".to_string())
    }
}

/// Identifier of a static card definition in the external card database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionId(pub u32);

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
