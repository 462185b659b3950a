use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ContextId);
id_newtype!(TurnId);
id_newtype!(FlagId);
id_newtype!(SessionId);

/// Profile identifiers. `0` is the reserved global/wildcard profile — see
/// the Open Question resolution in DESIGN.md: read paths match the active
/// profile *or* the global profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub i64);

impl ProfileId {
    pub const GLOBAL: ProfileId = ProfileId(0);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub const fn is_global(self) -> bool {
        self.0 == 0
    }

    /// `true` if `self` is the active profile or the global wildcard.
    pub fn matches_active(self, active: ProfileId) -> bool {
        self.is_global() || self == active
    }
}

impl From<i64> for ProfileId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_profile_matches_any_active_profile() {
        assert!(ProfileId::GLOBAL.matches_active(ProfileId::new(42)));
        assert!(ProfileId::new(42).matches_active(ProfileId::new(42)));
        assert!(!ProfileId::new(7).matches_active(ProfileId::new(42)));
    }
}
