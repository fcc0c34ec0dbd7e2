//! Allocation strategies
//!
//! The strategy is a closed set, picked before a run starts and fixed until
//! it ends. Call sites in the manager branch on it in exactly two places:
//! how a pending request is granted, and which forks an aged request
//! reserves.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::ForkSet;
use crate::error::ConfigError;

/// Fork allocation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Acquire forks one at a time in ascending index order.
    ///
    /// No actor ever holds a higher fork while waiting for a lower one, so
    /// the wait-for graph can never close a cycle.
    #[default]
    Ordered,

    /// Acquire the whole set at once, only when the resulting state passes
    /// the banker's safety check.
    Banker,
}

impl Strategy {
    /// Numeric code for [`Strategy::Ordered`]
    pub const ORDERED_CODE: i32 = 0;
    /// Numeric code for [`Strategy::Banker`]
    pub const BANKER_CODE: i32 = 1;

    /// Parse a collaborator-facing strategy code
    ///
    /// # Errors
    /// `InvalidStrategyCode` for anything but `0` or `1`.
    pub fn from_code(code: i32) -> Result<Self, ConfigError> {
        match code {
            Self::ORDERED_CODE => Ok(Self::Ordered),
            Self::BANKER_CODE => Ok(Self::Banker),
            other => Err(ConfigError::InvalidStrategyCode(other)),
        }
    }

    /// Numeric code of this strategy
    pub const fn code(self) -> i32 {
        match self {
            Self::Ordered => Self::ORDERED_CODE,
            Self::Banker => Self::BANKER_CODE,
        }
    }

    /// Forks a pending request is currently blocked on.
    ///
    /// Ordered waiters only ever wait on the lowest outstanding fork (the
    /// ones above it are not contended yet); banker waiters wait on the whole
    /// outstanding set. Aging priority reserves exactly these forks.
    pub fn frontier(self, outstanding: &ForkSet) -> ForkSet {
        match self {
            Self::Ordered => outstanding.first().into_iter().collect(),
            Self::Banker => outstanding.clone(),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordered => f.write_str("ordered"),
            Self::Banker => f.write_str("banker"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resources::ForkId;

    #[test]
    fn test_codes_round_trip() {
        assert_eq!(Strategy::from_code(0).unwrap(), Strategy::Ordered);
        assert_eq!(Strategy::from_code(1).unwrap(), Strategy::Banker);
        assert_eq!(Strategy::Banker.code(), 1);
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(
            Strategy::from_code(7),
            Err(ConfigError::InvalidStrategyCode(7))
        );
        assert!(Strategy::from_code(-1).is_err());
    }

    #[test]
    fn test_frontier_by_strategy() {
        let outstanding: ForkSet = [ForkId(3), ForkId(1)].into_iter().collect();
        let ordered = Strategy::Ordered.frontier(&outstanding);
        assert_eq!(ordered.iter().collect::<Vec<_>>(), vec![ForkId(1)]);
        assert_eq!(Strategy::Banker.frontier(&outstanding), outstanding);
        assert!(Strategy::Ordered.frontier(&ForkSet::new()).is_empty());
    }
}
