//! Resolver registry entity (§3, §4.5). The authorization predicate is a
//! single pure function over a tagged variant, per the design note in §9,
//! mirroring the teacher's `ProviderStatus` shape.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_REPUTATION;
use crate::types::{Address, Amount, Timestamp};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resolver {
    pub address: Address,
    pub stake: Amount,
    pub reputation: u32,
    pub authorized: bool,
    pub total_fills: u64,
    pub total_volume: Amount,
    pub last_active: Option<Timestamp>,
}

/// Tagged authorization state, per the design note in §9. `Resolver`'s
/// stored fields are the source of truth; this is a derived view used by
/// the single authorization predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolverAuthorization {
    Unregistered,
    Registered { stake: Amount, reputation: u32, authorized: bool },
    Penalized { stake: Amount, reputation: u32 },
}

impl Resolver {
    pub fn authorization(&self) -> ResolverAuthorization {
        if self.reputation < MIN_REPUTATION {
            ResolverAuthorization::Penalized {
                stake: self.stake,
                reputation: self.reputation,
            }
        } else {
            ResolverAuthorization::Registered {
                stake: self.stake,
                reputation: self.reputation,
                authorized: self.authorized,
            }
        }
    }

    /// Single pure predicate: authorized iff the flag is set AND reputation
    /// is at least the floor (§3).
    pub fn is_authorized(&self) -> bool {
        matches!(
            self.authorization(),
            ResolverAuthorization::Registered { authorized: true, .. }
        )
    }
}

impl ResolverAuthorization {
    pub fn from_optional(resolver: Option<&Resolver>) -> Self {
        match resolver {
            None => ResolverAuthorization::Unregistered,
            Some(r) => r.authorization(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Resolver {
        Resolver {
            address: Address(vec![1]),
            stake: 1_000_000_000_000,
            reputation: 500,
            authorized: true,
            total_fills: 0,
            total_volume: 0,
            last_active: None,
        }
    }

    #[test]
    fn authorized_when_flag_set_and_reputation_sufficient() {
        assert!(base().is_authorized());
    }

    #[test]
    fn not_authorized_when_reputation_below_floor() {
        let mut r = base();
        r.reputation = MIN_REPUTATION - 1;
        assert!(!r.is_authorized());
        assert!(matches!(r.authorization(), ResolverAuthorization::Penalized { .. }));
    }

    #[test]
    fn not_authorized_when_flag_unset() {
        let mut r = base();
        r.authorized = false;
        assert!(!r.is_authorized());
    }
}
