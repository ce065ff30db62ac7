//! Staged time predicates (§3, §4.1). `stage` is a total function over
//! `(now, timelocks, role)`; every escrow operation's precondition is a
//! membership test against its result, never a nested `if`.

use serde::{Deserialize, Serialize};

use crate::error::SwapError;
use crate::types::{Role, Timestamp};

/// The staged timelock structure for one swap. Both `src_*` and `dst_*`
/// stages are carried together because a single `OrderHash` governs both
/// legs; which half is consulted is selected by `Role`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Timelocks {
    pub src_withdrawal: Timestamp,
    pub src_public_withdrawal: Timestamp,
    pub src_cancellation: Timestamp,
    pub src_public_cancellation: Timestamp,
    pub dst_withdrawal: Timestamp,
    pub dst_public_withdrawal: Timestamp,
    pub dst_cancellation: Timestamp,
    pub dst_public_cancellation: Timestamp,
}

/// One of six half-open intervals partitioning time for a given role (P6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    PrePrivate,
    PrivateWithdrawal,
    PublicWithdrawal,
    PrivateCancellation,
    PublicCancellation,
    Post,
}

impl Timelocks {
    /// Validate the ordering invariant of §3: within each side the four
    /// stages are strictly increasing, and `dst_cancellation` is strictly
    /// earlier than `src_cancellation`.
    pub fn validate(&self, now: Timestamp) -> Result<(), SwapError> {
        let src_ok = self.src_withdrawal < self.src_public_withdrawal
            && self.src_public_withdrawal < self.src_cancellation
            && self.src_cancellation < self.src_public_cancellation;
        let dst_ok = self.dst_withdrawal < self.dst_public_withdrawal
            && self.dst_public_withdrawal < self.dst_cancellation
            && self.dst_cancellation < self.dst_public_cancellation;
        if !src_ok || !dst_ok {
            return Err(SwapError::InvalidTimeLock(
                "stage ordering violated within a side".into(),
            ));
        }
        if self.dst_cancellation >= self.src_cancellation {
            return Err(SwapError::InvalidTimeLock(
                "dst_cancellation must be strictly before src_cancellation".into(),
            ));
        }
        if self.src_withdrawal <= now {
            return Err(SwapError::InvalidTimeLock(
                "src_withdrawal must be in the future".into(),
            ));
        }
        Ok(())
    }

    /// The four stage boundaries for `role`, in order.
    fn boundaries(&self, role: Role) -> [Timestamp; 4] {
        match role {
            Role::Source => [
                self.src_withdrawal,
                self.src_public_withdrawal,
                self.src_cancellation,
                self.src_public_cancellation,
            ],
            Role::Destination => [
                self.dst_withdrawal,
                self.dst_public_withdrawal,
                self.dst_cancellation,
                self.dst_public_cancellation,
            ],
        }
    }

    /// Total function `stage: (now, timelocks) → Stage` for one role.
    /// Half-open: exactly at a boundary the *later* stage has begun.
    pub fn stage(&self, role: Role, now: Timestamp) -> Stage {
        let [withdrawal, public_withdrawal, cancellation, public_cancellation] =
            self.boundaries(role);
        if now < withdrawal {
            Stage::PrePrivate
        } else if now < public_withdrawal {
            Stage::PrivateWithdrawal
        } else if now < cancellation {
            Stage::PublicWithdrawal
        } else if now < public_cancellation {
            Stage::PrivateCancellation
        } else {
            Stage::PublicCancellation
        }
    }
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::PrePrivate => "pre-private",
            Stage::PrivateWithdrawal => "private-withdrawal",
            Stage::PublicWithdrawal => "public-withdrawal",
            Stage::PrivateCancellation => "private-cancellation",
            Stage::PublicCancellation => "public-cancellation",
            Stage::Post => "post",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Timelocks {
        Timelocks {
            src_withdrawal: 100,
            src_public_withdrawal: 200,
            src_cancellation: 300,
            src_public_cancellation: 400,
            dst_withdrawal: 50,
            dst_public_withdrawal: 150,
            dst_cancellation: 250,
            dst_public_cancellation: 350,
        }
    }

    #[test]
    fn validate_accepts_well_ordered_timelocks() {
        assert!(sample().validate(0).is_ok());
    }

    #[test]
    fn validate_rejects_dst_cancellation_not_before_src_cancellation() {
        let mut t = sample();
        t.dst_cancellation = t.src_cancellation;
        assert!(t.validate(0).is_err());
    }

    #[test]
    fn stage_boundaries_are_half_open() {
        let t = sample();
        assert_eq!(t.stage(Role::Source, 99), Stage::PrePrivate);
        assert_eq!(t.stage(Role::Source, 100), Stage::PrivateWithdrawal);
        assert_eq!(t.stage(Role::Source, 199), Stage::PrivateWithdrawal);
        assert_eq!(t.stage(Role::Source, 200), Stage::PublicWithdrawal);
        assert_eq!(t.stage(Role::Source, 300), Stage::PrivateCancellation);
        assert_eq!(t.stage(Role::Source, 400), Stage::PublicCancellation);
        assert_eq!(t.stage(Role::Source, 10_000), Stage::PublicCancellation);
    }

    #[test]
    fn validate_rejects_withdrawal_in_the_past() {
        let t = sample();
        assert!(t.validate(1_000).is_err());
    }
}
