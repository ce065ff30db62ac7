//! Protocol-wide constants, grouped the way the teacher's
//! `chronx_core::constants` groups them.

use crate::types::Amount;

// ── Fixed-point math ────────────────────────────────────────────────────────

/// Dutch-auction rates and `taking` amounts are 18-decimal fixed point.
pub const RATE_DECIMALS: u32 = 18;
pub const RATE_ONE: u128 = 10u128.pow(RATE_DECIMALS);

// ── Resolver registry bounds (§4.5) ─────────────────────────────────────────

pub const MIN_STAKE: Amount = 1_000_000_000_000; // 1e12
pub const MAX_STAKE: Amount = 1_000_000_000_000_000_000_000; // 1e21

pub const MIN_REPUTATION: u32 = 100;
pub const MAX_REPUTATION: u32 = 1000;

/// Reputation deltas on a successful fill (§4.5).
pub const REPUTATION_BASE_GAIN: u32 = 1;
pub const REPUTATION_VOLUME_BONUS_1X: u32 = 2;
pub const REPUTATION_VOLUME_BONUS_10X: u32 = 5;
pub const REPUTATION_GOOD_RATE_BONUS: u32 = 3;

/// "1 unit of the native bound" for the volume-bonus tiers, expressed in the
/// same base unit as `Amount` (analogous to the teacher's `CHRONOS_PER_KX`).
pub const NATIVE_UNIT: Amount = 1_000_000_000_000_000_000; // 1e18

// ── Auction window bounds (§4.4) ────────────────────────────────────────────

pub const MIN_AUCTION_DURATION_SECS: i64 = 5 * 60; // 5 minutes
pub const MAX_AUCTION_DURATION_SECS: i64 = 24 * 60 * 60; // 24 hours

// ── Escrow policy ────────────────────────────────────────────────────────────

/// Minimum safety deposit accepted by `create` (§4.2), expressed as a fixed
/// floor rather than a fraction of amount — keeps dust escrows from being
/// economically un-rescuable.
pub const MIN_SAFETY_DEPOSIT: Amount = 1_000_000_000; // 1e9

/// Delay after which `rescue` becomes callable on an escrow (§4.2).
pub const RESCUE_DELAY_SECS: i64 = 30 * 24 * 60 * 60; // 30 days

// ── Coordinator ──────────────────────────────────────────────────────────────

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 8;

/// Spacing between successive timelock stage boundaries when the
/// coordinator derives destination-side `Timelocks` itself (§4.8(c)) rather
/// than receiving them from the maker. `dst_cancellation` is placed at 2.5
/// steps so it always lands strictly before `src_cancellation` at 3 steps
/// (§3's ordering invariant).
pub const DEFAULT_TIMELOCK_STEP_SECS: i64 = 30 * 60; // 30 minutes
