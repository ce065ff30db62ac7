//! Order and cross-chain façade data model (§3, §4.6, §4.7).

use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, ChainId, HashLock, OrderHash, Timestamp};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AuctionConfig {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// 18-decimal fixed point.
    pub start_rate: u128,
    /// 18-decimal fixed point.
    pub end_rate: u128,
}

/// Advisory bid metadata (§4.4) — never influences the rate function.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BidLog {
    pub highest_bidder: Option<Address>,
    pub highest_amount: Amount,
    pub last_bid_at: Option<Timestamp>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrossChainConfig {
    pub destination_chain_id: ChainId,
    pub destination_chain_order_handle: Option<String>,
    pub timelock_duration_secs: i64,
    pub destination_address: Address,
    pub secret_hash: HashLock,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub order_hash: OrderHash,
    pub maker: Address,
    pub source_amount: Amount,
    pub destination_amount: Amount,
    pub remaining_source_amount: Amount,
    pub remaining_destination_amount: Amount,
    pub deadline: Timestamp,
    pub native: bool,
    pub chain_id: ChainId,
    pub nonce: u64,
    pub auction_config: AuctionConfig,
    pub cross_chain_config: CrossChainConfig,
    pub bid_log: BidLog,
    pub active: bool,
    pub created_at: Timestamp,
    pub total_fills: u32,
}

impl Order {
    /// §4.6 invariants checked at `create` time.
    pub fn validate_config(auction: &AuctionConfig, deadline: Timestamp) -> Result<(), String> {
        if auction.end_time <= auction.start_time {
            return Err("auction_end must be after auction_start".into());
        }
        if auction.start_rate <= auction.end_rate {
            return Err("start_rate must be strictly greater than end_rate".into());
        }
        if deadline < auction.end_time {
            return Err("deadline must be at or after auction_end".into());
        }
        Ok(())
    }

    pub fn is_fully_filled(&self) -> bool {
        self.remaining_source_amount == 0
    }
}

/// Dutch-auction rate at time `t` (§4.4). Pure and total; lives in
/// `swap-core` rather than `swap-auction` so that both the mutation engine
/// (`swap-state`, which must re-derive the rate at fill time and cannot
/// depend on the query crate) and `swap-auction`'s read-only service layer
/// can share one implementation.
pub fn dutch_auction_rate(config: &AuctionConfig, now: Timestamp) -> u128 {
    if now < config.start_time {
        return config.start_rate;
    }
    if now >= config.end_time {
        return config.end_rate;
    }
    let elapsed = (now - config.start_time) as u128;
    let span = (config.end_time - config.start_time) as u128;
    let decay = config.start_rate - config.end_rate;
    // Floor rounding, per §4.4.
    config.start_rate - (decay * elapsed) / span
}

/// `taking = floor(amount * rate / 1e18)` (§4.6).
pub fn compute_taking(amount: Amount, rate: u128) -> Amount {
    (amount * rate) / crate::constants::RATE_ONE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuctionConfig {
        AuctionConfig {
            start_time: 1_000,
            end_time: 2_000,
            start_rate: 2_000_000_000_000_000_000,
            end_rate: 1_000_000_000_000_000_000,
        }
    }

    #[test]
    fn rate_before_start_is_start_rate() {
        assert_eq!(dutch_auction_rate(&config(), 500), config().start_rate);
    }

    #[test]
    fn rate_after_end_is_end_rate() {
        assert_eq!(dutch_auction_rate(&config(), 5_000), config().end_rate);
        assert_eq!(dutch_auction_rate(&config(), 2_000), config().end_rate);
    }

    #[test]
    fn rate_is_non_increasing_midway() {
        let c = config();
        let r1 = dutch_auction_rate(&c, 1_200);
        let r2 = dutch_auction_rate(&c, 1_800);
        assert!(r1 >= r2);
        assert!(r1 <= c.start_rate && r1 >= c.end_rate);
    }

    #[test]
    fn s1_scenario_rate_at_t0_plus_1950() {
        // S1: auction [t0+300, t0+3900], start 2e18, end 1e18, fill at t0+1950.
        let c = AuctionConfig {
            start_time: 300,
            end_time: 3_900,
            start_rate: 2_000_000_000_000_000_000,
            end_rate: 1_000_000_000_000_000_000,
        };
        let rate = dutch_auction_rate(&c, 1_950);
        // Expected 1.5e18 +/- floor rounding by 1.
        let expected = 1_500_000_000_000_000_000u128;
        assert!(rate.abs_diff(expected) <= 1);
    }
}
