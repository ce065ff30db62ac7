use swap_core::error::SwapError;
use swap_core::order::{compute_taking, dutch_auction_rate};
use swap_core::types::{Amount, OrderHash, Timestamp};
use swap_state::StateDb;
use tracing::debug;

/// Read-only query layer over the Dutch-auction limit-order protocol
/// (C4/C6). The create/fill/cancel mutations live in
/// `swap_state::engine::SwapEngine`; this crate only re-derives the
/// pricing function against whatever the engine has already committed.
pub struct AuctionQuery<'a> {
    db: &'a StateDb,
}

impl<'a> AuctionQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    /// The rate a `fill` submitted right now would be charged (§4.4). Never
    /// influenced by `bid_log` — bids are advisory only.
    pub fn current_rate(&self, order_hash: &OrderHash, now: Timestamp) -> Result<u128, SwapError> {
        let order = self
            .db
            .get_order(order_hash)?
            .ok_or_else(|| SwapError::OrderNotFound(order_hash.to_hex()))?;
        Ok(dutch_auction_rate(&order.auction_config, now))
    }

    /// The `taking` amount a fill of `amount` would charge right now.
    pub fn quote(
        &self,
        order_hash: &OrderHash,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, SwapError> {
        let rate = self.current_rate(order_hash, now)?;
        let taking = compute_taking(amount, rate);
        debug!(%order_hash, amount, rate, taking, "quoted fill");
        Ok(taking)
    }

    /// Human-readable summary of an order's current auction state.
    pub fn describe(&self, order_hash: &OrderHash, now: Timestamp) -> Result<String, SwapError> {
        let order = self
            .db
            .get_order(order_hash)?
            .ok_or_else(|| SwapError::OrderNotFound(order_hash.to_hex()))?;
        let rate = dutch_auction_rate(&order.auction_config, now);

        let status = if !order.active {
            "inactive (filled or cancelled)".to_string()
        } else if now < order.auction_config.start_time {
            "pending — auction not yet started".to_string()
        } else if now >= order.auction_config.end_time {
            "auction ended — resting at end_rate".to_string()
        } else {
            format!("auction live — current rate {rate}")
        };

        Ok(format!(
            "Order {} | {}/{} remaining | rate {} | {}",
            &order_hash.to_hex()[..16],
            order.remaining_source_amount,
            order.source_amount,
            rate,
            status,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_core::order::AuctionConfig;
    use swap_core::types::{Address, HashLock};
    use swap_core::Action;
    use swap_state::SwapEngine;
    use std::sync::Arc;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("swap_auction_query_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    #[test]
    fn rate_decays_linearly_between_start_and_end() {
        let db = Arc::new(temp_db("decay"));
        let engine = SwapEngine::new(db.clone(), Address(vec![0]));
        let order_hash = match engine
            .apply(
                &Action::CreateOrder {
                    maker: Address(vec![1]),
                    source_amount: 1_000,
                    destination_amount: 2_000,
                    native: true,
                    chain_id: 1,
                    deadline: 10_000,
                    auction_config: AuctionConfig {
                        start_time: 0,
                        end_time: 1_000,
                        start_rate: 2_000_000_000_000_000_000,
                        end_rate: 1_000_000_000_000_000_000,
                    },
                    destination_chain_id: 2,
                    timelock_duration_secs: 600,
                    destination_address: Address(vec![9]),
                    secret_hash: HashLock([7u8; 32]),
                },
                0,
            )
            .unwrap()
        {
            swap_state::ActionOutcome::OrderCreated { order_hash } => order_hash,
            _ => panic!("expected OrderCreated"),
        };

        let query = AuctionQuery::new(&db);
        let early = query.current_rate(&order_hash, 0).unwrap();
        let mid = query.current_rate(&order_hash, 500).unwrap();
        let late = query.current_rate(&order_hash, 1_000).unwrap();
        assert!(early > mid && mid > late);
    }
}
