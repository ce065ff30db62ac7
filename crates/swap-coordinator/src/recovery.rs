use std::sync::Arc;

use tracing::{info, warn};

use swap_chain::ChainClient;
use swap_core::error::SwapError;
use swap_core::journal::JournalState;
use swap_core::types::{OrderHash, Role};
use swap_state::StateDb;

/// §4.8(f): on startup, replay the journal; for each non-terminal entry,
/// query both chains' current on-chain state and jump the in-memory
/// understanding directly to the appropriate node, so the dispatcher never
/// re-issues an already-applied effect once events resume flowing.
///
/// Returns the `OrderHash`es recovery found in-flight, so `main.rs` can
/// pre-seed a worker (and its queue) for each before subscribing to new
/// chain events.
pub async fn recover(
    db: &Arc<StateDb>,
    source: &Arc<dyn ChainClient>,
    destination: &Arc<dyn ChainClient>,
) -> Result<Vec<OrderHash>, SwapError> {
    let entries = db.iter_non_terminal_journal()?;
    info!(count = entries.len(), "recovering in-flight orders from journal");

    let mut recovered = Vec::new();
    for entry in entries {
        let order_hash = entry.order_hash;
        let src_id = swap_crypto::escrow_id(&order_hash, Role::Source, 0);
        let dst_id = swap_crypto::escrow_id(&order_hash, Role::Destination, 0);

        let src_escrow = source.query_escrow(src_id).await.ok().flatten();
        let dst_escrow = destination.query_escrow(dst_id).await.ok().flatten();

        let observed_state = match (entry.state, &src_escrow, &dst_escrow, &entry.preimage) {
            (state, _, _, _) if state.is_terminal() => state,
            (_, Some(s), _, _) if s.revealed_preimage.is_some() => JournalState::PreimageKnown,
            (_, _, Some(d), _) if d.revealed_preimage.is_some() => JournalState::PreimageKnown,
            (_, _, _, Some(_)) => JournalState::PreimageKnown,
            (_, _, Some(_), _) => JournalState::DestinationInitiated,
            (state, _, _, _) => state,
        };

        if observed_state != entry.state {
            info!(%order_hash, from = ?entry.state, to = ?observed_state, "recovery advanced journal");
            let mut updated = entry.clone();
            updated.state = observed_state;
            if let Err(e) = db.put_journal(&updated) {
                warn!(%order_hash, error = %e, "failed to persist recovered journal entry");
            }
        }

        if !observed_state.is_terminal() {
            recovered.push(order_hash);
        }
    }

    Ok(recovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_chain::MockChainClient;
    use swap_core::escrow::{Escrow, EscrowStatus};
    use swap_core::timelock::Timelocks;
    use swap_core::types::{Address, OrderHash};
    use swap_crypto::{generate_preimage, lock};

    fn temp_db(name: &str) -> Arc<StateDb> {
        let dir = std::env::temp_dir().join(format!("swap_coordinator_recovery_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        Arc::new(StateDb::open(&dir).expect("open temp db"))
    }

    fn sample_timelocks(now: i64) -> Timelocks {
        Timelocks {
            src_withdrawal: now + 10,
            src_public_withdrawal: now + 20,
            src_cancellation: now + 30,
            src_public_cancellation: now + 40,
            dst_withdrawal: now + 10,
            dst_public_withdrawal: now + 20,
            dst_cancellation: now + 30,
            dst_public_cancellation: now + 40,
        }
    }

    #[tokio::test]
    async fn advances_to_destination_initiated_when_destination_escrow_exists() {
        let db = temp_db("dst_exists");
        let order_hash = OrderHash([3u8; 32]);
        db.put_journal(&JournalEntry::new(order_hash, 0)).unwrap();

        let source: Arc<dyn ChainClient> = Arc::new(MockChainClient::new(Role::Source, 0));
        let destination_mock = Arc::new(MockChainClient::new(Role::Destination, 0));
        let destination: Arc<dyn ChainClient> = destination_mock.clone();

        let dst_id = swap_crypto::escrow_id(&order_hash, Role::Destination, 0);
        let preimage = generate_preimage();
        let hashlock = lock(&preimage);
        destination_mock
            .submit_create_escrow(
                dst_id,
                Address(vec![1]),
                Address::null(),
                true,
                100,
                5,
                hashlock,
                sample_timelocks(0),
            )
            .await
            .unwrap();

        let recovered = recover(&db, &source, &destination).await.unwrap();
        assert_eq!(recovered, vec![order_hash]);
        let entry = db.get_journal(&order_hash).unwrap().unwrap();
        assert_eq!(entry.state, JournalState::DestinationInitiated);
    }

    #[tokio::test]
    async fn advances_to_preimage_known_when_an_escrow_reveals_it() {
        let db = temp_db("preimage_known");
        let order_hash = OrderHash([4u8; 32]);
        db.put_journal(&JournalEntry::new(order_hash, 0)).unwrap();

        let source_mock = Arc::new(MockChainClient::new(Role::Source, 0));
        let source: Arc<dyn ChainClient> = source_mock.clone();
        let destination: Arc<dyn ChainClient> = Arc::new(MockChainClient::new(Role::Destination, 0));

        let src_id = swap_crypto::escrow_id(&order_hash, Role::Source, 0);
        let preimage = generate_preimage();
        let hashlock = lock(&preimage);
        source_mock.seed_escrow(Escrow {
            id: src_id,
            order_hash,
            role: Role::Source,
            maker: Address(vec![1]),
            taker: Address::null(),
            native: true,
            token: None,
            total_amount: 100,
            remaining_amount: 0,
            hashlock,
            timelocks: sample_timelocks(0),
            safety_deposit: 5,
            deployed_at: 0,
            status: EscrowStatus::Filled,
            revealed_preimage: Some(preimage),
            external_order_ref: String::new(),
        });

        let recovered = recover(&db, &source, &destination).await.unwrap();
        assert_eq!(recovered, vec![order_hash]);
        let entry = db.get_journal(&order_hash).unwrap().unwrap();
        assert_eq!(entry.state, JournalState::PreimageKnown);
    }

    #[tokio::test]
    async fn leaves_terminal_entries_alone() {
        let db = temp_db("terminal");
        let order_hash = OrderHash([5u8; 32]);
        let mut entry = JournalEntry::new(order_hash, 0);
        entry.state = JournalState::Completed;
        db.put_journal(&entry).unwrap();

        let source: Arc<dyn ChainClient> = Arc::new(MockChainClient::new(Role::Source, 0));
        let destination: Arc<dyn ChainClient> = Arc::new(MockChainClient::new(Role::Destination, 0));

        // Completed entries never surface from `iter_non_terminal_journal`,
        // so recovery should find nothing to do here.
        let recovered = recover(&db, &source, &destination).await.unwrap();
        assert!(recovered.is_empty());
    }
}
