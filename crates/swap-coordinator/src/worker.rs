use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{info, warn};

use swap_chain::{ChainClient, ChainEvent};
use swap_core::constants::DEFAULT_RETRY_BASE_DELAY_MS;
use swap_core::error::SwapError;
use swap_core::journal::{JournalEntry, JournalState, LogRecord};
use swap_core::timelock::Stage;
use swap_core::types::{Address, EscrowId, HashLock, OrderHash, Preimage, Role};
use swap_crypto::Signer;
use swap_state::StateDb;

/// Per-OrderHash state machine (§4.8(b)). One worker owns exactly one
/// order's journal entry; the dispatcher in `main.rs` routes every chain
/// event for this `OrderHash` to the same worker's queue, so events are
/// applied strictly in arrival order (§4.8(h)) — at most one in-flight
/// transaction per side at a time.
pub struct OrderWorker {
    order_hash: OrderHash,
    db: Arc<StateDb>,
    source: Arc<dyn ChainClient>,
    destination: Arc<dyn ChainClient>,
    source_signer: Arc<dyn Signer>,
    destination_signer: Arc<dyn Signer>,
    max_retries: u32,
}

impl OrderWorker {
    pub fn new(
        order_hash: OrderHash,
        db: Arc<StateDb>,
        source: Arc<dyn ChainClient>,
        destination: Arc<dyn ChainClient>,
        source_signer: Arc<dyn Signer>,
        destination_signer: Arc<dyn Signer>,
        max_retries: u32,
    ) -> Self {
        Self {
            order_hash,
            db,
            source,
            destination,
            source_signer,
            destination_signer,
            max_retries,
        }
    }

    /// §4.10: the signer is an oracle the coordinator consults before every
    /// submitted transaction. Concrete transaction encoding is out of scope
    /// (§1), so the "blob" signed here is just enough to bind the signature
    /// to this order, this escrow, and this operation; a production signer
    /// would instead receive the fully-encoded unsigned transaction.
    fn sign(&self, signer: &Arc<dyn Signer>, op: &str, id: EscrowId) -> swap_crypto::Signature {
        let mut blob = Vec::with_capacity(32 + 32 + op.len());
        blob.extend_from_slice(&self.order_hash.0);
        blob.extend_from_slice(&id.0);
        blob.extend_from_slice(op.as_bytes());
        signer.sign(&blob)
    }

    /// Drain `events` until the dispatcher drops its sender (process
    /// shutdown). Each event is durably logged before it is acted on
    /// (§4.9): a crash between "decide to send tx" and "tx landed" resumes
    /// as a retry, never a duplicated effect, since both chain sides'
    /// create/claim/refund calls are themselves idempotent by OrderHash.
    pub async fn run(self, mut events: mpsc::Receiver<ChainEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle(event).await {
                warn!(order_hash = %self.order_hash, error = %e, "event handling failed");
                match self.register_failure() {
                    Ok(Some(delay)) => tokio::time::sleep(delay).await,
                    Ok(None) => {}
                    Err(e2) => warn!(order_hash = %self.order_hash, error = %e2, "failed to record retry"),
                }
            }
        }
    }

    /// §4.8(e): bump the retry counter and back off before the next event on
    /// this order is attempted; past `max_retries` the order is abandoned
    /// rather than retried forever. Returns the backoff delay to sleep, or
    /// `None` once the order has been abandoned (no point waiting further).
    fn register_failure(&self) -> Result<Option<Duration>, SwapError> {
        let mut entry = self.journal()?;
        if entry.state.is_terminal() {
            return Ok(None);
        }
        entry.retries += 1;
        let abandoned = entry.retries > self.max_retries;
        if abandoned {
            entry.state = JournalState::Abandoned;
        }
        self.db.put_journal(&entry)?;
        if abandoned {
            return Ok(None);
        }
        Ok(Some(backoff_delay(entry.retries)))
    }

    fn journal(&self) -> Result<JournalEntry, SwapError> {
        match self.db.get_journal(&self.order_hash)? {
            Some(entry) => Ok(entry),
            None => Ok(JournalEntry::new(self.order_hash, 0)),
        }
    }

    fn advance(&self, next: JournalState, now: i64) -> Result<(), SwapError> {
        let mut entry = self.journal()?;
        if !entry.state.can_advance_to(next) {
            info!(
                order_hash = %self.order_hash,
                from = ?entry.state,
                to = ?next,
                "ignoring out-of-order journal transition (already applied)"
            );
            return Ok(());
        }
        entry.state = next;
        entry.last_step_at = now;
        entry.retries = 0;
        self.db.put_journal(&entry)
    }

    fn record_preimage(&self, preimage: Preimage, now: i64) -> Result<(), SwapError> {
        let mut entry = self.journal()?;
        entry.preimage = Some(preimage);
        if entry.state.can_advance_to(JournalState::PreimageKnown) {
            entry.state = JournalState::PreimageKnown;
        }
        entry.last_step_at = now;
        self.db.put_journal(&entry)
    }

    fn append_log(&self, event: &ChainEvent, now: i64) -> Result<(), SwapError> {
        let seq = self.db.next_log_seq()?;
        let payload = serde_json::to_vec(event).unwrap_or_default();
        let event_kind = event_kind_name(event);
        self.db.append_log(&LogRecord {
            seq,
            order_hash: self.order_hash,
            event_kind: event_kind.to_string(),
            payload,
            observed_at: now,
        })
    }

    async fn handle(&self, event: ChainEvent) -> Result<(), SwapError> {
        let now = self.source.now().await.unwrap_or(0);
        self.append_log(&event, now)?;

        match event {
            ChainEvent::EscrowCreated { hashlock, native, amount, maker, taker, .. } => {
                self.advance(JournalState::Observed, now)?;
                self.initiate_destination(hashlock, native, amount, maker, taker, now).await?;
            }
            ChainEvent::EscrowFilled { preimage, .. }
            | ChainEvent::EscrowPartiallyFilled { preimage, .. } => {
                self.record_preimage(preimage, now)?;
                self.relay_preimage(preimage, now).await?;
            }
            ChainEvent::EscrowCancelled { .. } | ChainEvent::EscrowRefunded { .. } => {
                self.advance(JournalState::Abandoned, now)?;
            }
            ChainEvent::CrossChainOrderCancelled { .. } => {
                self.advance(JournalState::Abandoned, now)?;
            }
            _ => {}
        }

        self.maybe_cancel(now).await
    }

    /// §4.8(c): a `Filled` event on the source side carries the hashlock and
    /// fill amount needed to open the matching destination escrow.
    /// Idempotent by OrderHash: if a destination escrow already exists the
    /// journal simply advances.
    async fn initiate_destination(
        &self,
        hashlock: HashLock,
        native: bool,
        amount: swap_core::types::Amount,
        maker: Address,
        taker: Address,
        now: i64,
    ) -> Result<(), SwapError> {
        let entry = self.journal()?;
        if entry.state != JournalState::Observed {
            return Ok(());
        }

        if let Some(order) = self.destination.query_order(self.order_hash).await? {
            if order.remaining_destination_amount < order.destination_amount {
                return self.advance(JournalState::DestinationInitiated, now);
            }
        }

        let tlocks = self.destination_timelocks(now);
        let dst_id = swap_crypto::escrow_id(&self.order_hash, Role::Destination, 0);
        let _sig = self.sign(&self.destination_signer, "create_escrow", dst_id);
        let handle = self
            .destination
            .submit_create_escrow(dst_id, maker, taker, native, amount, 0, hashlock, tlocks)
            .await?;
        self.destination.wait_for_receipt(&handle).await?;
        self.advance(JournalState::DestinationInitiated, now)
    }

    /// §4.8(d): relay a revealed preimage to whichever side hasn't claimed
    /// yet. Idempotent: the chain itself rejects a second claim.
    async fn relay_preimage(&self, preimage: Preimage, now: i64) -> Result<(), SwapError> {
        let src_id = swap_crypto::escrow_id(&self.order_hash, Role::Source, 0);
        let dst_id = swap_crypto::escrow_id(&self.order_hash, Role::Destination, 0);

        if let Some(escrow) = self.source.query_escrow(src_id).await? {
            if !escrow.status.is_terminal() {
                let _sig = self.sign(&self.source_signer, "claim_public", src_id);
                let handle = self.source.submit_claim_public(src_id, preimage).await?;
                let _ = self.source.wait_for_receipt(&handle).await;
            }
        }
        if let Some(escrow) = self.destination.query_escrow(dst_id).await? {
            if !escrow.status.is_terminal() {
                let _sig = self.sign(&self.destination_signer, "claim_public", dst_id);
                let handle = self.destination.submit_claim_public(dst_id, preimage).await?;
                let _ = self.destination.wait_for_receipt(&handle).await;
            }
        }
        self.advance(JournalState::Completed, now)
    }

    /// §4.8(g): if `dst_cancellation` arrives with no preimage ever
    /// observed, refund the destination leg, then the source leg once
    /// `src_cancellation` is reached.
    async fn maybe_cancel(&self, now: i64) -> Result<(), SwapError> {
        let entry = self.journal()?;
        if entry.state.is_terminal() || entry.preimage.is_some() {
            return Ok(());
        }

        let dst_id = swap_crypto::escrow_id(&self.order_hash, Role::Destination, 0);
        if let Some(escrow) = self.destination.query_escrow(dst_id).await? {
            if escrow.timelocks.stage(Role::Destination, now) == Stage::PublicCancellation
                && !escrow.status.is_terminal()
            {
                let _sig = self.sign(&self.destination_signer, "refund_public", dst_id);
                let handle = self.destination.submit_refund_public(dst_id).await?;
                let _ = self.destination.wait_for_receipt(&handle).await;
            }
        }

        let src_id = swap_crypto::escrow_id(&self.order_hash, Role::Source, 0);
        if let Some(escrow) = self.source.query_escrow(src_id).await? {
            if escrow.timelocks.stage(Role::Source, now) == Stage::PublicCancellation
                && !escrow.status.is_terminal()
            {
                let _sig = self.sign(&self.source_signer, "refund_public", src_id);
                let handle = self.source.submit_refund_public(src_id).await?;
                let _ = self.source.wait_for_receipt(&handle).await;
                return self.advance(JournalState::Abandoned, now);
            }
        }
        Ok(())
    }

    /// Derives a fresh staged `Timelocks` window when the maker's own
    /// hasn't been relayed (§4.8(c)). `dst_cancellation` sits at 2.5 steps so
    /// it always lands strictly before `src_cancellation` at 3 steps, per
    /// §3's cross-side ordering invariant.
    fn destination_timelocks(&self, now: i64) -> swap_core::timelock::Timelocks {
        use swap_core::constants::DEFAULT_TIMELOCK_STEP_SECS as STEP;
        let half = STEP / 2;
        swap_core::timelock::Timelocks {
            src_withdrawal: now + STEP,
            src_public_withdrawal: now + 2 * STEP,
            src_cancellation: now + 3 * STEP,
            src_public_cancellation: now + 4 * STEP,
            dst_withdrawal: now + STEP,
            dst_public_withdrawal: now + 2 * STEP,
            dst_cancellation: now + 2 * STEP + half,
            dst_public_cancellation: now + 3 * STEP + half,
        }
    }
}

/// Exponential backoff with jitter (§4.8(e)): `base * 2^(attempt-1)`, capped
/// at 64x the base delay, plus up to 50% random jitter so retries across
/// many orders don't all land on the same tick.
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    let capped_ms = DEFAULT_RETRY_BASE_DELAY_MS.saturating_mul(1u64 << exponent);
    let jitter_ms = rand::thread_rng().gen_range(0..=capped_ms / 2);
    Duration::from_millis(capped_ms + jitter_ms)
}

fn event_kind_name(event: &ChainEvent) -> &'static str {
    match event {
        ChainEvent::EscrowCreated { .. } => "EscrowCreated",
        ChainEvent::EscrowFilled { .. } => "EscrowFilled",
        ChainEvent::EscrowPartiallyFilled { .. } => "EscrowPartiallyFilled",
        ChainEvent::EscrowRefunded { .. } => "EscrowRefunded",
        ChainEvent::EscrowCancelled { .. } => "EscrowCancelled",
        ChainEvent::CrossChainOrderCreated { .. } => "CrossChainOrderCreated",
        ChainEvent::CrossChainOrderFilled { .. } => "CrossChainOrderFilled",
        ChainEvent::CrossChainOrderCancelled { .. } => "CrossChainOrderCancelled",
        ChainEvent::ResolverRegistered { .. } => "ResolverRegistered",
        ChainEvent::OrderFillRecorded { .. } => "OrderFillRecorded",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_and_caps() {
        let d1 = backoff_delay(1).as_millis() as u64;
        let d2 = backoff_delay(2).as_millis() as u64;
        assert!(d1 >= DEFAULT_RETRY_BASE_DELAY_MS);
        assert!(d1 <= DEFAULT_RETRY_BASE_DELAY_MS * 3 / 2);
        assert!(d2 >= DEFAULT_RETRY_BASE_DELAY_MS * 2);

        let capped = backoff_delay(50).as_millis() as u64;
        let max_possible = DEFAULT_RETRY_BASE_DELAY_MS * 64 * 3 / 2 + 1;
        assert!(capped <= max_possible);
    }

    #[test]
    fn destination_timelocks_keep_cross_side_ordering() {
        let dir = std::env::temp_dir().join("swap_worker_tlocks_test");
        let _ = std::fs::remove_dir_all(&dir);
        let worker = OrderWorker::new(
            OrderHash([1u8; 32]),
            Arc::new(StateDb::open(&dir).unwrap()),
            Arc::new(swap_chain::MockChainClient::new(Role::Source, 0)),
            Arc::new(swap_chain::MockChainClient::new(Role::Destination, 0)),
            Arc::new(swap_crypto::MockSigner::default()),
            Arc::new(swap_crypto::MockSigner::default()),
            5,
        );
        let t = worker.destination_timelocks(1_000);
        assert!(t.dst_cancellation < t.src_cancellation);
        t.validate(1_000).expect("derived timelocks must be internally consistent");
    }

    #[test]
    fn sign_binds_order_escrow_and_operation() {
        let dir = std::env::temp_dir().join("swap_worker_sign_test");
        let _ = std::fs::remove_dir_all(&dir);
        let worker = OrderWorker::new(
            OrderHash([2u8; 32]),
            Arc::new(StateDb::open(&dir).unwrap()),
            Arc::new(swap_chain::MockChainClient::new(Role::Source, 0)),
            Arc::new(swap_chain::MockChainClient::new(Role::Destination, 0)),
            Arc::new(swap_crypto::MockSigner::default()),
            Arc::new(swap_crypto::MockSigner::default()),
            5,
        );
        let id = EscrowId([9u8; 32]);
        let sig_a = worker.sign(&worker.source_signer, "claim_public", id);
        let sig_b = worker.sign(&worker.source_signer, "refund_public", id);
        assert_ne!(sig_a, sig_b, "different operations must sign different blobs");
    }
}
