//! In-memory `ChainClient` test double. No network, no signing — just
//! enough state to drive the coordinator's state machine in tests without a
//! real chain.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use swap_core::error::SwapError;
use swap_core::escrow::{Escrow, EscrowStatus};
use swap_core::order::Order;
use swap_core::timelock::{Stage, Timelocks};
use swap_core::types::{Address, Amount, EscrowId, HashLock, OrderHash, Preimage, Role};

use crate::client::{ChainClient, TxHandle};
use crate::events::ChainEvent;

struct Inner {
    escrows: HashMap<EscrowId, Escrow>,
    orders: HashMap<OrderHash, Order>,
    used_preimages: HashSet<[u8; 32]>,
    clock: i64,
    next_tx: u64,
}

pub struct MockChainClient {
    role: Role,
    inner: Mutex<Inner>,
    events_tx: mpsc::Sender<ChainEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<ChainEvent>>>,
}

impl MockChainClient {
    pub fn new(role: Role, now: i64) -> Self {
        let (tx, rx) = mpsc::channel(256);
        Self {
            role,
            inner: Mutex::new(Inner {
                escrows: HashMap::new(),
                orders: HashMap::new(),
                used_preimages: HashSet::new(),
                clock: now,
                next_tx: 0,
            }),
            events_tx: tx,
            events_rx: Mutex::new(Some(rx)),
        }
    }

    /// Test-only: advance the mock chain's clock.
    pub fn advance_to(&self, now: i64) {
        self.inner.lock().unwrap().clock = now;
    }

    /// Test-only: seed an escrow directly (bypassing `create`) to set up
    /// scenarios like S3/S5.
    pub fn seed_escrow(&self, escrow: Escrow) {
        self.inner.lock().unwrap().escrows.insert(escrow.id, escrow);
    }

    fn next_tx_handle(&self, inner: &mut Inner) -> TxHandle {
        inner.next_tx += 1;
        TxHandle(format!("mock-tx-{}", inner.next_tx))
    }

    fn emit(&self, event: ChainEvent) {
        let _ = self.events_tx.try_send(event);
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn submit_create_escrow(
        &self,
        id: EscrowId,
        maker: Address,
        taker: Address,
        native: bool,
        amount: Amount,
        safety_deposit: Amount,
        hashlock: HashLock,
        timelocks: Timelocks,
    ) -> Result<TxHandle, SwapError> {
        if amount == 0 {
            return Err(SwapError::InvalidAmount);
        }
        let mut inner = self.inner.lock().unwrap();
        let now = inner.clock;
        timelocks.validate(now)?;
        if inner.escrows.contains_key(&id) {
            return Err(SwapError::EscrowAlreadyExists);
        }
        let escrow = Escrow {
            id,
            order_hash: OrderHash([0u8; 32]),
            role: self.role,
            maker: maker.clone(),
            taker: taker.clone(),
            native,
            token: None,
            total_amount: amount,
            remaining_amount: amount,
            hashlock,
            timelocks,
            safety_deposit,
            deployed_at: now,
            status: EscrowStatus::Created,
            revealed_preimage: None,
            external_order_ref: String::new(),
        };
        inner.escrows.insert(id, escrow);
        let tx = self.next_tx_handle(&mut inner);
        drop(inner);
        self.emit(ChainEvent::EscrowCreated {
            id,
            maker,
            taker,
            amount,
            hashlock,
            timelocks,
            native,
            external_order_ref: String::new(),
        });
        Ok(tx)
    }

    async fn submit_claim(&self, id: EscrowId, preimage: Preimage) -> Result<TxHandle, SwapError> {
        self.claim_inner(id, preimage, false)
    }

    async fn submit_claim_public(
        &self,
        id: EscrowId,
        preimage: Preimage,
    ) -> Result<TxHandle, SwapError> {
        self.claim_inner(id, preimage, true)
    }

    async fn submit_claim_partial(
        &self,
        id: EscrowId,
        preimage: Preimage,
        amount: Amount,
    ) -> Result<TxHandle, SwapError> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.clock;
        let escrow = inner
            .escrows
            .get_mut(&id)
            .ok_or_else(|| SwapError::EscrowNotFound(id.to_hex()))?;
        if escrow.status.is_terminal() {
            return Err(SwapError::AlreadyTerminal);
        }
        if amount == 0 || amount > escrow.remaining_amount {
            return Err(SwapError::AmountExceedsRemaining {
                amount,
                remaining: escrow.remaining_amount,
            });
        }
        if !swap_crypto::verify(&preimage, &escrow.hashlock) {
            return Err(SwapError::InvalidSecret);
        }
        if let Some(pinned) = escrow.revealed_preimage {
            if pinned != preimage {
                return Err(SwapError::InvalidSecret);
            }
        } else {
            if inner.used_preimages.contains(preimage.as_bytes()) {
                return Err(SwapError::SecretReplay);
            }
            inner.used_preimages.insert(*preimage.as_bytes());
        }
        let escrow = inner.escrows.get_mut(&id).unwrap();
        escrow.revealed_preimage = Some(preimage);
        escrow.remaining_amount -= amount;
        escrow.status = if escrow.remaining_amount == 0 {
            EscrowStatus::Filled
        } else {
            EscrowStatus::PartiallyFilled
        };
        let remaining = escrow.remaining_amount;
        let native = escrow.native;
        let tx = self.next_tx_handle(&mut inner);
        drop(inner);
        self.emit(ChainEvent::EscrowPartiallyFilled {
            id,
            resolver: Address::null(),
            amount,
            remaining,
            preimage,
            native,
            external_order_ref: String::new(),
        });
        Ok(tx)
    }

    async fn submit_refund(&self, id: EscrowId) -> Result<TxHandle, SwapError> {
        self.refund_inner(id, false)
    }

    async fn submit_refund_public(&self, id: EscrowId) -> Result<TxHandle, SwapError> {
        self.refund_inner(id, true)
    }

    async fn wait_for_receipt(&self, _tx: &TxHandle) -> Result<(), SwapError> {
        Ok(())
    }

    async fn query_escrow(&self, id: EscrowId) -> Result<Option<Escrow>, SwapError> {
        Ok(self.inner.lock().unwrap().escrows.get(&id).cloned())
    }

    async fn query_order(&self, order_hash: OrderHash) -> Result<Option<Order>, SwapError> {
        Ok(self.inner.lock().unwrap().orders.get(&order_hash).cloned())
    }

    async fn now(&self) -> Result<i64, SwapError> {
        Ok(self.inner.lock().unwrap().clock)
    }

    fn subscribe_events(&self) -> mpsc::Receiver<ChainEvent> {
        self.events_rx
            .lock()
            .unwrap()
            .take()
            .expect("MockChainClient only supports a single subscriber")
    }
}

impl MockChainClient {
    fn claim_inner(&self, id: EscrowId, preimage: Preimage, public: bool) -> Result<TxHandle, SwapError> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.clock;
        let role = self.role;
        let escrow = inner
            .escrows
            .get_mut(&id)
            .ok_or_else(|| SwapError::EscrowNotFound(id.to_hex()))?;
        if escrow.status.is_terminal() {
            return Err(SwapError::AlreadyTerminal);
        }
        let stage = escrow.timelocks.stage(role, now);
        let wanted = if public {
            Stage::PublicWithdrawal
        } else {
            Stage::PrivateWithdrawal
        };
        if stage != wanted {
            return Err(SwapError::WrongStage {
                wanted: wanted.name(),
                actual: stage.name().into(),
            });
        }
        if !swap_crypto::verify(&preimage, &escrow.hashlock) {
            return Err(SwapError::InvalidSecret);
        }
        if inner.used_preimages.contains(preimage.as_bytes()) {
            return Err(SwapError::SecretReplay);
        }
        inner.used_preimages.insert(*preimage.as_bytes());
        let escrow = inner.escrows.get_mut(&id).unwrap();
        escrow.remaining_amount = 0;
        escrow.status = EscrowStatus::Filled;
        escrow.revealed_preimage = Some(preimage);
        let amount = escrow.total_amount;
        let native = escrow.native;
        let tx = self.next_tx_handle(&mut inner);
        drop(inner);
        self.emit(ChainEvent::EscrowFilled {
            id,
            resolver: Address::null(),
            preimage,
            amount,
            native,
            external_order_ref: String::new(),
        });
        Ok(tx)
    }

    fn refund_inner(&self, id: EscrowId, public: bool) -> Result<TxHandle, SwapError> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.clock;
        let role = self.role;
        let escrow = inner
            .escrows
            .get_mut(&id)
            .ok_or_else(|| SwapError::EscrowNotFound(id.to_hex()))?;
        if escrow.status.is_terminal() {
            return Err(SwapError::AlreadyTerminal);
        }
        let stage = escrow.timelocks.stage(role, now);
        let wanted = if public {
            Stage::PublicCancellation
        } else {
            Stage::PrivateCancellation
        };
        if stage != wanted {
            return Err(SwapError::WrongStage {
                wanted: wanted.name(),
                actual: stage.name().into(),
            });
        }
        escrow.status = EscrowStatus::Cancelled;
        let maker = escrow.maker.clone();
        let native = escrow.native;
        let tx = self.next_tx_handle(&mut inner);
        drop(inner);
        self.emit(ChainEvent::EscrowRefunded {
            id,
            maker,
            amount: 0,
            native,
            external_order_ref: String::new(),
        });
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_crypto::{generate_preimage, lock};

    fn sample_timelocks(now: i64) -> Timelocks {
        Timelocks {
            src_withdrawal: now + 10,
            src_public_withdrawal: now + 20,
            src_cancellation: now + 30,
            src_public_cancellation: now + 40,
            dst_withdrawal: now - 50,
            dst_public_withdrawal: now - 40,
            dst_cancellation: now - 30,
            dst_public_cancellation: now - 20,
        }
    }

    #[tokio::test]
    async fn create_then_claim_happy_path() {
        let now = 1_000;
        let client = MockChainClient::new(Role::Source, now);
        let preimage = generate_preimage();
        let hashlock = lock(&preimage);
        let id = EscrowId([7u8; 32]);
        client
            .submit_create_escrow(
                id,
                Address(vec![1]),
                Address::null(),
                true,
                100,
                5,
                hashlock,
                sample_timelocks(now),
            )
            .await
            .unwrap();

        // Before src_withdrawal, claim must fail.
        assert!(client.submit_claim(id, preimage).await.is_err());

        client.advance_to(now + 10);
        client.submit_claim(id, preimage).await.unwrap();

        let escrow = client.query_escrow(id).await.unwrap().unwrap();
        assert_eq!(escrow.status, EscrowStatus::Filled);
        assert_eq!(escrow.remaining_amount, 0);
    }

    #[tokio::test]
    async fn replayed_preimage_is_rejected() {
        let now = 1_000;
        let client = MockChainClient::new(Role::Source, now);
        let preimage = generate_preimage();
        let hashlock = lock(&preimage);
        let id1 = EscrowId([1u8; 32]);
        let id2 = EscrowId([2u8; 32]);
        for id in [id1, id2] {
            client
                .submit_create_escrow(
                    id,
                    Address(vec![1]),
                    Address::null(),
                    true,
                    100,
                    5,
                    hashlock,
                    sample_timelocks(now),
                )
                .await
                .unwrap();
        }
        client.advance_to(now + 10);
        client.submit_claim(id1, preimage).await.unwrap();
        let err = client.submit_claim(id2, preimage).await.unwrap_err();
        assert!(matches!(err, SwapError::SecretReplay));
    }
}
