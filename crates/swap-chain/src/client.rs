//! §1 treats "network RPC client libraries for either chain" as an external
//! black box providing send-signed-transaction / query-state /
//! subscribe-to-logs. `ChainClient` is that contract, one instance per
//! chain side. Shaped after the teacher's `P2pHandle`/`P2pNetwork` split
//! (`chronx_p2p::network`): a cheap-to-clone handle plus a mpsc event
//! stream, but as a plain async trait instead of a libp2p swarm, since this
//! layer talks to one chain's RPC endpoint, not to peers.

use async_trait::async_trait;
use tokio::sync::mpsc;

use swap_core::error::SwapError;
use swap_core::escrow::Escrow;
use swap_core::order::Order;
use swap_core::timelock::Timelocks;
use swap_core::types::{Address, Amount, EscrowId, HashLock, OrderHash, Preimage};

use crate::events::ChainEvent;

/// Opaque handle to a submitted, not-yet-confirmed transaction. The
/// coordinator polls `wait_for_receipt` rather than assuming immediate
/// finality (§5: "submitting a signed transaction" and "waiting for
/// transaction receipt" are each their own suspension point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxHandle(pub String);

#[async_trait]
pub trait ChainClient: Send + Sync {
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
    ) -> Result<TxHandle, SwapError>;

    async fn submit_claim(&self, id: EscrowId, preimage: Preimage) -> Result<TxHandle, SwapError>;

    async fn submit_claim_public(
        &self,
        id: EscrowId,
        preimage: Preimage,
    ) -> Result<TxHandle, SwapError>;

    async fn submit_claim_partial(
        &self,
        id: EscrowId,
        preimage: Preimage,
        amount: Amount,
    ) -> Result<TxHandle, SwapError>;

    async fn submit_refund(&self, id: EscrowId) -> Result<TxHandle, SwapError>;

    async fn submit_refund_public(&self, id: EscrowId) -> Result<TxHandle, SwapError>;

    async fn wait_for_receipt(&self, tx: &TxHandle) -> Result<(), SwapError>;

    async fn query_escrow(&self, id: EscrowId) -> Result<Option<Escrow>, SwapError>;

    async fn query_order(&self, order_hash: OrderHash) -> Result<Option<Order>, SwapError>;

    /// Current chain-native timestamp, in the chain's own units (seconds on
    /// EVM, milliseconds on the move side) — unit conversion to Unix-seconds
    /// is the coordinator's responsibility (§4.1).
    async fn now(&self) -> Result<i64, SwapError>;

    /// Subscribe to this chain's log stream. The receiver end is handed to
    /// the coordinator's dispatcher; the sender end is owned by whatever
    /// drives the underlying subscription (a real implementation would
    /// `tokio::spawn` a log-poller that forwards decoded events here).
    fn subscribe_events(&self) -> mpsc::Receiver<ChainEvent>;
}
