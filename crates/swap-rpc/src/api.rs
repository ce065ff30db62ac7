use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcEscrow, RpcJournalEntry, RpcOrder, RpcResolver, RpcVersionInfo};

/// Swap coordinator administrative JSON-RPC 2.0 API (§4.11, §6).
///
/// All method names are prefixed with "swap_" via `namespace = "swap"`.
#[rpc(server, namespace = "swap")]
pub trait SwapApi {
    /// List orders, optionally filtered by journal state name
    /// ("Observed", "DestinationInitiated", "PreimageKnown", "Completed",
    /// "Abandoned"). Backs the `list-orders` CLI subcommand.
    #[method(name = "listOrders")]
    async fn list_orders(&self, state: Option<String>) -> RpcResult<Vec<RpcOrder>>;

    /// Get a single order by hex OrderHash. Backs `show-order`.
    #[method(name = "getOrder")]
    async fn get_order(&self, order_hash: String) -> RpcResult<Option<RpcOrder>>;

    /// List every escrow spawned by fills of `order_hash`.
    #[method(name = "getEscrowsForOrder")]
    async fn get_escrows_for_order(&self, order_hash: String) -> RpcResult<Vec<RpcEscrow>>;

    /// List all registered resolvers, ranked by reputation descending.
    #[method(name = "listResolvers")]
    async fn list_resolvers(&self) -> RpcResult<Vec<RpcResolver>>;

    /// Get the coordinator's journal entry for `order_hash`.
    #[method(name = "getJournal")]
    async fn get_journal(&self, order_hash: String) -> RpcResult<Option<RpcJournalEntry>>;

    /// List all non-terminal journal entries.
    #[method(name = "listJournal")]
    async fn list_journal(&self) -> RpcResult<Vec<RpcJournalEntry>>;

    /// Force the public-refund path on `order_hash`'s escrows if the stage
    /// permits (§6's `force-cancel`). Returns the number of escrows refunded.
    #[method(name = "forceCancel")]
    async fn force_cancel(&self, order_hash: String) -> RpcResult<u32>;

    /// Rewind the journal and replay the append-only log from `seq`
    /// onward (§6's `replay-from`). Returns the number of records replayed.
    #[method(name = "replayFrom")]
    async fn replay_from(&self, seq: u64) -> RpcResult<u64>;

    /// Return coordinator/protocol version information.
    #[method(name = "getVersion")]
    async fn get_version(&self) -> RpcResult<RpcVersionInfo>;
}
