use serde::{Deserialize, Serialize};

/// JSON-serializable order summary returned by `swap_listOrders`/`swap_getOrder`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcOrder {
    pub order_hash: String,
    pub maker: String,
    pub source_amount: String,
    pub destination_amount: String,
    pub remaining_source_amount: String,
    pub remaining_destination_amount: String,
    pub deadline: i64,
    pub active: bool,
    pub total_fills: u32,
    pub auction_start_time: i64,
    pub auction_end_time: i64,
    pub auction_start_rate: String,
    pub auction_end_rate: String,
    /// Rate a fill submitted at query time would be charged (§4.4), as of
    /// the moment this snapshot was taken.
    pub current_rate: String,
    pub destination_chain_id: u64,
    pub destination_address: String,
    pub secret_hash: String,
}

/// JSON-serializable escrow summary returned by `swap_getEscrow`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcEscrow {
    pub id: String,
    pub order_hash: String,
    pub role: String,
    pub maker: String,
    pub taker: String,
    pub native: bool,
    pub total_amount: String,
    pub remaining_amount: String,
    pub status: String,
    pub deployed_at: i64,
}

/// JSON-serializable resolver summary returned by `swap_listResolvers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResolver {
    pub address: String,
    pub stake: String,
    pub reputation: u32,
    /// Stored authorization flag, as set by `swap_authorizeResolver`.
    pub authorized: bool,
    /// Effective authorization per `Resolver::is_authorized` — `authorized`
    /// AND reputation at or above the floor (§3, §4.5).
    pub effectively_authorized: bool,
    pub total_fills: u64,
    pub total_volume: String,
}

/// JSON-serializable journal entry returned by `swap_getJournal`/`swap_listJournal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcJournalEntry {
    pub order_hash: String,
    pub state: String,
    pub last_step_at: i64,
    pub retries: u32,
    pub last_seq: u64,
}

/// Coordinator/node version information returned by `swap_getVersion`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcVersionInfo {
    pub node_version: String,
    pub api_version: String,
}
