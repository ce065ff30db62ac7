//! swap-rpc
//!
//! JSON-RPC 2.0 administrative server for the swap coordinator (§4.11, §6).
//!
//! Namespace: "swap"
//! Methods:
//!   swap_listOrders          — list orders, optionally filtered by journal state
//!   swap_getOrder            — full order state by OrderHash hex
//!   swap_getEscrowsForOrder  — escrows spawned by fills of an order
//!   swap_listResolvers       — resolver registry, ranked by reputation
//!   swap_getJournal          — one journal entry by OrderHash hex
//!   swap_listJournal         — all non-terminal journal entries
//!   swap_forceCancel         — trigger the public-refund path where stage permits
//!   swap_replayFrom          — rewind and replay the append-only log
//!   swap_getVersion          — coordinator/protocol version info

pub mod api;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerState};
pub use types::{RpcEscrow, RpcJournalEntry, RpcOrder, RpcResolver, RpcVersionInfo};
