//! swap-auction
//!
//! Read-only query layer over the Dutch-auction limit-order protocol (§4.4,
//! §4.6). Thin wrapper around `&StateDb`, in the shape of `chronx-timelock`:
//! all mutation goes through `swap_state::engine::SwapEngine`.

pub mod query;

pub use query::AuctionQuery;
