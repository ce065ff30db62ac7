//! swap-core
//!
//! Chain-agnostic types and pure logic shared by every other crate in this
//! workspace: identifiers, the staged-timelock stage function (C1), the
//! escrow/order/resolver/journal data model (C2/C3/C5/C6/C7/C9), the
//! `Action` write-operation enum dispatched by `swap_state::engine`, and the
//! `SwapError` taxonomy (§7).

pub mod action;
pub mod constants;
pub mod error;
pub mod escrow;
pub mod journal;
pub mod order;
pub mod resolver;
pub mod timelock;
pub mod types;

pub use action::Action;
pub use error::SwapError;
pub use escrow::{Escrow, EscrowStatus};
pub use journal::{JournalEntry, JournalState, LogRecord};
pub use order::{AuctionConfig, BidLog, CrossChainConfig, Order};
pub use resolver::{Resolver, ResolverAuthorization};
pub use timelock::{Stage, Timelocks};
pub use types::{Address, Amount, ChainId, EscrowId, ExternalOrderRef, HashLock, Nonce, OrderHash, Preimage, Role, Timestamp};
