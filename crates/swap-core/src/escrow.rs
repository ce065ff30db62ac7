//! Escrow data model (§3) shared by the source and destination state
//! machines (§4.2, §4.3). The two legs are structurally identical; `Role`
//! selects which half of `Timelocks` governs them.

use serde::{Deserialize, Serialize};

use crate::timelock::Timelocks;
use crate::types::{Address, Amount, EscrowId, HashLock, OrderHash, Preimage, Role, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowStatus {
    Created,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl EscrowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EscrowStatus::Filled | EscrowStatus::Cancelled)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Escrow {
    pub id: EscrowId,
    /// The OrderHash this leg belongs to — the only coupling to the other
    /// leg (§9: no direct pointers, key lookup only).
    pub order_hash: OrderHash,
    pub role: Role,
    pub maker: Address,
    /// Null address means "any authorized resolver" (§3).
    pub taker: Address,
    pub native: bool,
    pub token: Option<Address>,
    pub total_amount: Amount,
    pub remaining_amount: Amount,
    pub hashlock: HashLock,
    pub timelocks: Timelocks,
    pub safety_deposit: Amount,
    pub deployed_at: Timestamp,
    pub status: EscrowStatus,
    pub revealed_preimage: Option<Preimage>,
    pub external_order_ref: String,
}

impl Escrow {
    /// P4: `remaining_amount` must never exceed `total_amount`.
    pub fn invariant_ok(&self) -> bool {
        self.remaining_amount <= self.total_amount
    }

    /// The caller may act as "the designated taker" when the escrow's taker
    /// is null (anyone may be the designated resolver) or matches exactly.
    pub fn taker_matches(&self, caller: &Address) -> bool {
        self.taker.is_null() || &self.taker == caller
    }
}
