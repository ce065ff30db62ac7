//! The single write-operation enum dispatched by `swap_state::engine`, in
//! the shape of the teacher's `chronx_core::transaction::Action`: one
//! variant per named operation in §4, carrying exactly the arguments that
//! operation's contract names.

use serde::{Deserialize, Serialize};

use crate::order::AuctionConfig;
use crate::timelock::Timelocks;
use crate::types::{Address, Amount, ChainId, EscrowId, HashLock, OrderHash, Preimage, Role};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Action {
    // ── C2/C3 escrow state machine (§4.2/§4.3) ──────────────────────────────
    CreateEscrow {
        id: EscrowId,
        order_hash: OrderHash,
        role: Role,
        maker: Address,
        taker: Address,
        native: bool,
        token: Option<Address>,
        amount: Amount,
        safety_deposit: Amount,
        hashlock: HashLock,
        timelocks: Timelocks,
        external_order_ref: String,
    },
    Claim {
        id: EscrowId,
        caller: Address,
        preimage: Preimage,
    },
    ClaimPublic {
        id: EscrowId,
        caller: Address,
        preimage: Preimage,
    },
    ClaimPartial {
        id: EscrowId,
        caller: Address,
        preimage: Preimage,
        amount: Amount,
    },
    Refund {
        id: EscrowId,
        caller: Address,
    },
    RefundPublic {
        id: EscrowId,
        caller: Address,
    },
    Rescue {
        id: EscrowId,
        caller: Address,
        asset: Option<Address>,
        amount: Amount,
    },

    // ── C5 resolver registry (§4.5) ─────────────────────────────────────────
    RegisterResolver {
        address: Address,
        stake: Amount,
    },
    UnregisterResolver {
        address: Address,
    },
    AuthorizeResolver {
        caller: Address,
        resolver: Address,
        flag: bool,
    },
    RecordFill {
        caller: Address,
        resolver: Address,
        amount: Amount,
        rate: u128,
    },
    ApplyPenalty {
        caller: Address,
        resolver: Address,
        amount: u32,
    },
    DistributeReward {
        caller: Address,
        resolver: Address,
        amount: Amount,
    },

    // ── C6/C7 limit-order protocol + façade (§4.6/§4.7) ─────────────────────
    CreateOrder {
        maker: Address,
        source_amount: Amount,
        destination_amount: Amount,
        native: bool,
        chain_id: ChainId,
        deadline: i64,
        auction_config: AuctionConfig,
        destination_chain_id: ChainId,
        timelock_duration_secs: i64,
        destination_address: Address,
        secret_hash: HashLock,
    },
    FillOrder {
        order_hash: OrderHash,
        resolver: Address,
        preimage: Preimage,
        amount: Amount,
        escrow_timelocks: Timelocks,
        safety_deposit: Amount,
    },
    CancelOrder {
        order_hash: OrderHash,
        caller: Address,
    },
    RecordBid {
        order_hash: OrderHash,
        bidder: Address,
        amount: Amount,
    },
}
