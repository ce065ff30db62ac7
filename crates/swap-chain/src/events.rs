//! Bit-exact on-chain event fields (§6). Source and destination chains
//! emit the same event shapes; `ChainSide` on the subscription distinguishes
//! which chain a given `ChainEvent` arrived from.

use serde::{Deserialize, Serialize};

use swap_core::order::AuctionConfig;
use swap_core::timelock::Timelocks;
use swap_core::types::{Address, Amount, ChainId, EscrowId, HashLock, OrderHash, Preimage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainSide {
    Source,
    Destination,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrossChainConfigEvent {
    pub destination_chain_id: ChainId,
    pub timelock_duration_secs: i64,
    pub destination_address: Address,
    pub secret_hash: HashLock,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ChainEvent {
    EscrowCreated {
        id: EscrowId,
        maker: Address,
        taker: Address,
        amount: Amount,
        hashlock: HashLock,
        timelocks: Timelocks,
        native: bool,
        external_order_ref: String,
    },
    EscrowFilled {
        id: EscrowId,
        resolver: Address,
        preimage: Preimage,
        amount: Amount,
        native: bool,
        external_order_ref: String,
    },
    EscrowPartiallyFilled {
        id: EscrowId,
        resolver: Address,
        amount: Amount,
        remaining: Amount,
        preimage: Preimage,
        native: bool,
        external_order_ref: String,
    },
    EscrowRefunded {
        id: EscrowId,
        maker: Address,
        amount: Amount,
        native: bool,
        external_order_ref: String,
    },
    EscrowCancelled {
        id: EscrowId,
        maker: Address,
        native: bool,
        external_order_ref: String,
    },
    CrossChainOrderCreated {
        order_hash: OrderHash,
        limit_order_hash: OrderHash,
        maker: Address,
        source_amount: Amount,
        destination_amount: Amount,
        auction_config: AuctionConfig,
        cross_chain_config: CrossChainConfigEvent,
    },
    CrossChainOrderFilled {
        order_hash: OrderHash,
        resolver: Address,
        preimage: Preimage,
        fill_amount: Amount,
        escrow_id: EscrowId,
        external_tx_ref: String,
    },
    CrossChainOrderCancelled {
        order_hash: OrderHash,
        maker: Address,
    },
    ResolverRegistered {
        resolver: Address,
        stake: Amount,
    },
    OrderFillRecorded {
        order_hash: OrderHash,
        resolver: Address,
        fill_amount: Amount,
        rate: u128,
    },
}
