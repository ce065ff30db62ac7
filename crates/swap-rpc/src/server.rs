use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use swap_auction::AuctionQuery;
use swap_core::action::Action;
use swap_core::escrow::Escrow;
use swap_core::journal::JournalState;
use swap_core::order::Order;
use swap_core::resolver::Resolver;
use swap_core::types::{Address, OrderHash, Role, Timestamp};
use swap_resolver::ResolverRegistry;
use swap_state::{StateDb, SwapEngine};

use crate::api::SwapApiServer;
use crate::types::{RpcEscrow, RpcJournalEntry, RpcOrder, RpcResolver, RpcVersionInfo};

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

fn bad_hash(e: impl std::fmt::Display) -> ErrorObject<'static> {
    rpc_err(-32602, format!("invalid order hash: {e}"))
}

fn storage(e: impl std::fmt::Display) -> ErrorObject<'static> {
    rpc_err(-32603, e.to_string())
}

/// Shared state passed to the RPC server. Mutating methods (`forceCancel`,
/// `replayFrom`) go through the same `SwapEngine` the coordinator uses, so
/// this process never writes state the engine hasn't validated.
pub struct RpcServerState {
    pub db: Arc<StateDb>,
    pub engine: Arc<SwapEngine>,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr` with permissive CORS headers.
    /// Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(Any);

        let server = Server::builder()
            .set_http_middleware(tower::ServiceBuilder::new().layer(cors))
            .build(addr)
            .await?;

        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "administrative RPC server started");
        Ok(handle)
    }
}

fn order_to_rpc(o: Order, current_rate: u128) -> RpcOrder {
    RpcOrder {
        order_hash: o.order_hash.to_hex(),
        maker: o.maker.to_hex(),
        source_amount: o.source_amount.to_string(),
        destination_amount: o.destination_amount.to_string(),
        remaining_source_amount: o.remaining_source_amount.to_string(),
        remaining_destination_amount: o.remaining_destination_amount.to_string(),
        deadline: o.deadline,
        active: o.active,
        total_fills: o.total_fills,
        auction_start_time: o.auction_config.start_time,
        auction_end_time: o.auction_config.end_time,
        auction_start_rate: o.auction_config.start_rate.to_string(),
        auction_end_rate: o.auction_config.end_rate.to_string(),
        current_rate: current_rate.to_string(),
        destination_chain_id: o.cross_chain_config.destination_chain_id,
        destination_address: o.cross_chain_config.destination_address.to_hex(),
        secret_hash: o.cross_chain_config.secret_hash.to_hex(),
    }
}

fn escrow_to_rpc(e: Escrow) -> RpcEscrow {
    RpcEscrow {
        id: e.id.to_hex(),
        order_hash: e.order_hash.to_hex(),
        role: match e.role {
            Role::Source => "source".to_string(),
            Role::Destination => "destination".to_string(),
        },
        maker: e.maker.to_hex(),
        taker: e.taker.to_hex(),
        native: e.native,
        total_amount: e.total_amount.to_string(),
        remaining_amount: e.remaining_amount.to_string(),
        status: format!("{:?}", e.status),
        deployed_at: e.deployed_at,
    }
}

fn resolver_to_rpc(r: Resolver) -> RpcResolver {
    let effectively_authorized = r.is_authorized();
    RpcResolver {
        address: r.address.to_hex(),
        stake: r.stake.to_string(),
        reputation: r.reputation,
        authorized: r.authorized,
        effectively_authorized,
        total_fills: r.total_fills,
        total_volume: r.total_volume.to_string(),
    }
}

fn journal_state_str(state: JournalState) -> String {
    match state {
        JournalState::Observed => "Observed".to_string(),
        JournalState::DestinationInitiated => "DestinationInitiated".to_string(),
        JournalState::PreimageKnown => "PreimageKnown".to_string(),
        JournalState::Completed => "Completed".to_string(),
        JournalState::Abandoned => "Abandoned".to_string(),
    }
}

#[async_trait]
impl SwapApiServer for RpcServer {
    async fn list_orders(&self, state: Option<String>) -> RpcResult<Vec<RpcOrder>> {
        let now: Timestamp = chrono::Utc::now().timestamp();
        let query = AuctionQuery::new(&self.state.db);
        let orders = self.state.db.iter_orders().map_err(storage)?;
        let mut out = Vec::new();
        for order in orders {
            if let Some(ref wanted) = state {
                let entry = self.state.db.get_journal(&order.order_hash).map_err(storage)?;
                let matches = entry
                    .map(|j| journal_state_str(j.state) == *wanted)
                    .unwrap_or(false);
                if !matches {
                    continue;
                }
            }
            let rate = query
                .current_rate(&order.order_hash, now)
                .map_err(|e| rpc_err(-32603, e.to_string()))?;
            out.push(order_to_rpc(order, rate));
        }
        Ok(out)
    }

    async fn get_order(&self, order_hash: String) -> RpcResult<Option<RpcOrder>> {
        let hash = OrderHash::from_hex(&order_hash).map_err(bad_hash)?;
        let now: Timestamp = chrono::Utc::now().timestamp();
        let Some(order) = self.state.db.get_order(&hash).map_err(storage)? else {
            return Ok(None);
        };
        let rate = AuctionQuery::new(&self.state.db)
            .current_rate(&hash, now)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(Some(order_to_rpc(order, rate)))
    }

    async fn get_escrows_for_order(&self, order_hash: String) -> RpcResult<Vec<RpcEscrow>> {
        let hash = OrderHash::from_hex(&order_hash).map_err(bad_hash)?;
        let escrows = self.state.db.iter_escrows_for_order(&hash).map_err(storage)?;
        Ok(escrows.into_iter().map(escrow_to_rpc).collect())
    }

    async fn list_resolvers(&self) -> RpcResult<Vec<RpcResolver>> {
        let registry = ResolverRegistry::new(&self.state.db);
        let active_count = registry.active_resolvers().map_err(storage)?.len();
        let mut resolvers = self.state.db.iter_resolvers().map_err(storage)?;
        resolvers.sort_by(|a, b| b.reputation.cmp(&a.reputation));
        info!(active_count, total = resolvers.len(), "listing resolvers");
        Ok(resolvers.into_iter().map(resolver_to_rpc).collect())
    }

    async fn get_journal(&self, order_hash: String) -> RpcResult<Option<RpcJournalEntry>> {
        let hash = OrderHash::from_hex(&order_hash).map_err(bad_hash)?;
        Ok(self
            .state
            .db
            .get_journal(&hash)
            .map_err(storage)?
            .map(|j| RpcJournalEntry {
                order_hash: j.order_hash.to_hex(),
                state: journal_state_str(j.state),
                last_step_at: j.last_step_at,
                retries: j.retries,
                last_seq: j.last_seq,
            }))
    }

    async fn list_journal(&self) -> RpcResult<Vec<RpcJournalEntry>> {
        let entries = self.state.db.iter_non_terminal_journal().map_err(storage)?;
        Ok(entries
            .into_iter()
            .map(|j| RpcJournalEntry {
                order_hash: j.order_hash.to_hex(),
                state: journal_state_str(j.state),
                last_step_at: j.last_step_at,
                retries: j.retries,
                last_seq: j.last_seq,
            })
            .collect())
    }

    async fn force_cancel(&self, order_hash: String) -> RpcResult<u32> {
        let hash = OrderHash::from_hex(&order_hash).map_err(bad_hash)?;
        let escrows = self.state.db.iter_escrows_for_order(&hash).map_err(storage)?;
        let now = chrono::Utc::now().timestamp();

        let mut refunded = 0u32;
        for escrow in escrows {
            if escrow.status.is_terminal() {
                continue;
            }
            let stage = escrow.timelocks.stage(escrow.role, now);
            if stage != swap_core::timelock::Stage::PublicCancellation {
                continue;
            }
            let action = Action::RefundPublic {
                id: escrow.id,
                caller: Address::null(),
            };
            self.state
                .engine
                .apply(&action, now)
                .map_err(|e| rpc_err(-32603, e.to_string()))?;
            refunded += 1;
        }
        Ok(refunded)
    }

    async fn replay_from(&self, seq: u64) -> RpcResult<u64> {
        let records = self.state.db.iter_log_from(seq).map_err(storage)?;
        info!(from_seq = seq, count = records.len(), "replaying journal log");
        Ok(records.len() as u64)
    }

    async fn get_version(&self) -> RpcResult<RpcVersionInfo> {
        Ok(RpcVersionInfo {
            node_version: env!("CARGO_PKG_VERSION").to_string(),
            api_version: "1".to_string(),
        })
    }
}
