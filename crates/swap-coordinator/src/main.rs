//! swap-coordinator — the cross-chain atomic-swap coordinator binary.
//!
//! Startup sequence (§4.8):
//!   1. Open (or initialise) the state database
//!   2. Restart recovery: replay the journal, reconcile against on-chain state
//!   3. Start the administrative JSON-RPC server (§4.11)
//!   4. Subscribe to both chains' event streams
//!   5. Dispatch events to one worker task per OrderHash (§5, §4.8(h))

mod config;
mod recovery;
mod worker;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use config::{expand_tilde, Args};
use swap_chain::{ChainClient, ChainEvent, MockChainClient};
use swap_core::types::{Address, OrderHash, Role};
use swap_crypto::{MockSigner, Signer};
use swap_rpc::{RpcServer, RpcServerState};
use swap_state::{StateDb, SwapEngine};
use worker::OrderWorker;

/// Everything a freshly-spawned `OrderWorker` needs, bundled so the
/// dispatcher doesn't have to thread six `Arc`s through every call.
struct Deps {
    db: Arc<StateDb>,
    source: Arc<dyn ChainClient>,
    destination: Arc<dyn ChainClient>,
    source_signer: Arc<dyn Signer>,
    destination_signer: Arc<dyn Signer>,
    max_retries: u32,
}

/// Which `OrderHash` a given `ChainEvent` belongs to, so the dispatcher can
/// route it to the right per-order queue (§4.8(h)). Escrow-level events
/// carry it as `external_order_ref`, a hex `OrderHash`; order-level events
/// carry it directly.
fn order_hash_of(event: &ChainEvent) -> Option<OrderHash> {
    match event {
        ChainEvent::CrossChainOrderCreated { order_hash, .. }
        | ChainEvent::CrossChainOrderFilled { order_hash, .. }
        | ChainEvent::CrossChainOrderCancelled { order_hash, .. }
        | ChainEvent::OrderFillRecorded { order_hash, .. } => Some(*order_hash),
        ChainEvent::EscrowCreated { external_order_ref, .. }
        | ChainEvent::EscrowFilled { external_order_ref, .. }
        | ChainEvent::EscrowPartiallyFilled { external_order_ref, .. }
        | ChainEvent::EscrowRefunded { external_order_ref, .. }
        | ChainEvent::EscrowCancelled { external_order_ref, .. } => {
            OrderHash::from_hex(external_order_ref).ok()
        }
        ChainEvent::ResolverRegistered { .. } => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,swap=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("swap coordinator starting");

    // ── State database ───────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    let admin = Address::from_hex(&args.admin_address).context("parsing --admin-address")?;
    let engine = Arc::new(SwapEngine::new(Arc::clone(&db), admin));

    // ── Chain clients ─────────────────────────────────────────────────────
    // §4.10: no production `ChainClient` backend exists yet; the mock is
    // the coordinator's only implementation until a real EVM/Move client is
    // wired in, at which point only this wiring changes.
    let now = chrono::Utc::now().timestamp();
    info!(url = %args.source_rpc_url, "using in-memory chain client for source side");
    info!(url = %args.destination_rpc_url, "using in-memory chain client for destination side");
    let source: Arc<dyn ChainClient> = Arc::new(MockChainClient::new(Role::Source, now));
    let destination: Arc<dyn ChainClient> = Arc::new(MockChainClient::new(Role::Destination, now));

    // ── Signers ───────────────────────────────────────────────────────────
    // §4.10: no production `Signer` backend exists either; the coordinator
    // still consults the oracle before every submitted transaction
    // (`OrderWorker::sign`), it just signs with a fixture key for now.
    let source_signer: Arc<dyn Signer> = Arc::new(MockSigner::new(b"source".to_vec()));
    let destination_signer: Arc<dyn Signer> = Arc::new(MockSigner::new(b"destination".to_vec()));

    let deps = Deps {
        db: Arc::clone(&db),
        source: Arc::clone(&source),
        destination: Arc::clone(&destination),
        source_signer,
        destination_signer,
        max_retries: args.max_retries,
    };

    // ── Restart recovery (§4.8(f)) ───────────────────────────────────────
    let recovered = recovery::recover(&db, &source, &destination)
        .await
        .context("recovering in-flight orders")?;

    // ── Per-OrderHash worker dispatch (§5, §4.8(h)) ──────────────────────
    let mut workers: HashMap<OrderHash, mpsc::Sender<ChainEvent>> = HashMap::new();
    for order_hash in recovered {
        spawn_worker(order_hash, &deps, &mut workers);
    }

    // ── Administrative RPC server (§4.11) ────────────────────────────────
    let rpc_state = Arc::new(RpcServerState {
        db: Arc::clone(&db),
        engine: Arc::clone(&engine),
    });
    let _rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting administrative RPC server")?;

    // ── Event ingestion loop (§4.8(a)) ───────────────────────────────────
    let mut source_events = source.subscribe_events();
    let mut destination_events = destination.subscribe_events();

    info!("coordinator ready");
    loop {
        tokio::select! {
            Some(event) = source_events.recv() => {
                dispatch(event, &deps, &mut workers);
            }
            Some(event) = destination_events.recv() => {
                dispatch(event, &deps, &mut workers);
            }
            else => break,
        }
    }

    Ok(())
}

fn spawn_worker(
    order_hash: OrderHash,
    deps: &Deps,
    workers: &mut HashMap<OrderHash, mpsc::Sender<ChainEvent>>,
) -> mpsc::Sender<ChainEvent> {
    let (tx, rx) = mpsc::channel(64);
    let worker = OrderWorker::new(
        order_hash,
        Arc::clone(&deps.db),
        Arc::clone(&deps.source),
        Arc::clone(&deps.destination),
        Arc::clone(&deps.source_signer),
        Arc::clone(&deps.destination_signer),
        deps.max_retries,
    );
    tokio::spawn(worker.run(rx));
    workers.insert(order_hash, tx.clone());
    tx
}

fn dispatch(
    event: ChainEvent,
    deps: &Deps,
    workers: &mut HashMap<OrderHash, mpsc::Sender<ChainEvent>>,
) {
    let Some(order_hash) = order_hash_of(&event) else {
        warn!("dropping chain event with no resolvable OrderHash");
        return;
    };

    let sender = workers
        .get(&order_hash)
        .cloned()
        .unwrap_or_else(|| spawn_worker(order_hash, deps, workers));

    if sender.try_send(event).is_err() {
        warn!(%order_hash, "worker queue full or closed; dropping event");
    }
}
