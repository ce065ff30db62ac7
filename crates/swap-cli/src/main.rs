//! swap-cli
//!
//! Administrative CLI for the swap coordinator (§4.11, §6). Talks to a
//! running `swap-coordinator`'s JSON-RPC server.
//!
//! Usage:
//!   swap-cli list-orders    [--state <state>] [--rpc <url>]
//!   swap-cli show-order     <order-hash>       [--rpc <url>]
//!   swap-cli force-cancel   <order-hash>       [--rpc <url>]
//!   swap-cli replay-from    <seq>              [--rpc <url>]
//!
//! Exit codes: 0 success, 2 bad arguments, 3 chain unreachable, 4 not found.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod rpc_client;
use rpc_client::CliRpcClient;

#[derive(Parser, Debug)]
#[command(
    name = "swap-cli",
    version,
    about = "Administrative CLI for the swap coordinator"
)]
struct Args {
    /// Coordinator administrative RPC endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8900")]
    rpc: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List orders, optionally filtered by journal state.
    ListOrders {
        /// Journal state name (Observed, DestinationInitiated,
        /// PreimageKnown, Completed, Abandoned).
        #[arg(long)]
        state: Option<String>,
    },

    /// Show a single order plus its escrows.
    ShowOrder {
        /// Hex-encoded OrderHash.
        order_hash: String,
    },

    /// Trigger the public-refund path on an order's escrows, if stage permits.
    ForceCancel {
        /// Hex-encoded OrderHash.
        order_hash: String,
    },

    /// Rewind the journal and replay the append-only log from `seq` onward.
    ReplayFrom {
        /// Log sequence number to replay from.
        seq: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter("warn,swap_cli=info")
        .init();

    let args = Args::parse();
    let client = CliRpcClient::new(&args.rpc);

    match run(&client, args.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            if is_unreachable(&e) {
                ExitCode::from(3)
            } else {
                ExitCode::from(2)
            }
        }
    }
}

fn is_unreachable(err: &anyhow::Error) -> bool {
    err.chain().any(|c| c.downcast_ref::<reqwest::Error>().is_some())
}

async fn run(client: &CliRpcClient, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::ListOrders { state } => {
            let orders = client.list_orders(state).await?;
            if orders.is_empty() {
                println!("(no orders)");
                return Ok(ExitCode::SUCCESS);
            }
            for o in orders {
                println!(
                    "{}  maker={}  {}/{}  rate={}  active={}",
                    &o.order_hash[..18.min(o.order_hash.len())],
                    o.maker,
                    o.remaining_source_amount,
                    o.source_amount,
                    o.current_rate,
                    o.active,
                );
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::ShowOrder { order_hash } => {
            let Some(order) = client.get_order(&order_hash).await? else {
                eprintln!("order not found: {order_hash}");
                return Ok(ExitCode::from(4));
            };
            println!("Order:                  {}", order.order_hash);
            println!("Maker:                  {}", order.maker);
            println!("Source amount:          {} / {}", order.remaining_source_amount, order.source_amount);
            println!("Destination amount:     {} / {}", order.remaining_destination_amount, order.destination_amount);
            println!("Deadline:               {}", order.deadline);
            println!("Active:                 {}", order.active);
            println!("Total fills:            {}", order.total_fills);
            println!("Auction window:         {} .. {}", order.auction_start_time, order.auction_end_time);
            println!("Auction rate range:     {} .. {}", order.auction_start_rate, order.auction_end_rate);
            println!("Current rate:           {}", order.current_rate);
            println!("Destination chain:      {}", order.destination_chain_id);
            println!("Destination address:    {}", order.destination_address);
            println!("Secret hash:            {}", order.secret_hash);

            let escrows = client.get_escrows_for_order(&order_hash).await?;
            println!("\nEscrows ({}):", escrows.len());
            for e in &escrows {
                println!(
                    "  {} [{}] {}/{} status={} deployed_at={}",
                    e.id, e.role, e.remaining_amount, e.total_amount, e.status, e.deployed_at
                );
            }

            if let Some(journal) = client.get_journal(&order_hash).await? {
                println!(
                    "\nJournal:                state={} retries={} last_step_at={}",
                    journal.state, journal.retries, journal.last_step_at
                );
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::ForceCancel { order_hash } => {
            let count = client.force_cancel(&order_hash).await?;
            println!("Refunded {count} escrow(s) for order {order_hash}");
            Ok(ExitCode::SUCCESS)
        }

        Command::ReplayFrom { seq } => {
            let count = client.replay_from(seq).await?;
            println!("Replayed {count} log record(s) from sequence {seq}");
            Ok(ExitCode::SUCCESS)
        }
    }
}
