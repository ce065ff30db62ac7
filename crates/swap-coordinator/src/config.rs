use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Coordinator configuration (§6): CLI flags with `SWAP_`-prefixed
/// environment variable fallbacks, in the manner of the ambient
/// configuration stack (§10.2).
#[derive(Parser, Debug)]
#[command(
    name = "swap-coordinator",
    version,
    about = "Cross-chain atomic-swap coordinator"
)]
pub struct Args {
    /// Directory for the persistent state database.
    #[arg(long, env = "SWAP_DATA_DIR", default_value = "~/.swap-coordinator/data")]
    pub data_dir: PathBuf,

    /// Source-chain RPC endpoint URL. No production `ChainClient` backend
    /// exists yet (§4.10) — this is recorded for the day one is wired in.
    #[arg(long, env = "SWAP_SOURCE_RPC_URL", default_value = "http://localhost:8645")]
    pub source_rpc_url: String,

    /// Destination-chain RPC endpoint URL.
    #[arg(long, env = "SWAP_DESTINATION_RPC_URL", default_value = "http://localhost:8646")]
    pub destination_rpc_url: String,

    /// Hex-encoded administrator address, authorized for
    /// `AuthorizeResolver`/`ApplyPenalty`/`DistributeReward` (§4.5, §9).
    #[arg(long, env = "SWAP_ADMIN_ADDRESS")]
    pub admin_address: String,

    /// Chain-event polling interval, in seconds (§6). Unused by the
    /// in-memory `ChainClient` (§4.10), which pushes events over an mpsc
    /// channel rather than being polled; recorded here for the day a
    /// production log-poller is wired in behind the same trait.
    #[arg(long, env = "SWAP_POLL_INTERVAL_SECS", default_value_t = 10)]
    pub poll_interval_secs: u64,

    /// Maximum retry attempts per submitted transaction before a stage is
    /// abandoned (§4.8(e)).
    #[arg(long, env = "SWAP_MAX_RETRIES", default_value_t = 5)]
    pub max_retries: u32,

    /// Administrative JSON-RPC bind address (§4.11, §6).
    #[arg(long, env = "SWAP_RPC_ADDR", default_value = "127.0.0.1:8900")]
    pub rpc_addr: SocketAddr,
}

/// Expand a leading `~` to the user's home directory (`HOME`/`USERPROFILE`).
pub fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
