use thiserror::Error;

/// All named error reasons from §4 and §6, grouped by the error-kind table
/// of §7. The Display message of each variant is the reason string surfaced
/// to operators (CLI) and logged verbatim by the coordinator.
#[derive(Debug, Error)]
pub enum SwapError {
    // ── ValidationError ─────────────────────────────────────────────────────
    #[error("amount must be nonzero")]
    InvalidAmount,
    #[error("hashlock is zero or otherwise malformed")]
    InvalidHashLock,
    #[error("timelock stage is in the past or violates ordering: {0}")]
    InvalidTimeLock(String),
    #[error("safety deposit {got} below policy minimum {min}")]
    InsufficientSafetyDeposit { got: u128, min: u128 },
    #[error("auction window invalid: {0}")]
    InvalidAuctionWindow(String),
    #[error("split policy basis points sum to {got}, expected 10000")]
    BasisPointsMismatch { got: u32 },
    #[error("resolver stake {got} outside bounds [{min}, {max}]")]
    StakeOutOfBounds { got: u128, min: u128, max: u128 },

    // ── StageError ──────────────────────────────────────────────────────────
    #[error("operation not permitted in current stage (wanted {wanted}, at {actual:?})")]
    WrongStage { wanted: &'static str, actual: String },
    #[error("escrow is already in a terminal state")]
    AlreadyTerminal,

    // ── AuthError ───────────────────────────────────────────────────────────
    #[error("caller is not authorized for this operation")]
    NotAuthorized,
    #[error("caller is not a registered resolver")]
    UnknownResolver,
    #[error("resolver reputation {reputation} below minimum {min}")]
    ReputationTooLow { reputation: u32, min: u32 },

    // ── ReplayError ─────────────────────────────────────────────────────────
    #[error("preimage does not match the escrow's hashlock")]
    InvalidSecret,
    #[error("preimage has already been used on this chain")]
    SecretReplay,
    #[error("escrow id collides with an existing escrow")]
    EscrowAlreadyExists,
    #[error("order hash collides with an existing order")]
    OrderAlreadyExists,

    // ── TransientChainError ─────────────────────────────────────────────────
    #[error("RPC call to chain timed out")]
    ChainTimeout,
    #[error("transaction nonce collision, retry")]
    NonceCollision,
    #[error("chain reorg observed, retry")]
    Reorg,

    // ── StageExpiredError ───────────────────────────────────────────────────
    #[error("stage window passed before the action landed on-chain")]
    StageExpired,

    // ── FatalConfigError ────────────────────────────────────────────────────
    #[error("missing signer credentials")]
    MissingCredentials,
    #[error("bad contract or chain address: {0}")]
    BadAddress(String),

    // ── Lookup / bookkeeping ────────────────────────────────────────────────
    #[error("escrow not found: {0}")]
    EscrowNotFound(String),
    #[error("order not found: {0}")]
    OrderNotFound(String),
    #[error("resolver not found: {0}")]
    ResolverNotFound(String),
    #[error("journal entry not found: {0}")]
    JournalEntryNotFound(String),
    #[error("order is not active")]
    OrderNotActive,
    #[error("requested amount {amount} exceeds remaining {remaining}")]
    AmountExceedsRemaining { amount: u128, remaining: u128 },
    #[error("auction returned a zero rate")]
    InvalidRate,

    // ── Storage / serialization ─────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),

    // ── Catch-all ───────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}
