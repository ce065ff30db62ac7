//! swap-crypto
//!
//! Hashlock primitives (C1) and the signer oracle abstraction (C10). Uses
//! `sha3::Keccak256` for all hashing, per §3's `HashLock = keccak256(preimage)`.

pub mod hash;
pub mod signer;

pub use hash::{escrow_id, generate_preimage, is_well_formed, lock, order_hash, verify};
pub use signer::{MockSigner, Signature, Signer};
