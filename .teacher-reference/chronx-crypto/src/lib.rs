pub mod dilithium;
pub mod hash;
pub mod keypair;
pub mod pow;

pub use dilithium::{verify_signature, ChronxSigner};
pub use hash::{blake3_hash, tx_id_from_body};
pub use keypair::KeyPair;
pub use pow::{mine_pow, verify_pow};
