use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte digest identifying a swap across both chains. Derived from
/// (maker, source_amount, destination_amount, auction window, nonce, chain id,
/// native flag) — see `swap_crypto::hash::order_hash`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct OrderHash(pub [u8; 32]);

/// 32-byte digest identifying one escrow leg. Derived the same way as an
/// `OrderHash` but additionally salted by `Role`, so the two legs of one swap
/// never collide.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EscrowId(pub [u8; 32]);

/// `keccak256(preimage)`. Never the zero digest for a well-formed lock.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashLock(pub [u8; 32]);

/// 32-byte secret whose keccak256 hash equals a `HashLock`.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preimage(pub [u8; 32]);

/// Chain-agnostic party address. Both chains are treated as opaque
/// byte-string address spaces at this layer (§1: concrete encoding is a
/// collaborator's concern).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Address(pub Vec<u8>);

/// Opaque destination-chain-side order handle, passed through from the
/// façade to the coordinator (§4.7).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalOrderRef(pub String);

pub type Amount = u128;
pub type Timestamp = i64;
pub type ChainId = u64;
pub type Nonce = u64;

macro_rules! impl_hex_id {
    ($t:ty) => {
        impl $t {
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let bytes = hex::decode(s.trim_start_matches("0x"))?;
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| hex::FromHexError::InvalidStringLength)?;
                Ok(Self(arr))
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let hex = self.to_hex();
                write!(f, "{}..{}", &hex[..6], &hex[hex.len() - 4..])
            }
        }

        impl fmt::Debug for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{})", stringify!($t), self.to_hex())
            }
        }
    };
}

impl_hex_id!(OrderHash);
impl_hex_id!(EscrowId);
impl_hex_id!(HashLock);

impl Preimage {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Preimage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Preimage(<redacted, {} bytes>)", self.0.len())
    }
}

impl Address {
    pub fn null() -> Self {
        Self(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(hex::decode(s.trim_start_matches("0x"))?))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "<any>")
        } else {
            write!(f, "0x{}", self.to_hex())
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// Which chain leg an escrow belongs to. Selects which half of `Timelocks`
/// (`src_*` vs `dst_*`) governs stage transitions and which chain's
/// `UsedPreimages` tree is consulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Source,
    Destination,
}
