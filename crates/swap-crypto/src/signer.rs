//! The coordinator's signing layer is explicitly out of scope (§1): treated
//! as a `sign(blob) → signature` oracle. This module defines that oracle's
//! contract and a test-only in-memory implementation; no real key custody
//! lives in this crate.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(pub Vec<u8>);

pub trait Signer: Send + Sync {
    fn sign(&self, blob: &[u8]) -> Signature;
}

/// Deterministic test double: "signs" by hashing the blob with a fixed
/// fixture tag, so tests can assert on signature bytes without any real key
/// material ever existing in-process.
pub struct MockSigner {
    tag: Vec<u8>,
}

impl MockSigner {
    pub fn new(tag: impl Into<Vec<u8>>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Default for MockSigner {
    fn default() -> Self {
        Self::new(b"mock-signer".to_vec())
    }
}

impl Signer for MockSigner {
    fn sign(&self, blob: &[u8]) -> Signature {
        use sha3::{Digest, Keccak256};
        let mut hasher = Keccak256::new();
        hasher.update(&self.tag);
        hasher.update(blob);
        Signature(hasher.finalize().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_signer_is_deterministic() {
        let signer = MockSigner::default();
        assert_eq!(signer.sign(b"hello"), signer.sign(b"hello"));
    }

    #[test]
    fn mock_signer_differs_by_blob() {
        let signer = MockSigner::default();
        assert_ne!(signer.sign(b"hello"), signer.sign(b"world"));
    }
}
