use sha3::{Digest, Keccak256};

use swap_core::types::{Address, Amount, ChainId, EscrowId, HashLock, OrderHash, Preimage, Role, Timestamp};

/// `lock(preimage) → H` (§4.1).
pub fn lock(preimage: &Preimage) -> HashLock {
    let mut hasher = Keccak256::new();
    hasher.update(preimage.as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    HashLock(out)
}

/// `verify(preimage, H) → bool` (§4.1).
pub fn verify(preimage: &Preimage, hashlock: &HashLock) -> bool {
    lock(preimage) == *hashlock
}

/// `is_well_formed(H) → bool` — rejects the zero digest (§3, §4.1).
pub fn is_well_formed(hashlock: &HashLock) -> bool {
    !hashlock.is_zero()
}

/// Generate a fresh random 32-byte preimage (maker/resolver side, never
/// used on the coordinator's side — the coordinator only ever relays a
/// preimage it has observed on-chain).
pub fn generate_preimage() -> Preimage {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    Preimage(bytes)
}

/// Derive the `OrderHash` for a new order (§3): keccak256 over
/// (maker, source_amount, destination_amount, auction window, nonce,
/// chain id, native flag), each field canonically big-endian encoded.
#[allow(clippy::too_many_arguments)]
pub fn order_hash(
    maker: &Address,
    source_amount: Amount,
    destination_amount: Amount,
    auction_start: Timestamp,
    auction_end: Timestamp,
    nonce: u64,
    chain_id: ChainId,
    native: bool,
) -> OrderHash {
    let mut hasher = Keccak256::new();
    hasher.update(&maker.0);
    hasher.update(source_amount.to_be_bytes());
    hasher.update(destination_amount.to_be_bytes());
    hasher.update(auction_start.to_be_bytes());
    hasher.update(auction_end.to_be_bytes());
    hasher.update(nonce.to_be_bytes());
    hasher.update(chain_id.to_be_bytes());
    hasher.update([native as u8]);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    OrderHash(out)
}

/// Derive the `EscrowId` for one leg of one fill of a swap: keccak256
/// (order_hash || role tag || fill_index). Salted by `Role` so the source
/// and destination legs never collide, and by `fill_index` so partial
/// fills of the same order (each a separate escrow, possibly taken by
/// different resolvers) get distinct ids (§4.6).
pub fn escrow_id(order_hash: &OrderHash, role: Role, fill_index: u32) -> EscrowId {
    let mut hasher = Keccak256::new();
    hasher.update(order_hash.as_bytes());
    hasher.update([match role {
        Role::Source => 0u8,
        Role::Destination => 1u8,
    }]);
    hasher.update(fill_index.to_be_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    EscrowId(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_then_verify_round_trips() {
        let preimage = generate_preimage();
        let hashlock = lock(&preimage);
        assert!(verify(&preimage, &hashlock));
    }

    #[test]
    fn wrong_preimage_does_not_verify() {
        let p1 = generate_preimage();
        let p2 = generate_preimage();
        let hashlock = lock(&p1);
        assert!(!verify(&p2, &hashlock));
    }

    #[test]
    fn zero_hashlock_is_not_well_formed() {
        assert!(!is_well_formed(&HashLock([0u8; 32])));
    }

    #[test]
    fn lock_of_zero_preimage_is_well_formed_but_not_zero() {
        // keccak256 of 32 zero bytes is not the zero digest.
        let hashlock = lock(&Preimage([0u8; 32]));
        assert!(is_well_formed(&hashlock));
    }

    #[test]
    fn order_hash_is_deterministic() {
        let maker = Address(vec![1, 2, 3]);
        let a = order_hash(&maker, 100, 200, 10, 20, 1, 1, true);
        let b = order_hash(&maker, 100, 200, 10, 20, 1, 1, true);
        assert_eq!(a, b);
    }

    #[test]
    fn order_hash_changes_with_nonce() {
        let maker = Address(vec![1, 2, 3]);
        let a = order_hash(&maker, 100, 200, 10, 20, 1, 1, true);
        let b = order_hash(&maker, 100, 200, 10, 20, 2, 1, true);
        assert_ne!(a, b);
    }

    #[test]
    fn escrow_id_differs_by_role_and_fill_index() {
        let oh = OrderHash([9u8; 32]);
        let src = escrow_id(&oh, Role::Source, 0);
        let dst = escrow_id(&oh, Role::Destination, 0);
        let src_second_fill = escrow_id(&oh, Role::Source, 1);
        assert_ne!(src, dst);
        assert_ne!(src, src_second_fill);
    }
}
