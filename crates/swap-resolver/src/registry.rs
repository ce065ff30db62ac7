use swap_core::constants::MIN_STAKE;
use swap_core::error::SwapError;
use swap_core::resolver::{Resolver, ResolverAuthorization};
use swap_core::types::{Address, Amount};
use swap_state::StateDb;

/// Read-only view over resolver registry state (§3, §4.5).
///
/// The canonical source of truth is the `Resolver` record itself, mutated
/// exclusively through `swap_state::engine::SwapEngine`'s
/// `RegisterResolver`/`AuthorizeResolver`/`RecordFill`/`ApplyPenalty`/
/// `DistributeReward` actions (the latter three admin-gated), plus the
/// reputation bonus `fill_order` applies inline on a successful fill. This
/// struct only reads.
pub struct ResolverRegistry<'a> {
    db: &'a StateDb,
}

impl<'a> ResolverRegistry<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    /// Returns true if `address` is currently authorized to fill orders.
    pub fn is_authorized(&self, address: &Address) -> Result<bool, SwapError> {
        Ok(self
            .db
            .get_resolver(address)?
            .map(|r| r.is_authorized())
            .unwrap_or(false))
    }

    pub fn stake_of(&self, address: &Address) -> Result<Amount, SwapError> {
        Ok(self.db.get_resolver(address)?.map(|r| r.stake).unwrap_or(0))
    }

    pub fn reputation_of(&self, address: &Address) -> Result<u32, SwapError> {
        Ok(self
            .db
            .get_resolver(address)?
            .map(|r| r.reputation)
            .unwrap_or(0))
    }

    pub fn meets_stake_requirement(&self, address: &Address) -> Result<bool, SwapError> {
        Ok(self.stake_of(address)? >= MIN_STAKE)
    }

    pub fn authorization_of(&self, address: &Address) -> Result<ResolverAuthorization, SwapError> {
        let resolver = self.db.get_resolver(address)?;
        Ok(ResolverAuthorization::from_optional(resolver.as_ref()))
    }

    /// All resolvers currently eligible to fill orders, ranked by
    /// reputation descending (used by `swap-cli`'s `list-resolvers`).
    pub fn active_resolvers(&self) -> Result<Vec<Resolver>, SwapError> {
        let mut resolvers: Vec<Resolver> = self
            .db
            .iter_resolvers()?
            .into_iter()
            .filter(|r| r.is_authorized())
            .collect();
        resolvers.sort_by(|a, b| b.reputation.cmp(&a.reputation));
        Ok(resolvers)
    }

    pub fn min_stake() -> Amount {
        MIN_STAKE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_state::SwapEngine;
    use swap_core::Action;
    use std::sync::Arc;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("swap_resolver_registry_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    #[test]
    fn unregistered_resolver_has_no_stake_or_authorization() {
        let db = temp_db("unregistered");
        let registry = ResolverRegistry::new(&db);
        let addr = Address(vec![7]);
        assert_eq!(registry.stake_of(&addr).unwrap(), 0);
        assert!(!registry.is_authorized(&addr).unwrap());
        assert_eq!(
            registry.authorization_of(&addr).unwrap(),
            ResolverAuthorization::Unregistered
        );
    }

    #[test]
    fn registered_and_authorized_resolver_appears_in_active_list() {
        let db = Arc::new(temp_db("active"));
        let engine = SwapEngine::new(db.clone(), Address(vec![0xAD]));
        let resolver = Address(vec![3]);

        engine
            .apply(
                &Action::RegisterResolver { address: resolver.clone(), stake: MIN_STAKE },
                0,
            )
            .unwrap();
        engine
            .apply(
                &Action::AuthorizeResolver {
                    caller: Address(vec![0xAD]),
                    resolver: resolver.clone(),
                    flag: true,
                },
                0,
            )
            .unwrap();

        let registry = ResolverRegistry::new(&db);
        assert!(registry.is_authorized(&resolver).unwrap());
        assert!(registry.meets_stake_requirement(&resolver).unwrap());
        let active = registry.active_resolvers().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].address, resolver);
    }
}
