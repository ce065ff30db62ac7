//! The state transition engine (C2/C3/C5/C6/C7): validates and applies one
//! `Action` at a time against the persistent `StateDb`. Mirrors the
//! teacher's `StateEngine`: stage every mutation in a `StagedMutations`
//! value, and only write it to the database once every precondition in the
//! action's contract has passed.

use std::sync::Arc;

use tracing::info;

use swap_core::constants::{
    MAX_AUCTION_DURATION_SECS, MAX_REPUTATION, MAX_STAKE, MIN_AUCTION_DURATION_SECS,
    MIN_REPUTATION, MIN_SAFETY_DEPOSIT, MIN_STAKE, NATIVE_UNIT, RATE_ONE,
    REPUTATION_BASE_GAIN, REPUTATION_GOOD_RATE_BONUS, REPUTATION_VOLUME_BONUS_10X,
    REPUTATION_VOLUME_BONUS_1X, RESCUE_DELAY_SECS,
};
use swap_core::error::SwapError;
use swap_core::escrow::{Escrow, EscrowStatus};
use swap_core::order::{compute_taking, dutch_auction_rate, CrossChainConfig, Order};
use swap_core::resolver::{Resolver, ResolverAuthorization};
use swap_core::timelock::Stage;
use swap_core::types::{Address, Amount, EscrowId, OrderHash, Role, Timestamp};
use swap_core::Action;

use crate::db::StateDb;

// ── Staged mutations ─────────────────────────────────────────────────────────

/// Everything one `apply_action` call wants to write, collected before any
/// of it is committed. An action either stages a complete, self-consistent
/// set of writes or returns `Err` and stages nothing.
#[derive(Default)]
struct StagedMutations {
    escrows: Vec<Escrow>,
    orders: Vec<Order>,
    resolvers: Vec<Resolver>,
    preimages: Vec<(Role, [u8; 32])>,
}

// ── Outcomes ─────────────────────────────────────────────────────────────────

/// What an applied action produced, for the caller (coordinator, RPC
/// handler, or test) to react to.
#[derive(Clone, Debug)]
pub enum ActionOutcome {
    EscrowCreated { id: EscrowId },
    Claimed { id: EscrowId, amount: Amount },
    Refunded { id: EscrowId },
    Rescued { id: EscrowId, amount: Amount },
    ResolverRegistered { address: Address, stake: Amount },
    ResolverUnregistered { address: Address, returned: Amount },
    ResolverAuthorized { address: Address, authorized: bool },
    FillRecorded { address: Address, reputation: u32 },
    PenaltyApplied { address: Address, reputation: u32 },
    RewardDistributed { address: Address, stake: Amount },
    OrderCreated { order_hash: OrderHash },
    OrderFilled {
        order_hash: OrderHash,
        src_escrow: EscrowId,
        taking: Amount,
        rate: u128,
    },
    OrderCancelled { order_hash: OrderHash },
    BidRecorded { order_hash: OrderHash },
}

// ── SwapEngine ───────────────────────────────────────────────────────────────

/// The state transition engine. `admin` gates the registry operations that
/// §4.5/§9 reserve to an operator caller (`authorize`, `apply_penalty`,
/// `distribute_reward`); every other operation's caller check is against
/// the data itself (maker, designated taker, registered resolver).
pub struct SwapEngine {
    pub db: Arc<StateDb>,
    pub admin: Address,
}

impl SwapEngine {
    pub fn new(db: Arc<StateDb>, admin: Address) -> Self {
        Self { db, admin }
    }

    pub fn apply(&self, action: &Action, now: Timestamp) -> Result<ActionOutcome, SwapError> {
        let mut staged = StagedMutations::default();
        let outcome = self.apply_action(action, &mut staged, now)?;

        for escrow in &staged.escrows {
            self.db.put_escrow(escrow)?;
        }
        for order in &staged.orders {
            self.db.put_order(order)?;
        }
        for resolver in &staged.resolvers {
            self.db.put_resolver(resolver)?;
        }
        for (role, preimage) in &staged.preimages {
            self.db.mark_preimage_used(*role, preimage)?;
        }

        info!(?action, "applied action");
        Ok(outcome)
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    fn apply_action(
        &self,
        action: &Action,
        staged: &mut StagedMutations,
        now: Timestamp,
    ) -> Result<ActionOutcome, SwapError> {
        match action {
            Action::CreateEscrow {
                id,
                order_hash,
                role,
                maker,
                taker,
                native,
                token,
                amount,
                safety_deposit,
                hashlock,
                timelocks,
                external_order_ref,
            } => self.create_escrow(
                staged,
                *id,
                *order_hash,
                *role,
                maker.clone(),
                taker.clone(),
                *native,
                token.clone(),
                *amount,
                *safety_deposit,
                *hashlock,
                *timelocks,
                external_order_ref.clone(),
                now,
            ),

            Action::Claim { id, caller, preimage } => {
                self.claim(staged, *id, caller, *preimage, false, now)
            }
            Action::ClaimPublic { id, caller, preimage } => {
                self.claim(staged, *id, caller, *preimage, true, now)
            }
            Action::ClaimPartial { id, caller, preimage, amount } => {
                self.claim_partial(staged, *id, caller, *preimage, *amount, now)
            }
            Action::Refund { id, caller } => self.refund(staged, *id, caller, false, now),
            Action::RefundPublic { id, caller } => self.refund(staged, *id, caller, true, now),
            Action::Rescue { id, caller, asset, amount } => {
                self.rescue(staged, *id, caller, asset.clone(), *amount, now)
            }

            Action::RegisterResolver { address, stake } => {
                self.register_resolver(staged, address.clone(), *stake, now)
            }
            Action::UnregisterResolver { address } => {
                self.unregister_resolver(staged, address.clone())
            }
            Action::AuthorizeResolver { caller, resolver, flag } => {
                self.authorize_resolver(staged, caller, resolver.clone(), *flag)
            }
            Action::RecordFill { caller, resolver, amount, rate } => {
                self.record_fill(staged, caller, resolver.clone(), *amount, *rate, now)
            }
            Action::ApplyPenalty { caller, resolver, amount } => {
                self.apply_penalty(staged, caller, resolver.clone(), *amount)
            }
            Action::DistributeReward { caller, resolver, amount } => {
                self.distribute_reward(staged, caller, resolver.clone(), *amount)
            }

            Action::CreateOrder {
                maker,
                source_amount,
                destination_amount,
                native,
                chain_id,
                deadline,
                auction_config,
                destination_chain_id,
                timelock_duration_secs,
                destination_address,
                secret_hash,
            } => self.create_order(
                staged,
                maker.clone(),
                *source_amount,
                *destination_amount,
                *native,
                *chain_id,
                *deadline,
                *auction_config,
                *destination_chain_id,
                *timelock_duration_secs,
                destination_address.clone(),
                *secret_hash,
                now,
            ),
            Action::FillOrder {
                order_hash,
                resolver,
                preimage,
                amount,
                escrow_timelocks,
                safety_deposit,
            } => self.fill_order(
                staged,
                *order_hash,
                resolver.clone(),
                *preimage,
                *amount,
                *escrow_timelocks,
                *safety_deposit,
                now,
            ),
            Action::CancelOrder { order_hash, caller } => {
                self.cancel_order(staged, *order_hash, caller)
            }
            Action::RecordBid { order_hash, bidder, amount } => {
                self.record_bid(staged, *order_hash, bidder.clone(), *amount, now)
            }
        }
    }

    // ── C2/C3 escrow state machine ───────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    fn create_escrow(
        &self,
        staged: &mut StagedMutations,
        id: EscrowId,
        order_hash: OrderHash,
        role: Role,
        maker: Address,
        taker: Address,
        native: bool,
        token: Option<Address>,
        amount: Amount,
        safety_deposit: Amount,
        hashlock: swap_core::types::HashLock,
        timelocks: swap_core::timelock::Timelocks,
        external_order_ref: String,
        now: Timestamp,
    ) -> Result<ActionOutcome, SwapError> {
        if amount == 0 {
            return Err(SwapError::InvalidAmount);
        }
        if !swap_crypto::is_well_formed(&hashlock) {
            return Err(SwapError::InvalidHashLock);
        }
        if safety_deposit < MIN_SAFETY_DEPOSIT {
            return Err(SwapError::InsufficientSafetyDeposit {
                got: safety_deposit,
                min: MIN_SAFETY_DEPOSIT,
            });
        }
        timelocks.validate(now)?;
        if self.db.get_escrow(&id)?.is_some() {
            return Err(SwapError::EscrowAlreadyExists);
        }

        staged.escrows.push(Escrow {
            id,
            order_hash,
            role,
            maker,
            taker,
            native,
            token,
            total_amount: amount,
            remaining_amount: amount,
            hashlock,
            timelocks,
            safety_deposit,
            deployed_at: now,
            status: EscrowStatus::Created,
            revealed_preimage: None,
            external_order_ref,
        });
        Ok(ActionOutcome::EscrowCreated { id })
    }

    fn load_escrow(&self, id: EscrowId) -> Result<Escrow, SwapError> {
        self.db
            .get_escrow(&id)?
            .ok_or_else(|| SwapError::EscrowNotFound(id.to_hex()))
    }

    fn claim(
        &self,
        staged: &mut StagedMutations,
        id: EscrowId,
        caller: &Address,
        preimage: swap_core::types::Preimage,
        public: bool,
        now: Timestamp,
    ) -> Result<ActionOutcome, SwapError> {
        let mut escrow = self.load_escrow(id)?;
        if escrow.status.is_terminal() {
            return Err(SwapError::AlreadyTerminal);
        }
        let wanted = if public {
            Stage::PublicWithdrawal
        } else {
            Stage::PrivateWithdrawal
        };
        let actual = escrow.timelocks.stage(escrow.role, now);
        if actual != wanted {
            return Err(SwapError::WrongStage {
                wanted: wanted.name(),
                actual: actual.name().into(),
            });
        }
        if public {
            let authorized = self.db.get_resolver(caller)?.map_or(false, |r| r.is_authorized());
            if !authorized {
                return Err(SwapError::NotAuthorized);
            }
        } else if !escrow.taker_matches(caller) {
            return Err(SwapError::NotAuthorized);
        }
        if !swap_crypto::verify(&preimage, &escrow.hashlock) {
            return Err(SwapError::InvalidSecret);
        }
        if self.db.preimage_used(escrow.role, preimage.as_bytes())? {
            return Err(SwapError::SecretReplay);
        }

        let amount = escrow.remaining_amount;
        escrow.remaining_amount = 0;
        escrow.status = EscrowStatus::Filled;
        escrow.revealed_preimage = Some(preimage);
        staged.preimages.push((escrow.role, *preimage.as_bytes()));
        staged.escrows.push(escrow);
        Ok(ActionOutcome::Claimed { id, amount })
    }

    fn claim_partial(
        &self,
        staged: &mut StagedMutations,
        id: EscrowId,
        caller: &Address,
        preimage: swap_core::types::Preimage,
        amount: Amount,
        now: Timestamp,
    ) -> Result<ActionOutcome, SwapError> {
        let mut escrow = self.load_escrow(id)?;
        if escrow.status.is_terminal() {
            return Err(SwapError::AlreadyTerminal);
        }
        if amount == 0 || amount > escrow.remaining_amount {
            return Err(SwapError::AmountExceedsRemaining {
                amount,
                remaining: escrow.remaining_amount,
            });
        }
        let stage = escrow.timelocks.stage(escrow.role, now);
        let public = match stage {
            Stage::PrivateWithdrawal => false,
            Stage::PublicWithdrawal => true,
            _ => {
                return Err(SwapError::WrongStage {
                    wanted: "private-withdrawal or public-withdrawal",
                    actual: stage.name().into(),
                })
            }
        };
        if public {
            let authorized = self.db.get_resolver(caller)?.map_or(false, |r| r.is_authorized());
            if !authorized {
                return Err(SwapError::NotAuthorized);
            }
        } else if !escrow.taker_matches(caller) {
            return Err(SwapError::NotAuthorized);
        }
        if !swap_crypto::verify(&preimage, &escrow.hashlock) {
            return Err(SwapError::InvalidSecret);
        }
        // Preimage pinning: the first partial claim fixes the preimage for
        // every subsequent partial claim on this escrow.
        match escrow.revealed_preimage {
            Some(pinned) if pinned != preimage => return Err(SwapError::InvalidSecret),
            Some(_) => {}
            None => {
                if self.db.preimage_used(escrow.role, preimage.as_bytes())? {
                    return Err(SwapError::SecretReplay);
                }
                staged.preimages.push((escrow.role, *preimage.as_bytes()));
            }
        }

        escrow.revealed_preimage = Some(preimage);
        escrow.remaining_amount -= amount;
        escrow.status = if escrow.remaining_amount == 0 {
            EscrowStatus::Filled
        } else {
            EscrowStatus::PartiallyFilled
        };
        staged.escrows.push(escrow);
        Ok(ActionOutcome::Claimed { id, amount })
    }

    fn refund(
        &self,
        staged: &mut StagedMutations,
        id: EscrowId,
        caller: &Address,
        public: bool,
        now: Timestamp,
    ) -> Result<ActionOutcome, SwapError> {
        let mut escrow = self.load_escrow(id)?;
        if escrow.status.is_terminal() {
            return Err(SwapError::AlreadyTerminal);
        }
        let wanted = if public {
            Stage::PublicCancellation
        } else {
            Stage::PrivateCancellation
        };
        let actual = escrow.timelocks.stage(escrow.role, now);
        if actual != wanted {
            return Err(SwapError::WrongStage {
                wanted: wanted.name(),
                actual: actual.name().into(),
            });
        }
        if !public && caller != &escrow.maker {
            return Err(SwapError::NotAuthorized);
        }
        escrow.status = EscrowStatus::Cancelled;
        staged.escrows.push(escrow);
        Ok(ActionOutcome::Refunded { id })
    }

    fn rescue(
        &self,
        staged: &mut StagedMutations,
        id: EscrowId,
        caller: &Address,
        asset: Option<Address>,
        amount: Amount,
        now: Timestamp,
    ) -> Result<ActionOutcome, SwapError> {
        let escrow = self.load_escrow(id)?;
        if caller != &escrow.maker && !escrow.taker_matches(caller) {
            return Err(SwapError::NotAuthorized);
        }
        let rescuable_at = escrow.deployed_at + RESCUE_DELAY_SECS;
        if now < rescuable_at {
            return Err(SwapError::WrongStage {
                wanted: "rescue-delay-elapsed",
                actual: format!("now={now}, rescuable_at={rescuable_at}"),
            });
        }
        let _ = asset;
        // The escrow record itself is untouched: rescue recovers funds
        // stranded alongside it, not the escrow's own locked amount.
        staged.escrows.push(escrow);
        Ok(ActionOutcome::Rescued { id, amount })
    }

    // ── C5 resolver registry ─────────────────────────────────────────────────

    fn register_resolver(
        &self,
        staged: &mut StagedMutations,
        address: Address,
        stake: Amount,
        now: Timestamp,
    ) -> Result<ActionOutcome, SwapError> {
        if !(MIN_STAKE..=MAX_STAKE).contains(&stake) {
            return Err(SwapError::StakeOutOfBounds { got: stake, min: MIN_STAKE, max: MAX_STAKE });
        }
        let resolver = match self.db.get_resolver(&address)? {
            Some(mut r) => {
                r.stake = (r.stake + stake).min(MAX_STAKE);
                r.last_active = Some(now);
                r
            }
            None => Resolver {
                address: address.clone(),
                stake,
                reputation: MIN_REPUTATION,
                authorized: false,
                total_fills: 0,
                total_volume: 0,
                last_active: Some(now),
            },
        };
        let total_stake = resolver.stake;
        staged.resolvers.push(resolver);
        Ok(ActionOutcome::ResolverRegistered { address, stake: total_stake })
    }

    fn unregister_resolver(
        &self,
        staged: &mut StagedMutations,
        address: Address,
    ) -> Result<ActionOutcome, SwapError> {
        let mut resolver = self
            .db
            .get_resolver(&address)?
            .ok_or_else(|| SwapError::ResolverNotFound(address.to_string()))?;
        let returned = resolver.stake;
        resolver.stake = 0;
        resolver.authorized = false;
        staged.resolvers.push(resolver);
        Ok(ActionOutcome::ResolverUnregistered { address, returned })
    }

    fn require_admin(&self, caller: &Address) -> Result<(), SwapError> {
        if caller != &self.admin {
            return Err(SwapError::NotAuthorized);
        }
        Ok(())
    }

    fn authorize_resolver(
        &self,
        staged: &mut StagedMutations,
        caller: &Address,
        resolver: Address,
        flag: bool,
    ) -> Result<ActionOutcome, SwapError> {
        self.require_admin(caller)?;
        let mut r = self
            .db
            .get_resolver(&resolver)?
            .ok_or_else(|| SwapError::ResolverNotFound(resolver.to_string()))?;
        r.authorized = flag;
        staged.resolvers.push(r);
        Ok(ActionOutcome::ResolverAuthorized { address: resolver, authorized: flag })
    }

    /// Reputation-bonus formula (§4.5), applied inline by `fill_order` on a
    /// successful fill, and available standalone via `record_fill` for an
    /// admin to reconcile the registry against fills observed off-band.
    fn apply_fill_bonus(resolver: &mut Resolver, amount: Amount, rate: u128, now: Timestamp) {
        let mut bonus = REPUTATION_BASE_GAIN;
        if amount >= 10 * NATIVE_UNIT {
            bonus += REPUTATION_VOLUME_BONUS_10X;
        } else if amount >= NATIVE_UNIT {
            bonus += REPUTATION_VOLUME_BONUS_1X;
        }
        if rate > RATE_ONE {
            bonus += REPUTATION_GOOD_RATE_BONUS;
        }
        resolver.reputation = (resolver.reputation + bonus).min(MAX_REPUTATION);
        resolver.total_fills += 1;
        resolver.total_volume += amount;
        resolver.last_active = Some(now);
    }

    /// Admin-only: record a fill against a resolver's reputation outside of
    /// `fill_order`'s own inline application (§4.5, §5 — registry mutations
    /// are guarded by an explicit caller check; this one requires `admin`
    /// since, unlike `fill_order`, it has no escrow/order to validate the
    /// claimed fill against).
    fn record_fill(
        &self,
        staged: &mut StagedMutations,
        caller: &Address,
        resolver: Address,
        amount: Amount,
        rate: u128,
        now: Timestamp,
    ) -> Result<ActionOutcome, SwapError> {
        self.require_admin(caller)?;
        let mut r = self
            .db
            .get_resolver(&resolver)?
            .ok_or_else(|| SwapError::ResolverNotFound(resolver.to_string()))?;
        Self::apply_fill_bonus(&mut r, amount, rate, now);
        let reputation = r.reputation;
        staged.resolvers.push(r);
        Ok(ActionOutcome::FillRecorded { address: resolver, reputation })
    }

    fn apply_penalty(
        &self,
        staged: &mut StagedMutations,
        caller: &Address,
        resolver: Address,
        amount: u32,
    ) -> Result<ActionOutcome, SwapError> {
        self.require_admin(caller)?;
        let mut r = self
            .db
            .get_resolver(&resolver)?
            .ok_or_else(|| SwapError::ResolverNotFound(resolver.to_string()))?;
        r.reputation = r.reputation.saturating_sub(amount);
        if r.reputation < MIN_REPUTATION {
            r.authorized = false;
        }
        let reputation = r.reputation;
        staged.resolvers.push(r);
        Ok(ActionOutcome::PenaltyApplied { address: resolver, reputation })
    }

    fn distribute_reward(
        &self,
        staged: &mut StagedMutations,
        caller: &Address,
        resolver: Address,
        amount: Amount,
    ) -> Result<ActionOutcome, SwapError> {
        self.require_admin(caller)?;
        let mut r = self
            .db
            .get_resolver(&resolver)?
            .ok_or_else(|| SwapError::ResolverNotFound(resolver.to_string()))?;
        r.stake = (r.stake + amount).min(MAX_STAKE);
        let stake = r.stake;
        staged.resolvers.push(r);
        Ok(ActionOutcome::RewardDistributed { address: resolver, stake })
    }

    // ── C6/C7 limit-order protocol + façade ──────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    fn create_order(
        &self,
        staged: &mut StagedMutations,
        maker: Address,
        source_amount: Amount,
        destination_amount: Amount,
        native: bool,
        chain_id: swap_core::types::ChainId,
        deadline: Timestamp,
        auction_config: swap_core::order::AuctionConfig,
        destination_chain_id: swap_core::types::ChainId,
        timelock_duration_secs: i64,
        destination_address: Address,
        secret_hash: swap_core::types::HashLock,
        now: Timestamp,
    ) -> Result<ActionOutcome, SwapError> {
        if source_amount == 0 || destination_amount == 0 {
            return Err(SwapError::InvalidAmount);
        }
        Order::validate_config(&auction_config, deadline)
            .map_err(SwapError::InvalidAuctionWindow)?;
        let duration = auction_config.end_time - auction_config.start_time;
        if !(MIN_AUCTION_DURATION_SECS..=MAX_AUCTION_DURATION_SECS).contains(&duration) {
            return Err(SwapError::InvalidAuctionWindow(format!(
                "auction duration {duration}s outside [{MIN_AUCTION_DURATION_SECS}, {MAX_AUCTION_DURATION_SECS}]"
            )));
        }
        if !swap_crypto::is_well_formed(&secret_hash) {
            return Err(SwapError::InvalidHashLock);
        }

        let nonce = self.db.next_order_nonce()?;
        let order_hash = swap_crypto::order_hash(
            &maker,
            source_amount,
            destination_amount,
            auction_config.start_time,
            auction_config.end_time,
            nonce,
            chain_id,
            native,
        );
        if self.db.get_order(&order_hash)?.is_some() {
            return Err(SwapError::OrderAlreadyExists);
        }

        staged.orders.push(Order {
            order_hash,
            maker,
            source_amount,
            destination_amount,
            remaining_source_amount: source_amount,
            remaining_destination_amount: destination_amount,
            deadline,
            native,
            chain_id,
            nonce,
            auction_config,
            cross_chain_config: CrossChainConfig {
                destination_chain_id,
                destination_chain_order_handle: None,
                timelock_duration_secs,
                destination_address,
                secret_hash,
            },
            bid_log: Default::default(),
            active: true,
            created_at: now,
            total_fills: 0,
        });
        Ok(ActionOutcome::OrderCreated { order_hash })
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_order(
        &self,
        staged: &mut StagedMutations,
        order_hash: OrderHash,
        resolver: Address,
        preimage: swap_core::types::Preimage,
        amount: Amount,
        escrow_timelocks: swap_core::timelock::Timelocks,
        safety_deposit: Amount,
        now: Timestamp,
    ) -> Result<ActionOutcome, SwapError> {
        let mut order = self
            .db
            .get_order(&order_hash)?
            .ok_or_else(|| SwapError::OrderNotFound(order_hash.to_hex()))?;
        if !order.active || now > order.deadline {
            return Err(SwapError::OrderNotActive);
        }

        let mut resolver_rec = self
            .db
            .get_resolver(&resolver)?
            .ok_or(SwapError::UnknownResolver)?;
        if !resolver_rec.is_authorized() {
            return Err(match resolver_rec.authorization() {
                ResolverAuthorization::Penalized { reputation, .. } => {
                    SwapError::ReputationTooLow { reputation, min: MIN_REPUTATION }
                }
                _ => SwapError::NotAuthorized,
            });
        }

        if amount == 0 || amount > order.remaining_source_amount {
            return Err(SwapError::AmountExceedsRemaining {
                amount,
                remaining: order.remaining_source_amount,
            });
        }
        if !swap_crypto::verify(&preimage, &order.cross_chain_config.secret_hash) {
            return Err(SwapError::InvalidSecret);
        }

        let rate = dutch_auction_rate(&order.auction_config, now);
        if rate == 0 {
            return Err(SwapError::InvalidRate);
        }
        let taking = compute_taking(amount, rate);
        if taking == 0 || taking > order.remaining_destination_amount {
            return Err(SwapError::AmountExceedsRemaining {
                amount: taking,
                remaining: order.remaining_destination_amount,
            });
        }
        if safety_deposit < MIN_SAFETY_DEPOSIT {
            return Err(SwapError::InsufficientSafetyDeposit {
                got: safety_deposit,
                min: MIN_SAFETY_DEPOSIT,
            });
        }
        escrow_timelocks.validate(now)?;

        let fill_index = order.total_fills;
        let src_escrow_id = swap_crypto::escrow_id(&order_hash, Role::Source, fill_index);
        if self.db.get_escrow(&src_escrow_id)?.is_some() {
            return Err(SwapError::EscrowAlreadyExists);
        }

        staged.escrows.push(Escrow {
            id: src_escrow_id,
            order_hash,
            role: Role::Source,
            maker: order.maker.clone(),
            taker: resolver.clone(),
            native: order.native,
            token: None,
            total_amount: amount,
            remaining_amount: amount,
            hashlock: order.cross_chain_config.secret_hash,
            timelocks: escrow_timelocks,
            safety_deposit,
            deployed_at: now,
            status: EscrowStatus::Created,
            revealed_preimage: None,
            external_order_ref: order_hash.to_hex(),
        });

        order.remaining_source_amount -= amount;
        order.remaining_destination_amount -= taking;
        order.total_fills += 1;
        if order.remaining_source_amount == 0 {
            order.active = false;
        }
        staged.orders.push(order);

        Self::apply_fill_bonus(&mut resolver_rec, amount, rate, now);
        staged.resolvers.push(resolver_rec);

        Ok(ActionOutcome::OrderFilled { order_hash, src_escrow: src_escrow_id, taking, rate })
    }

    fn cancel_order(
        &self,
        staged: &mut StagedMutations,
        order_hash: OrderHash,
        caller: &Address,
    ) -> Result<ActionOutcome, SwapError> {
        let mut order = self
            .db
            .get_order(&order_hash)?
            .ok_or_else(|| SwapError::OrderNotFound(order_hash.to_hex()))?;
        if caller != &order.maker {
            return Err(SwapError::NotAuthorized);
        }
        if !order.active {
            return Err(SwapError::OrderNotActive);
        }
        order.active = false;
        staged.orders.push(order);
        Ok(ActionOutcome::OrderCancelled { order_hash })
    }

    fn record_bid(
        &self,
        staged: &mut StagedMutations,
        order_hash: OrderHash,
        bidder: Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<ActionOutcome, SwapError> {
        let mut order = self
            .db
            .get_order(&order_hash)?
            .ok_or_else(|| SwapError::OrderNotFound(order_hash.to_hex()))?;
        if amount > order.bid_log.highest_amount {
            order.bid_log.highest_bidder = Some(bidder);
            order.bid_log.highest_amount = amount;
        }
        order.bid_log.last_bid_at = Some(now);
        staged.orders.push(order);
        Ok(ActionOutcome::BidRecorded { order_hash })
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use swap_core::order::AuctionConfig;
    use swap_core::timelock::Timelocks;
    use swap_core::types::{EscrowId, OrderHash};
    use swap_crypto::{generate_preimage, lock};

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("swap_engine_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn engine(name: &str) -> SwapEngine {
        SwapEngine::new(Arc::new(temp_db(name)), Address(vec![0xAD, 0x31]))
    }

    fn sample_timelocks(now: Timestamp) -> Timelocks {
        Timelocks {
            src_withdrawal: now + 100,
            src_public_withdrawal: now + 200,
            src_cancellation: now + 300,
            src_public_cancellation: now + 400,
            dst_withdrawal: now + 10,
            dst_public_withdrawal: now + 20,
            dst_cancellation: now + 30,
            dst_public_cancellation: now + 40,
        }
    }

    const NOW: Timestamp = 1_000_000;

    #[test]
    fn create_escrow_then_claim_happy_path() {
        let eng = engine("create_claim");
        let preimage = generate_preimage();
        let hashlock = lock(&preimage);
        let id = EscrowId([1u8; 32]);
        let maker = Address(vec![1]);
        let taker = Address(vec![2]);

        eng.apply(
            &Action::CreateEscrow {
                id,
                order_hash: OrderHash([9u8; 32]),
                role: Role::Source,
                maker: maker.clone(),
                taker: taker.clone(),
                native: true,
                token: None,
                amount: 1_000,
                safety_deposit: MIN_SAFETY_DEPOSIT,
                hashlock,
                timelocks: sample_timelocks(NOW),
                external_order_ref: "ref".into(),
            },
            NOW,
        )
        .unwrap();

        // Too early.
        let err = eng
            .apply(&Action::Claim { id, caller: taker.clone(), preimage }, NOW)
            .unwrap_err();
        assert!(matches!(err, SwapError::WrongStage { .. }));

        eng.apply(&Action::Claim { id, caller: taker, preimage }, NOW + 150)
            .unwrap();

        let escrow = eng.db.get_escrow(&id).unwrap().unwrap();
        assert_eq!(escrow.status, EscrowStatus::Filled);
        assert_eq!(escrow.remaining_amount, 0);
    }

    #[test]
    fn claim_by_wrong_caller_rejected() {
        let eng = engine("wrong_caller");
        let preimage = generate_preimage();
        let hashlock = lock(&preimage);
        let id = EscrowId([2u8; 32]);
        eng.apply(
            &Action::CreateEscrow {
                id,
                order_hash: OrderHash([1u8; 32]),
                role: Role::Source,
                maker: Address(vec![1]),
                taker: Address(vec![2]),
                native: true,
                token: None,
                amount: 500,
                safety_deposit: MIN_SAFETY_DEPOSIT,
                hashlock,
                timelocks: sample_timelocks(NOW),
                external_order_ref: "ref".into(),
            },
            NOW,
        )
        .unwrap();

        let err = eng
            .apply(
                &Action::Claim { id, caller: Address(vec![99]), preimage },
                NOW + 150,
            )
            .unwrap_err();
        assert!(matches!(err, SwapError::NotAuthorized));
    }

    #[test]
    fn claim_public_requires_authorized_resolver() {
        let eng = engine("claim_public_auth");
        let preimage = generate_preimage();
        let hashlock = lock(&preimage);
        let id = EscrowId([3u8; 32]);
        let resolver = Address(vec![5]);

        eng.apply(
            &Action::CreateEscrow {
                id,
                order_hash: OrderHash([2u8; 32]),
                role: Role::Source,
                maker: Address(vec![1]),
                taker: Address(vec![2]),
                native: true,
                token: None,
                amount: 500,
                safety_deposit: MIN_SAFETY_DEPOSIT,
                hashlock,
                timelocks: sample_timelocks(NOW),
                external_order_ref: "ref".into(),
            },
            NOW,
        )
        .unwrap();

        // Unregistered caller is rejected even once the public-withdrawal
        // stage has opened.
        let err = eng
            .apply(&Action::ClaimPublic { id, caller: resolver.clone(), preimage }, NOW + 250)
            .unwrap_err();
        assert!(matches!(err, SwapError::NotAuthorized));

        eng.apply(&Action::RegisterResolver { address: resolver.clone(), stake: MIN_STAKE }, NOW)
            .unwrap();
        eng.apply(
            &Action::AuthorizeResolver {
                caller: Address(vec![0xAD, 0x31]),
                resolver: resolver.clone(),
                flag: true,
            },
            NOW,
        )
        .unwrap();

        eng.apply(&Action::ClaimPublic { id, caller: resolver, preimage }, NOW + 250)
            .unwrap();
        let escrow = eng.db.get_escrow(&id).unwrap().unwrap();
        assert_eq!(escrow.status, EscrowStatus::Filled);
    }

    #[test]
    fn private_refund_requires_maker_not_taker() {
        let eng = engine("private_refund_maker");
        let preimage = generate_preimage();
        let hashlock = lock(&preimage);
        let id = EscrowId([4u8; 32]);
        let maker = Address(vec![1]);
        let taker = Address(vec![2]);

        eng.apply(
            &Action::CreateEscrow {
                id,
                order_hash: OrderHash([3u8; 32]),
                role: Role::Source,
                maker: maker.clone(),
                taker: taker.clone(),
                native: true,
                token: None,
                amount: 500,
                safety_deposit: MIN_SAFETY_DEPOSIT,
                hashlock,
                timelocks: sample_timelocks(NOW),
                external_order_ref: "ref".into(),
            },
            NOW,
        )
        .unwrap();

        // The taker may not trigger the private refund.
        let err = eng
            .apply(&Action::Refund { id, caller: taker }, NOW + 350)
            .unwrap_err();
        assert!(matches!(err, SwapError::NotAuthorized));

        eng.apply(&Action::Refund { id, caller: maker }, NOW + 350).unwrap();
        let escrow = eng.db.get_escrow(&id).unwrap().unwrap();
        assert_eq!(escrow.status, EscrowStatus::Cancelled);
    }

    #[test]
    fn record_fill_requires_admin_caller() {
        let eng = engine("record_fill_admin");
        let resolver = Address(vec![6]);
        eng.apply(&Action::RegisterResolver { address: resolver.clone(), stake: MIN_STAKE }, NOW)
            .unwrap();

        let err = eng
            .apply(
                &Action::RecordFill {
                    caller: resolver.clone(),
                    resolver: resolver.clone(),
                    amount: 10 * NATIVE_UNIT,
                    rate: RATE_ONE,
                },
                NOW,
            )
            .unwrap_err();
        assert!(matches!(err, SwapError::NotAuthorized));

        let outcome = eng
            .apply(
                &Action::RecordFill {
                    caller: Address(vec![0xAD, 0x31]),
                    resolver: resolver.clone(),
                    amount: 10 * NATIVE_UNIT,
                    rate: RATE_ONE,
                },
                NOW,
            )
            .unwrap();
        match outcome {
            ActionOutcome::FillRecorded { reputation, .. } => assert!(reputation > 0),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn order_lifecycle_create_fill_cancel() {
        let eng = engine("order_lifecycle");
        let preimage = generate_preimage();
        let secret_hash = lock(&preimage);
        let maker = Address(vec![1]);
        let resolver = Address(vec![2]);

        eng.apply(
            &Action::RegisterResolver { address: resolver.clone(), stake: MIN_STAKE },
            NOW,
        )
        .unwrap();
        eng.apply(
            &Action::AuthorizeResolver {
                caller: Address(vec![0xAD, 0x31]),
                resolver: resolver.clone(),
                flag: true,
            },
            NOW,
        )
        .unwrap();

        let outcome = eng
            .apply(
                &Action::CreateOrder {
                    maker: maker.clone(),
                    source_amount: 1_000,
                    destination_amount: 2_000,
                    native: true,
                    chain_id: 1,
                    deadline: NOW + 10_000,
                    auction_config: AuctionConfig {
                        start_time: NOW,
                        end_time: NOW + 3_600,
                        start_rate: 2 * RATE_ONE,
                        end_rate: RATE_ONE,
                    },
                    destination_chain_id: 2,
                    timelock_duration_secs: 600,
                    destination_address: Address(vec![7]),
                    secret_hash,
                },
                NOW,
            )
            .unwrap();
        let order_hash = match outcome {
            ActionOutcome::OrderCreated { order_hash } => order_hash,
            _ => panic!("expected OrderCreated"),
        };

        let fill = eng
            .apply(
                &Action::FillOrder {
                    order_hash,
                    resolver: resolver.clone(),
                    preimage,
                    amount: 400,
                    escrow_timelocks: sample_timelocks(NOW),
                    safety_deposit: MIN_SAFETY_DEPOSIT,
                },
                NOW,
            )
            .unwrap();
        match fill {
            ActionOutcome::OrderFilled { taking, .. } => assert!(taking > 0 && taking <= 2_000),
            _ => panic!("expected OrderFilled"),
        }

        let order = eng.db.get_order(&order_hash).unwrap().unwrap();
        assert_eq!(order.remaining_source_amount, 600);
        assert!(order.active);

        let err = eng
            .apply(&Action::CancelOrder { order_hash, caller: resolver }, NOW)
            .unwrap_err();
        assert!(matches!(err, SwapError::NotAuthorized));

        eng.apply(&Action::CancelOrder { order_hash, caller: maker }, NOW)
            .unwrap();
        let order = eng.db.get_order(&order_hash).unwrap().unwrap();
        assert!(!order.active);
    }

    #[test]
    fn two_partial_fills_require_the_same_preimage() {
        let eng = engine("partial_fills");
        let preimage = generate_preimage();
        let secret_hash = lock(&preimage);
        let maker = Address(vec![1]);
        let r1 = Address(vec![2]);
        let r2 = Address(vec![3]);

        for r in [&r1, &r2] {
            eng.apply(&Action::RegisterResolver { address: (*r).clone(), stake: MIN_STAKE }, NOW)
                .unwrap();
            eng.apply(
                &Action::AuthorizeResolver {
                    caller: Address(vec![0xAD, 0x31]),
                    resolver: (*r).clone(),
                    flag: true,
                },
                NOW,
            )
            .unwrap();
        }

        let outcome = eng
            .apply(
                &Action::CreateOrder {
                    maker,
                    source_amount: 1_000,
                    destination_amount: 2_000,
                    native: true,
                    chain_id: 1,
                    deadline: NOW + 10_000,
                    auction_config: AuctionConfig {
                        start_time: NOW,
                        end_time: NOW + 3_600,
                        start_rate: 2 * RATE_ONE,
                        end_rate: RATE_ONE,
                    },
                    destination_chain_id: 2,
                    timelock_duration_secs: 600,
                    destination_address: Address(vec![7]),
                    secret_hash,
                },
                NOW,
            )
            .unwrap();
        let order_hash = match outcome {
            ActionOutcome::OrderCreated { order_hash } => order_hash,
            _ => panic!("expected OrderCreated"),
        };

        let fill1 = eng
            .apply(
                &Action::FillOrder {
                    order_hash,
                    resolver: r1,
                    preimage,
                    amount: 400,
                    escrow_timelocks: sample_timelocks(NOW),
                    safety_deposit: MIN_SAFETY_DEPOSIT,
                },
                NOW,
            )
            .unwrap();
        let src_escrow_1 = match fill1 {
            ActionOutcome::OrderFilled { src_escrow, .. } => src_escrow,
            _ => panic!("expected OrderFilled"),
        };

        // A different preimage is rejected outright: the hashlock is pinned
        // to the order at creation time, not per fill.
        let wrong_preimage = generate_preimage();
        let err = eng
            .apply(
                &Action::FillOrder {
                    order_hash,
                    resolver: r2.clone(),
                    preimage: wrong_preimage,
                    amount: 600,
                    escrow_timelocks: sample_timelocks(NOW),
                    safety_deposit: MIN_SAFETY_DEPOSIT,
                },
                NOW,
            )
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidSecret));

        let fill2 = eng
            .apply(
                &Action::FillOrder {
                    order_hash,
                    resolver: r2,
                    preimage,
                    amount: 600,
                    escrow_timelocks: sample_timelocks(NOW),
                    safety_deposit: MIN_SAFETY_DEPOSIT,
                },
                NOW,
            )
            .unwrap();
        let src_escrow_2 = match fill2 {
            ActionOutcome::OrderFilled { src_escrow, .. } => src_escrow,
            _ => panic!("expected OrderFilled"),
        };

        assert_ne!(src_escrow_1, src_escrow_2, "each partial fill gets its own escrow id");
        let order = eng.db.get_order(&order_hash).unwrap().unwrap();
        assert_eq!(order.remaining_source_amount, 0);
        assert!(!order.active);
        assert_eq!(order.total_fills, 2);
    }

    #[test]
    fn fill_order_by_unauthorized_resolver_rejected() {
        let eng = engine("unauth_resolver");
        let preimage = generate_preimage();
        let secret_hash = lock(&preimage);
        let maker = Address(vec![1]);
        let resolver = Address(vec![3]);

        let outcome = eng
            .apply(
                &Action::CreateOrder {
                    maker,
                    source_amount: 1_000,
                    destination_amount: 2_000,
                    native: true,
                    chain_id: 1,
                    deadline: NOW + 10_000,
                    auction_config: AuctionConfig {
                        start_time: NOW,
                        end_time: NOW + 3_600,
                        start_rate: 2 * RATE_ONE,
                        end_rate: RATE_ONE,
                    },
                    destination_chain_id: 2,
                    timelock_duration_secs: 600,
                    destination_address: Address(vec![7]),
                    secret_hash,
                },
                NOW,
            )
            .unwrap();
        let order_hash = match outcome {
            ActionOutcome::OrderCreated { order_hash } => order_hash,
            _ => panic!("expected OrderCreated"),
        };

        let err = eng
            .apply(
                &Action::FillOrder {
                    order_hash,
                    resolver,
                    preimage,
                    amount: 100,
                    escrow_timelocks: sample_timelocks(NOW),
                    safety_deposit: MIN_SAFETY_DEPOSIT,
                },
                NOW,
            )
            .unwrap_err();
        assert!(matches!(err, SwapError::UnknownResolver));
    }

    #[test]
    fn penalty_below_min_reputation_clears_authorization() {
        let eng = engine("penalty");
        let admin = Address(vec![0xAD, 0x31]);
        let resolver = Address(vec![4]);
        eng.apply(&Action::RegisterResolver { address: resolver.clone(), stake: MIN_STAKE }, NOW)
            .unwrap();
        eng.apply(
            &Action::AuthorizeResolver { caller: admin.clone(), resolver: resolver.clone(), flag: true },
            NOW,
        )
        .unwrap();
        eng.apply(
            &Action::ApplyPenalty { caller: admin, resolver: resolver.clone(), amount: MIN_REPUTATION },
            NOW,
        )
        .unwrap();
        let r = eng.db.get_resolver(&resolver).unwrap().unwrap();
        assert!(!r.is_authorized());
    }
}
