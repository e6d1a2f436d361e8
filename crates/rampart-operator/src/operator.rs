//! The control loop, swap entrypoint, and admin surface.
//!
//! One operator instance manages both sides of the band. Each heartbeat
//! executes a fixed sequence — later steps depend on freshly updated state:
//!
//! 1. Record an oracle observation and refresh the range prices.
//! 2. Record one regeneration observation per side.
//! 3. Reconcile wall capacity against cushion auction fills.
//! 4. Regenerate any eligible side.
//! 5. Open or close cushion auctions from the price's band position.
//!
//! Swaps against an active wall are permissionless and may interleave with
//! heartbeats in any order. Capacity accounting is always finalized before
//! any external value movement, and the swap/wind-down paths carry a
//! reentrancy guard against non-conforming tokens.

use rampart_oracle::feed::PriceFeed;
use rampart_oracle::PriceOracle;
use rampart_range::range::WallStatus;
use rampart_range::{regen, RangeState, RegenStatus};
use rampart_types::auth::{Authorize, Role};
use rampart_types::{Address, Side, Token, ONE_HUNDRED_PERCENT, PRICE_SCALE};

use crate::config::OperatorConfig;
use crate::traits::{AuctionParams, Collaborators};
use crate::{scale, OperatorError, Result};

/// The market-operations control loop.
pub struct Operator<T: PriceFeed, R: PriceFeed> {
    oracle: PriceOracle<T, R>,
    range: RangeState,
    regen_low: RegenStatus,
    regen_high: RegenStatus,
    config: OperatorConfig,
    collab: Collaborators,
    auth: Box<dyn Authorize>,
    token: Token,
    reserve: Token,
    initialized: bool,
    entered: bool,
}

impl<T: PriceFeed, R: PriceFeed> Operator<T, R> {
    /// Wire up an operator. The oracle may be seeded before or after; the
    /// operator itself stays inert until [`Self::initialize`].
    ///
    /// # Errors
    ///
    /// - [`OperatorError::InvalidParams`] on out-of-bounds configuration
    pub fn new(
        oracle: PriceOracle<T, R>,
        range: RangeState,
        config: OperatorConfig,
        token: Token,
        reserve: Token,
        collab: Collaborators,
        auth: Box<dyn Authorize>,
    ) -> Result<Self> {
        config.validate()?;
        let window = config.regen_observe;
        Ok(Self {
            oracle,
            range,
            regen_low: RegenStatus::new(window, 0),
            regen_high: RegenStatus::new(window, 0),
            config,
            collab,
            auth,
            token,
            reserve,
            initialized: false,
            entered: false,
        })
    }

    /// Whether [`Self::initialize`] has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Band state, read-only.
    pub fn range(&self) -> &RangeState {
        &self.range
    }

    /// Current configuration.
    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    /// Oracle state, read-only.
    pub fn oracle(&self) -> &PriceOracle<T, R> {
        &self.oracle
    }

    /// Regeneration observations for one side.
    pub fn regen_status(&self, side: Side) -> &RegenStatus {
        match side {
            Side::Low => &self.regen_low,
            Side::High => &self.regen_high,
        }
    }

    fn regen_mut(&mut self, side: Side) -> &mut RegenStatus {
        match side {
            Side::Low => &mut self.regen_low,
            Side::High => &mut self.regen_high,
        }
    }

    // ---- lifecycle -------------------------------------------------------

    /// Seed the oracle's observation buffer. Admin.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::Auth`] for a caller without the admin role
    /// - oracle seeding errors per [`PriceOracle::initialize`]
    pub fn initialize_oracle(
        &mut self,
        caller: Address,
        seed: &[u128],
        last_observation_time: u64,
    ) -> Result<()> {
        self.auth.ensure(caller, Role::Admin)?;
        self.oracle.initialize(seed, last_observation_time)?;
        Ok(())
    }

    /// One-time activation. Admin. Requires a seeded oracle; derives the
    /// initial band prices and regenerates both walls to full capacity.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::AlreadyInitialized`] on a second call
    /// - [`OperatorError::Oracle`] while the oracle is unseeded
    pub fn initialize(&mut self, now: u64, caller: Address) -> Result<()> {
        self.auth.ensure(caller, Role::Admin)?;
        if self.initialized {
            return Err(OperatorError::AlreadyInitialized);
        }
        let moving_average = self.oracle.moving_average()?;
        self.range.update_prices(moving_average)?;
        for side in Side::BOTH {
            self.regenerate_side(side, now)?;
        }
        self.initialized = true;
        tracing::info!(moving_average, "operator: initialized");
        Ok(())
    }

    // ---- heartbeat -------------------------------------------------------

    /// Execute one heartbeat. Heartbeat role.
    ///
    /// Any oracle integrity failure aborts the entire call with no state
    /// committed; the keeper is expected to retry on its next attempt.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::Auth`] for a caller without the heartbeat role
    /// - [`OperatorError::NotInitialized`] before [`Self::initialize`]
    /// - [`OperatorError::Oracle`] on stale or invalid feeds (fatal)
    /// - [`OperatorError::Reentrancy`] on a reentrant call
    pub fn operate(&mut self, now: u64, caller: Address) -> Result<()> {
        self.auth.ensure(caller, Role::Heartbeat)?;
        self.enter()?;
        let result = self.operate_inner(now);
        self.entered = false;
        result
    }

    fn operate_inner(&mut self, now: u64) -> Result<()> {
        if !self.initialized {
            return Err(OperatorError::NotInitialized);
        }

        let moving_average = self.oracle.update_moving_average(now)?;
        self.range.update_prices(moving_average)?;

        // The loop reconciles against the last recorded observation, not a
        // second live feed read, for consistency within one heartbeat.
        let price = self.oracle.last_price()?;
        for side in Side::BOTH {
            let favorable = regen::favorable(side, price, moving_average);
            self.regen_mut(side).observe(favorable);
        }

        for side in Side::BOTH {
            self.reconcile_market(side, now)?;
        }

        for side in Side::BOTH {
            let eligible = self.regen_status(side).eligible(
                now,
                self.config.regen_wait,
                self.config.regen_threshold,
            );
            if eligible {
                self.regenerate_side(side, now)?;
            }
        }

        for side in Side::BOTH {
            self.check_cushion(side, price, now)?;
        }

        tracing::debug!(moving_average, price, "operator: heartbeat complete");
        Ok(())
    }

    /// Subtract cumulative auction consumption since the last heartbeat
    /// from the side's wall capacity.
    fn reconcile_market(&mut self, side: Side, now: u64) -> Result<()> {
        let s = self.range.side(side);
        let Some(market) = s.market else {
            return Ok(());
        };
        let (capacity, last_market_capacity) = (s.capacity, s.last_market_capacity);

        if !self.collab.auctioneer.is_live(market) {
            self.range.update_market(side, None, 0);
            return Ok(());
        }

        let remaining = self.collab.auctioneer.current_capacity(market);
        let consumed = last_market_capacity.saturating_sub(remaining);
        if consumed > 0 {
            let status = self
                .range
                .update_capacity(side, capacity.saturating_sub(consumed), now);
            if status == WallStatus::Down {
                // Cushions cannot outlive their wall
                self.deactivate_cushion(side)?;
                return Ok(());
            }
        }
        self.range.record_market_capacity(side, remaining);
        Ok(())
    }

    /// Restore a side to full capacity and reset its regeneration window.
    fn regenerate_side(&mut self, side: Side, now: u64) -> Result<()> {
        // Full capacity is derived from live treasury reserves and the last
        // recorded price at every regeneration, never cached.
        let full_capacity = self.full_capacity(side)?;
        self.deactivate_cushion(side)?;
        self.range.regenerate(side, full_capacity, now)?;
        self.regen_mut(side).reset(now);
        tracing::info!(?side, capacity = full_capacity, "operator: wall regenerated");
        Ok(())
    }

    /// Open or close the side's cushion auction from the price position.
    fn check_cushion(&mut self, side: Side, price: u128, now: u64) -> Result<()> {
        let s = self.range.side(side);
        let (active, market) = (s.active, s.market);
        let in_cushion = match side {
            Side::High => price >= s.cushion_price && price < s.wall_price,
            Side::Low => price <= s.cushion_price && price > s.wall_price,
        };

        match market {
            Some(id) => {
                // Close when the price left the cushion zone in either
                // direction, or the auction already wound down on its own.
                if !in_cushion || !self.collab.auctioneer.is_live(id) {
                    self.deactivate_cushion(side)?;
                }
            }
            None => {
                if active && in_cushion {
                    self.activate_cushion(side, now)?;
                }
            }
        }
        Ok(())
    }

    /// Open a cushion auction sized from the side's remaining capacity.
    fn activate_cushion(&mut self, side: Side, now: u64) -> Result<()> {
        let s = self.range.side(side);
        let (capacity, wall_price, cushion_price) = (s.capacity, s.wall_price, s.cushion_price);

        let market_capacity = scale::mul_div(
            capacity,
            self.config.cushion_factor as u128,
            ONE_HUNDRED_PERCENT as u128,
        )?;
        if market_capacity == 0 {
            return Ok(());
        }

        // High cushions sell the token for reserve between the wall
        // (initial) and cushion (minimum) prices. Low cushions sell reserve
        // for the token, so both prices invert: the wall maps to the upper
        // bound of the token-per-reserve quote.
        let (payout, quote, initial_price, minimum_price) = match side {
            Side::High => (self.token, self.reserve, wall_price, cushion_price),
            Side::Low => (
                self.reserve,
                self.token,
                scale::invert_price(wall_price)?,
                scale::invert_price(cushion_price)?,
            ),
        };

        let price_decimals = scale::price_decimals(minimum_price);
        let params = AuctionParams {
            payout,
            quote,
            capacity: market_capacity,
            initial_price: scale::format_price(
                initial_price,
                payout.decimals,
                quote.decimals,
                price_decimals,
            )?,
            minimum_price: scale::format_price(
                minimum_price,
                payout.decimals,
                quote.decimals,
                price_decimals,
            )?,
            debt_buffer: self.config.cushion_debt_buffer,
            conclusion: now.saturating_add(self.config.cushion_duration),
            deposit_interval: self.config.cushion_deposit_interval,
            scale_adjustment: scale::scale_adjustment(
                payout.decimals,
                quote.decimals,
                price_decimals,
            ),
        };

        let market = self.collab.auctioneer.create_market(params)?;
        // The teller must be whitelisted before the market can settle
        // payouts; only then is the market recorded against the side.
        let teller = self.collab.auctioneer.teller();
        self.collab.callback.whitelist(teller, market)?;
        self.range.update_market(side, Some(market), market_capacity);
        tracing::info!(?side, market, market_capacity, "operator: cushion auction opened");
        Ok(())
    }

    /// Close the side's cushion auction if one is open. No-op otherwise.
    fn deactivate_cushion(&mut self, side: Side) -> Result<()> {
        if let Some(market) = self.range.take_down_market(side) {
            if self.collab.auctioneer.is_live(market) {
                self.collab.auctioneer.close_market(market)?;
            }
            tracing::info!(?side, market, "operator: cushion auction closed");
        }
        Ok(())
    }

    // ---- swaps -----------------------------------------------------------

    /// Payout for swapping `amount_in` of `token_in` at the current wall
    /// price, with decimal-scale conversion.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::InvalidToken`] for a token outside the pair
    /// - [`OperatorError::ZeroPrice`] before prices are derived
    pub fn amount_out(&self, token_in: Token, amount_in: u128) -> Result<u128> {
        if token_in == self.token {
            // Token in: paid out in reserve at the low wall price
            let wall_price = self.range.side(Side::Low).wall_price;
            let scaled = scale::mul_div(
                amount_in,
                wall_price,
                scale::pow10(self.token.decimals as i16)?,
            )?;
            scale::mul_div(
                scaled,
                scale::pow10(self.reserve.decimals as i16)?,
                PRICE_SCALE,
            )
        } else if token_in == self.reserve {
            // Reserve in: paid out in token at the high wall price
            let wall_price = self.range.side(Side::High).wall_price;
            let scaled = scale::mul_div(
                amount_in,
                scale::pow10(self.token.decimals as i16)?,
                scale::pow10(self.reserve.decimals as i16)?,
            )?;
            scale::mul_div(scaled, PRICE_SCALE, wall_price)
        } else {
            Err(OperatorError::InvalidToken)
        }
    }

    /// Swap against an active wall. Permissionless.
    ///
    /// Capacity accounting (including a threshold-triggered wall-down and
    /// cushion close) is finalized before any mint, burn, or transfer.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::NotInitialized`] before [`Self::initialize`]
    /// - [`OperatorError::WallDown`] while the side's wall is inactive
    /// - [`OperatorError::InsufficientCapacity`] when the payout exceeds the
    ///   side's remaining capacity (state unchanged)
    /// - [`OperatorError::Reentrancy`] on a reentrant call
    pub fn swap(
        &mut self,
        now: u64,
        caller: Address,
        token_in: Token,
        amount_in: u128,
    ) -> Result<u128> {
        self.enter()?;
        let result = self.swap_inner(now, caller, token_in, amount_in);
        self.entered = false;
        result
    }

    fn swap_inner(
        &mut self,
        now: u64,
        caller: Address,
        token_in: Token,
        amount_in: u128,
    ) -> Result<u128> {
        if !self.initialized {
            return Err(OperatorError::NotInitialized);
        }
        if amount_in == 0 {
            return Err(OperatorError::ZeroAmount);
        }

        let side = if token_in == self.token {
            Side::Low
        } else if token_in == self.reserve {
            Side::High
        } else {
            return Err(OperatorError::InvalidToken);
        };

        let s = self.range.side(side);
        if !s.active {
            return Err(OperatorError::WallDown { side });
        }
        let capacity = s.capacity;

        let amount_out = self.amount_out(token_in, amount_in)?;
        if amount_out > capacity {
            return Err(OperatorError::InsufficientCapacity {
                requested: amount_out,
                available: capacity,
            });
        }

        // Accounting first: decrement capacity and wind down a cushion the
        // wall can no longer support, then move value.
        let status = self.range.update_capacity(side, capacity - amount_out, now);
        if status == WallStatus::Down {
            self.deactivate_cushion(side)?;
        }

        match side {
            Side::Low => {
                self.collab.tokens.burn(caller, amount_in)?;
                self.collab.treasury.withdraw(self.reserve, caller, amount_out)?;
            }
            Side::High => {
                self.collab.treasury.deposit(self.reserve, caller, amount_in)?;
                self.collab.tokens.mint(caller, amount_out)?;
            }
        }

        tracing::info!(?side, amount_in, amount_out, "operator: wall swap");
        Ok(amount_out)
    }

    fn enter(&mut self) -> Result<()> {
        if self.entered {
            return Err(OperatorError::Reentrancy);
        }
        self.entered = true;
        Ok(())
    }

    #[cfg(test)]
    fn hold_guard(&mut self) {
        self.entered = true;
    }

    // ---- capacity --------------------------------------------------------

    /// Full wall capacity for a side, derived from live treasury reserves.
    ///
    /// The high side converts the reserve-denominated quantity into token
    /// units at the last recorded price and widens it by twice the wall
    /// spread, since the wall sells above the moving average.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::Oracle`] while the oracle is unseeded
    pub fn full_capacity(&self, side: Side) -> Result<u128> {
        let reserves = self.collab.treasury.reserve_balance(self.reserve);
        let capacity = scale::mul_div(
            reserves,
            self.config.reserve_factor as u128,
            ONE_HUNDRED_PERCENT as u128,
        )?;
        match side {
            Side::Low => Ok(capacity),
            Side::High => {
                let price = self.oracle.last_price()?;
                let in_tokens = scale::mul_div(
                    capacity,
                    scale::pow10(self.token.decimals as i16)?,
                    scale::pow10(self.reserve.decimals as i16)?,
                )?;
                let in_tokens = scale::mul_div(in_tokens, PRICE_SCALE, price)?;
                let widened = ONE_HUNDRED_PERCENT as u128 + 2 * self.range.wall_spread() as u128;
                scale::mul_div(in_tokens, widened, ONE_HUNDRED_PERCENT as u128)
            }
        }
    }

    // ---- emergency -------------------------------------------------------

    /// Restore a side immediately, outside the regeneration rules. Admin.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::Auth`] for a caller without the admin role
    /// - [`OperatorError::Reentrancy`] on a reentrant call
    pub fn activate(&mut self, caller: Address, now: u64, side: Side) -> Result<()> {
        self.auth.ensure(caller, Role::Admin)?;
        self.enter()?;
        let result = self.regenerate_side(side, now);
        self.entered = false;
        result
    }

    /// Take a side down immediately, closing any open cushion. Admin.
    /// Idempotent when the side is already down.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::Auth`] for a caller without the admin role
    pub fn deactivate(&mut self, caller: Address, now: u64, side: Side) -> Result<()> {
        self.auth.ensure(caller, Role::Admin)?;
        self.enter()?;
        let result = self.deactivate_inner(side, now);
        self.entered = false;
        result
    }

    fn deactivate_inner(&mut self, side: Side, now: u64) -> Result<()> {
        let market = self.range.deactivate(side, now);
        self.range.update_capacity(side, 0, now);
        if let Some(market) = market {
            if self.collab.auctioneer.is_live(market) {
                self.collab.auctioneer.close_market(market)?;
            }
        }
        Ok(())
    }

    // ---- admin setters ---------------------------------------------------

    /// Change the cushion and wall spreads. Admin.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::Range`] on out-of-bounds or inverted spreads
    pub fn set_spreads(&mut self, caller: Address, cushion: u32, wall: u32) -> Result<()> {
        self.auth.ensure(caller, Role::Admin)?;
        self.range.set_spreads(cushion, wall)?;
        self.bump_version("spreads");
        Ok(())
    }

    /// Change the wall-down threshold factor. Admin. Applies at the next
    /// regeneration.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::Range`] on an out-of-bounds factor
    pub fn set_threshold_factor(&mut self, caller: Address, factor: u32) -> Result<()> {
        self.auth.ensure(caller, Role::Admin)?;
        self.range.set_threshold_factor(factor)?;
        self.bump_version("threshold factor");
        Ok(())
    }

    /// Change the cushion auction parameters. Admin.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::InvalidParams`] on out-of-bounds values
    pub fn set_cushion_params(
        &mut self,
        caller: Address,
        factor: u32,
        duration: u64,
        debt_buffer: u32,
        deposit_interval: u64,
    ) -> Result<()> {
        self.auth.ensure(caller, Role::Admin)?;
        let mut candidate = self.config.clone();
        candidate.cushion_factor = factor;
        candidate.cushion_duration = duration;
        candidate.cushion_debt_buffer = debt_buffer;
        candidate.cushion_deposit_interval = deposit_interval;
        candidate.validate()?;
        self.config = candidate;
        self.bump_version("cushion params");
        Ok(())
    }

    /// Change the fraction of reserves eligible as wall capacity. Admin.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::InvalidParams`] on an out-of-bounds factor
    pub fn set_reserve_factor(&mut self, caller: Address, factor: u32) -> Result<()> {
        self.auth.ensure(caller, Role::Admin)?;
        let mut candidate = self.config.clone();
        candidate.reserve_factor = factor;
        candidate.validate()?;
        self.config = candidate;
        self.bump_version("reserve factor");
        Ok(())
    }

    /// Change the regeneration parameters. Admin. Clears both observation
    /// windows, since counts from a differently-shaped window are not
    /// comparable.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::InvalidParams`] if the threshold exceeds the
    ///   window
    pub fn set_regen_params(
        &mut self,
        caller: Address,
        now: u64,
        wait: u64,
        threshold: u32,
        observe: usize,
    ) -> Result<()> {
        self.auth.ensure(caller, Role::Admin)?;
        let mut candidate = self.config.clone();
        candidate.regen_wait = wait;
        candidate.regen_threshold = threshold;
        candidate.regen_observe = observe;
        candidate.validate()?;
        self.config = candidate;
        self.regen_low.resize(observe, now);
        self.regen_high.resize(observe, now);
        self.bump_version("regen params");
        Ok(())
    }

    /// Change the oracle's moving-average window length. Admin. Invalidates
    /// the observation buffer; the oracle must be re-seeded before the next
    /// heartbeat.
    ///
    /// # Errors
    ///
    /// - [`OperatorError::Oracle`] on an indivisible window
    pub fn set_moving_average_duration(&mut self, caller: Address, duration: u64) -> Result<()> {
        self.auth.ensure(caller, Role::Admin)?;
        self.oracle.change_moving_average_duration(duration)?;
        self.bump_version("moving average duration");
        Ok(())
    }

    /// Change the oracle's observation frequency. Admin. Invalidates the
    /// observation buffer, as with [`Self::set_moving_average_duration`].
    ///
    /// # Errors
    ///
    /// - [`OperatorError::Oracle`] on an indivisible window
    pub fn set_observation_frequency(&mut self, caller: Address, frequency: u64) -> Result<()> {
        self.auth.ensure(caller, Role::Admin)?;
        self.oracle.change_observation_frequency(frequency)?;
        self.bump_version("observation frequency");
        Ok(())
    }

    fn bump_version(&mut self, what: &str) {
        self.config.version += 1;
        tracing::info!(version = self.config.version, what, "operator: configuration changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{StubAuctioneer, StubCallback, StubToken, StubTreasury};
    use crate::traits::{Auctioneer, Treasury};
    use rampart_oracle::stub::StubFeed;
    use rampart_oracle::OracleConfig;
    use rampart_types::auth::RoleTable;

    const ADMIN: Address = [0xad; 20];
    const KEEPER: Address = [0x4b; 20];
    const USER: Address = [0x55; 20];
    const HOUR: u64 = 3600;

    fn token() -> Token {
        Token::new([0x01; 20], 9)
    }

    fn reserve() -> Token {
        Token::new([0x02; 20], 18)
    }

    struct Harness {
        operator: Operator<StubFeed, StubFeed>,
        auctioneer: StubAuctioneer,
        callback: StubCallback,
        treasury: StubTreasury,
        tokens: StubToken,
        token_feed: StubFeed,
        reserve_feed: StubFeed,
    }

    impl Harness {
        /// Push a fresh token-feed answer so the next heartbeat observes
        /// `price` (18-decimal), with the reserve feed pinned at 0.0005.
        fn set_price(&self, price: u128, now: u64) {
            let answer = (price / 2_000) as i128; // price * 5e14 / 1e18
            self.token_feed.push(answer, now);
            self.reserve_feed.push(500_000_000_000_000, now);
        }
    }

    /// Oracle seeded flat at 10.0 over a 24-slot window; treasury funded
    /// with 1,000,000 reserve; walls at 7.50 / 12.50, cushions at 8.00 /
    /// 12.00.
    fn harness() -> Harness {
        let token_feed = StubFeed::new(18, 5_000_000_000_000_000, 0); // 0.005
        let reserve_feed = StubFeed::new(18, 500_000_000_000_000, 0); // 0.0005
        let mut oracle = PriceOracle::new(
            token_feed.clone(),
            reserve_feed.clone(),
            OracleConfig {
                observation_frequency: HOUR,
                moving_average_duration: 24 * HOUR,
                token_feed_threshold: 24 * HOUR,
                reserve_feed_threshold: 24 * HOUR,
            },
        )
        .expect("valid oracle config");
        oracle
            .initialize(&[10 * PRICE_SCALE; 24], 0)
            .expect("seed oracle");

        let range = RangeState::new(2_000, 2_500, 1_000).expect("valid range factors");

        let auctioneer = StubAuctioneer::new();
        let callback = StubCallback::new();
        let treasury = StubTreasury::new();
        let tokens = StubToken::new();
        treasury.fund(reserve(), 1_000_000 * reserve().unit());

        let mut auth = RoleTable::new();
        auth.grant(ADMIN, Role::Admin);
        auth.grant(KEEPER, Role::Heartbeat);

        let operator = Operator::new(
            oracle,
            range,
            OperatorConfig::default(),
            token(),
            reserve(),
            Collaborators {
                auctioneer: Box::new(auctioneer.clone()),
                callback: Box::new(callback.clone()),
                treasury: Box::new(treasury.clone()),
                tokens: Box::new(tokens.clone()),
            },
            Box::new(auth),
        )
        .expect("valid operator config");

        Harness {
            operator,
            auctioneer,
            callback,
            treasury,
            tokens,
            token_feed,
            reserve_feed,
        }
    }

    fn initialized() -> Harness {
        let mut h = harness();
        h.operator.initialize(0, ADMIN).expect("initialize");
        h
    }

    #[test]
    fn test_entrypoints_gated_until_initialized() {
        let mut h = harness();
        assert!(matches!(
            h.operator.operate(HOUR, KEEPER),
            Err(OperatorError::NotInitialized)
        ));
        assert!(matches!(
            h.operator.swap(HOUR, USER, token(), 1),
            Err(OperatorError::NotInitialized)
        ));
    }

    #[test]
    fn test_initialize_regenerates_both_sides() {
        let h = initialized();
        let low = h.operator.range().side(Side::Low);
        let high = h.operator.range().side(Side::High);

        assert!(low.active);
        assert!(high.active);
        // 10% of 1,000,000 reserve
        assert_eq!(low.capacity, 100_000 * reserve().unit());
        // Converted at price 10 and widened by 2 * 25%
        assert_eq!(high.capacity, 15_000 * token().unit());
        assert_eq!(low.wall_price, 7_500_000_000_000_000_000);
        assert_eq!(high.wall_price, 12_500_000_000_000_000_000);
    }

    #[test]
    fn test_initialize_twice_rejected() {
        let mut h = initialized();
        assert!(matches!(
            h.operator.initialize(1, ADMIN),
            Err(OperatorError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_initialize_requires_seeded_oracle() {
        let token_feed = StubFeed::new(18, 1, 0);
        let reserve_feed = StubFeed::new(18, 1, 0);
        let oracle = PriceOracle::new(
            token_feed,
            reserve_feed,
            OracleConfig {
                observation_frequency: HOUR,
                moving_average_duration: 3 * HOUR,
                token_feed_threshold: HOUR,
                reserve_feed_threshold: HOUR,
            },
        )
        .expect("valid oracle config");
        let mut auth = RoleTable::new();
        auth.grant(ADMIN, Role::Admin);
        let mut operator = Operator::new(
            oracle,
            RangeState::new(2_000, 2_500, 1_000).expect("valid range"),
            OperatorConfig::default(),
            token(),
            reserve(),
            Collaborators {
                auctioneer: Box::new(StubAuctioneer::new()),
                callback: Box::new(StubCallback::new()),
                treasury: Box::new(StubTreasury::new()),
                tokens: Box::new(StubToken::new()),
            },
            Box::new(auth),
        )
        .expect("valid operator config");

        assert!(matches!(
            operator.initialize(0, ADMIN),
            Err(OperatorError::Oracle(rampart_oracle::OracleError::NotInitialized))
        ));
    }

    #[test]
    fn test_permissioned_entrypoints_reject_unknown_caller() {
        let mut h = initialized();
        assert!(matches!(
            h.operator.operate(HOUR, USER),
            Err(OperatorError::Auth(_))
        ));
        assert!(matches!(
            h.operator.set_reserve_factor(USER, 2_000),
            Err(OperatorError::Auth(_))
        ));
        // Failed setter leaves the version untouched
        assert_eq!(h.operator.config().version, 0);
    }

    #[test]
    fn test_swap_low_wall_pays_reserve() {
        let mut h = initialized();
        h.tokens.fund(USER, 100 * token().unit());

        let amount_out = h
            .operator
            .swap(10, USER, token(), 100 * token().unit())
            .expect("low wall active");

        // 100 tokens at 7.50 = 750 reserve
        assert_eq!(amount_out, 750 * reserve().unit());
        assert_eq!(h.tokens.balance_of(USER), 0);
        assert_eq!(h.tokens.total_supply(), 0);
        assert_eq!(
            h.treasury.reserve_balance(reserve()),
            (1_000_000 - 750) * reserve().unit()
        );
        assert_eq!(
            h.operator.range().side(Side::Low).capacity,
            (100_000 - 750) * reserve().unit()
        );
    }

    #[test]
    fn test_swap_high_wall_mints_token() {
        let mut h = initialized();

        let amount_out = h
            .operator
            .swap(10, USER, reserve(), 125 * reserve().unit())
            .expect("high wall active");

        // 125 reserve at 12.50 = 10 tokens
        assert_eq!(amount_out, 10 * token().unit());
        assert_eq!(h.tokens.balance_of(USER), 10 * token().unit());
        assert_eq!(
            h.treasury.reserve_balance(reserve()),
            (1_000_000 + 125) * reserve().unit()
        );
        assert_eq!(
            h.operator.range().side(Side::High).capacity,
            (15_000 - 10) * token().unit()
        );
    }

    #[test]
    fn test_swap_rejects_zero_and_foreign_token() {
        let mut h = initialized();
        assert!(matches!(
            h.operator.swap(10, USER, token(), 0),
            Err(OperatorError::ZeroAmount)
        ));
        assert!(matches!(
            h.operator.swap(10, USER, Token::new([0x99; 20], 18), 1),
            Err(OperatorError::InvalidToken)
        ));
    }

    #[test]
    fn test_swap_capacity_edge() {
        let mut h = initialized();
        h.tokens.fund(USER, 20_000 * token().unit());
        h.operator
            .swap(10, USER, token(), 8_000 * token().unit())
            .expect("within capacity"); // consumes 60,000 reserve
        let remaining = h.operator.range().side(Side::Low).capacity;
        assert_eq!(remaining, 40_000 * reserve().unit());

        // Request exactly one base unit more than remaining capacity pays
        let too_much = h.operator.amount_out(token(), 5_340 * token().unit()).expect("quote");
        assert!(too_much > remaining);
        let err = h
            .operator
            .swap(11, USER, token(), 5_340 * token().unit())
            .unwrap_err();
        assert!(matches!(err, OperatorError::InsufficientCapacity { .. }));
        // State unchanged by the rejected swap
        assert_eq!(h.operator.range().side(Side::Low).capacity, remaining);
        assert_eq!(h.tokens.balance_of(USER), 12_000 * token().unit());
    }

    #[test]
    fn test_swap_below_threshold_takes_wall_down() {
        let mut h = initialized();
        // Threshold is 10% of 100,000 = 10,000 reserve. Swap down to 9,999.
        h.tokens.fund(USER, 13_000 * token().unit());
        let sell = h.operator.amount_out(token(), 12_000 * token().unit()).expect("quote");
        assert_eq!(sell, 90_000 * reserve().unit());
        h.operator
            .swap(10, USER, token(), 12_000 * token().unit())
            .expect("within capacity");
        assert!(h.operator.range().side(Side::Low).active);

        h.operator
            .swap(11, USER, token(), 10 * token().unit())
            .expect("still above zero capacity");
        // 9,925 < 10,000 threshold: wall down
        assert!(!h.operator.range().side(Side::Low).active);

        let err = h.operator.swap(12, USER, token(), token().unit()).unwrap_err();
        assert!(matches!(err, OperatorError::WallDown { side: Side::Low }));
    }

    #[test]
    fn test_heartbeat_opens_high_cushion_in_zone() {
        let mut h = initialized();
        // Price 12.30: above the cushion of the drifted average, below wall
        h.set_price(12_300_000_000_000_000_000, HOUR);
        h.operator.operate(HOUR, KEEPER).expect("heartbeat");

        let high = h.operator.range().side(Side::High);
        let market = high.market.expect("cushion auction open");
        let snapshot = h.auctioneer.market(market).expect("market exists");

        // Sized as cushion_factor (10%) of the side's capacity
        assert_eq!(snapshot.capacity, high.capacity / 10);
        assert_eq!(snapshot.params.payout, token());
        assert_eq!(snapshot.params.quote, reserve());
        assert!(snapshot.params.initial_price >= snapshot.params.minimum_price);
        assert!(h.callback.is_whitelisted([0x7e; 20], market));
    }

    #[test]
    fn test_heartbeat_closes_cushion_when_price_recenters() {
        let mut h = initialized();
        h.set_price(12_300_000_000_000_000_000, HOUR);
        h.operator.operate(HOUR, KEEPER).expect("open");
        let market = h.operator.range().side(Side::High).market.expect("open");

        h.set_price(10 * PRICE_SCALE, 2 * HOUR);
        h.operator.operate(2 * HOUR, KEEPER).expect("close");

        assert_eq!(h.operator.range().side(Side::High).market, None);
        assert!(!h.auctioneer.is_live(market));
        // Wall itself stays up
        assert!(h.operator.range().side(Side::High).active);
    }

    #[test]
    fn test_stale_feed_fails_heartbeat_without_commit() {
        let mut h = initialized();
        let before = h.operator.range().side(Side::High).wall_price;

        // 25 hours with no feed update exceeds the 24-hour threshold
        let err = h.operator.operate(25 * HOUR, KEEPER).unwrap_err();
        assert!(matches!(err, OperatorError::Oracle(_)));
        assert_eq!(h.operator.range().side(Side::High).wall_price, before);
        assert_eq!(h.operator.regen_status(Side::Low).count(), 0);
    }

    #[test]
    fn test_emergency_deactivate_and_activate() {
        let mut h = initialized();
        h.set_price(12_300_000_000_000_000_000, HOUR);
        h.operator.operate(HOUR, KEEPER).expect("open cushion");
        let market = h.operator.range().side(Side::High).market.expect("open");

        h.operator
            .deactivate(ADMIN, 2 * HOUR, Side::High)
            .expect("deactivate");
        let high = h.operator.range().side(Side::High);
        assert!(!high.active);
        assert_eq!(high.capacity, 0);
        assert_eq!(high.market, None);
        assert!(!h.auctioneer.is_live(market));

        // Deactivating again is a no-op
        h.operator
            .deactivate(ADMIN, 2 * HOUR, Side::High)
            .expect("idempotent");

        h.operator
            .activate(ADMIN, 3 * HOUR, Side::High)
            .expect("activate");
        assert!(h.operator.range().side(Side::High).active);
        assert!(h.operator.range().side(Side::High).capacity > 0);
    }

    #[test]
    fn test_guard_blocks_all_value_moving_entrypoints() {
        let mut h = initialized();
        h.tokens.fund(USER, 100 * token().unit());

        // Every entrypoint that can reach an external call refuses to run
        // while the guard is held
        h.operator.hold_guard();
        assert!(matches!(
            h.operator.swap(10, USER, token(), 100 * token().unit()),
            Err(OperatorError::Reentrancy)
        ));
        assert!(matches!(
            h.operator.operate(HOUR, KEEPER),
            Err(OperatorError::Reentrancy)
        ));
        assert!(matches!(
            h.operator.activate(ADMIN, 10, Side::Low),
            Err(OperatorError::Reentrancy)
        ));
        assert!(matches!(
            h.operator.deactivate(ADMIN, 10, Side::Low),
            Err(OperatorError::Reentrancy)
        ));
    }

    #[test]
    fn test_guard_releases_after_each_call() {
        let mut h = initialized();
        h.tokens.fund(USER, 100 * token().unit());
        h.operator
            .swap(10, USER, token(), 100 * token().unit())
            .expect("first swap");

        // A completed call leaves the guard clear for the next one
        h.operator.activate(ADMIN, 20, Side::Low).expect("activate");
        h.operator.operate(HOUR, KEEPER).expect("heartbeat");
    }

    #[test]
    fn test_setters_bump_version_once() {
        let mut h = initialized();
        h.operator.set_reserve_factor(ADMIN, 2_000).expect("set");
        assert_eq!(h.operator.config().version, 1);
        h.operator
            .set_regen_params(ADMIN, 0, 7_200, 3, 5)
            .expect("set");
        assert_eq!(h.operator.config().version, 2);
        assert_eq!(h.operator.regen_status(Side::Low).window(), 5);

        assert!(h.operator.set_regen_params(ADMIN, 0, 7_200, 6, 5).is_err());
        assert_eq!(h.operator.config().version, 2);
    }

    #[test]
    fn test_oracle_window_change_requires_reseed() {
        let mut h = initialized();
        h.operator
            .set_observation_frequency(ADMIN, 2 * HOUR)
            .expect("divisible frequency");

        let err = h.operator.operate(2 * HOUR, KEEPER).unwrap_err();
        assert!(matches!(
            err,
            OperatorError::Oracle(rampart_oracle::OracleError::NotInitialized)
        ));

        h.operator
            .initialize_oracle(ADMIN, &[10 * PRICE_SCALE; 12], 2 * HOUR)
            .expect("re-seed");
        h.set_price(10 * PRICE_SCALE, 4 * HOUR);
        h.operator.operate(4 * HOUR, KEEPER).expect("heartbeat resumes");
    }
}
