//! In-memory collaborator doubles.
//!
//! Each stub shares its state behind an `Rc`, so a cloned handle kept by a
//! test can drive fills, inspect balances, or assert on recorded calls while
//! the operator owns the boxed trait object.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rampart_types::{Address, MarketId, Token};

use crate::traits::{AuctionParams, Auctioneer, CallbackRegistry, TokenAuthority, Treasury};
use crate::{OperatorError, Result};

/// A market held by [`StubAuctioneer`].
#[derive(Debug, Clone)]
pub struct StubMarket {
    /// Parameters the market was created with.
    pub params: AuctionParams,
    /// Remaining payout capacity.
    pub capacity: u128,
    /// Whether the market is accepting purchases.
    pub live: bool,
}

#[derive(Debug, Default)]
struct AuctioneerInner {
    next_id: MarketId,
    markets: BTreeMap<MarketId, StubMarket>,
}

/// In-memory auction mechanism with settable fills.
#[derive(Debug, Clone, Default)]
pub struct StubAuctioneer {
    inner: Rc<RefCell<AuctioneerInner>>,
}

impl StubAuctioneer {
    /// Create an auctioneer with no markets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate purchases consuming `amount` of a market's capacity.
    /// The market concludes when its capacity is exhausted.
    pub fn fill(&self, market: MarketId, amount: u128) {
        let mut inner = self.inner.borrow_mut();
        if let Some(m) = inner.markets.get_mut(&market) {
            m.capacity = m.capacity.saturating_sub(amount);
            if m.capacity == 0 {
                m.live = false;
            }
        }
    }

    /// Conclude a market without consuming capacity, as expiry would.
    pub fn conclude(&self, market: MarketId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(m) = inner.markets.get_mut(&market) {
            m.live = false;
        }
    }

    /// Snapshot of a market, if it exists.
    pub fn market(&self, market: MarketId) -> Option<StubMarket> {
        self.inner.borrow().markets.get(&market).cloned()
    }

    /// Number of markets ever created.
    pub fn created(&self) -> usize {
        self.inner.borrow().markets.len()
    }
}

impl Auctioneer for StubAuctioneer {
    fn create_market(&mut self, params: AuctionParams) -> Result<MarketId> {
        if params.initial_price < params.minimum_price {
            return Err(OperatorError::Auctioneer(format!(
                "initial price {} below minimum {}",
                params.initial_price, params.minimum_price
            )));
        }
        if params.capacity == 0 {
            return Err(OperatorError::Auctioneer("zero capacity".into()));
        }
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let capacity = params.capacity;
        inner.markets.insert(
            id,
            StubMarket {
                params,
                capacity,
                live: true,
            },
        );
        Ok(id)
    }

    fn is_live(&self, market: MarketId) -> bool {
        self.inner
            .borrow()
            .markets
            .get(&market)
            .is_some_and(|m| m.live)
    }

    fn close_market(&mut self, market: MarketId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let m = inner
            .markets
            .get_mut(&market)
            .ok_or_else(|| OperatorError::Auctioneer(format!("unknown market {market}")))?;
        m.live = false;
        Ok(())
    }

    fn current_capacity(&self, market: MarketId) -> u128 {
        self.inner
            .borrow()
            .markets
            .get(&market)
            .map_or(0, |m| m.capacity)
    }

    fn teller(&self) -> Address {
        [0x7e; 20]
    }
}

/// In-memory payout-callback whitelist.
#[derive(Debug, Clone, Default)]
pub struct StubCallback {
    whitelisted: Rc<RefCell<Vec<(Address, MarketId)>>>,
}

impl StubCallback {
    /// Create an empty whitelist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `(teller, market)` has been registered.
    pub fn is_whitelisted(&self, teller: Address, market: MarketId) -> bool {
        self.whitelisted.borrow().contains(&(teller, market))
    }

    /// Number of registrations recorded.
    pub fn registrations(&self) -> usize {
        self.whitelisted.borrow().len()
    }
}

impl CallbackRegistry for StubCallback {
    fn whitelist(&mut self, teller: Address, market: MarketId) -> Result<()> {
        self.whitelisted.borrow_mut().push((teller, market));
        Ok(())
    }
}

/// In-memory reserve custody with per-token balances.
#[derive(Debug, Clone, Default)]
pub struct StubTreasury {
    balances: Rc<RefCell<BTreeMap<Address, u128>>>,
}

impl StubTreasury {
    /// Create an empty treasury.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed custody with `amount` of `token`.
    pub fn fund(&self, token: Token, amount: u128) {
        *self.balances.borrow_mut().entry(token.address).or_default() += amount;
    }
}

impl Treasury for StubTreasury {
    fn reserve_balance(&self, token: Token) -> u128 {
        self.balances
            .borrow()
            .get(&token.address)
            .copied()
            .unwrap_or(0)
    }

    fn deposit(&mut self, token: Token, _from: Address, amount: u128) -> Result<()> {
        *self.balances.borrow_mut().entry(token.address).or_default() += amount;
        Ok(())
    }

    fn withdraw(&mut self, token: Token, _to: Address, amount: u128) -> Result<()> {
        let mut balances = self.balances.borrow_mut();
        let balance = balances.entry(token.address).or_default();
        if *balance < amount {
            return Err(OperatorError::Treasury(format!(
                "insufficient custody: have {balance}, need {amount}"
            )));
        }
        *balance -= amount;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct TokenInner {
    total_supply: u128,
    balances: BTreeMap<Address, u128>,
}

/// In-memory protocol-token mint/burn authority.
#[derive(Debug, Clone, Default)]
pub struct StubToken {
    inner: Rc<RefCell<TokenInner>>,
}

impl StubToken {
    /// Create a token with zero supply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `holder` without going through minting.
    pub fn fund(&self, holder: Address, amount: u128) {
        let mut inner = self.inner.borrow_mut();
        *inner.balances.entry(holder).or_default() += amount;
        inner.total_supply += amount;
    }

    /// Balance of `holder`.
    pub fn balance_of(&self, holder: Address) -> u128 {
        self.inner
            .borrow()
            .balances
            .get(&holder)
            .copied()
            .unwrap_or(0)
    }

    /// Total supply outstanding.
    pub fn total_supply(&self) -> u128 {
        self.inner.borrow().total_supply
    }
}

impl TokenAuthority for StubToken {
    fn mint(&mut self, to: Address, amount: u128) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        *inner.balances.entry(to).or_default() += amount;
        inner.total_supply += amount;
        Ok(())
    }

    fn burn(&mut self, from: Address, amount: u128) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let balance = inner.balances.entry(from).or_default();
        if *balance < amount {
            return Err(OperatorError::TokenAuthority(format!(
                "insufficient balance: have {balance}, need {amount}"
            )));
        }
        *balance -= amount;
        inner.total_supply -= amount;
        Ok(())
    }
}
