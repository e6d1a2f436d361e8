//! Collaborator seams: auctioneer, callback registry, treasury, and token
//! authority.
//!
//! The control loop drives these external mechanisms through traits so it
//! can be exercised without a full chain simulation; [`crate::stub`] holds
//! the in-memory implementations.

use rampart_types::{Address, MarketId, Token};

use crate::Result;

/// Parameters for a new cushion auction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionParams {
    /// Token the auction pays out.
    pub payout: Token,
    /// Token the auction accepts.
    pub quote: Token,
    /// Payout capacity offered, in payout base units.
    pub capacity: u128,
    /// Starting price at the auction mechanism's scale.
    pub initial_price: u128,
    /// Price floor at the auction mechanism's scale.
    pub minimum_price: u128,
    /// Debt buffer in basis points.
    pub debt_buffer: u32,
    /// Unix timestamp the auction concludes at.
    pub conclusion: u64,
    /// Deposit interval in seconds.
    pub deposit_interval: u64,
    /// Signed exponent relating the price scale to the token decimals.
    pub scale_adjustment: i8,
}

/// The external graduated-auction mechanism.
pub trait Auctioneer {
    /// Open a market.
    ///
    /// # Errors
    ///
    /// - [`crate::OperatorError::Auctioneer`] if the mechanism rejects the
    ///   parameters
    fn create_market(&mut self, params: AuctionParams) -> Result<MarketId>;

    /// Whether a market is still accepting purchases.
    fn is_live(&self, market: MarketId) -> bool;

    /// Close a market early.
    ///
    /// # Errors
    ///
    /// - [`crate::OperatorError::Auctioneer`] for an unknown market
    fn close_market(&mut self, market: MarketId) -> Result<()>;

    /// Remaining payout capacity of a market. Zero for unknown or concluded
    /// markets.
    fn current_capacity(&self, market: MarketId) -> u128;

    /// Address of the teller that settles this mechanism's payouts.
    fn teller(&self) -> Address;
}

/// Payout-callback whitelist. Every new market's teller must be registered
/// here before the market can settle payouts.
pub trait CallbackRegistry {
    /// Register `teller` for `market`.
    ///
    /// # Errors
    ///
    /// - [`crate::OperatorError::Callback`] if registration is refused
    fn whitelist(&mut self, teller: Address, market: MarketId) -> Result<()>;
}

/// Custody of protocol reserves.
pub trait Treasury {
    /// Current reserve balance held for the protocol.
    fn reserve_balance(&self, token: Token) -> u128;

    /// Pull `amount` of `token` from `from` into custody.
    ///
    /// # Errors
    ///
    /// - [`crate::OperatorError::Treasury`] if the transfer fails
    fn deposit(&mut self, token: Token, from: Address, amount: u128) -> Result<()>;

    /// Pay `amount` of `token` out to `to`.
    ///
    /// # Errors
    ///
    /// - [`crate::OperatorError::Treasury`] on insufficient custody
    fn withdraw(&mut self, token: Token, to: Address, amount: u128) -> Result<()>;
}

/// Mint/burn authority over the protocol token.
pub trait TokenAuthority {
    /// Mint `amount` to `to`.
    ///
    /// # Errors
    ///
    /// - [`crate::OperatorError::TokenAuthority`] if minting is refused
    fn mint(&mut self, to: Address, amount: u128) -> Result<()>;

    /// Burn `amount` from `from`.
    ///
    /// # Errors
    ///
    /// - [`crate::OperatorError::TokenAuthority`] on insufficient balance
    fn burn(&mut self, from: Address, amount: u128) -> Result<()>;
}

/// The full set of external mechanisms the operator drives.
pub struct Collaborators {
    /// Graduated-auction mechanism for cushions.
    pub auctioneer: Box<dyn Auctioneer>,
    /// Payout-callback whitelist.
    pub callback: Box<dyn CallbackRegistry>,
    /// Reserve custody.
    pub treasury: Box<dyn Treasury>,
    /// Protocol token mint/burn authority.
    pub tokens: Box<dyn TokenAuthority>,
}
