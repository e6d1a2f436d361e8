//! # rampart-operator
//!
//! The market-operations control loop.
//!
//! Once per heartbeat the operator refreshes the range prices from the
//! oracle's moving average, records regeneration observations, reconciles
//! wall capacity against cushion auction fills, regenerates eligible walls,
//! and opens or closes cushion auctions based on where the price sits in the
//! band. Independently of the heartbeat, anyone may swap against an active
//! wall at its hard price.
//!
//! ## Modules
//!
//! - [`config`] — operator configuration with bounds validation
//! - [`scale`] — fixed-point scale conversion with signed exponents
//! - [`traits`] — auctioneer, treasury, token-authority, and callback seams
//! - [`stub`] — in-memory collaborator doubles
//! - [`operator`] — the control loop, swap entrypoint, and admin surface

pub mod config;
pub mod operator;
pub mod scale;
pub mod stub;
pub mod traits;

pub use config::OperatorConfig;
pub use operator::Operator;
pub use traits::{AuctionParams, Auctioneer, CallbackRegistry, Collaborators, TokenAuthority, Treasury};

use rampart_types::Side;

/// Error types for operator operations.
#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    /// Oracle failure. Feed integrity errors are fatal to the heartbeat.
    #[error(transparent)]
    Oracle(#[from] rampart_oracle::OracleError),

    /// Range parameter or state failure.
    #[error(transparent)]
    Range(#[from] rampart_range::RangeError),

    /// The caller does not hold the required role.
    #[error(transparent)]
    Auth(#[from] rampart_types::auth::AuthError),

    /// The operator has not been initialized.
    #[error("operator is not initialized")]
    NotInitialized,

    /// The operator was already initialized.
    #[error("operator is already initialized")]
    AlreadyInitialized,

    /// The requested side's wall is not accepting swaps.
    #[error("wall is down on the {side:?} side")]
    WallDown {
        /// Side whose wall is inactive.
        side: Side,
    },

    /// The swap payout exceeds the side's remaining capacity.
    #[error("insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity {
        /// Payout the swap would require.
        requested: u128,
        /// Capacity currently available.
        available: u128,
    },

    /// The swapped token is neither the protocol token nor the reserve.
    #[error("token is not part of the wall pair")]
    InvalidToken,

    /// A zero amount was supplied.
    #[error("amount must be nonzero")]
    ZeroAmount,

    /// A guarded entrypoint was re-entered.
    #[error("reentrant call")]
    Reentrancy,

    /// Configuration outside its allowed bounds.
    #[error("invalid operator params: {0}")]
    InvalidParams(String),

    /// A price cannot be formatted at the required auction scale.
    #[error("price scale exponent {0} out of range")]
    ScaleOutOfRange(i16),

    /// A price of zero cannot be inverted or divided by.
    #[error("price is zero")]
    ZeroPrice,

    /// Amount arithmetic exceeded the 128-bit range.
    #[error("amount arithmetic overflow")]
    AmountOverflow,

    /// The auction mechanism rejected a call.
    #[error("auctioneer: {0}")]
    Auctioneer(String),

    /// The payout callback registry rejected a call.
    #[error("callback registry: {0}")]
    Callback(String),

    /// The treasury rejected a call.
    #[error("treasury: {0}")]
    Treasury(String),

    /// The token mint/burn authority rejected a call.
    #[error("token authority: {0}")]
    TokenAuthority(String),
}

/// Convenience result type for operator operations.
pub type Result<T> = std::result::Result<T, OperatorError>;
