//! # rampart-range
//!
//! Wall/cushion band state and regeneration tracking.
//!
//! A [`range::RangeState`] holds the wall and cushion price pair for both
//! sides of the managed band and is the single source of truth for each
//! side's remaining capacity. A [`regen::RegenStatus`] per side records
//! whether recent prices have been favorable to restoring a depleted wall.
//!
//! ## Modules
//!
//! - [`range`] — band prices, capacity, and wall/cushion bookkeeping
//! - [`regen`] — regeneration observation ring buffer

pub mod range;
pub mod regen;

pub use range::{RangeSide, RangeState, WallStatus};
pub use regen::RegenStatus;

/// Error types for range operations.
#[derive(Debug, thiserror::Error)]
pub enum RangeError {
    /// Spread or threshold parameters outside their allowed bounds.
    #[error("invalid range params: {0}")]
    InvalidParams(String),

    /// Price or threshold arithmetic overflowed.
    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

/// Convenience result type for range operations.
pub type Result<T> = std::result::Result<T, RangeError>;
