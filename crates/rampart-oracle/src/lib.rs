//! # rampart-oracle
//!
//! Price oracle and moving-average engine.
//!
//! The oracle derives the token-in-reserve price from two external feeds
//! (token-vs-intermediate and reserve-vs-intermediate) and maintains a
//! fixed-size ring buffer of periodic observations whose running sum yields
//! the moving average that anchors the price band.
//!
//! ## Modules
//!
//! - [`feed`] — external feed interface and per-round validation
//! - [`moving_average`] — observation ring buffer and spot-price derivation
//! - [`stub`] — in-memory feed double for tests and simulation

pub mod feed;
pub mod moving_average;
pub mod stub;

pub use moving_average::{OracleConfig, PriceOracle};

/// A reason a feed reading was rejected.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FeedFault {
    /// The reported answer was zero or negative.
    #[error("non-positive answer {0}")]
    NonPositiveAnswer(i128),

    /// The reading is older than the staleness threshold allows.
    #[error("stale: updated {updated_at}, now {now}, threshold {threshold}")]
    Stale {
        /// Timestamp of the reading.
        updated_at: u64,
        /// Current timestamp.
        now: u64,
        /// Maximum acceptable age in seconds.
        threshold: u64,
    },

    /// The answer was carried over from an earlier round.
    #[error("round mismatch: answered in round {answered_in_round}, current round {round_id}")]
    RoundMismatch {
        /// Round the answer was computed in.
        answered_in_round: u64,
        /// Round the feed reported.
        round_id: u64,
    },
}

/// Error types for oracle operations.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// An external feed returned an unusable reading. Fatal to the caller:
    /// trading on a bad feed is unsafe.
    #[error("bad feed {feed}: {fault}")]
    BadFeed {
        /// Label of the offending feed.
        feed: &'static str,
        /// Why the reading was rejected.
        fault: FeedFault,
    },

    /// The observation buffer has not been seeded yet.
    #[error("oracle is not initialized")]
    NotInitialized,

    /// The observation buffer was already seeded.
    #[error("oracle is already initialized")]
    AlreadyInitialized,

    /// The seed did not match the observation buffer length.
    #[error("invalid seed: need {required} observations, have {provided}")]
    InvalidSeed {
        /// Number of observations the buffer holds.
        required: usize,
        /// Number of seed observations provided.
        provided: usize,
    },

    /// Less than one observation frequency has elapsed since the last update.
    #[error("update too soon: last observation {last}, now {now}, frequency {frequency}")]
    UpdateTooSoon {
        /// Timestamp of the last accepted observation.
        last: u64,
        /// Current timestamp.
        now: u64,
        /// Required seconds between observations.
        frequency: u64,
    },

    /// Duration/frequency parameters are zero or not divisible.
    #[error("invalid oracle params: {0}")]
    InvalidParams(String),

    /// Price arithmetic exceeded the 128-bit fixed-point range.
    #[error("price arithmetic overflow")]
    PriceOverflow,
}

/// Convenience result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;
