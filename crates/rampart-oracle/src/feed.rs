//! External feed interface and per-round validation.
//!
//! Each feed reports rounds of `(round_id, answer, updated_at,
//! answered_in_round)` at its own decimal precision. A reading is usable only
//! when the answer is positive, fresh within the feed's staleness threshold,
//! and answered in the round it was reported for.

use rampart_types::PRICE_DECIMALS;

use crate::{FeedFault, OracleError, Result};

/// One round of data from an external price feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundData {
    /// Round identifier reported by the feed.
    pub round_id: u64,
    /// Price answer at the feed's own decimal precision. May be negative on
    /// a malfunctioning feed, which validation rejects.
    pub answer: i128,
    /// Unix timestamp the answer was computed at.
    pub updated_at: u64,
    /// Round the answer was actually computed in. A value below `round_id`
    /// means the feed carried a stale answer forward.
    pub answered_in_round: u64,
}

/// An external price feed.
///
/// Two implementations exist: a live adapter to the host network's feed
/// contract, and [`crate::stub::StubFeed`] for tests and simulation.
pub trait PriceFeed {
    /// Read the most recent round.
    fn latest_round_data(&self) -> Result<RoundData>;

    /// Decimal precision of this feed's answers.
    fn decimals(&self) -> u8;
}

/// Validate a round and return its answer as an unsigned price.
///
/// # Errors
///
/// - [`OracleError::BadFeed`] if the answer is non-positive, the reading is
///   older than `staleness_threshold`, or the answer was carried over from an
///   earlier round
pub fn validate_round(
    feed: &'static str,
    round: &RoundData,
    now: u64,
    staleness_threshold: u64,
) -> Result<u128> {
    if round.answer <= 0 {
        return Err(OracleError::BadFeed {
            feed,
            fault: FeedFault::NonPositiveAnswer(round.answer),
        });
    }
    if round.updated_at.saturating_add(staleness_threshold) < now {
        return Err(OracleError::BadFeed {
            feed,
            fault: FeedFault::Stale {
                updated_at: round.updated_at,
                now,
                threshold: staleness_threshold,
            },
        });
    }
    if round.answered_in_round < round.round_id {
        return Err(OracleError::BadFeed {
            feed,
            fault: FeedFault::RoundMismatch {
                answered_in_round: round.answered_in_round,
                round_id: round.round_id,
            },
        });
    }
    Ok(round.answer as u128)
}

/// Rescale a validated feed answer from `feed_decimals` to [`PRICE_DECIMALS`].
///
/// # Errors
///
/// - [`OracleError::PriceOverflow`] if scaling up exceeds the 128-bit range
pub fn to_price_decimals(answer: u128, feed_decimals: u8) -> Result<u128> {
    if feed_decimals == PRICE_DECIMALS {
        return Ok(answer);
    }
    if feed_decimals < PRICE_DECIMALS {
        let factor = 10u128.pow((PRICE_DECIMALS - feed_decimals) as u32);
        answer.checked_mul(factor).ok_or(OracleError::PriceOverflow)
    } else {
        let factor = 10u128.pow((feed_decimals - PRICE_DECIMALS) as u32);
        Ok(answer / factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_round(answer: i128) -> RoundData {
        RoundData {
            round_id: 7,
            answer,
            updated_at: 1_000,
            answered_in_round: 7,
        }
    }

    #[test]
    fn test_valid_round() {
        let price = validate_round("token", &fresh_round(5_000), 1_100, 3_600)
            .expect("fresh positive round");
        assert_eq!(price, 5_000);
    }

    #[test]
    fn test_zero_answer_rejected() {
        let err = validate_round("token", &fresh_round(0), 1_100, 3_600).unwrap_err();
        assert!(matches!(
            err,
            OracleError::BadFeed { fault: FeedFault::NonPositiveAnswer(0), .. }
        ));
    }

    #[test]
    fn test_negative_answer_rejected() {
        let err = validate_round("reserve", &fresh_round(-1), 1_100, 3_600).unwrap_err();
        assert!(matches!(
            err,
            OracleError::BadFeed { feed: "reserve", fault: FeedFault::NonPositiveAnswer(-1) }
        ));
    }

    #[test]
    fn test_stale_round_rejected() {
        // updated_at 1000, threshold 100: acceptable until now = 1100
        validate_round("token", &fresh_round(1), 1_100, 100).expect("at threshold");
        let err = validate_round("token", &fresh_round(1), 1_101, 100).unwrap_err();
        assert!(matches!(
            err,
            OracleError::BadFeed { fault: FeedFault::Stale { .. }, .. }
        ));
    }

    #[test]
    fn test_carried_over_round_rejected() {
        let round = RoundData {
            round_id: 8,
            answer: 5_000,
            updated_at: 1_000,
            answered_in_round: 7,
        };
        let err = validate_round("token", &round, 1_100, 3_600).unwrap_err();
        assert!(matches!(
            err,
            OracleError::BadFeed {
                fault: FeedFault::RoundMismatch { answered_in_round: 7, round_id: 8 },
                ..
            }
        ));
    }

    #[test]
    fn test_rescale_up() {
        // 8-decimal feed answer of 1.5 -> 18-decimal price
        let price = to_price_decimals(150_000_000, 8).expect("rescale up");
        assert_eq!(price, 1_500_000_000_000_000_000);
    }

    #[test]
    fn test_rescale_down() {
        let price = to_price_decimals(1_500_000_000_000_000_000_000, 21).expect("rescale down");
        assert_eq!(price, 1_500_000_000_000_000_000);
    }

    #[test]
    fn test_rescale_identity() {
        let price = to_price_decimals(42, 18).expect("same scale");
        assert_eq!(price, 42);
    }

    #[test]
    fn test_rescale_overflow() {
        let err = to_price_decimals(u128::MAX / 10, 6).unwrap_err();
        assert!(matches!(err, OracleError::PriceOverflow));
    }
}
