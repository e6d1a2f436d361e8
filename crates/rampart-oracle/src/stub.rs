//! In-memory feed double for tests and simulation.
//!
//! [`StubFeed`] shares its round state behind an `Rc`, so a cloned handle
//! kept by a test can push new answers while the oracle owns the feed.

use std::cell::RefCell;
use std::rc::Rc;

use crate::feed::{PriceFeed, RoundData};
use crate::Result;

/// A settable price feed.
#[derive(Debug, Clone)]
pub struct StubFeed {
    decimals: u8,
    round: Rc<RefCell<RoundData>>,
}

impl StubFeed {
    /// Create a feed reporting `answer` at `decimals` precision, fresh as of
    /// `updated_at`, in round 1.
    pub fn new(decimals: u8, answer: i128, updated_at: u64) -> Self {
        Self {
            decimals,
            round: Rc::new(RefCell::new(RoundData {
                round_id: 1,
                answer,
                updated_at,
                answered_in_round: 1,
            })),
        }
    }

    /// Replace the answer, keeping timestamp and round.
    pub fn set_answer(&self, answer: i128) {
        self.round.borrow_mut().answer = answer;
    }

    /// Refresh the reading timestamp.
    pub fn set_updated_at(&self, updated_at: u64) {
        self.round.borrow_mut().updated_at = updated_at;
    }

    /// Publish a fresh answer in a new round.
    pub fn push(&self, answer: i128, updated_at: u64) {
        let mut round = self.round.borrow_mut();
        round.round_id += 1;
        round.answered_in_round = round.round_id;
        round.answer = answer;
        round.updated_at = updated_at;
    }

    /// Replace the whole round, for exercising round-consistency checks.
    pub fn set_round(&self, round: RoundData) {
        *self.round.borrow_mut() = round;
    }
}

impl PriceFeed for StubFeed {
    fn latest_round_data(&self) -> Result<RoundData> {
        Ok(self.round.borrow().clone())
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_advances_round() {
        let feed = StubFeed::new(8, 100, 0);
        feed.push(200, 50);

        let round = feed.latest_round_data().expect("stub always answers");
        assert_eq!(round.round_id, 2);
        assert_eq!(round.answered_in_round, 2);
        assert_eq!(round.answer, 200);
        assert_eq!(round.updated_at, 50);
    }

    #[test]
    fn test_handles_share_state() {
        let feed = StubFeed::new(8, 100, 0);
        let handle = feed.clone();
        handle.set_answer(300);

        let round = feed.latest_round_data().expect("stub always answers");
        assert_eq!(round.answer, 300);
    }
}
