//! Observation ring buffer and spot-price derivation.
//!
//! The oracle records one spot price per observation frequency into a ring
//! buffer of `moving_average_duration / observation_frequency` slots and
//! keeps a running cumulative sum, so the moving average is always:
//!
//! ```text
//! moving_average = cumulative / num_observations
//! ```
//!
//! The buffer must be fully seeded before the oracle is usable; changing the
//! duration or frequency deliberately invalidates it, forcing a re-seed,
//! because a partially populated buffer would corrupt the average.

use rampart_types::PRICE_SCALE;

use crate::feed::{self, PriceFeed};
use crate::{OracleError, Result};

/// Oracle timing and staleness parameters.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OracleConfig {
    /// Seconds between accepted observations.
    pub observation_frequency: u64,
    /// Length of the moving-average window in seconds. Must be a nonzero
    /// multiple of `observation_frequency`.
    pub moving_average_duration: u64,
    /// Maximum acceptable age of a token-feed reading in seconds.
    pub token_feed_threshold: u64,
    /// Maximum acceptable age of a reserve-feed reading in seconds.
    pub reserve_feed_threshold: u64,
}

impl OracleConfig {
    fn validate(&self) -> Result<()> {
        check_window(self.moving_average_duration, self.observation_frequency)
    }
}

fn check_window(duration: u64, frequency: u64) -> Result<()> {
    if frequency == 0 || duration == 0 {
        return Err(OracleError::InvalidParams(
            "duration and frequency must be nonzero".into(),
        ));
    }
    if duration % frequency != 0 {
        return Err(OracleError::InvalidParams(format!(
            "duration {duration} not divisible by frequency {frequency}"
        )));
    }
    Ok(())
}

/// Moving-average price oracle over two external feeds.
#[derive(Debug)]
pub struct PriceOracle<T: PriceFeed, R: PriceFeed> {
    token_feed: T,
    reserve_feed: R,
    config: OracleConfig,
    observations: Vec<u128>,
    cumulative: u128,
    next_obs_index: usize,
    last_observation_time: u64,
    initialized: bool,
}

impl<T: PriceFeed, R: PriceFeed> PriceOracle<T, R> {
    /// Create an unseeded oracle.
    ///
    /// # Errors
    ///
    /// - [`OracleError::InvalidParams`] if the window parameters are zero or
    ///   the duration is not a multiple of the frequency
    pub fn new(token_feed: T, reserve_feed: R, config: OracleConfig) -> Result<Self> {
        config.validate()?;
        let slots = (config.moving_average_duration / config.observation_frequency) as usize;
        Ok(Self {
            token_feed,
            reserve_feed,
            config,
            observations: vec![0; slots],
            cumulative: 0,
            next_obs_index: 0,
            last_observation_time: 0,
            initialized: false,
        })
    }

    /// Number of observations in the moving-average window.
    pub fn num_observations(&self) -> usize {
        self.observations.len()
    }

    /// Whether the observation buffer has been seeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Seconds between accepted observations.
    pub fn observation_frequency(&self) -> u64 {
        self.config.observation_frequency
    }

    /// Timestamp of the most recently accepted observation.
    pub fn last_observation_time(&self) -> u64 {
        self.last_observation_time
    }

    /// Compute the live token-in-reserve spot price at [`rampart_types::PRICE_DECIMALS`].
    ///
    /// Reads and validates both feeds; both readings are rescaled to the
    /// oracle's decimal precision before dividing.
    ///
    /// # Errors
    ///
    /// - [`OracleError::BadFeed`] if either feed is stale, non-positive, or
    ///   round-inconsistent. This must propagate as a hard failure: trading
    ///   on stale data is unsafe.
    pub fn current_price(&self, now: u64) -> Result<u128> {
        let token_round = self.token_feed.latest_round_data()?;
        let token_price = feed::validate_round(
            "token",
            &token_round,
            now,
            self.config.token_feed_threshold,
        )?;
        let token_price = feed::to_price_decimals(token_price, self.token_feed.decimals())?;

        let reserve_round = self.reserve_feed.latest_round_data()?;
        let reserve_price = feed::validate_round(
            "reserve",
            &reserve_round,
            now,
            self.config.reserve_feed_threshold,
        )?;
        let reserve_price = feed::to_price_decimals(reserve_price, self.reserve_feed.decimals())?;

        // reserve_price > 0 after validation, so the division is safe
        token_price
            .checked_mul(PRICE_SCALE)
            .map(|scaled| scaled / reserve_price)
            .ok_or(OracleError::PriceOverflow)
    }

    /// Seed the observation buffer.
    ///
    /// `seed` must hold exactly [`Self::num_observations`] prices, oldest
    /// first; `last_observation_time` is the timestamp of the newest.
    ///
    /// # Errors
    ///
    /// - [`OracleError::AlreadyInitialized`] on a second call
    /// - [`OracleError::InvalidSeed`] on a length mismatch
    /// - [`OracleError::PriceOverflow`] if the seed sum exceeds 128 bits
    pub fn initialize(&mut self, seed: &[u128], last_observation_time: u64) -> Result<()> {
        if self.initialized {
            return Err(OracleError::AlreadyInitialized);
        }
        if seed.len() != self.observations.len() {
            return Err(OracleError::InvalidSeed {
                required: self.observations.len(),
                provided: seed.len(),
            });
        }

        let mut cumulative: u128 = 0;
        for price in seed {
            cumulative = cumulative
                .checked_add(*price)
                .ok_or(OracleError::PriceOverflow)?;
        }

        self.observations.copy_from_slice(seed);
        self.cumulative = cumulative;
        self.next_obs_index = 0;
        self.last_observation_time = last_observation_time;
        self.initialized = true;

        tracing::info!(
            observations = self.observations.len(),
            moving_average = cumulative / self.observations.len() as u128,
            "oracle: seeded"
        );
        Ok(())
    }

    /// Record one observation and return the new moving average.
    ///
    /// Reads the spot price, swaps it into the oldest slot (subtracting the
    /// displaced observation from the cumulative sum), and advances the slot
    /// pointer modulo the buffer length. Nothing is committed if the feed
    /// read fails.
    ///
    /// # Errors
    ///
    /// - [`OracleError::NotInitialized`] before seeding
    /// - [`OracleError::UpdateTooSoon`] if less than one observation
    ///   frequency has elapsed
    /// - [`OracleError::BadFeed`] on a bad feed reading (fatal, no commit)
    pub fn update_moving_average(&mut self, now: u64) -> Result<u128> {
        if !self.initialized {
            return Err(OracleError::NotInitialized);
        }
        let due = self
            .last_observation_time
            .saturating_add(self.config.observation_frequency);
        if now < due {
            return Err(OracleError::UpdateTooSoon {
                last: self.last_observation_time,
                now,
                frequency: self.config.observation_frequency,
            });
        }

        let price = self.current_price(now)?;

        let displaced = self.observations[self.next_obs_index];
        self.cumulative = self
            .cumulative
            .checked_sub(displaced)
            .and_then(|partial| partial.checked_add(price))
            .ok_or(OracleError::PriceOverflow)?;
        self.observations[self.next_obs_index] = price;
        self.next_obs_index = (self.next_obs_index + 1) % self.observations.len();
        self.last_observation_time = now;

        let moving_average = self.cumulative / self.observations.len() as u128;
        tracing::debug!(price, moving_average, "oracle: observation recorded");
        Ok(moving_average)
    }

    /// The most recently written observation.
    ///
    /// Intentionally *not* the live spot price: the control loop reconciles
    /// against the last recorded observation for consistency within one
    /// heartbeat.
    ///
    /// # Errors
    ///
    /// - [`OracleError::NotInitialized`] before seeding
    pub fn last_price(&self) -> Result<u128> {
        if !self.initialized {
            return Err(OracleError::NotInitialized);
        }
        let last = (self.next_obs_index + self.observations.len() - 1) % self.observations.len();
        Ok(self.observations[last])
    }

    /// The current moving average (`cumulative / num_observations`, integer
    /// division).
    ///
    /// # Errors
    ///
    /// - [`OracleError::NotInitialized`] before seeding
    pub fn moving_average(&self) -> Result<u128> {
        if !self.initialized {
            return Err(OracleError::NotInitialized);
        }
        Ok(self.cumulative / self.observations.len() as u128)
    }

    /// Change the moving-average window length.
    ///
    /// Clears the buffer and drops the initialized flag: an in-place resize
    /// over a partially populated buffer would corrupt the average.
    ///
    /// # Errors
    ///
    /// - [`OracleError::InvalidParams`] if the new duration is zero or not a
    ///   multiple of the observation frequency
    pub fn change_moving_average_duration(&mut self, duration: u64) -> Result<()> {
        check_window(duration, self.config.observation_frequency)?;
        self.config.moving_average_duration = duration;
        self.invalidate();
        Ok(())
    }

    /// Change the observation frequency.
    ///
    /// Clears the buffer and drops the initialized flag, as with
    /// [`Self::change_moving_average_duration`].
    ///
    /// # Errors
    ///
    /// - [`OracleError::InvalidParams`] if the frequency is zero or does not
    ///   divide the moving-average duration
    pub fn change_observation_frequency(&mut self, frequency: u64) -> Result<()> {
        check_window(self.config.moving_average_duration, frequency)?;
        self.config.observation_frequency = frequency;
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        let slots =
            (self.config.moving_average_duration / self.config.observation_frequency) as usize;
        self.observations = vec![0; slots];
        self.cumulative = 0;
        self.next_obs_index = 0;
        self.initialized = false;
        tracing::warn!(
            observations = slots,
            "oracle: window changed, buffer invalidated, re-seed required"
        );
    }

    /// Shared access to the token feed.
    pub fn token_feed(&self) -> &T {
        &self.token_feed
    }

    /// Shared access to the reserve feed.
    pub fn reserve_feed(&self) -> &R {
        &self.reserve_feed
    }
}
