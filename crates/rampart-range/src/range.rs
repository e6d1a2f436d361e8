//! Band prices, capacity, and wall/cushion bookkeeping.
//!
//! Prices derive from the oracle's moving average and the configured
//! spreads:
//!
//! ```text
//! wall_high    = ma * (10000 + wall_spread)    / 10000
//! cushion_high = ma * (10000 + cushion_spread) / 10000
//! cushion_low  = ma * (10000 - cushion_spread) / 10000
//! wall_low     = ma * (10000 - wall_spread)    / 10000
//! ```
//!
//! Capacity is consumed by wall swaps and by cushion auction fills; a wall
//! is considered down once capacity falls below the threshold recorded at
//! the last regeneration (`full_capacity * threshold_factor / 10000`).

use rampart_types::{MarketId, Side, ONE_HUNDRED_PERCENT};
use serde::{Deserialize, Serialize};

use crate::{RangeError, Result};

/// Minimum configurable spread or threshold factor (1%).
pub const MIN_SPREAD: u32 = 100;

/// Maximum configurable spread or threshold factor (100%).
pub const MAX_SPREAD: u32 = ONE_HUNDRED_PERCENT;

/// Whether a wall is still standing after a capacity update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WallStatus {
    /// Capacity remains above the threshold.
    Up,
    /// Capacity fell below the threshold; the wall deactivated.
    Down,
}

/// State of one side of the band.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeSide {
    /// Hard swap price defending the outer edge of the band.
    pub wall_price: u128,
    /// Auction trigger price inside the wall.
    pub cushion_price: u128,
    /// Remaining capacity in this side's payout denomination.
    pub capacity: u128,
    /// Capacity level below which the wall is considered down.
    pub threshold: u128,
    /// Whether the wall is accepting swaps.
    pub active: bool,
    /// Open cushion auction, if any.
    pub market: Option<MarketId>,
    /// Auction capacity snapshot taken at the last reconciliation, used to
    /// compute consumption deltas between heartbeats.
    pub last_market_capacity: u128,
    /// Timestamp of the last activation or deactivation.
    pub last_active: u64,
}

/// Wall/cushion prices and capacity for both sides of the band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeState {
    low: RangeSide,
    high: RangeSide,
    cushion_spread: u32,
    wall_spread: u32,
    threshold_factor: u32,
}

fn scale_by(value: u128, factor: u128, what: &'static str) -> Result<u128> {
    let scaled = value.checked_mul(factor).ok_or(RangeError::Overflow(what))?;
    Ok(scaled / ONE_HUNDRED_PERCENT as u128)
}

fn check_factor(name: &str, value: u32) -> Result<()> {
    if !(MIN_SPREAD..=MAX_SPREAD).contains(&value) {
        return Err(RangeError::InvalidParams(format!(
            "{name} {value} outside [{MIN_SPREAD}, {MAX_SPREAD}]"
        )));
    }
    Ok(())
}

impl RangeState {
    /// Create a zeroed range with the given spreads and threshold factor,
    /// all in basis points.
    ///
    /// # Errors
    ///
    /// - [`RangeError::InvalidParams`] if a factor is outside
    ///   `[MIN_SPREAD, MAX_SPREAD]` or the cushion spread exceeds the wall
    ///   spread
    pub fn new(cushion_spread: u32, wall_spread: u32, threshold_factor: u32) -> Result<Self> {
        check_spread_pair(cushion_spread, wall_spread)?;
        check_factor("threshold factor", threshold_factor)?;
        Ok(Self {
            low: RangeSide::default(),
            high: RangeSide::default(),
            cushion_spread,
            wall_spread,
            threshold_factor,
        })
    }

    /// State of one side.
    pub fn side(&self, side: Side) -> &RangeSide {
        match side {
            Side::Low => &self.low,
            Side::High => &self.high,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut RangeSide {
        match side {
            Side::Low => &mut self.low,
            Side::High => &mut self.high,
        }
    }

    /// Configured cushion spread in basis points.
    pub fn cushion_spread(&self) -> u32 {
        self.cushion_spread
    }

    /// Configured wall spread in basis points.
    pub fn wall_spread(&self) -> u32 {
        self.wall_spread
    }

    /// Configured threshold factor in basis points.
    pub fn threshold_factor(&self) -> u32 {
        self.threshold_factor
    }

    /// Recompute wall and cushion prices from the moving average.
    ///
    /// All four prices are computed before any is written, so a rejected
    /// update leaves the band untouched.
    ///
    /// # Errors
    ///
    /// - [`RangeError::Overflow`] if a spread-widened price exceeds `u128`
    pub fn update_prices(&mut self, moving_average: u128) -> Result<()> {
        let pct = ONE_HUNDRED_PERCENT as u128;
        let wall = self.wall_spread as u128;
        let cushion = self.cushion_spread as u128;

        let wall_high = scale_by(moving_average, pct + wall, "high wall price")?;
        let cushion_high = scale_by(moving_average, pct + cushion, "high cushion price")?;
        let cushion_low = scale_by(moving_average, pct - cushion, "low cushion price")?;
        let wall_low = scale_by(moving_average, pct - wall, "low wall price")?;

        self.high.wall_price = wall_high;
        self.high.cushion_price = cushion_high;
        self.low.cushion_price = cushion_low;
        self.low.wall_price = wall_low;

        tracing::trace!(
            moving_average,
            wall_high = self.high.wall_price,
            cushion_high = self.high.cushion_price,
            cushion_low = self.low.cushion_price,
            wall_low = self.low.wall_price,
            "range: prices updated"
        );
        Ok(())
    }

    /// Set a side's capacity, deactivating the wall once capacity falls
    /// below the side's threshold.
    pub fn update_capacity(&mut self, side: Side, capacity: u128, now: u64) -> WallStatus {
        let s = self.side_mut(side);
        s.capacity = capacity;
        if s.active && capacity < s.threshold {
            s.active = false;
            s.last_active = now;
            tracing::info!(?side, capacity, threshold = s.threshold, "range: wall down");
            return WallStatus::Down;
        }
        WallStatus::Up
    }

    /// Record or clear a side's cushion market.
    ///
    /// Clearing an already-clear market is a no-op, so deactivating an
    /// inactive cushion never errors.
    pub fn update_market(&mut self, side: Side, market: Option<MarketId>, market_capacity: u128) {
        let s = self.side_mut(side);
        s.market = market;
        s.last_market_capacity = market_capacity;
        match market {
            Some(id) => tracing::info!(?side, market = id, market_capacity, "range: cushion up"),
            None => tracing::debug!(?side, "range: cushion cleared"),
        }
    }

    /// Refresh the auction-capacity snapshot after a reconciliation pass.
    pub fn record_market_capacity(&mut self, side: Side, market_capacity: u128) {
        self.side_mut(side).last_market_capacity = market_capacity;
    }

    /// Clear and return the side's open market so the caller can close it.
    pub fn take_down_market(&mut self, side: Side) -> Option<MarketId> {
        let s = self.side_mut(side);
        let market = s.market.take();
        s.last_market_capacity = 0;
        market
    }

    /// Restore a side to full capacity and reactivate its wall.
    ///
    /// The threshold is recomputed from the freshly derived full capacity.
    /// Any recorded market is cleared; the caller is responsible for closing
    /// the live auction it referred to.
    ///
    /// # Errors
    ///
    /// - [`RangeError::Overflow`] if the threshold computation overflows;
    ///   the side is left untouched
    pub fn regenerate(&mut self, side: Side, full_capacity: u128, now: u64) -> Result<()> {
        let threshold = scale_by(full_capacity, self.threshold_factor as u128, "regeneration threshold")?;
        let s = self.side_mut(side);
        s.capacity = full_capacity;
        s.threshold = threshold;
        s.active = true;
        s.last_active = now;
        s.market = None;
        s.last_market_capacity = 0;
        tracing::info!(?side, capacity = full_capacity, threshold, "range: wall regenerated");
        Ok(())
    }

    /// Deactivate a side's wall outright (emergency path), returning any
    /// open market for the caller to close.
    pub fn deactivate(&mut self, side: Side, now: u64) -> Option<MarketId> {
        let s = self.side_mut(side);
        s.active = false;
        s.last_active = now;
        s.last_market_capacity = 0;
        let market = s.market.take();
        tracing::warn!(?side, market = ?market, "range: wall deactivated");
        market
    }

    /// Change both spreads.
    ///
    /// # Errors
    ///
    /// - [`RangeError::InvalidParams`] on out-of-bounds or inverted spreads
    pub fn set_spreads(&mut self, cushion_spread: u32, wall_spread: u32) -> Result<()> {
        check_spread_pair(cushion_spread, wall_spread)?;
        self.cushion_spread = cushion_spread;
        self.wall_spread = wall_spread;
        Ok(())
    }

    /// Change the threshold factor. Takes effect at the next regeneration.
    ///
    /// # Errors
    ///
    /// - [`RangeError::InvalidParams`] on an out-of-bounds factor
    pub fn set_threshold_factor(&mut self, threshold_factor: u32) -> Result<()> {
        check_factor("threshold factor", threshold_factor)?;
        self.threshold_factor = threshold_factor;
        Ok(())
    }
}

fn check_spread_pair(cushion_spread: u32, wall_spread: u32) -> Result<()> {
    check_factor("cushion spread", cushion_spread)?;
    check_factor("wall spread", wall_spread)?;
    if cushion_spread > wall_spread {
        return Err(RangeError::InvalidParams(format!(
            "cushion spread {cushion_spread} exceeds wall spread {wall_spread}"
        )));
    }
    Ok(())
}
