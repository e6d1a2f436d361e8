//! # rampart-types
//!
//! Shared domain types used across the Rampart workspace.
//!
//! The market-operations system prices a protocol token against a reserve
//! asset in a fixed-point decimal scheme and splits its state by band side
//! ([`Side`]). Everything denominated in percent uses basis points with
//! [`ONE_HUNDRED_PERCENT`] = 10,000.

pub mod auth;

use serde::{Deserialize, Serialize};

/// An account or contract address on the host network.
pub type Address = [u8; 20];

/// Identifier of a market on the external auction mechanism.
pub type MarketId = u64;

/// Decimal precision of all oracle prices.
pub const PRICE_DECIMALS: u8 = 18;

/// Fixed-point scale of all oracle prices (`10^PRICE_DECIMALS`).
pub const PRICE_SCALE: u128 = 10u128.pow(PRICE_DECIMALS as u32);

/// Basis-point scale: 10,000 = 100%.
pub const ONE_HUNDRED_PERCENT: u32 = 10_000;

/// Seconds per hour.
pub const SECS_PER_HOUR: u64 = 3600;

/// Seconds per day.
pub const SECS_PER_DAY: u64 = 86_400;

/// Side of the managed price band.
///
/// The low side defends the band with reserve purchases of the token below
/// the moving average; the high side sells the token above it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Below the moving average: the protocol buys its token with reserves.
    Low,
    /// Above the moving average: the protocol sells its token for reserves.
    High,
}

impl Side {
    /// Both sides, in bookkeeping order.
    pub const BOTH: [Side; 2] = [Side::Low, Side::High];

    /// The opposite side of the band.
    pub fn other(self) -> Side {
        match self {
            Side::Low => Side::High,
            Side::High => Side::Low,
        }
    }
}

/// A token identity paired with its decimal precision.
///
/// Amounts of a token are always expressed in base units of `10^-decimals`.
/// Realistic precisions range from 6 to 18 decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Address of the token contract.
    pub address: Address,
    /// Decimal precision of token amounts.
    pub decimals: u8,
}

impl Token {
    /// Create a token descriptor.
    pub fn new(address: Address, decimals: u8) -> Self {
        Self { address, decimals }
    }

    /// One whole token in base units (`10^decimals`).
    pub fn unit(&self) -> u128 {
        10u128.pow(self.decimals as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_scale() {
        assert_eq!(PRICE_SCALE, 1_000_000_000_000_000_000);
    }

    #[test]
    fn test_side_other() {
        assert_eq!(Side::Low.other(), Side::High);
        assert_eq!(Side::High.other(), Side::Low);
    }

    #[test]
    fn test_token_unit() {
        let usdc = Token::new([0x01; 20], 6);
        assert_eq!(usdc.unit(), 1_000_000);

        let dai = Token::new([0x02; 20], 18);
        assert_eq!(dai.unit(), PRICE_SCALE);
    }
}
