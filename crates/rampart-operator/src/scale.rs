//! Fixed-point scale conversion with signed exponents.
//!
//! The oracle quotes every price at [`PRICE_DECIMALS`]; the external auction
//! mechanism wants prices at a scale derived from the payout and quote token
//! decimals *and* from the magnitude of the price itself:
//!
//! ```text
//! price_decimals   = digits(price) - PRICE_DECIMALS        (may be negative)
//! scale_adjustment = payout_decimals - quote_decimals + price_decimals / 2
//! auction_scale    = 10^(18 + scale_adjustment
//!                         + quote_decimals - payout_decimals
//!                         - price_decimals)
//! oracle_scale     = 10^(PRICE_DECIMALS - price_decimals)
//! formatted        = price * auction_scale / oracle_scale
//! ```
//!
//! The two scales cancel down to a single signed net exponent
//! (`scale_adjustment + quote_decimals - payout_decimals`), which is how the
//! conversion is applied: no intermediate power of ten ever exceeds the
//! 128-bit range for realistic inputs. The relative exponent is negative
//! whenever the raw price carries fewer digits than the oracle scale, so
//! every step here is signed; exponents that leave the representable range
//! surface as errors instead of wrapping.

use rampart_types::PRICE_DECIMALS;

use crate::{OperatorError, Result};

/// Highest power of ten representable in a `u128`.
const MAX_POW10: i16 = 38;

/// `10^exp`, checked against the 128-bit range.
///
/// # Errors
///
/// - [`OperatorError::ScaleOutOfRange`] for `exp` outside `[0, 38]`
pub fn pow10(exp: i16) -> Result<u128> {
    if !(0..=MAX_POW10).contains(&exp) {
        return Err(OperatorError::ScaleOutOfRange(exp));
    }
    Ok(10u128.pow(exp as u32))
}

/// `a * b / c` with full-precision fallback when the product overflows.
///
/// The fallback splits `a` into `(a / c) * c + a % c`, which keeps the floor
/// semantics exact as long as the partial products fit.
///
/// # Errors
///
/// - [`OperatorError::ZeroPrice`] if `c` is zero
/// - [`OperatorError::AmountOverflow`] if the result exceeds 128 bits
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(OperatorError::ZeroPrice);
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / c);
    }
    let quotient = a / c;
    let remainder = a % c;
    let whole = quotient.checked_mul(b).ok_or(OperatorError::AmountOverflow)?;
    let partial = remainder
        .checked_mul(b)
        .ok_or(OperatorError::AmountOverflow)?
        / c;
    whole.checked_add(partial).ok_or(OperatorError::AmountOverflow)
}

/// Apply a signed power of ten to a value.
///
/// # Errors
///
/// - [`OperatorError::ScaleOutOfRange`] for `|exp| > 38`
/// - [`OperatorError::AmountOverflow`] on 128-bit overflow
pub fn apply_pow10(value: u128, exp: i16) -> Result<u128> {
    if exp >= 0 {
        value
            .checked_mul(pow10(exp)?)
            .ok_or(OperatorError::AmountOverflow)
    } else {
        Ok(value / pow10(-exp)?)
    }
}

/// Number of decimal digits a raw price implies, relative to the oracle
/// scale.
///
/// Counts the base-10 magnitude of `price` and subtracts [`PRICE_DECIMALS`].
/// A price of `12.5` at 18 decimals has 19 digits of magnitude, so the
/// result is `1`; a price of `0.005` yields `-3`.
pub fn price_decimals(price: u128) -> i8 {
    let mut p = price;
    let mut digits: i8 = 0;
    while p >= 10 {
        p /= 10;
        digits += 1;
    }
    digits - PRICE_DECIMALS as i8
}

/// Scale adjustment to parameterize an auction for the given token pair.
///
/// Signed on purpose: the sign flips with the token pair ordering and with
/// the side of the oracle scale the price falls on. The division truncates
/// toward zero.
pub fn scale_adjustment(payout_decimals: u8, quote_decimals: u8, price_decimals: i8) -> i8 {
    payout_decimals as i8 - quote_decimals as i8 + price_decimals / 2
}

/// Convert an oracle-scale price into the auction mechanism's scale.
///
/// Applies the net of the auction and oracle scales,
/// `10^(scale_adjustment + quote_decimals - payout_decimals)`.
///
/// # Errors
///
/// - [`OperatorError::ScaleOutOfRange`] if the net exponent leaves
///   `[-38, 38]`
/// - [`OperatorError::AmountOverflow`] on 128-bit overflow
pub fn format_price(
    price: u128,
    payout_decimals: u8,
    quote_decimals: u8,
    price_decimals: i8,
) -> Result<u128> {
    let adjustment = scale_adjustment(payout_decimals, quote_decimals, price_decimals) as i16;
    let net = adjustment + quote_decimals as i16 - payout_decimals as i16;
    apply_pow10(price, net)
}

/// Invert an oracle-scale price (`10^(2 * PRICE_DECIMALS) / price`).
///
/// Low-side cushion auctions quote token-per-reserve, the reciprocal of the
/// oracle's reserve-per-token price.
///
/// # Errors
///
/// - [`OperatorError::ZeroPrice`] for a zero price
pub fn invert_price(price: u128) -> Result<u128> {
    if price == 0 {
        return Err(OperatorError::ZeroPrice);
    }
    Ok(10u128.pow(2 * PRICE_DECIMALS as u32) / price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_types::PRICE_SCALE;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Apply a signed power of ten by repeated multiply/divide, for checking
    /// the production helpers against an independent computation.
    fn naive_pow10_apply(value: u128, exp: i16) -> u128 {
        let mut v = value;
        if exp >= 0 {
            for _ in 0..exp {
                v *= 10;
            }
        } else {
            for _ in 0..(-exp) {
                v /= 10;
            }
        }
        v
    }

    #[test]
    fn test_pow10_bounds() {
        assert_eq!(pow10(0).expect("10^0"), 1);
        assert_eq!(pow10(38).expect("10^38"), 10u128.pow(38));
        assert!(matches!(pow10(39), Err(OperatorError::ScaleOutOfRange(39))));
        assert!(matches!(pow10(-1), Err(OperatorError::ScaleOutOfRange(-1))));
    }

    #[test]
    fn test_apply_pow10_signed() {
        assert_eq!(apply_pow10(123, 3).expect("up"), 123_000);
        assert_eq!(apply_pow10(123_456, -3).expect("down"), 123);
        assert_eq!(apply_pow10(7, 0).expect("identity"), 7);
        assert!(matches!(
            apply_pow10(u128::MAX, 1),
            Err(OperatorError::AmountOverflow)
        ));
    }

    #[test]
    fn test_mul_div_exact() {
        assert_eq!(mul_div(6, 7, 3).expect("small"), 14);
        assert_eq!(mul_div(0, u128::MAX, 1).expect("zero"), 0);
    }

    #[test]
    fn test_mul_div_survives_product_overflow() {
        // a * b overflows 128 bits but the result fits
        let a = 10u128.pow(30);
        let b = 10u128.pow(20);
        let c = 10u128.pow(25);
        assert_eq!(mul_div(a, b, c).expect("fallback"), 10u128.pow(25));
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        assert!(matches!(mul_div(1, 1, 0), Err(OperatorError::ZeroPrice)));
    }

    #[test]
    fn test_price_decimals_positive_and_negative() {
        // 12.5 at 18 decimals: 19 digits of magnitude
        assert_eq!(price_decimals(12_500_000_000_000_000_000), 1);
        // 1.0 exactly
        assert_eq!(price_decimals(PRICE_SCALE), 0);
        // 0.005: 15 digits of magnitude
        assert_eq!(price_decimals(5_000_000_000_000_000), -3);
        // Degenerate zero price
        assert_eq!(price_decimals(0), -(PRICE_DECIMALS as i8));
    }

    #[test]
    fn test_scale_adjustment_sign_follows_pair() {
        // token (9 decimals) payout vs reserve (18) quote
        assert_eq!(scale_adjustment(9, 18, 0), -9);
        // reversed pair flips the sign
        assert_eq!(scale_adjustment(18, 9, 0), 9);
        // price magnitude shifts it, truncating toward zero
        assert_eq!(scale_adjustment(9, 18, 3), -8);
        assert_eq!(scale_adjustment(9, 18, -3), -10);
    }

    #[test]
    fn test_format_price_net_is_half_price_decimals() {
        // The token decimals cancel: the conversion nets out to
        // 10^(price_decimals / 2) for every payout/quote combination.
        for payout in 6..=18u8 {
            for quote in 6..=18u8 {
                let price = 12_500_000_000_000_000_000u128; // pd = 1
                let formatted =
                    format_price(price, payout, quote, 1).expect("in-range exponents");
                assert_eq!(formatted, price, "payout {payout} quote {quote}");
            }
        }
    }

    #[test]
    fn test_format_price_digit_sweep() {
        // Prices from far below to far above the oracle scale
        for magnitude in 4..=30u32 {
            let price = 10u128.pow(magnitude);
            let pd = price_decimals(price);
            assert_eq!(pd as i32, magnitude as i32 - 18);

            let formatted = format_price(price, 9, 18, pd).expect("in-range exponents");
            assert_eq!(
                formatted,
                naive_pow10_apply(price, (pd / 2) as i16),
                "magnitude {magnitude}"
            );
        }
    }

    #[test]
    fn test_format_price_randomized_decimal_combinations() {
        let mut rng = StdRng::seed_from_u64(0x5ca1e);
        for _ in 0..500 {
            let payout = rng.gen_range(6..=18u8);
            let quote = rng.gen_range(6..=18u8);
            // Random price between 0.000001 and ~1e6 at oracle scale
            let price = rng.gen_range(10u128.pow(12)..10u128.pow(24));
            let pd = price_decimals(price);

            let formatted = format_price(price, payout, quote, pd)
                .expect("realistic prices stay in range");
            assert_eq!(
                formatted,
                naive_pow10_apply(price, (pd / 2) as i16),
                "payout {payout} quote {quote} price {price}"
            );
        }
    }

    #[test]
    fn test_invert_price() {
        // 12.5 inverts to 0.08
        let inverted = invert_price(12_500_000_000_000_000_000).expect("nonzero");
        assert_eq!(inverted, 80_000_000_000_000_000);
        // Inverting twice returns the original for exact divisors
        assert_eq!(invert_price(inverted).expect("nonzero"), 12_500_000_000_000_000_000);
    }

    #[test]
    fn test_invert_zero_price_rejected() {
        assert!(matches!(invert_price(0), Err(OperatorError::ZeroPrice)));
    }
}
