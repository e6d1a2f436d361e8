//! Integration test: wall swaps across asymmetric token decimals.
//!
//! The protocol token carries 9 decimals against an 18-decimal reserve, so
//! every payout crosses a scale conversion. Covers:
//! 1. A round trip through both walls captures the spread
//! 2. A swap landing exactly on remaining capacity succeeds and takes the
//!    wall down
//! 3. A randomized swap walk conserves treasury and supply accounting

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rampart_integration_tests::{build, reserve, standard, token, Setup, ADMIN, USER};
use rampart_operator::{OperatorError, Treasury};
use rampart_types::Side;

#[test]
fn round_trip_captures_spread() {
    let mut h = standard();
    h.tokens.fund(USER, 1_000 * token().unit());

    // Sell 1,000 tokens into the low wall at 7.50
    let reserve_out = h
        .operator
        .swap(10, USER, token(), 1_000 * token().unit())
        .expect("low wall active");
    assert_eq!(reserve_out, 7_500 * reserve().unit());

    // Buy back through the high wall at 12.50
    let token_out = h
        .operator
        .swap(20, USER, reserve(), reserve_out)
        .expect("high wall active");
    assert_eq!(token_out, 600 * token().unit());

    // The treasury keeps the spread: net zero reserve movement, 400 fewer
    // tokens outstanding
    assert_eq!(
        h.treasury.reserve_balance(reserve()),
        1_000_000 * reserve().unit()
    );
    assert_eq!(h.tokens.balance_of(USER), 600 * token().unit());
    assert_eq!(h.tokens.total_supply(), 600 * token().unit());
}

#[test]
fn exact_capacity_swap_takes_wall_down() {
    // Equal 20% spreads put the low wall at 8.00, so 12,500 tokens drain
    // the 100,000-reserve capacity exactly
    let mut h = build(Setup {
        cushion_spread: 2_000,
        wall_spread: 2_000,
        ..Setup::default()
    });
    h.operator.initialize(0, ADMIN).expect("initialize");
    h.tokens.fund(USER, 13_000 * token().unit());

    let out = h
        .operator
        .swap(10, USER, token(), 12_500 * token().unit())
        .expect("payout equals capacity");
    assert_eq!(out, 100_000 * reserve().unit());

    let low = h.operator.range().side(Side::Low);
    assert_eq!(low.capacity, 0);
    assert!(!low.active);

    let err = h
        .operator
        .swap(11, USER, token(), token().unit())
        .unwrap_err();
    assert!(matches!(err, OperatorError::WallDown { side: Side::Low }));
}

#[test]
fn random_swap_walk_conserves_accounting() {
    let mut h = standard();
    h.tokens.fund(USER, 100_000 * token().unit());
    let funded_tokens = h.tokens.total_supply();
    let initial_reserves = h.treasury.reserve_balance(reserve());
    let low_capacity = h.operator.range().side(Side::Low).capacity;
    let high_capacity = h.operator.range().side(Side::High).capacity;

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut reserve_paid_out = 0u128;
    let mut reserve_taken_in = 0u128;
    let mut tokens_burned = 0u128;
    let mut tokens_minted = 0u128;

    for step in 0..100u64 {
        if rng.gen_bool(0.5) {
            let amount = rng.gen_range(1..=40) * token().unit();
            let out = h
                .operator
                .swap(step, USER, token(), amount)
                .expect("low wall stays above threshold");
            tokens_burned += amount;
            reserve_paid_out += out;
        } else {
            let amount = rng.gen_range(1..=400) * reserve().unit();
            let out = h
                .operator
                .swap(step, USER, reserve(), amount)
                .expect("high wall stays above threshold");
            reserve_taken_in += amount;
            tokens_minted += out;
        }
    }

    // Both walls survived the walk
    assert!(h.operator.range().side(Side::Low).active);
    assert!(h.operator.range().side(Side::High).active);

    // Capacity consumed exactly matches payouts
    assert_eq!(
        h.operator.range().side(Side::Low).capacity,
        low_capacity - reserve_paid_out
    );
    assert_eq!(
        h.operator.range().side(Side::High).capacity,
        high_capacity - tokens_minted
    );

    // Treasury and supply reconcile against the running totals
    assert_eq!(
        h.treasury.reserve_balance(reserve()),
        initial_reserves + reserve_taken_in - reserve_paid_out
    );
    assert_eq!(
        h.tokens.total_supply(),
        funded_tokens - tokens_burned + tokens_minted
    );
}
