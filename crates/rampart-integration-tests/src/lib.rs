//! Integration test crate for the Rampart market operations stack.
//!
//! This crate has no library logic — `src/lib.rs` only provides the shared
//! harness that wires an operator to stub collaborators, and the tests under
//! `tests/` exercise end-to-end heartbeat, swap, auction, and regeneration
//! flows across the workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p rampart-integration-tests
//! ```

use rampart_operator::stub::{StubAuctioneer, StubCallback, StubToken, StubTreasury};
use rampart_operator::{Collaborators, Operator, OperatorConfig};
use rampart_oracle::stub::StubFeed;
use rampart_oracle::{OracleConfig, PriceOracle};
use rampart_range::RangeState;
use rampart_types::auth::{Role, RoleTable};
use rampart_types::{Address, Token, PRICE_SCALE, SECS_PER_HOUR};

/// Holds the admin role.
pub const ADMIN: Address = [0xad; 20];
/// Holds the heartbeat role.
pub const KEEPER: Address = [0x4b; 20];
/// Holds no role.
pub const USER: Address = [0x55; 20];
/// The teller address reported by [`StubAuctioneer`].
pub const TELLER: Address = [0x7e; 20];

/// One heartbeat interval.
pub const HOUR: u64 = SECS_PER_HOUR;

/// The protocol token: 9 decimals.
pub fn token() -> Token {
    Token::new([0x01; 20], 9)
}

/// The reserve token: 18 decimals.
pub fn reserve() -> Token {
    Token::new([0x02; 20], 18)
}

/// Non-default knobs for [`build`].
pub struct Setup {
    /// Cushion spread in basis points.
    pub cushion_spread: u32,
    /// Wall spread in basis points.
    pub wall_spread: u32,
    /// Wall-down threshold factor in basis points.
    pub threshold_factor: u32,
    /// Operator configuration.
    pub config: OperatorConfig,
    /// Initial treasury reserve balance, in reserve base units.
    pub reserves: u128,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            cushion_spread: 2_000,
            wall_spread: 2_500,
            threshold_factor: 1_000,
            config: OperatorConfig::default(),
            reserves: 1_000_000 * reserve().unit(),
        }
    }
}

/// An operator wired to stub collaborators, with cloned handles kept so
/// tests can drive feeds, auction fills, and balances from outside.
pub struct Harness {
    pub operator: Operator<StubFeed, StubFeed>,
    pub auctioneer: StubAuctioneer,
    pub callback: StubCallback,
    pub treasury: StubTreasury,
    pub tokens: StubToken,
    pub token_feed: StubFeed,
    pub reserve_feed: StubFeed,
}

/// Build an uninitialized harness: oracle seeded flat at 10.0 over a
/// 24-hour hourly window, feeds fresh at time zero.
pub fn build(setup: Setup) -> Harness {
    let token_feed = StubFeed::new(18, 5_000_000_000_000_000, 0); // 0.005
    let reserve_feed = StubFeed::new(18, 500_000_000_000_000, 0); // 0.0005
    let mut oracle = PriceOracle::new(
        token_feed.clone(),
        reserve_feed.clone(),
        OracleConfig {
            observation_frequency: HOUR,
            moving_average_duration: 24 * HOUR,
            token_feed_threshold: 24 * HOUR,
            reserve_feed_threshold: 24 * HOUR,
        },
    )
    .expect("valid oracle config");
    oracle
        .initialize(&[10 * PRICE_SCALE; 24], 0)
        .expect("seed oracle");

    let range = RangeState::new(
        setup.cushion_spread,
        setup.wall_spread,
        setup.threshold_factor,
    )
    .expect("valid range factors");

    let auctioneer = StubAuctioneer::new();
    let callback = StubCallback::new();
    let treasury = StubTreasury::new();
    let tokens = StubToken::new();
    treasury.fund(reserve(), setup.reserves);

    let mut auth = RoleTable::new();
    auth.grant(ADMIN, Role::Admin);
    auth.grant(KEEPER, Role::Heartbeat);

    let operator = Operator::new(
        oracle,
        range,
        setup.config,
        token(),
        reserve(),
        Collaborators {
            auctioneer: Box::new(auctioneer.clone()),
            callback: Box::new(callback.clone()),
            treasury: Box::new(treasury.clone()),
            tokens: Box::new(tokens.clone()),
        },
        Box::new(auth),
    )
    .expect("valid operator config");

    Harness {
        operator,
        auctioneer,
        callback,
        treasury,
        tokens,
        token_feed,
        reserve_feed,
    }
}

/// [`build`] with defaults, initialized at time zero.
pub fn standard() -> Harness {
    let mut h = build(Setup::default());
    h.operator.initialize(0, ADMIN).expect("initialize");
    h
}

impl Harness {
    /// Refresh both feeds at `now` so the next heartbeat observes `price`
    /// (18-decimal reserve-per-token).
    pub fn set_price(&self, price: u128, now: u64) {
        // token answer = price * 5e14 / 1e18, with the reserve feed pinned
        // at 0.0005
        let answer = (price / 2_000) as i128;
        self.token_feed.push(answer, now);
        self.reserve_feed.push(500_000_000_000_000, now);
    }

    /// Run hourly heartbeats at a constant price over `(from, to]`.
    pub fn run_hours(&mut self, from_hour: u64, to_hour: u64, price: u128) {
        for hour in (from_hour + 1)..=to_hour {
            let now = hour * HOUR;
            self.set_price(price, now);
            self.operator.operate(now, KEEPER).expect("heartbeat");
        }
    }
}
