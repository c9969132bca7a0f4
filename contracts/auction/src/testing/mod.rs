
use cosmwasm_std::testing::mock_env;
use cosmwasm_std::{Addr, Decimal, Env, Storage, Timestamp};

use ballast::auction::Config;

use crate::state::CONFIG;

pub const START_TIME: u64 = 1_600_000_000;
pub const MAX_DURATION: u64 = 2 * 24 * 60 * 60;
pub const BID_DURATION: u64 = 60 * 60;

pub fn env_at(seconds: u64) -> Env {
    let mut env = mock_env();
    env.block.time = Timestamp::from_seconds(seconds);
    env
}

pub fn save_config(storage: &mut dyn Storage, increment: Decimal) {
    CONFIG
        .save(
            storage,
            &Config {
                owner: Addr::unchecked("owner"),
                max_auction_duration: MAX_DURATION,
                bid_duration: BID_DURATION,
                increment_surplus: increment,
                increment_debt: increment,
                increment_collateral: increment,
            },
        )
        .unwrap();
}
