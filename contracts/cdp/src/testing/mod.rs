mod contract_tests;
mod interest_tests;
mod store_tests;

use std::str::FromStr;

use cosmwasm_std::testing::{mock_env, mock_info, MockStorage};
use cosmwasm_std::{coin, Coin, Decimal, Env, Response, Timestamp, Uint128};

use auction::contract as auction_contract;
use ballast::auction::InstantiateMsg as AuctionInstantiateMsg;
use ballast::cdp::{ExecuteMsg, InstantiateMsg};
use ballast::host::{HostDeps, HostDepsMut};
use ballast::testing::{MockLedger, MockOracle};
use ballast::types::{CollateralParam, DebtParam};

use crate::contract::{begin_blocker, execute, instantiate};
use crate::ContractError;

pub const START_TIME: u64 = 1_600_000_000;
pub const ONE_YEAR: u64 = 31_536_000;
pub const MAX_AUCTION_DURATION: u64 = 2 * 24 * 60 * 60;

pub const BNB_A: &str = "bnb-a";
pub const SPOT_MARKET: &str = "bnb:usd";
pub const LIQUIDATION_MARKET: &str = "bnb:usd:30";

pub fn env_at(seconds: u64) -> Env {
    let mut env = mock_env();
    env.block.time = Timestamp::from_seconds(seconds);
    env
}

pub fn collateral_param() -> CollateralParam {
    CollateralParam {
        denom: String::from("bnb"),
        collateral_type: String::from(BNB_A),
        liquidation_ratio: Decimal::percent(200),
        debt_limit: coin(2_000_000_000_000, "usdx"),
        stability_fee: Decimal::from_str("1.0000000016").unwrap(),
        auction_size: Uint128::new(100_000_000),
        liquidation_penalty: Decimal::percent(5),
        spot_market_id: String::from(SPOT_MARKET),
        liquidation_market_id: String::from(LIQUIDATION_MARKET),
        keeper_reward_percentage: Decimal::percent(1),
        check_collateralization_index_count: 10,
        conversion_factor: 6,
    }
}

pub fn instantiate_msg() -> InstantiateMsg {
    InstantiateMsg {
        owner: None,
        collateral_params: vec![collateral_param()],
        debt_param: DebtParam {
            denom: String::from("usdx"),
            reference_asset: String::from("usd"),
            conversion_factor: 6,
            debt_floor: Uint128::new(10_000_000),
            savings_rate: Decimal::percent(50),
        },
        global_debt_limit: coin(2_000_000_000_000, "usdx"),
        surplus_auction_threshold: Uint128::new(500_000_000),
        surplus_auction_lot: Uint128::new(10_000_000_000),
        debt_auction_threshold: Uint128::new(100_000_000),
        debt_auction_lot: Uint128::new(10_000_000),
        debt_denom: None,
        gov_denom: String::from("ukava"),
    }
}

/// Both contracts instantiated on one store, with a ledger and an oracle at price 1
pub struct Suite {
    pub storage: MockStorage,
    pub oracle: MockOracle,
    pub ledger: MockLedger,
}

impl Suite {
    pub fn new() -> Self {
        Suite::with_msg(instantiate_msg())
    }

    pub fn with_msg(msg: InstantiateMsg) -> Self {
        let mut suite = Suite {
            storage: MockStorage::new(),
            oracle: MockOracle::new(&[(SPOT_MARKET, Decimal::one()), (LIQUIDATION_MARKET, Decimal::one())]),
            ledger: MockLedger::new(&[
                ("alice", vec![coin(1_000_000_000, "bnb"), coin(1_000_000, "usdx")]),
                ("bob", vec![coin(1_000_000_000, "bnb")]),
                ("carol", vec![coin(1_000_000_000, "bnb")]),
            ]),
        };

        auction_contract::instantiate(
            suite.deps(),
            env_at(START_TIME),
            mock_info("owner", &[]),
            AuctionInstantiateMsg {
                owner: None,
                max_auction_duration: None,
                bid_duration: None,
                increment_surplus: None,
                increment_debt: None,
                increment_collateral: None,
            },
        )
        .unwrap();
        instantiate(suite.deps(), env_at(START_TIME), mock_info("owner", &[]), msg).unwrap();

        suite
    }

    pub fn deps(&mut self) -> HostDepsMut {
        HostDepsMut {
            storage: &mut self.storage,
            oracle: &self.oracle,
            ledger: &mut self.ledger,
        }
    }

    pub fn query_deps(&self) -> HostDeps {
        HostDeps {
            storage: &self.storage,
            oracle: &self.oracle,
            ledger: &self.ledger,
        }
    }

    pub fn execute(&mut self, sender: &str, time: u64, msg: ExecuteMsg) -> Result<Response, ContractError> {
        execute(self.deps(), env_at(time), mock_info(sender, &[]), msg)
    }

    pub fn begin_blocker(&mut self, time: u64) -> Result<Response, ContractError> {
        begin_blocker(self.deps(), env_at(time))
    }

    pub fn set_price(&mut self, price: Decimal) {
        self.oracle.set_price(SPOT_MARKET, price);
        self.oracle.set_price(LIQUIDATION_MARKET, price);
    }

    /// Opens a bnb-a CDP for `owner`
    pub fn open(&mut self, owner: &str, collateral: u128, principal: u128) -> Result<Response, ContractError> {
        self.execute(
            owner,
            START_TIME,
            ExecuteMsg::CreateCdp {
                collateral: coin(collateral, "bnb"),
                principal: coin(principal, "usdx"),
                collateral_type: String::from(BNB_A),
            },
        )
    }
}

pub fn bnb(amount: u128) -> Coin {
    coin(amount, "bnb")
}

pub fn usdx(amount: u128) -> Coin {
    coin(amount, "usdx")
}
