use cosmwasm_std::testing::{mock_info, MockStorage};
use cosmwasm_std::{from_binary, Addr, Decimal, Decimal256, Uint128};

use ballast::cdp::{Config, ExecuteMsg, QueryMsg, TotalPrincipalResponse, UpdateConfig};
use ballast::host::HostDepsMut;
use ballast::testing::{MockLedger, MockOracle};
use ballast::types::{AugmentedCDP, CollateralState, Deposit};

use crate::contract::{instantiate, query};
use crate::state::get_collateral_state;
use crate::testing::{bnb, collateral_param, env_at, instantiate_msg, usdx, Suite, BNB_A, START_TIME};
use crate::ContractError;

fn no_update() -> UpdateConfig {
    UpdateConfig {
        owner: None,
        collateral_params: None,
        debt_param: None,
        global_debt_limit: None,
        surplus_auction_threshold: None,
        surplus_auction_lot: None,
        debt_auction_threshold: None,
        debt_auction_lot: None,
        circuit_breaker: None,
    }
}

fn instantiate_with(msg: ballast::cdp::InstantiateMsg) -> Result<(), ContractError> {
    let mut storage = MockStorage::new();
    let oracle = MockOracle::default();
    let mut ledger = MockLedger::default();
    let deps = HostDepsMut { storage: &mut storage, oracle: &oracle, ledger: &mut ledger };

    instantiate(deps, env_at(START_TIME), mock_info("owner", &[]), msg).map(|_| ())
}

#[test]
fn proper_initialization() {
    let suite = Suite::new();

    let config: Config = from_binary(&query(suite.query_deps(), env_at(START_TIME), QueryMsg::Config {}).unwrap()).unwrap();
    assert_eq!(config.owner, Addr::unchecked("owner"));
    assert_eq!(config.debt_denom, "debt");
    assert!(!config.circuit_breaker);

    let state: CollateralState = from_binary(
        &query(
            suite.query_deps(),
            env_at(START_TIME),
            QueryMsg::CollateralState { collateral_type: String::from(BNB_A) },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(state.previous_accrual_time, Some(START_TIME));
    assert_eq!(state.interest_factor, Decimal256::one());
}

#[test]
fn invalid_params() {
    let mut msg = instantiate_msg();
    msg.collateral_params[0].stability_fee = Decimal::percent(200);
    assert!(instantiate_with(msg).is_err());

    let mut msg = instantiate_msg();
    msg.collateral_params.push(msg.collateral_params[0].clone());
    assert!(instantiate_with(msg).is_err());

    let mut msg = instantiate_msg();
    msg.collateral_params[0].liquidation_penalty = Decimal::percent(101);
    assert!(instantiate_with(msg).is_err());

    let mut msg = instantiate_msg();
    msg.collateral_params[0].debt_limit = usdx(3_000_000_000_000);
    assert!(instantiate_with(msg).is_err());

    let mut msg = instantiate_msg();
    msg.debt_param.savings_rate = Decimal::percent(150);
    assert!(instantiate_with(msg).is_err());

    let mut msg = instantiate_msg();
    msg.surplus_auction_lot = Uint128::zero();
    assert!(instantiate_with(msg).is_err());

    let mut msg = instantiate_msg();
    msg.gov_denom = String::from("usdx");
    assert!(instantiate_with(msg).is_err());

    assert!(instantiate_with(instantiate_msg()).is_ok());
}

#[test]
fn update_config() {
    let mut suite = Suite::new();

    let err = suite
        .execute("alice", START_TIME, ExecuteMsg::UpdateConfig(UpdateConfig { circuit_breaker: Some(true), ..no_update() }))
        .unwrap_err();
    assert_eq!(err, ContractError::Unauthorized {});

    //Circuit breaker halts position changes
    suite
        .execute("owner", START_TIME, ExecuteMsg::UpdateConfig(UpdateConfig { circuit_breaker: Some(true), ..no_update() }))
        .unwrap();
    let err = suite.open("alice", 100_000_000, 40_000_000).unwrap_err();
    assert_eq!(err, ContractError::CircuitBreaker {});

    suite
        .execute("owner", START_TIME, ExecuteMsg::UpdateConfig(UpdateConfig { circuit_breaker: Some(false), ..no_update() }))
        .unwrap();
    suite.open("alice", 100_000_000, 40_000_000).unwrap();

    //Invalid values are rejected
    let err = suite
        .execute(
            "owner",
            START_TIME,
            ExecuteMsg::UpdateConfig(UpdateConfig { debt_auction_lot: Some(Uint128::zero()), ..no_update() }),
        )
        .unwrap_err();
    assert!(matches!(err, ContractError::Std(_)));

    //Types with debt can't be dropped
    let err = suite
        .execute("owner", START_TIME, ExecuteMsg::UpdateConfig(UpdateConfig { collateral_params: Some(vec![]), ..no_update() }))
        .unwrap_err();
    assert!(matches!(err, ContractError::InvalidCollateral { .. }));

    //Ownership moves once the new owner acts
    suite
        .execute("owner", START_TIME, ExecuteMsg::UpdateConfig(UpdateConfig { owner: Some(String::from("new_owner")), ..no_update() }))
        .unwrap();
    suite
        .execute("new_owner", START_TIME, ExecuteMsg::UpdateConfig(no_update()))
        .unwrap();
    let config: Config = from_binary(&query(suite.query_deps(), env_at(START_TIME), QueryMsg::Config {}).unwrap()).unwrap();
    assert_eq!(config.owner, Addr::unchecked("new_owner"));

    let err = suite.execute("owner", START_TIME, ExecuteMsg::UpdateConfig(no_update())).unwrap_err();
    assert_eq!(err, ContractError::Unauthorized {});
}

#[test]
fn open_cdps_pin_conversion_factors() {
    let mut suite = Suite::new();
    suite.open("alice", 100_000_000, 40_000_000).unwrap();

    let mut rescaled = collateral_param();
    rescaled.conversion_factor = 8;
    let err = suite
        .execute(
            "owner",
            START_TIME,
            ExecuteMsg::UpdateConfig(UpdateConfig { collateral_params: Some(vec![rescaled.clone()]), ..no_update() }),
        )
        .unwrap_err();
    assert!(matches!(err, ContractError::InvalidCollateral { .. }));

    let mut debt_param = instantiate_msg().debt_param;
    debt_param.conversion_factor = 8;
    let err = suite
        .execute(
            "owner",
            START_TIME,
            ExecuteMsg::UpdateConfig(UpdateConfig { debt_param: Some(debt_param.clone()), ..no_update() }),
        )
        .unwrap_err();
    assert!(matches!(err, ContractError::InvalidCollateral { .. }));

    //Other risk params can still move
    let mut penalty = collateral_param();
    penalty.liquidation_penalty = Decimal::percent(10);
    suite
        .execute(
            "owner",
            START_TIME,
            ExecuteMsg::UpdateConfig(UpdateConfig { collateral_params: Some(vec![penalty]), ..no_update() }),
        )
        .unwrap();

    //The position stays usable
    suite
        .execute(
            "alice",
            START_TIME,
            ExecuteMsg::RepayDebt { collateral_type: String::from(BNB_A), payment: usdx(40_000_000) },
        )
        .unwrap();
    assert_eq!(get_collateral_state(&suite.storage, BNB_A).unwrap().total_principal, Uint128::zero());

    //Nothing is open anymore so both factors can change
    suite
        .execute(
            "owner",
            START_TIME,
            ExecuteMsg::UpdateConfig(UpdateConfig {
                collateral_params: Some(vec![rescaled]),
                debt_param: Some(debt_param),
                ..no_update()
            }),
        )
        .unwrap();
}

#[test]
fn cdp_queries() {
    let mut suite = Suite::new();
    suite.open("alice", 100_000_000, 40_000_000).unwrap();
    suite.open("bob", 100_000_000, 50_000_000).unwrap();
    suite.open("carol", 200_000_000, 40_000_000).unwrap();

    let cdp: AugmentedCDP = from_binary(
        &query(
            suite.query_deps(),
            env_at(START_TIME),
            QueryMsg::CdpById { collateral_type: String::from(BNB_A), id: 2 },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(cdp.cdp.owner, Addr::unchecked("bob"));
    assert_eq!(cdp.collateralization_ratio, Decimal256::percent(200));

    let page: Vec<AugmentedCDP> = from_binary(
        &query(
            suite.query_deps(),
            env_at(START_TIME),
            QueryMsg::Cdps { collateral_type: String::from(BNB_A), start_after: Some(1), limit: Some(1) },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].cdp.id, 2u64);

    let risky: Vec<AugmentedCDP> = from_binary(
        &query(
            suite.query_deps(),
            env_at(START_TIME),
            QueryMsg::CdpsByRatio { collateral_type: String::from(BNB_A), ratio: Decimal256::percent(300), limit: None },
        )
        .unwrap(),
    )
    .unwrap();
    let ids: Vec<u64> = risky.iter().map(|cdp| cdp.cdp.id).collect();
    assert_eq!(ids, vec![2, 1]);

    let deposits: Vec<Deposit> = from_binary(
        &query(
            suite.query_deps(),
            env_at(START_TIME),
            QueryMsg::Deposits { owner: String::from("carol"), collateral_type: String::from(BNB_A) },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(deposits[0].amount, bnb(200_000_000));

    let totals: Vec<TotalPrincipalResponse> = from_binary(
        &query(suite.query_deps(), env_at(START_TIME), QueryMsg::TotalPrincipal { collateral_type: None }).unwrap(),
    )
    .unwrap();
    assert_eq!(
        totals,
        vec![TotalPrincipalResponse { collateral_type: String::from(BNB_A), amount: usdx(130_000_000) }]
    );

    assert!(query(
        suite.query_deps(),
        env_at(START_TIME),
        QueryMsg::TotalPrincipal { collateral_type: Some(String::from("xrp-a")) }
    )
    .is_err());
}
