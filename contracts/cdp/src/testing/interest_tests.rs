use std::str::FromStr;

use cosmwasm_std::{Addr, Decimal, Decimal256, Uint128};

use ballast::host::{Ledger, CDP_MODULE, LIQUIDATOR_MODULE, SAVINGS_MODULE};
use ballast::math::decimal_multiplication;
use ballast::types::{CollateralState, CDP};

use crate::rates::{accrue, calculate_interest_factor, synchronize_interest};
use crate::state::get_collateral_state;
use crate::testing::{bnb, usdx, Suite, BNB_A, ONE_YEAR, START_TIME};
use crate::ContractError;

fn dec(value: &str) -> Decimal256 {
    Decimal256::from_str(value).unwrap()
}

fn fee(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn cdp(principal: u128, fees: u128, interest_factor: Decimal256) -> CDP {
    CDP {
        id: 1,
        owner: Addr::unchecked("alice"),
        collateral_type: String::from(BNB_A),
        collateral: bnb(100_000_000),
        principal: usdx(principal),
        accumulated_fees: usdx(fees),
        fees_updated: START_TIME,
        interest_factor,
    }
}

#[test]
fn interest_factor() {
    let cases = vec![
        ("1.000000005555", ONE_YEAR, "1.191463614477847370"),
        ("1.000000005555", 10 * ONE_YEAR, "5.765113233897391189"),
        ("1.000000005555", 30 * 24 * 60 * 60, "1.014502718535278645"),
        ("1.000000005555", 24 * 60 * 60, "1.000480067194057924"),
        ("1.000000000555", ONE_YEAR, "1.017656545925063632"),
        ("1.000000000005", ONE_YEAR, "1.000157692432076670"),
        ("1.000000055555", ONE_YEAR, "5.766022095987868825"),
        ("1.0000000016", ONE_YEAR, "1.051752268076200445"),
        ("1.0000000016", 1000, "1.000001600001278880"),
    ];
    for (rate, seconds, expected) in cases {
        assert_eq!(
            calculate_interest_factor(fee(rate), seconds).unwrap(),
            dec(expected),
            "{} over {} seconds",
            rate,
            seconds
        );
    }

    assert_eq!(calculate_interest_factor(fee("1.0000000016"), 0).unwrap(), Decimal256::one());
    assert_eq!(calculate_interest_factor(fee("1.0000000016"), 1).unwrap(), dec("1.0000000016"));
    assert_eq!(calculate_interest_factor(Decimal::one(), ONE_YEAR).unwrap(), Decimal256::one());
}

#[test]
fn interest_factor_compounds() {
    let rate = fee("1.0000000016");
    let whole = calculate_interest_factor(rate, 2000).unwrap();
    let halves = decimal_multiplication(
        calculate_interest_factor(rate, 1000).unwrap(),
        calculate_interest_factor(rate, 1000).unwrap(),
    )
    .unwrap();

    assert_eq!(whole, dec("1.000003200005117762"));
    let diff = if whole > halves { whole - halves } else { halves - whole };
    assert!(diff <= dec("0.000000000000000010"), "{} vs {}", whole, halves);
}

#[test]
fn accrue_collateral_state() {
    let rate = fee("1.0000000016");

    //First accrual only starts the clock
    let accrual = accrue(&CollateralState::default(), rate, START_TIME).unwrap();
    assert_eq!(accrual.state.previous_accrual_time, Some(START_TIME));
    assert_eq!(accrual.interest, Uint128::zero());

    let state = CollateralState {
        total_principal: Uint128::new(40_000_000),
        interest_factor: Decimal256::one(),
        previous_accrual_time: Some(START_TIME),
    };
    assert_eq!(accrue(&state, rate, START_TIME).unwrap().state, state);

    let accrual = accrue(&state, rate, START_TIME + ONE_YEAR).unwrap();
    assert_eq!(accrual.interest, Uint128::new(2_070_091));
    assert_eq!(accrual.state.total_principal, Uint128::new(42_070_091));
    assert_eq!(accrual.state.interest_factor, dec("1.051752268076200445"));
    assert_eq!(accrual.state.previous_accrual_time, Some(START_TIME + ONE_YEAR));

    //No debt, only time moves
    let empty = CollateralState { total_principal: Uint128::zero(), ..state.clone() };
    let accrual = accrue(&empty, rate, START_TIME + 100).unwrap();
    assert_eq!(accrual.state.interest_factor, Decimal256::one());
    assert_eq!(accrual.state.previous_accrual_time, Some(START_TIME + 100));

    //Interest that rounds to zero waits for a later tick
    let dust = CollateralState { total_principal: Uint128::new(1), ..state };
    let accrual = accrue(&dust, rate, START_TIME + 1).unwrap();
    assert_eq!(accrual.interest, Uint128::zero());
    assert_eq!(accrual.state, dust);
}

#[test]
fn synchronize_cdp_interest() {
    let state = CollateralState {
        total_principal: Uint128::new(42_070_091),
        interest_factor: dec("1.051752268076200445"),
        previous_accrual_time: Some(START_TIME + ONE_YEAR),
    };

    let synced = synchronize_interest(&cdp(40_000_000, 0, Decimal256::one()), &state).unwrap();
    assert_eq!(synced.accumulated_fees, usdx(2_070_091));
    assert_eq!(synced.principal, usdx(40_000_000));
    assert_eq!(synced.interest_factor, dec("1.051752268076200445"));
    //Stamped with the accrual time the factor belongs to
    assert_eq!(synced.fees_updated, START_TIME + ONE_YEAR);

    //Already in sync
    assert_eq!(synchronize_interest(&synced, &state).unwrap(), synced);

    //Stored factors below one are corrupt
    let err = synchronize_interest(&cdp(40_000_000, 0, dec("0.99")), &state).unwrap_err();
    assert!(matches!(err, ContractError::InvariantViolation { .. }));

    //Dust keeps the old factor so it isn't lost
    let dust = synchronize_interest(&cdp(1, 0, Decimal256::one()), &CollateralState {
        interest_factor: dec("1.0000000016"),
        ..state
    })
    .unwrap();
    assert_eq!(dust.accumulated_fees, usdx(0));
    assert_eq!(dust.interest_factor, Decimal256::one());
}

#[test]
fn accumulate_interest_mints_fees() {
    let mut suite = Suite::new();
    suite.open("alice", 100_000_000, 40_000_000).unwrap();

    let res = suite.begin_blocker(START_TIME + ONE_YEAR).unwrap();
    assert!(res.attributes.iter().any(|attr| attr.key == "accrued_interest" && attr.value == "bnb-a:2070091"));

    let state = get_collateral_state(&suite.storage, BNB_A).unwrap();
    assert_eq!(state.total_principal, Uint128::new(42_070_091));
    assert_eq!(state.previous_accrual_time, Some(START_TIME + ONE_YEAR));

    //Debt coins back the new fees, the stable coins are split 50/50 (ties to even)
    assert_eq!(suite.ledger.module_balance(CDP_MODULE, "debt"), Uint128::new(42_070_091));
    assert_eq!(suite.ledger.module_balance(SAVINGS_MODULE, "usdx"), Uint128::new(1_035_046));
    assert_eq!(suite.ledger.module_balance(LIQUIDATOR_MODULE, "usdx"), Uint128::new(1_035_045));

    //Same block again is a no-op
    suite.begin_blocker(START_TIME + ONE_YEAR).unwrap();
    assert_eq!(get_collateral_state(&suite.storage, BNB_A).unwrap(), state);
}
