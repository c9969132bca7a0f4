use std::str::FromStr;

use cosmwasm_std::{Addr, Decimal256, Uint128};

use ballast::math::smallest_decimal;

use crate::risk_engine::calculate_collateral_to_debt_ratio;
use crate::state::{
    get_cdp, get_cdps_below_ratio, max_sortable_ratio, ratio_index_key, sortable_ratio_bytes,
    update_cdp_and_ratio_index, CDPS, CONFIG,
};
use crate::testing::{bnb, Suite, BNB_A};
use crate::ContractError;

fn dec(value: &str) -> Decimal256 {
    Decimal256::from_str(value).unwrap()
}

#[test]
fn ratio_keys_sort_numerically() {
    let ratios = vec![
        Decimal256::zero(),
        smallest_decimal(),
        dec("0.5"),
        Decimal256::one(),
        dec("2.5"),
        dec("1000"),
        max_sortable_ratio() - smallest_decimal(),
        max_sortable_ratio(),
    ];
    let keys: Vec<Vec<u8>> = ratios.iter().map(|ratio| sortable_ratio_bytes(*ratio).unwrap()).collect();
    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1]);
        assert_eq!(pair[0].len(), 16);
    }

    //Clamped at the max
    assert_eq!(sortable_ratio_bytes(dec("100000000000000000000")).unwrap(), keys[7]);

    //Ties break on id
    let key = ratio_index_key(dec("2.5"), 7).unwrap();
    assert_eq!(key.len(), 24);
    assert_eq!(&key[16..], &7u64.to_be_bytes());
    assert!(ratio_index_key(dec("2.5"), 7).unwrap() < ratio_index_key(dec("2.5"), 8).unwrap());
}

#[test]
fn collateral_to_debt_ratio() {
    let suite = Suite::new();
    let config = CONFIG.load(&suite.storage).unwrap();

    assert_eq!(
        calculate_collateral_to_debt_ratio(&config, &bnb(100_000_000), BNB_A, Uint128::new(40_000_000)).unwrap(),
        dec("2.5")
    );
    //Debt-free CDPs sort last
    assert_eq!(
        calculate_collateral_to_debt_ratio(&config, &bnb(100_000_000), BNB_A, Uint128::zero()).unwrap(),
        max_sortable_ratio() - smallest_decimal()
    );
    let err = calculate_collateral_to_debt_ratio(&config, &bnb(1), "xrp-a", Uint128::new(1)).unwrap_err();
    assert!(matches!(err, ContractError::CollateralNotSupported { .. }));
}

#[test]
fn scan_below_ratio_is_exclusive() {
    let mut suite = Suite::new();
    suite.open("alice", 100_000_000, 40_000_000).unwrap();
    suite.open("bob", 100_000_000, 50_000_000).unwrap();

    let below = get_cdps_below_ratio(&suite.storage, BNB_A, dec("2.5"), 10).unwrap();
    assert_eq!(below.len(), 1);
    assert_eq!(below[0].owner, Addr::unchecked("bob"));

    let below = get_cdps_below_ratio(&suite.storage, BNB_A, dec("2.500000000000000001"), 10).unwrap();
    let owners: Vec<Addr> = below.into_iter().map(|cdp| cdp.owner).collect();
    assert_eq!(owners, vec![Addr::unchecked("bob"), Addr::unchecked("alice")]);

    assert_eq!(get_cdps_below_ratio(&suite.storage, BNB_A, max_sortable_ratio(), 1).unwrap().len(), 1);
    assert!(get_cdps_below_ratio(&suite.storage, "xrp-a", max_sortable_ratio(), 10).unwrap().is_empty());
}

#[test]
fn missing_index_entry_is_an_invariant_violation() {
    let mut suite = Suite::new();
    suite.open("alice", 100_000_000, 40_000_000).unwrap();
    let config = CONFIG.load(&suite.storage).unwrap();

    let mut cdp = get_cdp(&suite.storage, BNB_A, 1).unwrap();
    cdp.collateral = bnb(200_000_000);
    update_cdp_and_ratio_index(&mut suite.storage, &config, &cdp).unwrap();

    //Stored record changed behind the index's back
    let mut corrupted = cdp.clone();
    corrupted.collateral = bnb(300_000_000);
    CDPS.save(&mut suite.storage, (BNB_A, 1), &corrupted).unwrap();
    let err = update_cdp_and_ratio_index(&mut suite.storage, &config, &cdp).unwrap_err();
    assert!(matches!(err, ContractError::InvariantViolation { .. }));

    //Never stored
    let mut unknown = cdp;
    unknown.id = 9;
    let err = update_cdp_and_ratio_index(&mut suite.storage, &config, &unknown).unwrap_err();
    assert!(matches!(err, ContractError::InvariantViolation { .. }));
}

#[test]
fn ratio_index_tracks_every_mutation() {
    use cosmwasm_std::Order;

    use ballast::cdp::ExecuteMsg;

    use crate::risk_engine::cdp_collateral_to_debt_ratio;
    use crate::state::{get_cdps_by_type, CDP_IDS_BY_RATIO};
    use crate::testing::{usdx, START_TIME};

    let mut suite = Suite::new();
    suite.open("alice", 100_000_000, 40_000_000).unwrap();
    suite.open("bob", 300_000_000, 60_000_000).unwrap();
    suite.open("carol", 150_000_000, 20_000_000).unwrap();

    let type_of = || String::from(BNB_A);
    suite.execute("alice", START_TIME, ExecuteMsg::DrawDebt { collateral_type: type_of(), principal: usdx(5_000_000) }).unwrap();
    suite.execute("bob", START_TIME, ExecuteMsg::RepayDebt { collateral_type: type_of(), payment: usdx(30_000_000) }).unwrap();
    suite
        .execute("carol", START_TIME, ExecuteMsg::Deposit { owner: String::from("alice"), collateral: bnb(10_000_000), collateral_type: type_of() })
        .unwrap();
    suite
        .execute("carol", START_TIME, ExecuteMsg::Withdraw { owner: String::from("carol"), collateral: bnb(50_000_000), collateral_type: type_of() })
        .unwrap();
    suite.begin_blocker(START_TIME + 86_400).unwrap();
    suite.execute("carol", START_TIME + 86_400, ExecuteMsg::DrawDebt { collateral_type: type_of(), principal: usdx(1_000_000) }).unwrap();

    let config = CONFIG.load(&suite.storage).unwrap();
    let cdps = get_cdps_by_type(&suite.storage, BNB_A, None, 100).unwrap();
    let mut expected: Vec<Vec<u8>> = cdps
        .iter()
        .map(|cdp| ratio_index_key(cdp_collateral_to_debt_ratio(&config, cdp).unwrap(), cdp.id).unwrap())
        .collect();
    expected.sort();

    let indexed: Vec<Vec<u8>> = CDP_IDS_BY_RATIO
        .prefix(BNB_A)
        .keys(&suite.storage, None, None, Order::Ascending)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(indexed, expected);
}
