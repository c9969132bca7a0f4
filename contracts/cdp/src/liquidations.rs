use std::cmp::{max, min};

use cosmwasm_std::{attr, coin, Addr, Attribute, Coin, Decimal, Decimal256, Env, Response, Storage, Uint128};

use auction::auctions::{new_collateral_auction, open_auction, start_debt_auction, start_surplus_auction};
use ballast::auction::Auction;
use ballast::cdp::Config;
use ballast::host::{HostDepsMut, Ledger, Oracle, CDP_MODULE, LIQUIDATOR_MODULE};
use ballast::math::multiply_and_round;
use ballast::types::{CollateralParam, Deposit, WeightedAddresses, CDP};

use crate::rates::synchronize_interest;
use crate::risk_engine::{
    assert_circuit_breaker, calculate_collateralization_ratio, get_collateral_param, get_price, liquidation_threshold,
    PricefeedType,
};
use crate::state::{
    delete_cdp, delete_deposit, get_cdp_by_owner_and_type, get_cdps_below_ratio, get_collateral_state, get_deposits,
    COLLATERAL_STATE, CONFIG,
};
use crate::ContractError;

/// Debt auctions sell this many gov tokens per unit of debt at the start
pub const DEBT_AUCTION_LOT_MULTIPLIER: u128 = 100_000;

/// One collateral auction's share of a seized CDP
#[derive(Clone, Debug, PartialEq)]
pub struct CollateralLot {
    pub lot: Uint128,
    pub debt: Uint128,
    pub max_bid: Uint128,
}

/// Splits seized collateral into lots of at most `auction_size`, each carrying a proportional share of the debt.
/// The last lot takes whatever debt the proportional shares left over.
/// The max bid is the lot's debt plus the liquidation penalty.
pub fn plan_collateral_lots(
    collateral: Uint128,
    debt: Uint128,
    auction_size: Uint128,
    liquidation_penalty: Decimal,
) -> Result<Vec<CollateralLot>, ContractError> {
    if auction_size.is_zero() {
        return Err(ContractError::InvalidCollateral { msg: String::from("Auction size must be positive") });
    }

    let mut lots = vec![];
    let mut remaining_collateral = collateral;
    let mut remaining_debt = debt;
    while !remaining_collateral.is_zero() {
        let lot = min(auction_size, remaining_collateral);
        let lot_debt = if lot == remaining_collateral {
            remaining_debt
        } else {
            min(debt.multiply_ratio(lot, collateral), remaining_debt)
        };
        let penalty = multiply_and_round(lot_debt, liquidation_penalty)?;

        lots.push(CollateralLot {
            lot,
            debt: lot_debt,
            max_bid: max(lot_debt.checked_add(penalty)?, Uint128::one()),
        });
        remaining_collateral -= lot;
        remaining_debt -= lot_debt;
    }

    Ok(lots)
}

/// A checked seizure, nothing is written until it's committed
pub struct Seizure {
    pub deposits: Vec<Deposit>,
    pub debt: Uint128,
    pub auctions: Vec<Auction>,
}

fn assert_collateral_held(ledger: &dyn Ledger, cdp: &CDP) -> Result<(), ContractError> {
    let held = ledger.module_balance(CDP_MODULE, &cdp.collateral.denom);
    if held < cdp.collateral.amount {
        return Err(ContractError::InvariantViolation {
            msg: format!("CDP {} holds {} but the cdp module only has {}", cdp.id, cdp.collateral, held),
        });
    }
    Ok(())
}

/// Runs every check a seizure of `cdp` backed by `deposits` needs and builds its collateral auctions
pub fn plan_seizure(
    storage: &dyn Storage,
    ledger: &dyn Ledger,
    env: &Env,
    config: &Config,
    cdp: &CDP,
    deposits: Vec<Deposit>,
) -> Result<Seizure, ContractError> {
    let param = get_collateral_param(config, &cdp.collateral_type)?;
    assert_collateral_held(ledger, cdp)?;

    let debt = min(cdp.total_principal(), ledger.module_balance(CDP_MODULE, &config.debt_denom));
    let lots = plan_collateral_lots(cdp.collateral.amount, debt, param.auction_size, param.liquidation_penalty)?;

    let funded: Vec<_> = deposits.iter().filter(|deposit| !deposit.amount.amount.is_zero()).collect();
    let lot_returns = WeightedAddresses {
        addresses: funded.iter().map(|deposit| deposit.depositor.clone()).collect(),
        weights: funded.iter().map(|deposit| deposit.amount.amount).collect(),
    };
    let mut auctions = vec![];
    for lot in lots.iter() {
        auctions.push(new_collateral_auction(
            storage,
            env,
            LIQUIDATOR_MODULE,
            coin(lot.lot.u128(), &cdp.collateral.denom),
            coin(lot.max_bid.u128(), &config.debt_param.denom),
            lot_returns.clone(),
            coin(lot.debt.u128(), &config.debt_denom),
        )?);
    }

    Ok(Seizure { deposits, debt, auctions })
}

/// Removes the CDP, moves its collateral and debt to the liquidator and opens the planned auctions
fn commit_seizure(
    storage: &mut dyn Storage,
    ledger: &mut dyn Ledger,
    config: &Config,
    cdp: &CDP,
    seizure: Seizure,
) -> Result<Vec<Attribute>, ContractError> {
    let mut state = get_collateral_state(storage, &cdp.collateral_type)?;
    state.total_principal = state.total_principal.saturating_sub(cdp.total_principal());

    delete_cdp(storage, config, cdp)?;
    for deposit in seizure.deposits.iter() {
        delete_deposit(storage, cdp.id, &deposit.depositor);
    }
    COLLATERAL_STATE.save(storage, &cdp.collateral_type, &state)?;

    let mut seized = vec![];
    if !cdp.collateral.amount.is_zero() {
        seized.push(cdp.collateral.clone());
    }
    if !seizure.debt.is_zero() {
        seized.push(coin(seizure.debt.u128(), &config.debt_denom));
    }
    //The CDP is gone, failing from here on would lose its collateral
    let auction_ids = open_seized_auctions(storage, ledger, seized, seizure.auctions).map_err(|err| {
        ContractError::InvariantViolation { msg: format!("CDP {} was removed but not auctioned: {}", cdp.id, err) }
    })?;

    let mut attrs = vec![
        attr("seized_cdp", cdp.id.to_string()),
        attr("seized_collateral", cdp.collateral.to_string()),
        attr("seized_debt", seizure.debt.to_string()),
    ];
    for auction_id in auction_ids {
        attrs.push(attr("collateral_auction", auction_id.to_string()));
    }
    Ok(attrs)
}

fn open_seized_auctions(
    storage: &mut dyn Storage,
    ledger: &mut dyn Ledger,
    seized: Vec<Coin>,
    auctions: Vec<Auction>,
) -> Result<Vec<u64>, ContractError> {
    if !seized.is_empty() {
        ledger.send_from_module_to_module(CDP_MODULE, LIQUIDATOR_MODULE, seized)?;
    }
    let mut ids = vec![];
    for auction in auctions {
        ids.push(open_auction(storage, ledger, auction)?);
    }
    Ok(ids)
}

/// Takes a CDP's collateral and debt to the liquidator and auctions the collateral.
/// The CDP, its deposits and index entries are removed.
/// A CDP that fails a check is left as it was.
pub fn seize_collateral(
    storage: &mut dyn Storage,
    ledger: &mut dyn Ledger,
    env: &Env,
    config: &Config,
    cdp: &CDP,
) -> Result<Vec<Attribute>, ContractError> {
    let deposits = get_deposits(storage, cdp.id)?;
    let seizure = plan_seizure(storage, ledger, env, config, cdp, deposits)?;

    commit_seizure(storage, ledger, config, cdp, seizure)
}

/// Seizes up to `check_collateralization_index_count` CDPs that are undercollateralized at the liquidation price.
/// A CDP that fails to seize is reported and skipped, invariant violations abort.
pub fn liquidate_cdps(
    storage: &mut dyn Storage,
    ledger: &mut dyn Ledger,
    oracle: &dyn Oracle,
    env: &Env,
    config: &Config,
    param: &CollateralParam,
) -> Result<Vec<Attribute>, ContractError> {
    let price = get_price(oracle, param, PricefeedType::Liquidation)?;
    let threshold = liquidation_threshold(price, param.liquidation_ratio)?;

    let candidates = get_cdps_below_ratio(
        storage,
        &param.collateral_type,
        threshold,
        param.check_collateralization_index_count as usize,
    )?;

    let state = get_collateral_state(storage, &param.collateral_type)?;
    let mut attrs = vec![];
    for cdp in candidates {
        let cdp = synchronize_interest(&cdp, &state)?;
        match seize_collateral(storage, ledger, env, config, &cdp) {
            Ok(seized) => attrs.extend(seized),
            Err(err @ ContractError::InvariantViolation { .. }) => return Err(err),
            Err(err) => attrs.push(attr("liquidation_error", format!("{}: {}", cdp.id, err))),
        }
    }
    Ok(attrs)
}

/// Keeper liquidation of one CDP, the keeper earns a share of the collateral
pub fn liquidate(
    deps: HostDepsMut,
    env: Env,
    keeper: Addr,
    borrower: Addr,
    collateral_type: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_circuit_breaker(&config)?;
    let param = get_collateral_param(&config, &collateral_type)?;

    let cdp = get_cdp_by_owner_and_type(deps.storage, &borrower, &collateral_type)?.ok_or_else(|| {
        ContractError::CdpNotFound { owner: borrower.to_string(), collateral_type: collateral_type.clone() }
    })?;
    let mut cdp = synchronize_interest(&cdp, &get_collateral_state(deps.storage, &collateral_type)?)?;

    let ratio = calculate_collateralization_ratio(
        deps.oracle,
        &config,
        &cdp.collateral,
        &collateral_type,
        cdp.total_principal(),
        PricefeedType::Liquidation,
    )?;
    let liquidation_ratio = Decimal256::from(param.liquidation_ratio);
    if ratio >= liquidation_ratio {
        return Err(ContractError::NotLiquidatable { ratio, liquidation_ratio });
    }

    //The reward comes out of the first deposit that covers it
    assert_collateral_held(deps.ledger, &cdp)?;
    let reward = multiply_and_round(cdp.collateral.amount, param.keeper_reward_percentage)?;
    let mut deposits = get_deposits(deps.storage, cdp.id)?;
    let mut paid_reward = Uint128::zero();
    if !reward.is_zero() {
        if let Some(deposit) = deposits.iter_mut().find(|deposit| deposit.amount.amount >= reward) {
            deposit.amount.amount -= reward;
            cdp.collateral.amount -= reward;
            paid_reward = reward;
        }
    }

    let seizure = plan_seizure(deps.storage, deps.ledger, &env, &config, &cdp, deposits)?;
    let attrs = commit_seizure(deps.storage, deps.ledger, &config, &cdp, seizure)?;
    if !paid_reward.is_zero() {
        deps.ledger
            .send_from_module_to_account(CDP_MODULE, &keeper, vec![coin(paid_reward.u128(), &cdp.collateral.denom)])?;
    }

    Ok(Response::new()
        .add_attributes(vec![
            attr("method", "liquidate"),
            attr("cdp_id", cdp.id.to_string()),
            attr("keeper", keeper),
            attr("keeper_reward", coin(paid_reward.u128(), &cdp.collateral.denom).to_string()),
        ])
        .add_attributes(attrs))
}

/// Nets the liquidator's stable coins against its debt coins, then auctions off
/// whatever debt or surplus is past its threshold
pub fn run_surplus_and_debt_auctions(
    storage: &mut dyn Storage,
    ledger: &mut dyn Ledger,
    env: &Env,
    config: &Config,
) -> Result<Vec<Attribute>, ContractError> {
    let stable_denom = &config.debt_param.denom;
    let surplus = ledger.module_balance(LIQUIDATOR_MODULE, stable_denom);
    let debt = ledger.module_balance(LIQUIDATOR_MODULE, &config.debt_denom);

    let mut attrs = vec![];
    let netted = min(surplus, debt);
    if !netted.is_zero() {
        ledger.burn(LIQUIDATOR_MODULE, coin(netted.u128(), stable_denom))?;
        ledger.burn(LIQUIDATOR_MODULE, coin(netted.u128(), &config.debt_denom))?;
        attrs.push(attr("netted_debt", netted.to_string()));
    }
    let surplus = surplus - netted;
    let debt = debt - netted;

    if debt >= config.debt_auction_threshold {
        let bid = config.debt_auction_lot;
        let initial_lot = bid.checked_mul(Uint128::new(DEBT_AUCTION_LOT_MULTIPLIER))?;
        let corresponding_debt = min(bid, debt);

        let auction_id = start_debt_auction(
            storage,
            ledger,
            env,
            LIQUIDATOR_MODULE,
            coin(bid.u128(), stable_denom),
            coin(initial_lot.u128(), &config.gov_denom),
            coin(corresponding_debt.u128(), &config.debt_denom),
        )?;
        attrs.push(attr("debt_auction", auction_id.to_string()));
    }

    if surplus >= config.surplus_auction_threshold {
        let lot = min(config.surplus_auction_lot, surplus);

        let auction_id = start_surplus_auction(
            storage,
            ledger,
            env,
            LIQUIDATOR_MODULE,
            coin(lot.u128(), stable_denom),
            &config.gov_denom,
        )?;
        attrs.push(attr("surplus_auction", auction_id.to_string()));
    }

    Ok(attrs)
}
