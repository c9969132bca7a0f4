use cosmwasm_std::{coin, Addr, Decimal256, StdError, StdResult, Uint128};

use ballast::cdp::{Config, TotalPrincipalResponse};
use ballast::host::HostDeps;
use ballast::math::{decimal_multiplication, round_half_even, uint_to_decimal};
use ballast::types::{AugmentedCDP, CollateralState, Deposit, CDP};

use crate::rates::synchronize_interest;
use crate::risk_engine::{calculate_collateralization_ratio, collateral_value, get_collateral_param, PricefeedType};
use crate::state::{
    get_cdp, get_cdp_by_owner_and_type, get_cdps_below_ratio, get_cdps_by_type, get_collateral_state, get_deposits,
    CONFIG,
};
use crate::ContractError;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 31;

fn to_std(err: ContractError) -> StdError {
    match err {
        ContractError::Std(err) => err,
        err => StdError::GenericErr { msg: err.to_string() },
    }
}

/// Synced CDP with its collateral value and collateralization at the liquidation price
fn augment_cdp(deps: HostDeps, config: &Config, cdp: CDP) -> Result<AugmentedCDP, ContractError> {
    let cdp = synchronize_interest(&cdp, &get_collateral_state(deps.storage, &cdp.collateral_type)?)?;

    let value = collateral_value(deps.oracle, config, &cdp.collateral, &cdp.collateral_type, PricefeedType::Liquidation)?;
    let scale = uint_to_decimal(Uint128::new(10u128.pow(config.debt_param.conversion_factor)))?;
    let value = round_half_even(decimal_multiplication(value, scale)?)?;

    let collateralization_ratio = calculate_collateralization_ratio(
        deps.oracle,
        config,
        &cdp.collateral,
        &cdp.collateral_type,
        cdp.total_principal(),
        PricefeedType::Liquidation,
    )?;

    Ok(AugmentedCDP {
        collateral_value: coin(value.u128(), &config.debt_param.denom),
        collateralization_ratio,
        cdp,
    })
}

pub fn query_cdp(deps: HostDeps, owner: Addr, collateral_type: String) -> StdResult<AugmentedCDP> {
    let config = CONFIG.load(deps.storage)?;
    get_collateral_param(&config, &collateral_type).map_err(to_std)?;

    let cdp = get_cdp_by_owner_and_type(deps.storage, &owner, &collateral_type)?.ok_or_else(|| {
        to_std(ContractError::CdpNotFound { owner: owner.to_string(), collateral_type: collateral_type.clone() })
    })?;

    augment_cdp(deps, &config, cdp).map_err(to_std)
}

pub fn query_cdp_by_id(deps: HostDeps, collateral_type: String, id: u64) -> StdResult<AugmentedCDP> {
    let config = CONFIG.load(deps.storage)?;
    let cdp = get_cdp(deps.storage, &collateral_type, id).map_err(to_std)?;

    augment_cdp(deps, &config, cdp).map_err(to_std)
}

/// CDPs of a type in id order
pub fn query_cdps(
    deps: HostDeps,
    collateral_type: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Vec<AugmentedCDP>> {
    let config = CONFIG.load(deps.storage)?;
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;

    get_cdps_by_type(deps.storage, &collateral_type, start_after, limit)?
        .into_iter()
        .map(|cdp| augment_cdp(deps, &config, cdp).map_err(to_std))
        .collect()
}

/// CDPs whose stored collateral to debt ratio is below `ratio`, lowest first
pub fn query_cdps_by_ratio(
    deps: HostDeps,
    collateral_type: String,
    ratio: Decimal256,
    limit: Option<u32>,
) -> StdResult<Vec<AugmentedCDP>> {
    let config = CONFIG.load(deps.storage)?;
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;

    get_cdps_below_ratio(deps.storage, &collateral_type, ratio, limit)
        .map_err(to_std)?
        .into_iter()
        .map(|cdp| augment_cdp(deps, &config, cdp).map_err(to_std))
        .collect()
}

pub fn query_deposits(deps: HostDeps, owner: Addr, collateral_type: String) -> StdResult<Vec<Deposit>> {
    let cdp = get_cdp_by_owner_and_type(deps.storage, &owner, &collateral_type)?.ok_or_else(|| {
        to_std(ContractError::CdpNotFound { owner: owner.to_string(), collateral_type: collateral_type.clone() })
    })?;

    get_deposits(deps.storage, cdp.id)
}

/// Total principal of one collateral type, or of every type
pub fn query_total_principal(deps: HostDeps, collateral_type: Option<String>) -> StdResult<Vec<TotalPrincipalResponse>> {
    let config = CONFIG.load(deps.storage)?;

    let collateral_types: Vec<String> = match collateral_type {
        Some(collateral_type) => {
            get_collateral_param(&config, &collateral_type).map_err(to_std)?;
            vec![collateral_type]
        }
        None => config.collateral_params.iter().map(|param| param.collateral_type.clone()).collect(),
    };

    collateral_types
        .into_iter()
        .map(|collateral_type| {
            let total: Uint128 = get_collateral_state(deps.storage, &collateral_type)?.total_principal;
            Ok(TotalPrincipalResponse {
                amount: coin(total.u128(), &config.debt_param.denom),
                collateral_type,
            })
        })
        .collect()
}

pub fn query_collateral_state(deps: HostDeps, collateral_type: String) -> StdResult<CollateralState> {
    let config = CONFIG.load(deps.storage)?;
    get_collateral_param(&config, &collateral_type).map_err(to_std)?;

    get_collateral_state(deps.storage, &collateral_type)
}
