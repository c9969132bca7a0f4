use cosmwasm_std::{attr, to_binary, Addr, Binary, Env, MessageInfo, Response, StdResult};
use cw2::set_contract_version;

use ballast::cdp::{Config, ExecuteMsg, InstantiateMsg, QueryMsg, UpdateConfig, DEFAULT_DEBT_DENOM};
use ballast::host::{HostDeps, HostDepsMut};
use ballast::types::CollateralState;

use crate::error::ContractError;
use crate::liquidations::{liquidate, liquidate_cdps, run_surplus_and_debt_auctions};
use crate::positions::{deposit_collateral, draw_principal, open_cdp, repay_principal, withdraw_collateral};
use crate::query::{
    query_cdp, query_cdp_by_id, query_cdps, query_cdps_by_ratio, query_collateral_state, query_deposits,
    query_total_principal,
};
use crate::rates::{accumulate_interest, synchronize_interest_for_risky_cdps};
use crate::risk_engine::{market_id, PricefeedType};
use crate::state::{has_open_cdps, COLLATERAL_STATE, CONFIG, NEXT_CDP_ID, OWNERSHIP_TRANSFER};

// version info for migration info
const CONTRACT_NAME: &str = "crates.io:cdp";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn instantiate(
    deps: HostDepsMut,
    env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = Config {
        owner: msg.owner.map(Addr::unchecked).unwrap_or(info.sender),
        collateral_params: msg.collateral_params,
        debt_param: msg.debt_param,
        global_debt_limit: msg.global_debt_limit,
        surplus_auction_threshold: msg.surplus_auction_threshold,
        surplus_auction_lot: msg.surplus_auction_lot,
        debt_auction_threshold: msg.debt_auction_threshold,
        debt_auction_lot: msg.debt_auction_lot,
        circuit_breaker: false,
        debt_denom: msg.debt_denom.unwrap_or_else(|| String::from(DEFAULT_DEBT_DENOM)),
        gov_denom: msg.gov_denom,
    };
    config.validate()?;

    CONFIG.save(deps.storage, &config)?;
    NEXT_CDP_ID.save(deps.storage, &1u64)?;

    //Interest starts accruing from instantiation
    for param in config.collateral_params.iter() {
        COLLATERAL_STATE.save(
            deps.storage,
            &param.collateral_type,
            &CollateralState {
                previous_accrual_time: Some(env.block.time.seconds()),
                ..CollateralState::default()
            },
        )?;
    }

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("config", format!("{:?}", config))
        .add_attribute("contract_address", env.contract.address))
}

pub fn execute(
    deps: HostDepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::CreateCdp { collateral, principal, collateral_type } => {
            open_cdp(deps, env, info.sender, collateral, principal, collateral_type)
        }
        ExecuteMsg::Deposit { owner, collateral, collateral_type } => {
            deposit_collateral(deps, Addr::unchecked(owner), info.sender, collateral, collateral_type)
        }
        ExecuteMsg::Withdraw { owner, collateral, collateral_type } => {
            withdraw_collateral(deps, Addr::unchecked(owner), info.sender, collateral, collateral_type)
        }
        ExecuteMsg::DrawDebt { collateral_type, principal } => {
            draw_principal(deps, info.sender, collateral_type, principal)
        }
        ExecuteMsg::RepayDebt { collateral_type, payment } => {
            repay_principal(deps, info.sender, collateral_type, payment)
        }
        ExecuteMsg::Liquidate { borrower, collateral_type } => {
            liquidate(deps, env, info.sender, Addr::unchecked(borrower), collateral_type)
        }
        ExecuteMsg::UpdateConfig(update) => update_config(deps, info, update),
    }
}

/// Runs once per block before any transaction.
/// Per collateral type with live markets: accrue interest, sync the riskiest CDPs, liquidate.
/// Then auctions off the liquidator's surplus or debt.
pub fn begin_blocker(deps: HostDepsMut, env: Env) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut attrs = vec![attr("method", "begin_blocker")];

    for param in config.collateral_params.iter() {
        let down = [PricefeedType::Spot, PricefeedType::Liquidation]
            .iter()
            .map(|feed| market_id(param, *feed))
            .find(|id| !deps.oracle.market_is_live(id));
        if let Some(market_id) = down {
            attrs.push(attr("skipped", format!("{}: pricefeed {} is down", param.collateral_type, market_id)));
            continue;
        }

        attrs.extend(accumulate_interest(deps.storage, deps.ledger, &env, &config, &param.collateral_type)?);

        let count = param.check_collateralization_index_count as usize;
        let synced = synchronize_interest_for_risky_cdps(deps.storage, &config, &param.collateral_type, count)?;
        if synced > 0 {
            attrs.push(attr("synced_cdps", format!("{}:{}", param.collateral_type, synced)));
        }

        attrs.extend(liquidate_cdps(deps.storage, deps.ledger, deps.oracle, &env, &config, param)?);
    }

    attrs.extend(run_surplus_and_debt_auctions(deps.storage, deps.ledger, &env, &config)?);

    Ok(Response::new().add_attributes(attrs))
}

fn update_config(
    deps: HostDepsMut,
    info: MessageInfo,
    update: UpdateConfig,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    let mut attrs = vec![attr("method", "update_config")];

    //Assert Authority
    if info.sender != config.owner {
        //Check if ownership transfer is in progress & transfer if so
        match OWNERSHIP_TRANSFER.may_load(deps.storage)? {
            Some(new_owner) if new_owner == info.sender => {
                config.owner = info.sender;
                OWNERSHIP_TRANSFER.remove(deps.storage);
            }
            _ => return Err(ContractError::Unauthorized {}),
        }
    }

    if let Some(owner) = update.owner {
        let new_owner = Addr::unchecked(owner);
        OWNERSHIP_TRANSFER.save(deps.storage, &new_owner)?;
        attrs.push(attr("owner_transfer", new_owner));
    }
    if let Some(collateral_params) = update.collateral_params {
        //Open CDPs pin their type's denom and conversion factor, their ratio index keys depend on them
        for param in config.collateral_params.iter() {
            if !has_open_cdps(deps.storage, &param.collateral_type) {
                continue;
            }
            match collateral_params.iter().find(|new_param| new_param.collateral_type == param.collateral_type) {
                None => {
                    return Err(ContractError::InvalidCollateral {
                        msg: format!("{} still has open CDPs", param.collateral_type),
                    })
                }
                Some(new_param)
                    if new_param.denom != param.denom || new_param.conversion_factor != param.conversion_factor =>
                {
                    return Err(ContractError::InvalidCollateral {
                        msg: format!(
                            "{} still has open CDPs, its denom and conversion factor can't change",
                            param.collateral_type
                        ),
                    })
                }
                Some(_) => {}
            }
        }
        config.collateral_params = collateral_params;
    }
    if let Some(debt_param) = update.debt_param {
        let rekeys_positions = debt_param.denom != config.debt_param.denom
            || debt_param.conversion_factor != config.debt_param.conversion_factor;
        if rekeys_positions
            && config
                .collateral_params
                .iter()
                .any(|param| has_open_cdps(deps.storage, &param.collateral_type))
        {
            return Err(ContractError::InvalidCollateral {
                msg: String::from("Open CDPs exist, the debt denom and conversion factor can't change"),
            });
        }
        config.debt_param = debt_param;
    }
    if let Some(limit) = update.global_debt_limit {
        config.global_debt_limit = limit;
    }
    if let Some(threshold) = update.surplus_auction_threshold {
        config.surplus_auction_threshold = threshold;
    }
    if let Some(lot) = update.surplus_auction_lot {
        config.surplus_auction_lot = lot;
    }
    if let Some(threshold) = update.debt_auction_threshold {
        config.debt_auction_threshold = threshold;
    }
    if let Some(lot) = update.debt_auction_lot {
        config.debt_auction_lot = lot;
    }
    if let Some(circuit_breaker) = update.circuit_breaker {
        config.circuit_breaker = circuit_breaker;
    }
    config.validate()?;

    CONFIG.save(deps.storage, &config)?;
    attrs.push(attr("updated_config", format!("{:?}", config)));

    Ok(Response::new().add_attributes(attrs))
}

pub fn query(deps: HostDeps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_binary(&CONFIG.load(deps.storage)?),
        QueryMsg::Cdp { owner, collateral_type } => {
            to_binary(&query_cdp(deps, Addr::unchecked(owner), collateral_type)?)
        }
        QueryMsg::CdpById { collateral_type, id } => to_binary(&query_cdp_by_id(deps, collateral_type, id)?),
        QueryMsg::Cdps { collateral_type, start_after, limit } => {
            to_binary(&query_cdps(deps, collateral_type, start_after, limit)?)
        }
        QueryMsg::CdpsByRatio { collateral_type, ratio, limit } => {
            to_binary(&query_cdps_by_ratio(deps, collateral_type, ratio, limit)?)
        }
        QueryMsg::Deposits { owner, collateral_type } => {
            to_binary(&query_deposits(deps, Addr::unchecked(owner), collateral_type)?)
        }
        QueryMsg::TotalPrincipal { collateral_type } => to_binary(&query_total_principal(deps, collateral_type)?),
        QueryMsg::CollateralState { collateral_type } => {
            to_binary(&query_collateral_state(deps, collateral_type)?)
        }
    }
}
