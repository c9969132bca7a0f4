use cosmwasm_std::{attr, to_binary, Addr, Binary, Decimal, Env, MessageInfo, Response, StdResult};
use cw2::set_contract_version;

use ballast::auction::{
    Config, ExecuteMsg, InstantiateMsg, QueryMsg, UpdateConfig, DEFAULT_BID_DURATION,
    DEFAULT_MAX_AUCTION_DURATION,
};
use ballast::host::{HostDeps, HostDepsMut};

use crate::auctions::close_expired_auctions;
use crate::bidding::place_bid;
use crate::error::ContractError;
use crate::query::{query_auction, query_auctions};
use crate::state::{CONFIG, OWNERSHIP_TRANSFER};

// Contract name and version used for migration.
const CONTRACT_NAME: &str = "crates.io:auction";
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
        max_auction_duration: msg.max_auction_duration.unwrap_or(DEFAULT_MAX_AUCTION_DURATION),
        bid_duration: msg.bid_duration.unwrap_or(DEFAULT_BID_DURATION),
        increment_surplus: msg.increment_surplus.unwrap_or_else(|| Decimal::percent(5)),
        increment_debt: msg.increment_debt.unwrap_or_else(|| Decimal::percent(5)),
        increment_collateral: msg.increment_collateral.unwrap_or_else(|| Decimal::percent(5)),
    };
    config.validate()?;

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("config", format!("{:?}", config))
        .add_attribute("block_time", env.block.time.seconds().to_string()))
}

pub fn execute(
    deps: HostDepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::PlaceBid { auction_id, amount } => {
            place_bid(deps.storage, deps.ledger, &env, auction_id, info.sender, amount)
        }
        ExecuteMsg::UpdateConfig(update) => update_config(deps, info, update),
    }
}

/// Runs once per block after the bids of the block
pub fn end_blocker(deps: HostDepsMut, env: Env) -> Result<Response, ContractError> {
    close_expired_auctions(deps.storage, deps.ledger, &env)
}

/// Update contract configuration
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
    if let Some(max_auction_duration) = update.max_auction_duration {
        config.max_auction_duration = max_auction_duration;
    }
    if let Some(bid_duration) = update.bid_duration {
        config.bid_duration = bid_duration;
    }
    if let Some(increment) = update.increment_surplus {
        config.increment_surplus = increment;
    }
    if let Some(increment) = update.increment_debt {
        config.increment_debt = increment;
    }
    if let Some(increment) = update.increment_collateral {
        config.increment_collateral = increment;
    }
    config.validate()?;

    CONFIG.save(deps.storage, &config)?;
    attrs.push(attr("updated_config", format!("{:?}", config)));

    Ok(Response::new().add_attributes(attrs))
}

pub fn query(deps: HostDeps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_binary(&CONFIG.load(deps.storage)?),
        QueryMsg::Auction { auction_id } => to_binary(&query_auction(deps.storage, auction_id)?),
        QueryMsg::Auctions { start_after, limit } => {
            to_binary(&query_auctions(deps.storage, start_after, limit)?)
        }
    }
}
