use std::cmp::min;
use std::convert::TryFrom;

use cosmwasm_std::{Addr, Decimal256, Order, StdResult, Storage, Uint128, Uint256};
use cw_storage_plus::{Bound, Item, Map};

use ballast::cdp::Config;
use ballast::types::{CollateralState, Deposit, CDP};

use crate::risk_engine::cdp_collateral_to_debt_ratio;
use crate::ContractError;

pub const CONFIG: Item<Config> = Item::new("cdp_config");
pub const NEXT_CDP_ID: Item<u64> = Item::new("next_cdp_id");

pub const CDPS: Map<(&str, u64), CDP> = Map::new("cdps"); //(collateral_type, id)
pub const DEPOSITS: Map<(u64, &Addr), Deposit> = Map::new("deposits"); //(cdp_id, depositor)
pub const CDP_IDS_BY_OWNER: Map<&Addr, Vec<u64>> = Map::new("cdp_ids_by_owner");
/// (collateral_type, sortable ratio ++ id) -> id
pub const CDP_IDS_BY_RATIO: Map<(&str, &[u8]), u64> = Map::new("cdp_ids_by_ratio");

/// Accrual state per collateral type
pub const COLLATERAL_STATE: Map<&str, CollateralState> = Map::new("collateral_state");

/// Config ownership transfer
pub const OWNERSHIP_TRANSFER: Item<Addr> = Item::new("cdp_ownership_transfer");

/// Ratios are clamped to 10^18 so every key has the same width
pub fn max_sortable_ratio() -> Decimal256 {
    Decimal256::new(Uint256::from(10u128.pow(36)))
}

/// Big endian ratio atomics, byte order matches numeric order
pub fn sortable_ratio_bytes(ratio: Decimal256) -> StdResult<Vec<u8>> {
    let ratio = min(ratio, max_sortable_ratio());

    Ok(Uint128::try_from(ratio.atomics())?.u128().to_be_bytes().to_vec())
}

pub fn ratio_index_key(ratio: Decimal256, id: u64) -> StdResult<Vec<u8>> {
    let mut key = sortable_ratio_bytes(ratio)?;
    key.extend_from_slice(&id.to_be_bytes());
    Ok(key)
}

pub fn get_next_cdp_id(storage: &dyn Storage) -> StdResult<u64> {
    Ok(NEXT_CDP_ID.may_load(storage)?.unwrap_or(1u64))
}

pub fn get_collateral_state(storage: &dyn Storage, collateral_type: &str) -> StdResult<CollateralState> {
    Ok(COLLATERAL_STATE.may_load(storage, collateral_type)?.unwrap_or_default())
}

pub fn get_cdp(storage: &dyn Storage, collateral_type: &str, id: u64) -> Result<CDP, ContractError> {
    CDPS.may_load(storage, (collateral_type, id))?
        .ok_or_else(|| ContractError::CdpIdNotFound { collateral_type: collateral_type.to_string(), id })
}

pub fn get_cdp_by_owner_and_type(
    storage: &dyn Storage,
    owner: &Addr,
    collateral_type: &str,
) -> StdResult<Option<CDP>> {
    let ids = CDP_IDS_BY_OWNER.may_load(storage, owner)?.unwrap_or_default();
    for id in ids {
        if let Some(cdp) = CDPS.may_load(storage, (collateral_type, id))? {
            return Ok(Some(cdp));
        }
    }
    Ok(None)
}

pub fn get_cdps_by_type(
    storage: &dyn Storage,
    collateral_type: &str,
    start_after: Option<u64>,
    limit: usize,
) -> StdResult<Vec<CDP>> {
    CDPS.prefix(collateral_type)
        .range(storage, start_after.map(Bound::exclusive), None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, cdp)| cdp))
        .collect()
}

pub fn has_open_cdps(storage: &dyn Storage, collateral_type: &str) -> bool {
    CDPS.prefix(collateral_type)
        .keys(storage, None, None, Order::Ascending)
        .next()
        .is_some()
}

/// CDPs of a type whose collateral to debt ratio is strictly below `ratio`, lowest first
pub fn get_cdps_below_ratio(
    storage: &dyn Storage,
    collateral_type: &str,
    ratio: Decimal256,
    limit: usize,
) -> Result<Vec<CDP>, ContractError> {
    let upper = Bound::ExclusiveRaw(sortable_ratio_bytes(ratio)?);

    let ids = CDP_IDS_BY_RATIO
        .prefix(collateral_type)
        .range(storage, None, Some(upper), Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, id)| id))
        .collect::<StdResult<Vec<u64>>>()?;

    ids.into_iter()
        .map(|id| get_cdp(storage, collateral_type, id))
        .collect()
}

pub fn get_deposit(storage: &dyn Storage, cdp_id: u64, depositor: &Addr) -> StdResult<Option<Deposit>> {
    DEPOSITS.may_load(storage, (cdp_id, depositor))
}

pub fn get_deposits(storage: &dyn Storage, cdp_id: u64) -> StdResult<Vec<Deposit>> {
    DEPOSITS
        .prefix(cdp_id)
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, deposit)| deposit))
        .collect()
}

pub fn set_deposit(storage: &mut dyn Storage, deposit: &Deposit) -> StdResult<()> {
    DEPOSITS.save(storage, (deposit.cdp_id, &deposit.depositor), deposit)
}

pub fn delete_deposit(storage: &mut dyn Storage, cdp_id: u64, depositor: &Addr) {
    DEPOSITS.remove(storage, (cdp_id, depositor));
}

/// Stores a new CDP with its ratio and owner index entries
pub fn create_cdp(storage: &mut dyn Storage, config: &Config, cdp: &CDP) -> Result<(), ContractError> {
    if CDPS.may_load(storage, (&cdp.collateral_type, cdp.id))?.is_some() {
        return Err(ContractError::InvariantViolation { msg: format!("CDP {} already stored", cdp.id) });
    }
    let key = ratio_index_key(cdp_collateral_to_debt_ratio(config, cdp)?, cdp.id)?;

    CDPS.save(storage, (&cdp.collateral_type, cdp.id), cdp)?;
    CDP_IDS_BY_RATIO.save(storage, (&cdp.collateral_type, key.as_slice()), &cdp.id)?;

    CDP_IDS_BY_OWNER.update(storage, &cdp.owner, |ids| -> StdResult<Vec<u64>> {
        let mut ids = ids.unwrap_or_default();
        if let Err(index) = ids.binary_search(&cdp.id) {
            ids.insert(index, cdp.id);
        }
        Ok(ids)
    })?;

    Ok(())
}

/// Removes the ratio index entry of the stored CDP, which must exist
fn remove_stored_ratio_index(storage: &mut dyn Storage, config: &Config, cdp: &CDP) -> Result<(), ContractError> {
    let stored = get_cdp(storage, &cdp.collateral_type, cdp.id).map_err(|_| ContractError::InvariantViolation {
        msg: format!("CDP {} isn't stored", cdp.id),
    })?;
    let stored_key = ratio_index_key(cdp_collateral_to_debt_ratio(config, &stored)?, stored.id)?;

    if CDP_IDS_BY_RATIO
        .may_load(storage, (&stored.collateral_type, stored_key.as_slice()))?
        .is_none()
    {
        return Err(ContractError::InvariantViolation {
            msg: format!("CDP {} is missing from the collateral ratio index", stored.id),
        });
    }
    CDP_IDS_BY_RATIO.remove(storage, (&stored.collateral_type, stored_key.as_slice()));

    Ok(())
}

/// The only way to write a changed CDP: replaces its ratio index entry alongside the record
pub fn update_cdp_and_ratio_index(storage: &mut dyn Storage, config: &Config, cdp: &CDP) -> Result<(), ContractError> {
    remove_stored_ratio_index(storage, config, cdp)?;

    let key = ratio_index_key(cdp_collateral_to_debt_ratio(config, cdp)?, cdp.id)?;
    CDP_IDS_BY_RATIO.save(storage, (&cdp.collateral_type, key.as_slice()), &cdp.id)?;
    CDPS.save(storage, (&cdp.collateral_type, cdp.id), cdp)?;

    Ok(())
}

/// Deletes a CDP with its ratio and owner index entries
pub fn delete_cdp(storage: &mut dyn Storage, config: &Config, cdp: &CDP) -> Result<(), ContractError> {
    remove_stored_ratio_index(storage, config, cdp)?;
    CDPS.remove(storage, (&cdp.collateral_type, cdp.id));

    let mut ids = CDP_IDS_BY_OWNER.may_load(storage, &cdp.owner)?.unwrap_or_default();
    ids.retain(|id| *id != cdp.id);
    if ids.is_empty() {
        CDP_IDS_BY_OWNER.remove(storage, &cdp.owner);
    } else {
        CDP_IDS_BY_OWNER.save(storage, &cdp.owner, &ids)?;
    }

    Ok(())
}
