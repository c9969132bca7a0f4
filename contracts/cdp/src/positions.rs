use std::cmp::min;

use cosmwasm_std::{attr, coin, Addr, Coin, Env, Response, Storage, Uint128};

use ballast::cdp::Config;
use ballast::host::{HostDepsMut, Ledger, CDP_MODULE};
use ballast::types::{Deposit, CDP};

use crate::rates::synchronize_interest;
use crate::risk_engine::{
    assert_circuit_breaker, validate_balance, validate_collateral, validate_collateralization_ratio,
    validate_debt_floor, validate_debt_limit, validate_payment, validate_principal_add,
};
use crate::state::{
    create_cdp, delete_cdp, delete_deposit, get_cdp_by_owner_and_type, get_collateral_state, get_deposit,
    get_deposits, get_next_cdp_id, set_deposit, update_cdp_and_ratio_index, COLLATERAL_STATE, CONFIG, NEXT_CDP_ID,
};
use crate::ContractError;

fn load_owned_cdp(storage: &dyn Storage, owner: &Addr, collateral_type: &str) -> Result<CDP, ContractError> {
    get_cdp_by_owner_and_type(storage, owner, collateral_type)?.ok_or_else(|| ContractError::CdpNotFound {
        owner: owner.to_string(),
        collateral_type: collateral_type.to_string(),
    })
}

/// Loads a CDP with its fees synced to the collateral type's interest factor
fn load_synced_cdp(storage: &dyn Storage, owner: &Addr, collateral_type: &str) -> Result<CDP, ContractError> {
    let cdp = load_owned_cdp(storage, owner, collateral_type)?;
    let state = get_collateral_state(storage, collateral_type)?;

    synchronize_interest(&cdp, &state)
}

fn change_total_principal(
    storage: &mut dyn Storage,
    collateral_type: &str,
    increase: Uint128,
    decrease: Uint128,
) -> Result<(), ContractError> {
    let mut state = get_collateral_state(storage, collateral_type)?;
    state.total_principal = state.total_principal.checked_add(increase)?.saturating_sub(decrease);
    COLLATERAL_STATE.save(storage, collateral_type, &state)?;
    Ok(())
}

/// Mints stable coins for the owner and the matching debt coins for the cdp module
fn mint_principal(ledger: &mut dyn Ledger, config: &Config, owner: &Addr, principal: &Coin) -> Result<(), ContractError> {
    ledger.mint(CDP_MODULE, principal.clone())?;
    ledger.send_from_module_to_account(CDP_MODULE, owner, vec![principal.clone()])?;
    ledger.mint(CDP_MODULE, coin(principal.amount.u128(), &config.debt_denom))?;
    Ok(())
}

pub fn open_cdp(
    deps: HostDepsMut,
    env: Env,
    owner: Addr,
    collateral: Coin,
    principal: Coin,
    collateral_type: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_circuit_breaker(&config)?;

    validate_collateral(deps.oracle, &config, &collateral, &collateral_type)?;
    if collateral.amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }
    if get_cdp_by_owner_and_type(deps.storage, &owner, &collateral_type)?.is_some() {
        return Err(ContractError::CdpAlreadyExists {
            owner: owner.to_string(),
            collateral_type,
        });
    }
    validate_principal_add(&config, &principal)?;
    validate_debt_floor(&config, principal.amount)?;
    validate_debt_limit(deps.storage, &config, &collateral_type, &principal)?;
    validate_collateralization_ratio(deps.oracle, &config, &collateral, &collateral_type, principal.amount)?;
    validate_balance(deps.ledger, &owner, &collateral)?;

    let id = get_next_cdp_id(deps.storage)?;
    let state = get_collateral_state(deps.storage, &collateral_type)?;
    let cdp = CDP {
        id,
        owner: owner.clone(),
        collateral_type: collateral_type.clone(),
        collateral: collateral.clone(),
        principal: principal.clone(),
        accumulated_fees: coin(0, &principal.denom),
        fees_updated: env.block.time.seconds(),
        interest_factor: state.interest_factor,
    };

    create_cdp(deps.storage, &config, &cdp)?;
    set_deposit(deps.storage, &Deposit { cdp_id: id, depositor: owner.clone(), amount: collateral.clone() })?;
    NEXT_CDP_ID.save(deps.storage, &(id + 1))?;
    change_total_principal(deps.storage, &collateral_type, principal.amount, Uint128::zero())?;

    deps.ledger.send_from_account_to_module(&owner, CDP_MODULE, vec![collateral.clone()])?;
    mint_principal(deps.ledger, &config, &owner, &principal)?;

    Ok(Response::new().add_attributes(vec![
        attr("method", "create_cdp"),
        attr("cdp_id", id.to_string()),
        attr("owner", owner),
        attr("collateral_type", collateral_type),
        attr("collateral", collateral.to_string()),
        attr("principal", principal.to_string()),
    ]))
}

/// Anyone can add collateral to an existing CDP
pub fn deposit_collateral(
    deps: HostDepsMut,
    owner: Addr,
    depositor: Addr,
    collateral: Coin,
    collateral_type: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_circuit_breaker(&config)?;

    validate_collateral(deps.oracle, &config, &collateral, &collateral_type)?;
    if collateral.amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }
    let mut cdp = load_synced_cdp(deps.storage, &owner, &collateral_type)?;
    validate_balance(deps.ledger, &depositor, &collateral)?;

    let deposit = match get_deposit(deps.storage, cdp.id, &depositor)? {
        Some(mut deposit) => {
            deposit.amount.amount = deposit.amount.amount.checked_add(collateral.amount)?;
            deposit
        }
        None => Deposit { cdp_id: cdp.id, depositor: depositor.clone(), amount: collateral.clone() },
    };

    cdp.collateral.amount = cdp.collateral.amount.checked_add(collateral.amount)?;
    update_cdp_and_ratio_index(deps.storage, &config, &cdp)?;
    set_deposit(deps.storage, &deposit)?;

    deps.ledger.send_from_account_to_module(&depositor, CDP_MODULE, vec![collateral.clone()])?;

    Ok(Response::new().add_attributes(vec![
        attr("method", "deposit"),
        attr("cdp_id", cdp.id.to_string()),
        attr("depositor", depositor),
        attr("collateral", collateral.to_string()),
        attr("total_collateral", cdp.collateral.to_string()),
    ]))
}

/// A depositor takes back part of their own deposit, the CDP must stay collateralized
pub fn withdraw_collateral(
    deps: HostDepsMut,
    owner: Addr,
    depositor: Addr,
    collateral: Coin,
    collateral_type: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_circuit_breaker(&config)?;

    validate_collateral(deps.oracle, &config, &collateral, &collateral_type)?;
    if collateral.amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }
    let mut cdp = load_synced_cdp(deps.storage, &owner, &collateral_type)?;
    let mut deposit = get_deposit(deps.storage, cdp.id, &depositor)?.ok_or_else(|| ContractError::DepositNotFound {
        cdp_id: cdp.id,
        depositor: depositor.to_string(),
    })?;
    if collateral.amount > deposit.amount.amount {
        return Err(ContractError::InvalidWithdrawAmount {
            requested: collateral.to_string(),
            deposited: deposit.amount.to_string(),
        });
    }

    cdp.collateral.amount = cdp.collateral.amount.checked_sub(collateral.amount)?;
    validate_collateralization_ratio(deps.oracle, &config, &cdp.collateral, &collateral_type, cdp.total_principal())?;

    update_cdp_and_ratio_index(deps.storage, &config, &cdp)?;
    deposit.amount.amount -= collateral.amount;
    if deposit.amount.amount.is_zero() {
        delete_deposit(deps.storage, cdp.id, &depositor);
    } else {
        set_deposit(deps.storage, &deposit)?;
    }

    deps.ledger.send_from_module_to_account(CDP_MODULE, &depositor, vec![collateral.clone()])?;

    Ok(Response::new().add_attributes(vec![
        attr("method", "withdraw"),
        attr("cdp_id", cdp.id.to_string()),
        attr("depositor", depositor),
        attr("collateral", collateral.to_string()),
        attr("total_collateral", cdp.collateral.to_string()),
    ]))
}

/// Mints more stable coins against an existing CDP
pub fn draw_principal(
    deps: HostDepsMut,
    owner: Addr,
    collateral_type: String,
    principal: Coin,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_circuit_breaker(&config)?;

    let mut cdp = load_synced_cdp(deps.storage, &owner, &collateral_type)?;
    validate_principal_add(&config, &principal)?;
    validate_debt_limit(deps.storage, &config, &collateral_type, &principal)?;

    let new_total = cdp.total_principal().checked_add(principal.amount)?;
    validate_collateralization_ratio(deps.oracle, &config, &cdp.collateral, &collateral_type, new_total)?;

    cdp.principal.amount = cdp.principal.amount.checked_add(principal.amount)?;
    update_cdp_and_ratio_index(deps.storage, &config, &cdp)?;
    change_total_principal(deps.storage, &collateral_type, principal.amount, Uint128::zero())?;

    mint_principal(deps.ledger, &config, &owner, &principal)?;

    Ok(Response::new().add_attributes(vec![
        attr("method", "draw_debt"),
        attr("cdp_id", cdp.id.to_string()),
        attr("principal", principal.to_string()),
        attr("total_debt", new_total.to_string()),
    ]))
}

/// Splits a payment into (fee payment, principal payment).
/// Fees are paid first and the payment is capped at the total debt.
pub fn calculate_payment(total_fees: Uint128, principal: Uint128, payment: Uint128) -> (Uint128, Uint128) {
    let payment = min(payment, principal + total_fees);

    let fee_payment = min(payment, total_fees);
    let principal_payment = payment - fee_payment;

    (fee_payment, principal_payment)
}

/// Pays back debt, fees first. Clearing the whole debt returns every deposit and closes the CDP.
pub fn repay_principal(
    deps: HostDepsMut,
    owner: Addr,
    collateral_type: String,
    payment: Coin,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_circuit_breaker(&config)?;

    validate_payment(&config, &payment)?;
    let mut cdp = load_synced_cdp(deps.storage, &owner, &collateral_type)?;

    let (fee_payment, principal_payment) =
        calculate_payment(cdp.accumulated_fees.amount, cdp.principal.amount, payment.amount);
    let paid = fee_payment + principal_payment;

    cdp.accumulated_fees.amount -= fee_payment;
    cdp.principal.amount -= principal_payment;
    let remaining = cdp.total_principal();
    if !remaining.is_zero() {
        validate_debt_floor(&config, remaining)?;
    }

    let capped_payment = coin(paid.u128(), &payment.denom);
    validate_balance(deps.ledger, &owner, &capped_payment)?;

    //Store first, a stale ratio index fails here before any funds move
    let returned_deposits = if remaining.is_zero() {
        let deposits = get_deposits(deps.storage, cdp.id)?;
        delete_cdp(deps.storage, &config, &cdp)?;
        for deposit in deposits.iter() {
            delete_deposit(deps.storage, cdp.id, &deposit.depositor);
        }
        deposits
    } else {
        update_cdp_and_ratio_index(deps.storage, &config, &cdp)?;
        vec![]
    };
    change_total_principal(deps.storage, &collateral_type, Uint128::zero(), paid)?;

    deps.ledger.send_from_account_to_module(&owner, CDP_MODULE, vec![capped_payment.clone()])?;
    deps.ledger.burn(CDP_MODULE, capped_payment.clone())?;

    //Rounding can leave the module a little short of debt coins
    let debt_to_burn = min(paid, deps.ledger.module_balance(CDP_MODULE, &config.debt_denom));
    if !debt_to_burn.is_zero() {
        deps.ledger.burn(CDP_MODULE, coin(debt_to_burn.u128(), &config.debt_denom))?;
    }
    for deposit in returned_deposits.iter() {
        deps.ledger
            .send_from_module_to_account(CDP_MODULE, &deposit.depositor, vec![deposit.amount.clone()])?;
    }

    let mut attrs = vec![
        attr("method", "repay_debt"),
        attr("cdp_id", cdp.id.to_string()),
        attr("payment", capped_payment.to_string()),
        attr("fees_paid", fee_payment.to_string()),
        attr("remaining_debt", remaining.to_string()),
    ];
    if remaining.is_zero() {
        attrs.push(attr("closed", "true"));
        attrs.push(attr("returned_deposits", returned_deposits.len().to_string()));
    }

    Ok(Response::new().add_attributes(attrs))
}
