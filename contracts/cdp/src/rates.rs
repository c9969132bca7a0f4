use cosmwasm_std::{attr, coin, Attribute, Decimal, Decimal256, Env, StdResult, Storage, Uint128, Uint256};

use ballast::cdp::Config;
use ballast::host::{Ledger, CDP_MODULE, LIQUIDATOR_MODULE, SAVINGS_MODULE};
use ballast::math::{decimal_multiplication, multiply_and_round, round_half_even, uint_to_decimal, DECIMAL_FRACTIONAL};
use ballast::types::{CollateralState, CDP};

use crate::risk_engine::get_collateral_param;
use crate::state::{get_cdps_below_ratio, get_collateral_state, max_sortable_ratio, update_cdp_and_ratio_index, COLLATERAL_STATE};
use crate::ContractError;

/// rate^seconds by squaring on 18 decimal fixed point integers, each product rounded half up
pub fn calculate_interest_factor(per_second_rate: Decimal, seconds: u64) -> StdResult<Decimal256> {
    let base = Uint256::from(DECIMAL_FRACTIONAL);
    let half = Uint256::from(DECIMAL_FRACTIONAL / 2);

    let mut x = Uint256::from(per_second_rate.atomics());
    if x.is_zero() {
        return Ok(if seconds == 0 { Decimal256::one() } else { Decimal256::zero() });
    }
    let mut z = if seconds % 2 == 0 { base } else { x };
    let mut n = seconds / 2;

    while n > 0 {
        x = x.checked_mul(x)?.checked_add(half)?.checked_div(base)?;
        if n % 2 == 1 {
            z = z.checked_mul(x)?.checked_add(half)?.checked_div(base)?;
        }
        n /= 2;
    }

    Ok(Decimal256::new(z))
}

/// Outcome of compounding one collateral type's debt
#[derive(Clone, Debug, PartialEq)]
pub struct Accrual {
    pub state: CollateralState,
    /// Newly owed interest, zero if nothing accrued
    pub interest: Uint128,
}

/// Compounds the type's total principal from the previous accrual time up to `now`.
/// Interest that rounds to zero leaves the state untouched, so the time keeps running.
pub fn accrue(state: &CollateralState, stability_fee: Decimal, now: u64) -> Result<Accrual, ContractError> {
    let unchanged = Accrual { state: state.clone(), interest: Uint128::zero() };

    let previous = match state.previous_accrual_time {
        Some(previous) => previous,
        None => {
            return Ok(Accrual {
                state: CollateralState { previous_accrual_time: Some(now), ..state.clone() },
                interest: Uint128::zero(),
            })
        }
    };
    let elapsed = now.saturating_sub(previous);
    if elapsed == 0 {
        return Ok(unchanged);
    }
    if state.total_principal.is_zero() || stability_fee == Decimal::one() {
        return Ok(Accrual {
            state: CollateralState { previous_accrual_time: Some(now), ..state.clone() },
            interest: Uint128::zero(),
        });
    }

    let factor = calculate_interest_factor(stability_fee, elapsed)?;
    let new_total = round_half_even(decimal_multiplication(uint_to_decimal(state.total_principal)?, factor)?)?;
    let interest = new_total.saturating_sub(state.total_principal);
    if interest.is_zero() {
        return Ok(unchanged);
    }

    Ok(Accrual {
        state: CollateralState {
            total_principal: new_total,
            interest_factor: decimal_multiplication(state.interest_factor, factor)?,
            previous_accrual_time: Some(now),
        },
        interest,
    })
}

/// Accrues a collateral type and mints the interest.
/// Debt coins go to the cdp module, the stable coins are split between savings and the liquidator's surplus.
pub fn accumulate_interest(
    storage: &mut dyn Storage,
    ledger: &mut dyn Ledger,
    env: &Env,
    config: &Config,
    collateral_type: &str,
) -> Result<Vec<Attribute>, ContractError> {
    let param = get_collateral_param(config, collateral_type)?;
    let state = get_collateral_state(storage, collateral_type)?;

    let accrual = accrue(&state, param.stability_fee, env.block.time.seconds())?;
    if accrual.state == state {
        return Ok(vec![]);
    }

    let mut attrs = vec![];
    if !accrual.interest.is_zero() {
        let savings = multiply_and_round(accrual.interest, config.debt_param.savings_rate)?;
        let surplus = accrual.interest - savings;

        ledger.mint(CDP_MODULE, coin(accrual.interest.u128(), &config.debt_denom))?;
        if !savings.is_zero() {
            ledger.mint(SAVINGS_MODULE, coin(savings.u128(), &config.debt_param.denom))?;
        }
        if !surplus.is_zero() {
            ledger.mint(LIQUIDATOR_MODULE, coin(surplus.u128(), &config.debt_param.denom))?;
        }

        attrs = vec![
            attr("accrued_interest", format!("{}:{}", collateral_type, accrual.interest)),
            attr("interest_factor", format!("{}:{}", collateral_type, accrual.state.interest_factor)),
            attr("savings", savings.to_string()),
            attr("surplus", surplus.to_string()),
        ];
    }
    COLLATERAL_STATE.save(storage, collateral_type, &accrual.state)?;

    Ok(attrs)
}

/// Brings a CDP's fees up to the collateral type's interest factor.
/// `fees_updated` becomes the type's last accrual time, which is when that factor was computed,
/// rather than the current block time.
/// Nothing is stored, the caller persists the result.
pub fn synchronize_interest(cdp: &CDP, state: &CollateralState) -> Result<CDP, ContractError> {
    if cdp.interest_factor < Decimal256::one() {
        return Err(ContractError::InvariantViolation {
            msg: format!("CDP {} has interest factor {} below one", cdp.id, cdp.interest_factor),
        });
    }
    if cdp.interest_factor == state.interest_factor {
        return Ok(cdp.clone());
    }

    let new_total = round_half_even(decimal_multiplication(cdp.normalized_principal()?, state.interest_factor)?)?;
    let interest = new_total.saturating_sub(cdp.total_principal());

    let mut synced = cdp.clone();
    synced.fees_updated = state.previous_accrual_time.unwrap_or(cdp.fees_updated);
    //Dust stays owed under the old factor until it rounds up
    if !interest.is_zero() {
        synced.accumulated_fees.amount = synced.accumulated_fees.amount.checked_add(interest)?;
        synced.interest_factor = state.interest_factor;
    }

    Ok(synced)
}

/// Syncs a stored CDP and writes it back if its fees moved
pub fn sync_stored_cdp(storage: &mut dyn Storage, config: &Config, cdp: &CDP) -> Result<CDP, ContractError> {
    let state = get_collateral_state(storage, &cdp.collateral_type)?;
    let synced = synchronize_interest(cdp, &state)?;
    if synced != *cdp {
        update_cdp_and_ratio_index(storage, config, &synced)?;
    }
    Ok(synced)
}

/// Syncs the `count` lowest entries of the ratio index so their keys include accrued fees
pub fn synchronize_interest_for_risky_cdps(
    storage: &mut dyn Storage,
    config: &Config,
    collateral_type: &str,
    count: usize,
) -> Result<usize, ContractError> {
    let cdps = get_cdps_below_ratio(storage, collateral_type, max_sortable_ratio(), count)?;
    let mut synced = 0;
    for cdp in cdps {
        if sync_stored_cdp(storage, config, &cdp)? != cdp {
            synced += 1;
        }
    }
    Ok(synced)
}
