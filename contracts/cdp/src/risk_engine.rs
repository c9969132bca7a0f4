use std::cmp::min;

use cosmwasm_std::{Addr, Coin, Decimal, Decimal256, Storage, Uint128};

use ballast::cdp::Config;
use ballast::host::{Ledger, Oracle};
use ballast::math::{decimal_division, decimal_multiplication, smallest_decimal, to_base_units};
use ballast::types::{CollateralParam, CDP};

use crate::state::{get_collateral_state, max_sortable_ratio};
use crate::ContractError;

/// Which market prices a collateral type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PricefeedType {
    Spot,
    Liquidation,
}

pub fn get_collateral_param<'a>(config: &'a Config, collateral_type: &str) -> Result<&'a CollateralParam, ContractError> {
    config
        .get_collateral(collateral_type)
        .ok_or_else(|| ContractError::CollateralNotSupported { collateral_type: collateral_type.to_string() })
}

pub fn assert_circuit_breaker(config: &Config) -> Result<(), ContractError> {
    if config.circuit_breaker {
        return Err(ContractError::CircuitBreaker {});
    }
    Ok(())
}

pub fn market_id(param: &CollateralParam, feed: PricefeedType) -> &str {
    match feed {
        PricefeedType::Spot => &param.spot_market_id,
        PricefeedType::Liquidation => &param.liquidation_market_id,
    }
}

pub fn get_price(oracle: &dyn Oracle, param: &CollateralParam, feed: PricefeedType) -> Result<Decimal, ContractError> {
    let market_id = market_id(param, feed);
    oracle
        .current_price(market_id)
        .map_err(|_| ContractError::PricefeedDown { market_id: market_id.to_string() })
}

/// Collateral must be the type's denom and the type must be priced by both markets
pub fn validate_collateral(
    oracle: &dyn Oracle,
    config: &Config,
    collateral: &Coin,
    collateral_type: &str,
) -> Result<(), ContractError> {
    let param = get_collateral_param(config, collateral_type)?;
    if param.denom != collateral.denom {
        return Err(ContractError::InvalidCollateral {
            msg: format!("Collateral type {} takes {}, got {}", collateral_type, param.denom, collateral.denom),
        });
    }
    for feed in [PricefeedType::Spot, PricefeedType::Liquidation] {
        let id = market_id(param, feed);
        if !oracle.market_is_live(id) {
            return Err(ContractError::PricefeedDown { market_id: id.to_string() });
        }
    }
    Ok(())
}

pub fn validate_balance(ledger: &dyn Ledger, owner: &Addr, amount: &Coin) -> Result<(), ContractError> {
    if ledger.spendable_balance(owner, &amount.denom) < amount.amount {
        return Err(ContractError::InsufficientBalance {
            address: owner.to_string(),
            required: amount.to_string(),
        });
    }
    Ok(())
}

/// Principal added by a draw must be the stable denom and non-zero
pub fn validate_principal_add(config: &Config, principal: &Coin) -> Result<(), ContractError> {
    if principal.denom != config.debt_param.denom {
        return Err(ContractError::DebtNotSupported { denom: principal.denom.clone() });
    }
    if principal.amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }
    Ok(())
}

pub fn validate_debt_floor(config: &Config, total_debt: Uint128) -> Result<(), ContractError> {
    if total_debt < config.debt_param.debt_floor {
        return Err(ContractError::BelowDebtFloor {
            proposed: total_debt.to_string(),
            minimum: config.debt_param.debt_floor.to_string(),
        });
    }
    Ok(())
}

/// A payment must be in the stable denom and positive
pub fn validate_payment(config: &Config, payment: &Coin) -> Result<(), ContractError> {
    if payment.denom != config.debt_param.denom {
        return Err(ContractError::InvalidPayment {
            msg: format!("Payment must be {}, got {}", config.debt_param.denom, payment.denom),
        });
    }
    if payment.amount.is_zero() {
        return Err(ContractError::InvalidPayment { msg: String::from("Payment must be positive") });
    }
    Ok(())
}

/// Both the collateral type's and the global debt limit must hold after adding `principal`
pub fn validate_debt_limit(
    storage: &dyn Storage,
    config: &Config,
    collateral_type: &str,
    principal: &Coin,
) -> Result<(), ContractError> {
    let param = get_collateral_param(config, collateral_type)?;

    let type_total = get_collateral_state(storage, collateral_type)?.total_principal;
    let proposed = type_total.checked_add(principal.amount)?;
    if proposed > param.debt_limit.amount {
        return Err(ContractError::ExceedsDebtLimit {
            msg: format!(
                "Proposed {} debt {} exceeds the limit {}",
                collateral_type, proposed, param.debt_limit.amount
            ),
        });
    }

    let mut global_total = Uint128::zero();
    for param in config.collateral_params.iter() {
        global_total = global_total.checked_add(get_collateral_state(storage, &param.collateral_type)?.total_principal)?;
    }
    let proposed = global_total.checked_add(principal.amount)?;
    if proposed > config.global_debt_limit.amount {
        return Err(ContractError::ExceedsDebtLimit {
            msg: format!(
                "Proposed global debt {} exceeds the limit {}",
                proposed, config.global_debt_limit.amount
            ),
        });
    }
    Ok(())
}

/// Collateral in base units divided by debt in base units, unpriced.
/// Debt-free positions sort just under the largest key.
pub fn calculate_collateral_to_debt_ratio(
    config: &Config,
    collateral: &Coin,
    collateral_type: &str,
    debt: Uint128,
) -> Result<Decimal256, ContractError> {
    let param = get_collateral_param(config, collateral_type)?;
    let max_ratio = max_sortable_ratio() - smallest_decimal();

    let debt_base = to_base_units(debt, config.debt_param.conversion_factor)?;
    if debt_base.is_zero() {
        return Ok(max_ratio);
    }
    let collateral_base = to_base_units(collateral.amount, param.conversion_factor)?;

    let ratio = match decimal_division(collateral_base, debt_base) {
        Ok(ratio) => ratio,
        //Overflow, ie. dust debt against huge collateral
        Err(_) => max_ratio,
    };
    Ok(min(ratio, max_ratio))
}

pub fn cdp_collateral_to_debt_ratio(config: &Config, cdp: &CDP) -> Result<Decimal256, ContractError> {
    calculate_collateral_to_debt_ratio(config, &cdp.collateral, &cdp.collateral_type, cdp.total_principal())
}

/// Value of the collateral in the stable denom's base units
pub fn collateral_value(
    oracle: &dyn Oracle,
    config: &Config,
    collateral: &Coin,
    collateral_type: &str,
    feed: PricefeedType,
) -> Result<Decimal256, ContractError> {
    let param = get_collateral_param(config, collateral_type)?;
    let price = get_price(oracle, param, feed)?;

    Ok(decimal_multiplication(
        to_base_units(collateral.amount, param.conversion_factor)?,
        Decimal256::from(price),
    )?)
}

/// Collateral value divided by debt value; zero debt is reported as the largest ratio
pub fn calculate_collateralization_ratio(
    oracle: &dyn Oracle,
    config: &Config,
    collateral: &Coin,
    collateral_type: &str,
    debt: Uint128,
    feed: PricefeedType,
) -> Result<Decimal256, ContractError> {
    let value = collateral_value(oracle, config, collateral, collateral_type, feed)?;
    let debt_base = to_base_units(debt, config.debt_param.conversion_factor)?;
    if debt_base.is_zero() {
        return Ok(Decimal256::MAX);
    }
    Ok(decimal_division(value, debt_base)?)
}

/// The collateralization ratio after a change must be at least the liquidation ratio (spot market)
pub fn validate_collateralization_ratio(
    oracle: &dyn Oracle,
    config: &Config,
    collateral: &Coin,
    collateral_type: &str,
    debt: Uint128,
) -> Result<(), ContractError> {
    let param = get_collateral_param(config, collateral_type)?;
    let ratio = calculate_collateralization_ratio(oracle, config, collateral, collateral_type, debt, PricefeedType::Spot)?;
    let liquidation_ratio = Decimal256::from(param.liquidation_ratio);

    if ratio < liquidation_ratio {
        return Err(ContractError::InvalidCollateralRatio { ratio, liquidation_ratio });
    }
    Ok(())
}

/// Collateral to debt ratio below which a CDP is undercollateralized at `price`:
/// liquidation_ratio / price
pub fn liquidation_threshold(price: Decimal, liquidation_ratio: Decimal) -> Result<Decimal256, ContractError> {
    let price_per_ratio = decimal_division(Decimal256::from(price), Decimal256::from(liquidation_ratio))?;
    let price_per_ratio = if price_per_ratio.is_zero() { smallest_decimal() } else { price_per_ratio };

    match decimal_division(Decimal256::one(), price_per_ratio) {
        Ok(threshold) => Ok(threshold),
        Err(_) => Ok(max_sortable_ratio()),
    }
}
