use std::cmp::Ordering;
use std::convert::TryFrom;

use cosmwasm_std::{Decimal, Decimal256, StdError, StdResult, Uint128, Uint256};

pub const DECIMAL_FRACTIONAL: u128 = 1_000_000_000_000_000_000u128;

fn fractional() -> Uint256 {
    Uint256::from(DECIMAL_FRACTIONAL)
}

/// Smallest representable decimal, 10^-18
pub fn smallest_decimal() -> Decimal256 {
    Decimal256::new(Uint256::one())
}

pub fn decimal_multiplication(a: Decimal256, b: Decimal256) -> StdResult<Decimal256> {
    let product = a.atomics().checked_mul(b.atomics())?;

    Ok(Decimal256::new(product.checked_div(fractional())?))
}

pub fn decimal_division(a: Decimal256, b: Decimal256) -> StdResult<Decimal256> {
    if b.is_zero() {
        return Err(StdError::generic_err(format!("Cannot divide {} by zero", a)));
    }
    let numerator = a.atomics().checked_mul(fractional())?;

    Ok(Decimal256::new(numerator.checked_div(b.atomics())?))
}

pub fn decimal_subtraction(a: Decimal256, b: Decimal256) -> StdResult<Decimal256> {
    Ok(Decimal256::new(a.atomics().checked_sub(b.atomics())?))
}

/// Whole units as a Decimal256
pub fn uint_to_decimal(amount: Uint128) -> StdResult<Decimal256> {
    Ok(Decimal256::new(Uint256::from(amount).checked_mul(fractional())?))
}

/// Converts an amount of internal units to base units, ie. divides by 10^conversion_factor
pub fn to_base_units(amount: Uint128, conversion_factor: u32) -> StdResult<Decimal256> {
    Decimal256::from_atomics(amount, conversion_factor)
        .map_err(|err| StdError::generic_err(format!("{} (conversion factor {})", err, conversion_factor)))
}

/// Rounds to the nearest integer, ties to even
pub fn round_half_even(value: Decimal256) -> StdResult<Uint128> {
    let quotient = value.atomics().checked_div(fractional())?;
    let remainder = value.atomics().checked_sub(quotient.checked_mul(fractional())?)?;
    let half = Uint256::from(DECIMAL_FRACTIONAL / 2);

    let rounded = match remainder.cmp(&half) {
        Ordering::Greater => quotient.checked_add(Uint256::one())?,
        Ordering::Less => quotient,
        Ordering::Equal => {
            let is_odd = quotient.checked_rem(Uint256::from(2u8))? == Uint256::one();
            if is_odd { quotient.checked_add(Uint256::one())? } else { quotient }
        }
    };

    Ok(Uint128::try_from(rounded)?)
}

/// amount * ratio, rounded half to even
pub fn multiply_and_round(amount: Uint128, ratio: Decimal) -> StdResult<Uint128> {
    let product = decimal_multiplication(uint_to_decimal(amount)?, Decimal256::from(ratio))?;

    round_half_even(product)
}

/// amount * ratio, rounded down
pub fn multiply_and_floor(amount: Uint128, ratio: Decimal) -> StdResult<Uint128> {
    let product = decimal_multiplication(uint_to_decimal(amount)?, Decimal256::from(ratio))?;

    Ok(Uint128::try_from(product.atomics().checked_div(fractional())?)?)
}

/// Splits `amount` into buckets proportional to `weights`.
/// Whole-number parts are allotted first, the leftover units go one each
/// to the buckets with the largest remainders (ties go to the lower index).
pub fn split_into_weighted_buckets(amount: Uint128, weights: &[Uint128]) -> StdResult<Vec<Uint128>> {
    if weights.is_empty() {
        return Err(StdError::generic_err("No buckets to split into"));
    }
    let total_weight = weights
        .iter()
        .try_fold(Uint256::zero(), |acc, weight| acc.checked_add(Uint256::from(*weight)))?;
    if total_weight.is_zero() {
        return Err(StdError::generic_err("Bucket weights sum to zero"));
    }

    //(index, quotient, remainder)
    let mut quotients: Vec<(usize, Uint256, Uint256)> = vec![];
    for (index, weight) in weights.iter().enumerate() {
        let scaled = Uint256::from(amount).checked_mul(Uint256::from(*weight))?;
        let quotient = scaled.checked_div(total_weight)?;
        let remainder = scaled.checked_sub(quotient.checked_mul(total_weight)?)?;
        quotients.push((index, quotient, remainder));
    }

    let allocated = quotients
        .iter()
        .try_fold(Uint256::zero(), |acc, (_, quotient, _)| acc.checked_add(*quotient))?;
    let mut left_to_allocate = Uint256::from(amount).checked_sub(allocated)?;

    quotients.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

    let mut results = vec![Uint128::zero(); weights.len()];
    for (index, quotient, _) in quotients {
        let mut share = quotient;
        if !left_to_allocate.is_zero() {
            share = share.checked_add(Uint256::one())?;
            left_to_allocate = left_to_allocate.checked_sub(Uint256::one())?;
        }
        results[index] = Uint128::try_from(share)?;
    }

    Ok(results)
}
