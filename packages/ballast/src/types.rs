use std::fmt;

use cosmwasm_std::{Addr, Coin, Decimal, Decimal256, StdError, StdResult, Uint128};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::math::{decimal_division, uint_to_decimal};

/// Risk parameters of one collateral type
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct CollateralParam {
    pub denom: String,
    /// Unique name, several types can share a denom
    pub collateral_type: String,
    /// Collateral value / debt value below which a CDP can be liquidated
    pub liquidation_ratio: Decimal,
    pub debt_limit: Coin,
    /// Per second interest factor, ie. 1.000000001547125958 ~ 5% APR
    pub stability_fee: Decimal,
    /// Max collateral amount per collateral auction
    pub auction_size: Uint128,
    pub liquidation_penalty: Decimal,
    pub spot_market_id: String,
    /// Market (usually a TWAP) used to decide liquidations
    pub liquidation_market_id: String,
    pub keeper_reward_percentage: Decimal,
    /// Ratio index entries checked per collateral type each block
    pub check_collateralization_index_count: u32,
    /// Decimals of the collateral denom
    pub conversion_factor: u32,
}

/// Parameters of the minted stable asset
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct DebtParam {
    pub denom: String,
    pub reference_asset: String,
    pub conversion_factor: u32,
    /// Minimum non-zero principal a CDP can hold
    pub debt_floor: Uint128,
    /// Share of accrued interest minted to the savings module
    pub savings_rate: Decimal,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct CDP {
    pub id: u64,
    pub owner: Addr,
    pub collateral_type: String,
    pub collateral: Coin,
    pub principal: Coin,
    pub accumulated_fees: Coin,
    pub fees_updated: u64,
    /// Global interest factor of the collateral type as of `fees_updated`
    pub interest_factor: Decimal256,
}

impl CDP {
    pub fn total_principal(&self) -> Uint128 {
        self.principal.amount + self.accumulated_fees.amount
    }

    /// Debt divided by the CDP's interest factor
    pub fn normalized_principal(&self) -> StdResult<Decimal256> {
        if self.interest_factor < Decimal256::one() {
            return Err(StdError::generic_err(format!(
                "CDP {} has interest factor {} below one",
                self.id, self.interest_factor
            )));
        }
        decimal_division(uint_to_decimal(self.total_principal())?, self.interest_factor)
    }
}

impl fmt::Display for CDP {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "CDP {} ({}) owner: {} collateral: {} principal: {} fees: {}",
            self.id, self.collateral_type, self.owner, self.collateral, self.principal, self.accumulated_fees
        )
    }
}

/// Collateral a single depositor locked in a CDP
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct Deposit {
    pub cdp_id: u64,
    pub depositor: Addr,
    pub amount: Coin,
}

/// Accrual state of one collateral type
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct CollateralState {
    pub total_principal: Uint128,
    /// Compounded interest since the type was added, never decreases
    pub interest_factor: Decimal256,
    pub previous_accrual_time: Option<u64>,
}

impl Default for CollateralState {
    fn default() -> Self {
        CollateralState {
            total_principal: Uint128::zero(),
            interest_factor: Decimal256::one(),
            previous_accrual_time: None,
        }
    }
}

/// Addresses with relative weights, used to return unsold collateral
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct WeightedAddresses {
    pub addresses: Vec<Addr>,
    pub weights: Vec<Uint128>,
}

impl WeightedAddresses {
    pub fn validate(&self) -> StdResult<()> {
        if self.addresses.is_empty() {
            return Err(StdError::generic_err("Must be at least 1 weighted address"));
        }
        if self.addresses.len() != self.weights.len() {
            return Err(StdError::generic_err(format!(
                "Number of addresses ({}) doesn't match number of weights ({})",
                self.addresses.len(),
                self.weights.len()
            )));
        }
        if self.weights.iter().any(|weight| weight.is_zero()) {
            return Err(StdError::generic_err("Weights must be positive"));
        }

        Ok(())
    }
}

/// CDP with its value and collateralization under the liquidation market
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct AugmentedCDP {
    pub cdp: CDP,
    pub collateral_value: Coin,
    pub collateralization_ratio: Decimal256,
}
