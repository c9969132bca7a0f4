use std::collections::HashSet;
use std::str::FromStr;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Decimal, Decimal256, StdError, StdResult, Uint128};

use crate::types::{CollateralParam, DebtParam};

pub const DEFAULT_DEBT_DENOM: &str = "debt";
/// Highest per second stability fee, ~500% APR
pub const MAX_STABILITY_FEE: &str = "1.000000051034942716";
/// Most decimals a denom can have and still fit the 18 decimal fixed point math
pub const MAX_CONVERSION_FACTOR: u32 = 18;

#[cw_serde]
pub struct InstantiateMsg {
    pub owner: Option<String>,
    pub collateral_params: Vec<CollateralParam>,
    pub debt_param: DebtParam,
    pub global_debt_limit: Coin,
    pub surplus_auction_threshold: Uint128,
    pub surplus_auction_lot: Uint128,
    pub debt_auction_threshold: Uint128,
    pub debt_auction_lot: Uint128,
    /// Defaults to "debt"
    pub debt_denom: Option<String>,
    pub gov_denom: String,
}

#[cw_serde]
pub enum ExecuteMsg {
    CreateCdp {
        collateral: Coin,
        principal: Coin,
        collateral_type: String,
    },
    /// Anyone can deposit into any CDP
    Deposit {
        owner: String,
        collateral: Coin,
        collateral_type: String,
    },
    /// Depositors withdraw from their own deposit
    Withdraw {
        owner: String,
        collateral: Coin,
        collateral_type: String,
    },
    DrawDebt {
        collateral_type: String,
        principal: Coin,
    },
    RepayDebt {
        collateral_type: String,
        payment: Coin,
    },
    /// Keeper liquidation of a single CDP
    Liquidate {
        borrower: String,
        collateral_type: String,
    },
    UpdateConfig(UpdateConfig),
}

#[cw_serde]
pub enum QueryMsg {
    /// Returns Config
    Config {},
    /// Returns AugmentedCDP
    Cdp {
        owner: String,
        collateral_type: String,
    },
    /// Returns AugmentedCDP
    CdpById {
        collateral_type: String,
        id: u64,
    },
    /// Returns Vec<AugmentedCDP>
    Cdps {
        collateral_type: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// CDPs whose collateralization under the liquidation market is below `ratio`.
    /// Returns Vec<AugmentedCDP>
    CdpsByRatio {
        collateral_type: String,
        ratio: Decimal256,
        limit: Option<u32>,
    },
    /// Returns Vec<Deposit>
    Deposits {
        owner: String,
        collateral_type: String,
    },
    /// Returns Vec<TotalPrincipalResponse>
    TotalPrincipal {
        collateral_type: Option<String>,
    },
    /// Returns CollateralState
    CollateralState {
        collateral_type: String,
    },
}

#[cw_serde]
pub struct Config {
    pub owner: Addr,
    pub collateral_params: Vec<CollateralParam>,
    pub debt_param: DebtParam,
    pub global_debt_limit: Coin,
    /// Liquidator surplus that triggers a surplus auction
    pub surplus_auction_threshold: Uint128,
    pub surplus_auction_lot: Uint128,
    /// Liquidator debt that triggers a debt auction
    pub debt_auction_threshold: Uint128,
    pub debt_auction_lot: Uint128,
    /// Halts all position changes
    pub circuit_breaker: bool,
    /// Internal accounting coin minted alongside principal
    pub debt_denom: String,
    /// Token minted by debt auctions and bought by surplus auctions
    pub gov_denom: String,
}

#[cw_serde]
pub struct UpdateConfig {
    pub owner: Option<String>,
    pub collateral_params: Option<Vec<CollateralParam>>,
    pub debt_param: Option<DebtParam>,
    pub global_debt_limit: Option<Coin>,
    pub surplus_auction_threshold: Option<Uint128>,
    pub surplus_auction_lot: Option<Uint128>,
    pub debt_auction_threshold: Option<Uint128>,
    pub debt_auction_lot: Option<Uint128>,
    pub circuit_breaker: Option<bool>,
}

#[cw_serde]
pub struct TotalPrincipalResponse {
    pub collateral_type: String,
    pub amount: Coin,
}

impl Config {
    pub fn get_collateral(&self, collateral_type: &str) -> Option<&CollateralParam> {
        self.collateral_params
            .iter()
            .find(|param| param.collateral_type == collateral_type)
    }

    pub fn validate(&self) -> StdResult<()> {
        if self.debt_param.denom.is_empty() || self.debt_denom.is_empty() || self.gov_denom.is_empty() {
            return Err(StdError::generic_err("Denoms can't be empty"));
        }
        if self.debt_denom == self.debt_param.denom || self.gov_denom == self.debt_param.denom {
            return Err(StdError::generic_err(format!(
                "Debt denom {} and gov denom {} must differ from the stable denom {}",
                self.debt_denom, self.gov_denom, self.debt_param.denom
            )));
        }
        if self.global_debt_limit.denom != self.debt_param.denom {
            return Err(StdError::generic_err(format!(
                "Global debt limit denom {} doesn't match debt param denom {}",
                self.global_debt_limit.denom, self.debt_param.denom
            )));
        }
        validate_debt_param(&self.debt_param)?;

        let mut collateral_types: HashSet<String> = HashSet::new();
        let mut collateral_limits = Uint128::zero();
        for param in self.collateral_params.iter() {
            if !collateral_types.insert(param.collateral_type.clone()) {
                return Err(StdError::generic_err(format!(
                    "Duplicate collateral type: {}",
                    param.collateral_type
                )));
            }
            if param.debt_limit.denom != self.global_debt_limit.denom {
                return Err(StdError::generic_err(format!(
                    "Collateral debt limit denom {} doesn't match global debt limit denom {}",
                    param.debt_limit.denom, self.global_debt_limit.denom
                )));
            }
            validate_collateral_param(param)?;
            collateral_limits = collateral_limits.checked_add(param.debt_limit.amount)?;
        }
        if collateral_limits > self.global_debt_limit.amount {
            return Err(StdError::generic_err(format!(
                "Sum of collateral debt limits {} exceeds the global debt limit {}",
                collateral_limits, self.global_debt_limit
            )));
        }

        for (name, value) in [
            ("surplus_auction_threshold", self.surplus_auction_threshold),
            ("surplus_auction_lot", self.surplus_auction_lot),
            ("debt_auction_threshold", self.debt_auction_threshold),
            ("debt_auction_lot", self.debt_auction_lot),
        ] {
            if value.is_zero() {
                return Err(StdError::generic_err(format!("{} must be positive", name)));
            }
        }

        Ok(())
    }
}

fn validate_collateral_param(param: &CollateralParam) -> StdResult<()> {
    if param.collateral_type.is_empty() || param.denom.is_empty() {
        return Err(StdError::generic_err("Collateral type and denom can't be empty"));
    }
    if param.spot_market_id.is_empty() || param.liquidation_market_id.is_empty() {
        return Err(StdError::generic_err(format!(
            "Market ids of {} can't be empty",
            param.collateral_type
        )));
    }
    if param.liquidation_ratio.is_zero() {
        return Err(StdError::generic_err(format!(
            "Liquidation ratio of {} must be positive",
            param.collateral_type
        )));
    }
    if param.liquidation_penalty > Decimal::one() {
        return Err(StdError::generic_err(format!(
            "Liquidation penalty of {} must be between 0 and 1",
            param.collateral_type
        )));
    }
    if param.keeper_reward_percentage > Decimal::one() {
        return Err(StdError::generic_err(format!(
            "Keeper reward of {} must be between 0 and 1",
            param.collateral_type
        )));
    }
    if param.auction_size.is_zero() {
        return Err(StdError::generic_err(format!(
            "Auction size of {} must be positive",
            param.collateral_type
        )));
    }
    let max_fee = Decimal::from_str(MAX_STABILITY_FEE)?;
    if param.stability_fee < Decimal::one() || param.stability_fee > max_fee {
        return Err(StdError::generic_err(format!(
            "Stability fee of {} must be between 1 and {}, got {}",
            param.collateral_type, max_fee, param.stability_fee
        )));
    }
    if param.conversion_factor > MAX_CONVERSION_FACTOR {
        return Err(StdError::generic_err(format!(
            "Conversion factor of {} can't exceed {}",
            param.collateral_type, MAX_CONVERSION_FACTOR
        )));
    }

    Ok(())
}

fn validate_debt_param(param: &DebtParam) -> StdResult<()> {
    if param.savings_rate > Decimal::one() {
        return Err(StdError::generic_err("Savings rate must be between 0 and 1"));
    }
    if param.conversion_factor > MAX_CONVERSION_FACTOR {
        return Err(StdError::generic_err(format!(
            "Debt conversion factor can't exceed {}",
            MAX_CONVERSION_FACTOR
        )));
    }

    Ok(())
}
