use cosmwasm_std::{Decimal256, OverflowError, StdError};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("{0}")]
    Auction(#[from] auction::ContractError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Circuit breaker is on, positions can't be changed")]
    CircuitBreaker {},

    #[error("Collateral type {collateral_type} isn't supported")]
    CollateralNotSupported { collateral_type: String },

    #[error("Invalid collateral: {msg}")]
    InvalidCollateral { msg: String },

    #[error("Pricefeed {market_id} is down")]
    PricefeedDown { market_id: String },

    #[error("Insufficient balance: {address} needs {required}")]
    InsufficientBalance { address: String, required: String },

    #[error("{owner} already has a {collateral_type} CDP")]
    CdpAlreadyExists { owner: String, collateral_type: String },

    #[error("{owner} has no {collateral_type} CDP")]
    CdpNotFound { owner: String, collateral_type: String },

    #[error("CDP {id} of type {collateral_type} doesn't exist")]
    CdpIdNotFound { collateral_type: String, id: u64 },

    #[error("{depositor} has no deposit in CDP {cdp_id}")]
    DepositNotFound { cdp_id: u64, depositor: String },

    #[error("Withdrawal of {requested} exceeds deposit of {deposited}")]
    InvalidWithdrawAmount { requested: String, deposited: String },

    #[error("Debt denom {denom} isn't supported")]
    DebtNotSupported { denom: String },

    #[error("Amounts must be positive")]
    ZeroAmount {},

    #[error("Proposed debt {proposed} is below the debt floor {minimum}")]
    BelowDebtFloor { proposed: String, minimum: String },

    #[error("Debt limit exceeded: {msg}")]
    ExceedsDebtLimit { msg: String },

    #[error("Collateral ratio {ratio} is below the liquidation ratio {liquidation_ratio}")]
    InvalidCollateralRatio { ratio: Decimal256, liquidation_ratio: Decimal256 },

    #[error("Invalid payment: {msg}")]
    InvalidPayment { msg: String },

    #[error("CDP is not liquidatable, collateral ratio {ratio} >= liquidation ratio {liquidation_ratio}")]
    NotLiquidatable { ratio: Decimal256, liquidation_ratio: Decimal256 },

    #[error("Invariant violated: {msg}")]
    InvariantViolation { msg: String },
}
