#![allow(clippy::too_many_arguments)]
pub mod contract;
mod error;
pub mod liquidations;
pub mod positions;
pub mod query;
pub mod rates;
pub mod risk_engine;
pub mod state;

pub use crate::error::ContractError;

#[cfg(test)]
pub mod testing;
