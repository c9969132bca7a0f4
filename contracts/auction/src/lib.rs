#![allow(clippy::too_many_arguments)]
pub mod auctions;
pub mod bidding;
pub mod contract;
mod error;
pub mod query;
pub mod state;

pub use crate::error::ContractError;

#[cfg(test)]
pub mod testing;
