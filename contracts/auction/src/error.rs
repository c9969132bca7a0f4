use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Auction {id} doesn't exist")]
    AuctionNotFound { id: u64 },

    #[error("Auction {id} has expired")]
    AuctionExpired { id: u64 },

    #[error("Auction {id} can't close before {end_time}")]
    AuctionNotExpired { id: u64, end_time: u64 },

    #[error("Invalid bid denom: expected {expected}, got {got}")]
    InvalidBidDenom { expected: String, got: String },

    #[error("Invalid lot denom: expected {expected}, got {got}")]
    InvalidLotDenom { expected: String, got: String },

    #[error("Bid too small: {msg}")]
    BidTooSmall { msg: String },

    #[error("Bid too large: {msg}")]
    BidTooLarge { msg: String },

    #[error("Insufficient balance: {bidder} needs {required}")]
    InsufficientBalance { bidder: String, required: String },

    #[error("Invalid auction: {msg}")]
    InvalidAuction { msg: String },
}
