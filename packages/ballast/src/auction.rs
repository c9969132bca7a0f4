use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Decimal, StdError, StdResult};

use crate::types::WeightedAddresses;

pub const DEFAULT_MAX_AUCTION_DURATION: u64 = 2 * 24 * 60 * 60;
pub const DEFAULT_BID_DURATION: u64 = 60 * 60;

#[cw_serde]
pub struct InstantiateMsg {
    pub owner: Option<String>,
    pub max_auction_duration: Option<u64>,
    pub bid_duration: Option<u64>,
    pub increment_surplus: Option<Decimal>,
    pub increment_debt: Option<Decimal>,
    pub increment_collateral: Option<Decimal>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Bid on the auction. `amount` is the bid for Surplus and forward Collateral
    /// auctions, the requested lot for Debt and reverse Collateral auctions.
    PlaceBid {
        auction_id: u64,
        amount: Coin,
    },
    UpdateConfig(UpdateConfig),
}

#[cw_serde]
pub enum QueryMsg {
    /// Returns Config
    Config {},
    /// Returns Auction
    Auction { auction_id: u64 },
    /// Returns Vec<Auction>
    Auctions {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
}

#[cw_serde]
pub struct Config {
    pub owner: Addr,
    /// Longest an auction can run, in seconds
    pub max_auction_duration: u64,
    /// Each bid extends the auction to now + bid_duration (capped at the max end time)
    pub bid_duration: u64,
    pub increment_surplus: Decimal,
    pub increment_debt: Decimal,
    pub increment_collateral: Decimal,
}

impl Config {
    pub fn validate(&self) -> StdResult<()> {
        if self.max_auction_duration == 0 || self.bid_duration == 0 {
            return Err(StdError::generic_err("Auction durations must be positive"));
        }
        if self.bid_duration > self.max_auction_duration {
            return Err(StdError::generic_err(format!(
                "Bid duration {} can't exceed max auction duration {}",
                self.bid_duration, self.max_auction_duration
            )));
        }
        for increment in [self.increment_surplus, self.increment_debt, self.increment_collateral] {
            if increment > Decimal::one() {
                return Err(StdError::generic_err(format!(
                    "Increment {} must be between 0 and 1",
                    increment
                )));
            }
        }

        Ok(())
    }
}

#[cw_serde]
pub struct UpdateConfig {
    pub owner: Option<String>,
    pub max_auction_duration: Option<u64>,
    pub bid_duration: Option<u64>,
    pub increment_surplus: Option<Decimal>,
    pub increment_debt: Option<Decimal>,
    pub increment_collateral: Option<Decimal>,
}

/// Fields every auction shares
#[cw_serde]
pub struct BaseAuction {
    pub id: u64,
    /// Module that started the auction and receives its proceeds
    pub initiator: String,
    pub lot: Coin,
    pub bidder: Option<Addr>,
    pub bid: Coin,
    pub has_received_bids: bool,
    pub end_time: u64,
    pub max_end_time: u64,
}

/// Sells a fixed lot of surplus stable coins for gov tokens, bid rises
#[cw_serde]
pub struct SurplusAuction {
    pub base: BaseAuction,
}

/// Sells newly minted gov tokens for a fixed bid, lot falls
#[cw_serde]
pub struct DebtAuction {
    pub base: BaseAuction,
    pub corresponding_debt: Coin,
}

/// Sells seized collateral. Bid rises to `max_bid`, then the lot falls
/// and the unsold part is returned to `lot_returns`.
#[cw_serde]
pub struct CollateralAuction {
    pub base: BaseAuction,
    pub corresponding_debt: Coin,
    pub max_bid: Coin,
    pub lot_returns: WeightedAddresses,
}

impl CollateralAuction {
    pub fn is_reversed(&self) -> bool {
        self.base.bid.amount >= self.max_bid.amount
    }
}

#[cw_serde]
pub enum Auction {
    Surplus(SurplusAuction),
    Debt(DebtAuction),
    Collateral(CollateralAuction),
}

impl Auction {
    pub fn base(&self) -> &BaseAuction {
        match self {
            Auction::Surplus(auction) => &auction.base,
            Auction::Debt(auction) => &auction.base,
            Auction::Collateral(auction) => &auction.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseAuction {
        match self {
            Auction::Surplus(auction) => &mut auction.base,
            Auction::Debt(auction) => &mut auction.base,
            Auction::Collateral(auction) => &mut auction.base,
        }
    }

    pub fn id(&self) -> u64 {
        self.base().id
    }

    pub fn end_time(&self) -> u64 {
        self.base().end_time
    }

    pub fn auction_type(&self) -> &'static str {
        match self {
            Auction::Surplus(_) => "surplus",
            Auction::Debt(_) => "debt",
            Auction::Collateral(_) => "collateral",
        }
    }

    /// Phase name for events: forward, reverse, or the type for single phase auctions
    pub fn phase(&self) -> &'static str {
        match self {
            Auction::Collateral(auction) if auction.is_reversed() => "reverse",
            Auction::Collateral(_) => "forward",
            Auction::Surplus(_) => "forward",
            Auction::Debt(_) => "reverse",
        }
    }
}
