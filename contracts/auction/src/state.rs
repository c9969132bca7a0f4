use cosmwasm_std::{Addr, StdResult, Storage};
use cw_storage_plus::{Item, Map};

use ballast::auction::{Auction, Config};

use crate::ContractError;

pub const CONFIG: Item<Config> = Item::new("auction_config");
pub const NEXT_AUCTION_ID: Item<u64> = Item::new("next_auction_id");
pub const AUCTIONS: Map<u64, Auction> = Map::new("auctions"); //id, Auction
/// (end_time, id) -> id, lets the close sweep stop at the first live auction
pub const AUCTIONS_BY_TIME: Map<(u64, u64), u64> = Map::new("auctions_by_time");

/// Config ownership transfer
pub const OWNERSHIP_TRANSFER: Item<Addr> = Item::new("auction_ownership_transfer");

pub fn get_auction(storage: &dyn Storage, id: u64) -> Result<Auction, ContractError> {
    AUCTIONS
        .may_load(storage, id)?
        .ok_or(ContractError::AuctionNotFound { id })
}

/// Stores a new auction under the next id
pub fn store_new_auction(storage: &mut dyn Storage, mut auction: Auction) -> StdResult<u64> {
    let id = NEXT_AUCTION_ID.may_load(storage)?.unwrap_or(1u64);
    auction.base_mut().id = id;

    AUCTIONS.save(storage, id, &auction)?;
    AUCTIONS_BY_TIME.save(storage, (auction.end_time(), id), &id)?;
    NEXT_AUCTION_ID.save(storage, &(id + 1))?;

    Ok(id)
}

/// Saves an auction and moves its entry in the time index
pub fn update_auction(storage: &mut dyn Storage, auction: &Auction) -> Result<(), ContractError> {
    let stored = get_auction(storage, auction.id())?;

    AUCTIONS_BY_TIME.remove(storage, (stored.end_time(), stored.id()));
    AUCTIONS_BY_TIME.save(storage, (auction.end_time(), auction.id()), &auction.id())?;
    AUCTIONS.save(storage, auction.id(), auction)?;

    Ok(())
}

pub fn delete_auction(storage: &mut dyn Storage, auction: &Auction) {
    AUCTIONS_BY_TIME.remove(storage, (auction.end_time(), auction.id()));
    AUCTIONS.remove(storage, auction.id());
}
