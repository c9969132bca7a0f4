use cosmwasm_std::{Order, StdResult, Storage};
use cw_storage_plus::Bound;

use ballast::auction::Auction;

use crate::state::AUCTIONS;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 31;

pub fn query_auction(storage: &dyn Storage, auction_id: u64) -> StdResult<Auction> {
    AUCTIONS.load(storage, auction_id)
}

/// Auctions in id order
pub fn query_auctions(
    storage: &dyn Storage,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Vec<Auction>> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    AUCTIONS
        .range(storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, auction)| auction))
        .collect()
}
