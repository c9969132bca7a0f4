use cosmwasm_std::{attr, coin, Attribute, Coin, Env, Order, Response, StdResult, Storage};
use cw_storage_plus::Bound;

use ballast::auction::{Auction, BaseAuction, CollateralAuction, DebtAuction, SurplusAuction};
use ballast::host::{Ledger, AUCTION_MODULE};
use ballast::types::WeightedAddresses;

use crate::state::{delete_auction, get_auction, store_new_auction, update_auction, AUCTIONS_BY_TIME, CONFIG};
use crate::ContractError;

fn new_base_auction(
    storage: &dyn Storage,
    env: &Env,
    initiator: &str,
    lot: Coin,
    bid: Coin,
) -> StdResult<BaseAuction> {
    let config = CONFIG.load(storage)?;
    let end_time = env.block.time.seconds() + config.max_auction_duration;

    Ok(BaseAuction {
        id: 0,
        initiator: initiator.to_string(),
        lot,
        bidder: None,
        bid,
        has_received_bids: false,
        end_time,
        max_end_time: end_time,
    })
}

/// Surplus auction selling `lot` for the highest bid in `bid_denom`, not yet opened
pub fn new_surplus_auction(
    storage: &dyn Storage,
    env: &Env,
    seller: &str,
    lot: Coin,
    bid_denom: &str,
) -> Result<Auction, ContractError> {
    if lot.amount.is_zero() {
        return Err(ContractError::InvalidAuction { msg: String::from("Surplus lot must be positive") });
    }
    let base = new_base_auction(storage, env, seller, lot, coin(0, bid_denom))?;

    Ok(Auction::Surplus(SurplusAuction { base }))
}

/// Debt auction selling newly minted `initial_lot` for the fixed `bid`, not yet opened.
/// The buyer module stands in as the first bidder so the first real bid pays it.
pub fn new_debt_auction(
    storage: &dyn Storage,
    ledger: &dyn Ledger,
    env: &Env,
    buyer: &str,
    bid: Coin,
    initial_lot: Coin,
    debt: Coin,
) -> Result<Auction, ContractError> {
    if bid.amount.is_zero() || initial_lot.amount.is_zero() {
        return Err(ContractError::InvalidAuction { msg: String::from("Debt auction bid and lot must be positive") });
    }
    let mut base = new_base_auction(storage, env, buyer, initial_lot, bid)?;
    base.bidder = Some(ledger.module_address(buyer));

    Ok(Auction::Debt(DebtAuction { base, corresponding_debt: debt }))
}

/// Collateral auction whose bids rise up to `max_bid` before the lot is bid down, not yet opened
pub fn new_collateral_auction(
    storage: &dyn Storage,
    env: &Env,
    seller: &str,
    lot: Coin,
    max_bid: Coin,
    lot_returns: WeightedAddresses,
    debt: Coin,
) -> Result<Auction, ContractError> {
    if lot.amount.is_zero() || max_bid.amount.is_zero() {
        return Err(ContractError::InvalidAuction { msg: String::from("Collateral lot and max bid must be positive") });
    }
    lot_returns.validate()?;
    let base = new_base_auction(storage, env, seller, lot, coin(0, &max_bid.denom))?;

    Ok(Auction::Collateral(CollateralAuction {
        base,
        corresponding_debt: debt,
        max_bid,
        lot_returns,
    }))
}

/// Moves what the auction holds from its initiator to the auction module and stores it.
/// Surplus and collateral auctions hold their lot, debt and collateral auctions their debt coins.
pub fn open_auction(storage: &mut dyn Storage, ledger: &mut dyn Ledger, auction: Auction) -> Result<u64, ContractError> {
    let mut held = vec![];
    match auction {
        Auction::Surplus(ref surplus) => held.push(surplus.base.lot.clone()),
        Auction::Debt(ref debt) => held.push(debt.corresponding_debt.clone()),
        Auction::Collateral(ref collateral) => {
            held.push(collateral.base.lot.clone());
            held.push(collateral.corresponding_debt.clone());
        }
    }
    held.retain(|held_coin| !held_coin.amount.is_zero());
    if !held.is_empty() {
        ledger.send_from_module_to_module(&auction.base().initiator, AUCTION_MODULE, held)?;
    }

    Ok(store_new_auction(storage, auction)?)
}

pub fn start_surplus_auction(
    storage: &mut dyn Storage,
    ledger: &mut dyn Ledger,
    env: &Env,
    seller: &str,
    lot: Coin,
    bid_denom: &str,
) -> Result<u64, ContractError> {
    let auction = new_surplus_auction(storage, env, seller, lot, bid_denom)?;
    open_auction(storage, ledger, auction)
}

pub fn start_debt_auction(
    storage: &mut dyn Storage,
    ledger: &mut dyn Ledger,
    env: &Env,
    buyer: &str,
    bid: Coin,
    initial_lot: Coin,
    debt: Coin,
) -> Result<u64, ContractError> {
    let auction = new_debt_auction(storage, ledger, env, buyer, bid, initial_lot, debt)?;
    open_auction(storage, ledger, auction)
}

pub fn start_collateral_auction(
    storage: &mut dyn Storage,
    ledger: &mut dyn Ledger,
    env: &Env,
    seller: &str,
    lot: Coin,
    max_bid: Coin,
    lot_returns: WeightedAddresses,
    debt: Coin,
) -> Result<u64, ContractError> {
    let auction = new_collateral_auction(storage, env, seller, lot, max_bid, lot_returns, debt)?;
    open_auction(storage, ledger, auction)
}

/// Pays out an expired auction and deletes it.
/// Collateral and debt auctions without bids are restarted instead.
pub fn close_auction(
    storage: &mut dyn Storage,
    ledger: &mut dyn Ledger,
    env: &Env,
    id: u64,
) -> Result<Vec<Attribute>, ContractError> {
    let mut auction = get_auction(storage, id)?;
    let now = env.block.time.seconds();
    if now < auction.end_time() {
        return Err(ContractError::AuctionNotExpired { id, end_time: auction.end_time() });
    }
    let mut attrs = vec![
        attr("auction_id", id.to_string()),
        attr("auction_type", auction.auction_type()),
    ];

    if !auction.base().has_received_bids {
        match auction {
            Auction::Surplus(ref surplus) => {
                ledger.send_from_module_to_module(
                    AUCTION_MODULE,
                    &surplus.base.initiator,
                    vec![surplus.base.lot.clone()],
                )?;
                delete_auction(storage, &auction);
                attrs.push(attr("close", "returned_lot"));
            }
            Auction::Debt(_) | Auction::Collateral(_) => {
                let config = CONFIG.load(storage)?;
                let base = auction.base_mut();
                base.end_time = now + config.max_auction_duration;
                base.max_end_time = base.end_time;
                let end_time = base.end_time;

                update_auction(storage, &auction)?;
                attrs.push(attr("close", "restarted"));
                attrs.push(attr("end_time", end_time.to_string()));
            }
        }
        return Ok(attrs);
    }

    let bidder = auction.base().bidder.clone().ok_or_else(|| ContractError::InvalidAuction {
        msg: format!("Auction {} has bids but no bidder", id),
    })?;

    match auction {
        Auction::Surplus(ref surplus) => {
            ledger.send_from_module_to_account(AUCTION_MODULE, &bidder, vec![surplus.base.lot.clone()])?;
        }
        Auction::Debt(ref debt) => {
            ledger.mint(AUCTION_MODULE, debt.base.lot.clone())?;
            ledger.send_from_module_to_account(AUCTION_MODULE, &bidder, vec![debt.base.lot.clone()])?;
            if !debt.corresponding_debt.amount.is_zero() {
                ledger.send_from_module_to_module(
                    AUCTION_MODULE,
                    &debt.base.initiator,
                    vec![debt.corresponding_debt.clone()],
                )?;
            }
        }
        Auction::Collateral(ref collateral) => {
            if !collateral.base.lot.amount.is_zero() {
                ledger.send_from_module_to_account(AUCTION_MODULE, &bidder, vec![collateral.base.lot.clone()])?;
            }
            if !collateral.corresponding_debt.amount.is_zero() {
                ledger.send_from_module_to_module(
                    AUCTION_MODULE,
                    &collateral.base.initiator,
                    vec![collateral.corresponding_debt.clone()],
                )?;
            }
        }
    }
    delete_auction(storage, &auction);

    attrs.extend(vec![
        attr("close", "paid_out"),
        attr("winner", bidder),
        attr("lot", auction.base().lot.to_string()),
        attr("bid", auction.base().bid.to_string()),
    ]);
    Ok(attrs)
}

/// Closes every auction whose end time has passed.
/// A failing auction is reported and skipped.
pub fn close_expired_auctions(
    storage: &mut dyn Storage,
    ledger: &mut dyn Ledger,
    env: &Env,
) -> Result<Response, ContractError> {
    let now = env.block.time.seconds();

    let expired: Vec<u64> = AUCTIONS_BY_TIME
        .range(storage, None, Some(Bound::inclusive((now, u64::MAX))), Order::Ascending)
        .map(|item| item.map(|(_, id)| id))
        .collect::<StdResult<Vec<u64>>>()?;

    let mut attrs = vec![
        attr("method", "close_expired_auctions"),
        attr("expired", expired.len().to_string()),
    ];
    for id in expired {
        match close_auction(storage, ledger, env, id) {
            Ok(close_attrs) => attrs.extend(close_attrs),
            Err(err) => attrs.push(attr("close_error", format!("{}: {}", id, err))),
        }
    }

    Ok(Response::new().add_attributes(attrs))
}
