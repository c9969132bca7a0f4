use std::cmp::{max, min};

use cosmwasm_std::{attr, coin, Addr, Coin, Decimal, Env, Response, StdResult, Storage, Uint128};

use ballast::auction::{Auction, CollateralAuction, Config, DebtAuction, SurplusAuction};
use ballast::host::{Ledger, AUCTION_MODULE};
use ballast::math::{multiply_and_round, split_into_weighted_buckets};

use crate::state::{get_auction, update_auction, CONFIG};
use crate::ContractError;

/// Places a bid on any auction type.
/// `amount` is a bid for Surplus and forward Collateral auctions and a lot for Debt and reverse Collateral auctions.
pub fn place_bid(
    storage: &mut dyn Storage,
    ledger: &mut dyn Ledger,
    env: &Env,
    auction_id: u64,
    bidder: Addr,
    amount: Coin,
) -> Result<Response, ContractError> {
    let auction = get_auction(storage, auction_id)?;
    let now = env.block.time.seconds();
    if now >= auction.end_time() {
        return Err(ContractError::AuctionExpired { id: auction_id });
    }
    let config = CONFIG.load(storage)?;

    let mut auction = match auction {
        Auction::Surplus(surplus) => {
            Auction::Surplus(place_bid_surplus(ledger, &config, surplus, &bidder, amount)?)
        }
        Auction::Debt(debt) => Auction::Debt(place_bid_debt(ledger, &config, debt, &bidder, amount)?),
        Auction::Collateral(collateral) => {
            if collateral.is_reversed() {
                Auction::Collateral(place_reverse_bid_collateral(ledger, &config, collateral, &bidder, amount)?)
            } else {
                Auction::Collateral(place_forward_bid_collateral(ledger, &config, collateral, &bidder, amount)?)
            }
        }
    };

    let base = auction.base_mut();
    base.bidder = Some(bidder.clone());
    base.has_received_bids = true;
    base.end_time = min(now + config.bid_duration, base.max_end_time);

    update_auction(storage, &auction)?;

    let base = auction.base();
    Ok(Response::new().add_attributes(vec![
        attr("method", "place_bid"),
        attr("auction_id", auction_id.to_string()),
        attr("auction_type", auction.auction_type()),
        attr("phase", auction.phase()),
        attr("bidder", bidder),
        attr("bid", base.bid.to_string()),
        attr("lot", base.lot.to_string()),
        attr("end_time", base.end_time.to_string()),
    ]))
}

/// Smallest change a bid has to make, never below one unit
fn min_increment(amount: Uint128, increment: Decimal) -> StdResult<Uint128> {
    Ok(max(Uint128::new(1), multiply_and_round(amount, increment)?))
}

fn assert_balance(ledger: &dyn Ledger, bidder: &Addr, required: &Coin) -> Result<(), ContractError> {
    if ledger.spendable_balance(bidder, &required.denom) < required.amount {
        return Err(ContractError::InsufficientBalance {
            bidder: bidder.to_string(),
            required: required.to_string(),
        });
    }
    Ok(())
}

/// Bidder repays the previous bidder's bid, routed through the auction module
fn pay_previous_bidder(
    ledger: &mut dyn Ledger,
    bidder: &Addr,
    previous_bidder: &Addr,
    amount: Coin,
) -> StdResult<()> {
    if amount.amount.is_zero() {
        return Ok(());
    }
    ledger.send_from_account_to_module(bidder, AUCTION_MODULE, vec![amount.clone()])?;
    ledger.send_from_module_to_account(AUCTION_MODULE, previous_bidder, vec![amount])
}

/// Previous bidder if it isn't the new bidder
fn outbid_bidder(previous: &Option<Addr>, bidder: &Addr) -> Option<Addr> {
    previous.clone().filter(|previous| previous != bidder)
}

fn place_bid_surplus(
    ledger: &mut dyn Ledger,
    config: &Config,
    mut auction: SurplusAuction,
    bidder: &Addr,
    bid: Coin,
) -> Result<SurplusAuction, ContractError> {
    let current_bid = auction.base.bid.clone();
    if bid.denom != current_bid.denom {
        return Err(ContractError::InvalidBidDenom { expected: current_bid.denom, got: bid.denom });
    }
    let min_new_bid = current_bid.amount + min_increment(current_bid.amount, config.increment_surplus)?;
    if bid.amount < min_new_bid {
        return Err(ContractError::BidTooSmall {
            msg: format!("{} < minimum bid {}", bid, coin(min_new_bid.u128(), &bid.denom)),
        });
    }

    let outbid = outbid_bidder(&auction.base.bidder, bidder);
    let refund = if outbid.is_some() { current_bid.amount } else { Uint128::zero() };
    let increment = bid.amount - current_bid.amount;
    assert_balance(ledger, bidder, &coin((refund + increment).u128(), &bid.denom))?;

    if let Some(previous_bidder) = outbid {
        pay_previous_bidder(ledger, bidder, &previous_bidder, coin(refund.u128(), &bid.denom))?;
    }
    //Increase in bid goes to the initiator and is burned
    let increment = coin(increment.u128(), &bid.denom);
    ledger.send_from_account_to_module(bidder, &auction.base.initiator, vec![increment.clone()])?;
    ledger.burn(&auction.base.initiator, increment)?;

    auction.base.bid = bid;
    Ok(auction)
}

fn place_bid_debt(
    ledger: &mut dyn Ledger,
    config: &Config,
    mut auction: DebtAuction,
    bidder: &Addr,
    lot: Coin,
) -> Result<DebtAuction, ContractError> {
    let current_lot = auction.base.lot.clone();
    if lot.denom != current_lot.denom {
        return Err(ContractError::InvalidLotDenom { expected: current_lot.denom, got: lot.denom });
    }
    let max_new_lot = current_lot
        .amount
        .checked_sub(min_increment(current_lot.amount, config.increment_debt)?)
        .map_err(|_| ContractError::BidTooSmall {
            msg: format!("lot {} can't be reduced further", current_lot),
        })?;
    if lot.amount > max_new_lot {
        return Err(ContractError::BidTooSmall {
            msg: format!("lot {} > maximum lot {}", lot, coin(max_new_lot.u128(), &lot.denom)),
        });
    }

    //New bidder pays the fixed bid to the previous bidder
    if let Some(previous_bidder) = outbid_bidder(&auction.base.bidder, bidder) {
        let bid = auction.base.bid.clone();
        assert_balance(ledger, bidder, &bid)?;

        if previous_bidder == ledger.module_address(&auction.base.initiator) {
            //First bid pays the initiating module and releases the matching debt back to it
            ledger.send_from_account_to_module(bidder, &auction.base.initiator, vec![bid.clone()])?;

            let debt_to_return = min(bid.amount, auction.corresponding_debt.amount);
            if !debt_to_return.is_zero() {
                ledger.send_from_module_to_module(
                    AUCTION_MODULE,
                    &auction.base.initiator,
                    vec![coin(debt_to_return.u128(), &auction.corresponding_debt.denom)],
                )?;
                auction.corresponding_debt.amount -= debt_to_return;
            }
        } else {
            pay_previous_bidder(ledger, bidder, &previous_bidder, bid)?;
        }
    }

    auction.base.lot = lot;
    Ok(auction)
}

fn place_forward_bid_collateral(
    ledger: &mut dyn Ledger,
    config: &Config,
    mut auction: CollateralAuction,
    bidder: &Addr,
    bid: Coin,
) -> Result<CollateralAuction, ContractError> {
    let current_bid = auction.base.bid.clone();
    if bid.denom != current_bid.denom {
        return Err(ContractError::InvalidBidDenom { expected: current_bid.denom, got: bid.denom });
    }
    if bid.amount > auction.max_bid.amount {
        return Err(ContractError::BidTooLarge {
            msg: format!("{} > max bid {}", bid, auction.max_bid),
        });
    }
    let min_new_bid = min(
        current_bid.amount + min_increment(current_bid.amount, config.increment_collateral)?,
        auction.max_bid.amount,
    );
    if bid.amount < min_new_bid {
        return Err(ContractError::BidTooSmall {
            msg: format!("{} < minimum bid {}", bid, coin(min_new_bid.u128(), &bid.denom)),
        });
    }

    let outbid = outbid_bidder(&auction.base.bidder, bidder);
    let refund = if outbid.is_some() { current_bid.amount } else { Uint128::zero() };
    let increment = bid.amount - current_bid.amount;
    assert_balance(ledger, bidder, &coin((refund + increment).u128(), &bid.denom))?;

    if let Some(previous_bidder) = outbid {
        pay_previous_bidder(ledger, bidder, &previous_bidder, coin(refund.u128(), &bid.denom))?;
    }
    //Increase in bid goes to the initiator along with the debt it covers
    ledger.send_from_account_to_module(
        bidder,
        &auction.base.initiator,
        vec![coin(increment.u128(), &bid.denom)],
    )?;
    let debt_to_return = min(increment, auction.corresponding_debt.amount);
    if !debt_to_return.is_zero() {
        ledger.send_from_module_to_module(
            AUCTION_MODULE,
            &auction.base.initiator,
            vec![coin(debt_to_return.u128(), &auction.corresponding_debt.denom)],
        )?;
        auction.corresponding_debt.amount -= debt_to_return;
    }

    auction.base.bid = bid;
    Ok(auction)
}

fn place_reverse_bid_collateral(
    ledger: &mut dyn Ledger,
    config: &Config,
    mut auction: CollateralAuction,
    bidder: &Addr,
    lot: Coin,
) -> Result<CollateralAuction, ContractError> {
    let current_lot = auction.base.lot.clone();
    if lot.denom != current_lot.denom {
        return Err(ContractError::InvalidLotDenom { expected: current_lot.denom, got: lot.denom });
    }
    let max_new_lot = current_lot
        .amount
        .checked_sub(min_increment(current_lot.amount, config.increment_collateral)?)
        .map_err(|_| ContractError::BidTooSmall {
            msg: format!("lot {} can't be reduced further", current_lot),
        })?;
    if lot.amount > max_new_lot {
        return Err(ContractError::BidTooSmall {
            msg: format!("lot {} > maximum lot {}", lot, coin(max_new_lot.u128(), &lot.denom)),
        });
    }

    let outbid = outbid_bidder(&auction.base.bidder, bidder);
    if outbid.is_some() {
        assert_balance(ledger, bidder, &auction.base.bid)?;
    }
    let lot_shares = split_into_weighted_buckets(current_lot.amount - lot.amount, &auction.lot_returns.weights)?;

    if let Some(previous_bidder) = outbid {
        pay_previous_bidder(ledger, bidder, &previous_bidder, auction.base.bid.clone())?;
    }
    //Unsold lot goes back to the depositors
    for (address, share) in auction.lot_returns.addresses.iter().zip(lot_shares) {
        if !share.is_zero() {
            ledger.send_from_module_to_account(AUCTION_MODULE, address, vec![coin(share.u128(), &lot.denom)])?;
        }
    }

    auction.base.lot = lot;
    Ok(auction)
}
