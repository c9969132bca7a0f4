use cosmwasm_std::{Addr, Coin, Decimal, StdResult, Storage, Uint128};

//Module accounts
pub const CDP_MODULE: &str = "cdp";
pub const LIQUIDATOR_MODULE: &str = "liquidator";
pub const AUCTION_MODULE: &str = "auction";
pub const SAVINGS_MODULE: &str = "savings";

/// Price source. Markets are addressed by id, eg. "bnb:usd" (spot) or "bnb:usd:30" (TWAP).
pub trait Oracle {
    fn current_price(&self, market_id: &str) -> StdResult<Decimal>;
    fn market_is_live(&self, market_id: &str) -> bool;
}

/// Token ledger with named module accounts.
/// Every send/mint/burn either applies fully or returns an error.
pub trait Ledger {
    fn send_from_account_to_module(&mut self, sender: &Addr, module: &str, amount: Vec<Coin>) -> StdResult<()>;
    fn send_from_module_to_account(&mut self, module: &str, recipient: &Addr, amount: Vec<Coin>) -> StdResult<()>;
    fn send_from_module_to_module(&mut self, sender: &str, recipient: &str, amount: Vec<Coin>) -> StdResult<()>;
    fn mint(&mut self, module: &str, amount: Coin) -> StdResult<()>;
    fn burn(&mut self, module: &str, amount: Coin) -> StdResult<()>;
    fn spendable_balance(&self, account: &Addr, denom: &str) -> Uint128;
    fn module_balance(&self, module: &str, denom: &str) -> Uint128;
    /// Account address of a module, so a module can stand in as a bidder
    fn module_address(&self, module: &str) -> Addr;
}

/// Mutable handles to everything the host provides
pub struct HostDepsMut<'a> {
    pub storage: &'a mut dyn Storage,
    pub oracle: &'a dyn Oracle,
    pub ledger: &'a mut dyn Ledger,
}

/// Read-only handles to everything the host provides
#[derive(Clone, Copy)]
pub struct HostDeps<'a> {
    pub storage: &'a dyn Storage,
    pub oracle: &'a dyn Oracle,
    pub ledger: &'a dyn Ledger,
}

impl<'a> HostDepsMut<'a> {
    pub fn as_ref(&'_ self) -> HostDeps<'_> {
        HostDeps {
            storage: self.storage,
            oracle: self.oracle,
            ledger: self.ledger,
        }
    }

    pub fn branch(&'_ mut self) -> HostDepsMut<'_> {
        HostDepsMut {
            storage: self.storage,
            oracle: self.oracle,
            ledger: self.ledger,
        }
    }
}
