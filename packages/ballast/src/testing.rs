//! In-memory host collaborators for unit tests

use std::collections::BTreeMap;

use cosmwasm_std::{coin, Addr, Coin, Decimal, StdError, StdResult, Uint128};

use crate::host::{Ledger, Oracle};

#[derive(Default, Clone, Debug)]
pub struct MockOracle {
    prices: BTreeMap<String, Decimal>,
    halted: Vec<String>,
}

impl MockOracle {
    pub fn new(prices: &[(&str, Decimal)]) -> Self {
        let mut oracle = MockOracle::default();
        for (market_id, price) in prices {
            oracle.set_price(market_id, *price);
        }
        oracle
    }

    pub fn set_price(&mut self, market_id: &str, price: Decimal) {
        self.prices.insert(market_id.to_string(), price);
    }

    /// Marks a market live or halted, halted markets return no price
    pub fn set_live(&mut self, market_id: &str, live: bool) {
        self.halted.retain(|market| market != market_id);
        if !live {
            self.halted.push(market_id.to_string());
        }
    }
}

impl Oracle for MockOracle {
    fn current_price(&self, market_id: &str) -> StdResult<Decimal> {
        if !self.market_is_live(market_id) {
            return Err(StdError::generic_err(format!("No valid price for market {}", market_id)));
        }
        self.prices
            .get(market_id)
            .copied()
            .ok_or_else(|| StdError::generic_err(format!("No valid price for market {}", market_id)))
    }

    fn market_is_live(&self, market_id: &str) -> bool {
        self.prices.contains_key(market_id) && !self.halted.iter().any(|market| market == market_id)
    }
}

/// Balances keyed by account address. Module accounts live at `module/<name>`.
#[derive(Default, Clone, Debug)]
pub struct MockLedger {
    balances: BTreeMap<String, BTreeMap<String, Uint128>>,
    supply: BTreeMap<String, Uint128>,
}

impl MockLedger {
    pub fn new(balances: &[(&str, Vec<Coin>)]) -> Self {
        let mut ledger = MockLedger::default();
        for (account, coins) in balances {
            for coin in coins.iter() {
                ledger.credit(account, coin);
                ledger.add_supply(coin);
            }
        }
        ledger
    }

    /// Balance of any address, module or account
    pub fn balance(&self, address: &str, denom: &str) -> Uint128 {
        self.balances
            .get(address)
            .and_then(|coins| coins.get(denom))
            .copied()
            .unwrap_or_default()
    }

    pub fn supply(&self, denom: &str) -> Uint128 {
        self.supply.get(denom).copied().unwrap_or_default()
    }

    fn credit(&mut self, address: &str, amount: &Coin) {
        let balance = self
            .balances
            .entry(address.to_string())
            .or_default()
            .entry(amount.denom.clone())
            .or_default();
        *balance += amount.amount;
    }

    fn add_supply(&mut self, amount: &Coin) {
        *self.supply.entry(amount.denom.clone()).or_default() += amount.amount;
    }

    fn debit(&mut self, address: &str, amount: &Coin) -> StdResult<()> {
        let available = self.balance(address, &amount.denom);
        if available < amount.amount {
            return Err(StdError::generic_err(format!(
                "Insufficient funds: {} has {}, needs {}",
                address,
                coin(available.u128(), &amount.denom),
                amount
            )));
        }
        if let Some(coins) = self.balances.get_mut(address) {
            coins.insert(amount.denom.clone(), available - amount.amount);
        }
        Ok(())
    }

    fn transfer(&mut self, from: &str, to: &str, amount: Vec<Coin>) -> StdResult<()> {
        //Check every coin before moving any
        for coin in amount.iter() {
            let required: Uint128 = amount
                .iter()
                .filter(|other| other.denom == coin.denom)
                .map(|other| other.amount)
                .sum();
            if self.balance(from, &coin.denom) < required {
                return Err(StdError::generic_err(format!(
                    "Insufficient funds: {} has {}{}, needs {}{}",
                    from,
                    self.balance(from, &coin.denom),
                    coin.denom,
                    required,
                    coin.denom
                )));
            }
        }
        for coin in amount.iter().filter(|coin| !coin.amount.is_zero()) {
            self.debit(from, coin)?;
            self.credit(to, coin);
        }
        Ok(())
    }
}

fn module_key(module: &str) -> String {
    format!("module/{}", module)
}

impl Ledger for MockLedger {
    fn send_from_account_to_module(&mut self, sender: &Addr, module: &str, amount: Vec<Coin>) -> StdResult<()> {
        self.transfer(sender.as_str(), &module_key(module), amount)
    }

    fn send_from_module_to_account(&mut self, module: &str, recipient: &Addr, amount: Vec<Coin>) -> StdResult<()> {
        self.transfer(&module_key(module), recipient.as_str(), amount)
    }

    fn send_from_module_to_module(&mut self, sender: &str, recipient: &str, amount: Vec<Coin>) -> StdResult<()> {
        self.transfer(&module_key(sender), &module_key(recipient), amount)
    }

    fn mint(&mut self, module: &str, amount: Coin) -> StdResult<()> {
        self.credit(&module_key(module), &amount);
        self.add_supply(&amount);
        Ok(())
    }

    fn burn(&mut self, module: &str, amount: Coin) -> StdResult<()> {
        self.debit(&module_key(module), &amount)?;
        let supply = self.supply(&amount.denom);
        self.supply.insert(amount.denom.clone(), supply.checked_sub(amount.amount)?);
        Ok(())
    }

    fn spendable_balance(&self, account: &Addr, denom: &str) -> Uint128 {
        self.balance(account.as_str(), denom)
    }

    fn module_balance(&self, module: &str, denom: &str) -> Uint128 {
        self.balance(&module_key(module), denom)
    }

    fn module_address(&self, module: &str) -> Addr {
        Addr::unchecked(module_key(module))
    }
}
