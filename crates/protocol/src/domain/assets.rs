//! Token movements.
//!
//! Both ledgers move principal, stakes, deposits and collateral exclusively
//! through [`AssetTransfer`]. The native asset is modelled as the token at the
//! zero address so every balance lives in one place.

use {
    model::TokenAddress,
    std::collections::HashMap,
    winner_selection::{Address, U256},
};

/// The transfer capability consumed by the commitment ledger and the auction
/// registry. Mirrors the ERC-20 surface.
pub trait AssetTransfer {
    fn balance_of(&self, token: TokenAddress, account: Address) -> U256;

    fn allowance(&self, token: TokenAddress, owner: Address, spender: Address) -> U256;

    fn approve(&mut self, token: TokenAddress, owner: Address, spender: Address, amount: U256);

    /// Moves `amount` from `from` to `to`.
    fn transfer(
        &mut self,
        token: TokenAddress,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Error>;

    /// Moves `amount` out of `from` on behalf of `spender`, consuming
    /// allowance.
    fn transfer_from(
        &mut self,
        token: TokenAddress,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{account} holds {available} of {token}, needs {required}")]
    InsufficientBalance {
        token: TokenAddress,
        account: Address,
        available: U256,
        required: U256,
    },
    #[error("{spender} may spend {available} of {token} for {owner}, needs {required}")]
    InsufficientAllowance {
        token: TokenAddress,
        owner: Address,
        spender: Address,
        available: U256,
        required: U256,
    },
}

/// In-memory balance sheet.
#[derive(Debug, Clone, Default)]
pub struct Balances {
    balances: HashMap<(TokenAddress, Address), U256>,
    allowances: HashMap<(TokenAddress, Address, Address), U256>,
}

impl Balances {
    /// Credits `amount` out of thin air. Used for genesis allocations.
    pub fn mint(&mut self, token: TokenAddress, account: Address, amount: U256) {
        let balance = self.balances.entry((token, account)).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Total supply of `token` held across all accounts.
    pub fn supply(&self, token: TokenAddress) -> U256 {
        self.balances
            .iter()
            .filter(|((t, _), _)| *t == token)
            .fold(U256::ZERO, |total, (_, balance)| total.saturating_add(*balance))
    }
}

impl AssetTransfer for Balances {
    fn balance_of(&self, token: TokenAddress, account: Address) -> U256 {
        self.balances
            .get(&(token, account))
            .copied()
            .unwrap_or_default()
    }

    fn allowance(&self, token: TokenAddress, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn approve(&mut self, token: TokenAddress, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((token, owner, spender), amount);
    }

    fn transfer(
        &mut self,
        token: TokenAddress,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Error> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(Error::InsufficientBalance {
                token,
                account: from,
                available,
                required: amount,
            });
        }
        self.balances.insert((token, from), available - amount);
        self.mint(token, to, amount);
        tracing::trace!(%token, %from, %to, %amount, "transfer");
        Ok(())
    }

    fn transfer_from(
        &mut self,
        token: TokenAddress,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Error> {
        if amount.is_zero() {
            return Ok(());
        }
        let allowance = self.allowance(token, from, spender);
        if allowance < amount {
            return Err(Error::InsufficientAllowance {
                token,
                owner: from,
                spender,
                available: allowance,
                required: amount,
            });
        }
        self.transfer(token, from, to, amount)?;
        self.allowances
            .insert((token, from, spender), allowance - amount);
        Ok(())
    }
}
