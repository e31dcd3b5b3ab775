//! In-memory incentive-token ledger.
//!
//! [`MemoryLedger`] implements [`TokenLedger`] with `HashMap`s and no
//! persistence. Used by tests and the simulator in place of a real token
//! contract.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::amount::base_units;
use crate::error::LedgerError;
use crate::traits::TokenLedger;
use crate::types::{Address, Transfer};

/// A balance entry as exchanged with the simulator's balance files.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BalanceEntry {
    pub account: Address,
    #[serde(with = "base_units")]
    pub balance: u128,
}

/// HashMap-backed token ledger.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    balances: HashMap<Address, u128>,
    /// (owner, spender) → remaining allowance.
    allowances: HashMap<(Address, Address), u128>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `account` out of thin air.
    pub fn mint(&mut self, account: Address, amount: u128) -> Result<(), LedgerError> {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(account))?;
        Ok(())
    }

    /// Set the allowance `owner` grants `spender`, replacing any previous one.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: u128) {
        self.allowances.insert((owner, spender), amount);
    }

    /// Sum of every balance.
    pub fn total_supply(&self) -> u128 {
        self.balances.values().fold(0u128, |acc, b| acc.saturating_add(*b))
    }

    /// All nonzero balances, sorted by account.
    pub fn entries(&self) -> Vec<BalanceEntry> {
        let mut entries: Vec<BalanceEntry> = self
            .balances
            .iter()
            .filter(|(_, b)| **b > 0)
            .map(|(a, b)| BalanceEntry { account: *a, balance: *b })
            .collect();
        entries.sort_by_key(|e| e.account);
        entries
    }
}

/// Entries touched by a batch in progress, layered over the committed maps.
#[derive(Default)]
struct Staged {
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
}

impl Staged {
    fn balance(&self, ledger: &MemoryLedger, account: &Address) -> u128 {
        match self.balances.get(account) {
            Some(b) => *b,
            None => ledger.balance_of(account),
        }
    }

    fn allowance(&self, ledger: &MemoryLedger, owner: &Address, spender: &Address) -> u128 {
        match self.allowances.get(&(*owner, *spender)) {
            Some(a) => *a,
            None => ledger.allowance(owner, spender),
        }
    }

    fn apply(&mut self, ledger: &MemoryLedger, transfer: &Transfer) -> Result<(), LedgerError> {
        if transfer.amount == 0 {
            return Ok(());
        }

        if let Some(spender) = transfer.spender {
            let allowed = self.allowance(ledger, &transfer.from, &spender);
            if allowed < transfer.amount {
                return Err(LedgerError::InsufficientAllowance {
                    owner: transfer.from,
                    spender,
                    have: allowed,
                    need: transfer.amount,
                });
            }
            self.allowances.insert((transfer.from, spender), allowed - transfer.amount);
        }

        let have = self.balance(ledger, &transfer.from);
        if have < transfer.amount {
            return Err(LedgerError::InsufficientFunds {
                account: transfer.from,
                have,
                need: transfer.amount,
            });
        }
        self.balances.insert(transfer.from, have - transfer.amount);

        let to = self
            .balance(ledger, &transfer.to)
            .checked_add(transfer.amount)
            .ok_or(LedgerError::BalanceOverflow(transfer.to))?;
        self.balances.insert(transfer.to, to);
        Ok(())
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        // Stage touched entries only; merge in once every transfer succeeds.
        let mut staged = Staged::default();
        for transfer in transfers {
            staged.apply(self, transfer)?;
        }
        self.balances.extend(staged.balances);
        self.allowances.extend(staged.allowances);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(seed: u8) -> Address {
        Address::from_bytes([seed; 20])
    }

    #[test]
    fn plain_transfer_moves_balance() {
        let mut l = MemoryLedger::new();
        l.mint(addr(1), 100).unwrap();
        l.execute(&[Transfer::transfer(addr(1), addr(2), 40)]).unwrap();
        assert_eq!(l.balance_of(&addr(1)), 60);
        assert_eq!(l.balance_of(&addr(2)), 40);
        assert_eq!(l.total_supply(), 100);
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let mut l = MemoryLedger::new();
        l.mint(addr(1), 100).unwrap();
        l.approve(addr(1), addr(9), 30);
        l.execute(&[Transfer::transfer_from(addr(9), addr(1), addr(9), 30)]).unwrap();
        assert_eq!(l.allowance(&addr(1), &addr(9)), 0);
        assert_eq!(l.balance_of(&addr(9)), 30);
    }

    #[test]
    fn missing_allowance_fails() {
        let mut l = MemoryLedger::new();
        l.mint(addr(1), 100).unwrap();
        let err = l
            .execute(&[Transfer::transfer_from(addr(9), addr(1), addr(9), 1)])
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAllowance { have: 0, need: 1, .. }));
    }

    #[test]
    fn failed_batch_leaves_no_trace() {
        let mut l = MemoryLedger::new();
        l.mint(addr(1), 100).unwrap();
        l.approve(addr(1), addr(9), 100);
        let err = l
            .execute(&[
                Transfer::transfer_from(addr(9), addr(1), addr(9), 80),
                Transfer::transfer(addr(9), addr(3), 81),
            ])
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds { account: addr(9), have: 80, need: 81 }
        );
        assert_eq!(l.balance_of(&addr(1)), 100);
        assert_eq!(l.balance_of(&addr(9)), 0);
        assert_eq!(l.allowance(&addr(1), &addr(9)), 100);
    }

    #[test]
    fn failed_batch_keeps_untouched_accounts() {
        let mut l = MemoryLedger::new();
        l.mint(addr(1), 100).unwrap();
        l.mint(addr(5), 7).unwrap();
        l.approve(addr(5), addr(6), 3);
        l.execute(&[
            Transfer::transfer(addr(1), addr(2), 50),
            Transfer::transfer(addr(4), addr(1), 1),
        ])
        .unwrap_err();
        assert_eq!(l.balance_of(&addr(1)), 100);
        assert_eq!(l.balance_of(&addr(2)), 0);
        assert_eq!(l.balance_of(&addr(5)), 7);
        assert_eq!(l.allowance(&addr(5), &addr(6)), 3);
        assert_eq!(l.total_supply(), 107);
    }

    #[test]
    fn self_transfer_keeps_balance() {
        let mut l = MemoryLedger::new();
        l.mint(addr(1), 10).unwrap();
        l.execute(&[Transfer::transfer(addr(1), addr(1), 10)]).unwrap();
        assert_eq!(l.balance_of(&addr(1)), 10);
    }

    #[test]
    fn later_transfers_see_earlier_ones() {
        let mut l = MemoryLedger::new();
        l.mint(addr(1), 10).unwrap();
        l.execute(&[
            Transfer::transfer(addr(1), addr(2), 10),
            Transfer::transfer(addr(2), addr(3), 4),
        ])
        .unwrap();
        assert_eq!(l.balance_of(&addr(2)), 6);
        assert_eq!(l.balance_of(&addr(3)), 4);
    }

    #[test]
    fn zero_transfer_is_noop_even_without_funds() {
        let mut l = MemoryLedger::new();
        l.execute(&[Transfer::transfer_from(addr(9), addr(1), addr(9), 0)]).unwrap();
        assert_eq!(l.total_supply(), 0);
    }

    #[test]
    fn mint_overflow_detected() {
        let mut l = MemoryLedger::new();
        l.mint(addr(1), u128::MAX).unwrap();
        assert_eq!(l.mint(addr(1), 1), Err(LedgerError::BalanceOverflow(addr(1))));
    }

    #[test]
    fn entries_sorted_and_nonzero() {
        let mut l = MemoryLedger::new();
        l.mint(addr(3), 5).unwrap();
        l.mint(addr(1), 7).unwrap();
        l.mint(addr(2), 0).unwrap();
        let entries = l.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].account, addr(1));
        assert_eq!(entries[1].balance, 5);
    }
}
