//! World state with journaled rollback.
//!
//! Accounts live in a plain address map; every mutation appends a reversible
//! entry to an ordered journal. A checkpoint is the journal length; rolling
//! back replays entries in reverse until the length matches.

mod host_impl;
mod journal;

pub use host_impl::{ExecutorKind, StateHost};
pub use journal::JournalEntry;

use crate::host::AccessStatus;
use aevm_common::{
    constants::EMPTY_CODE_HASH,
    utils::keccak,
    Address, H256, U256,
};
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;

/// One storage slot. `original` captures the value at transaction start and
/// drives the storage-status derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageValue {
    pub current: U256,
    pub original: U256,
    #[serde(skip)]
    pub access_status: AccessStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Account {
    pub nonce: u64,
    pub balance: U256,
    pub code: Bytes,
    pub storage: HashMap<U256, StorageValue>,
    #[serde(skip)]
    pub transient_storage: HashMap<U256, U256>,
    /// Touched in the [EIP-161] sense: deletable at transaction end when
    /// still empty.
    pub touched: bool,
    /// Scheduled for destruction at transaction end.
    pub destructed: bool,
    #[serde(skip)]
    pub access_status: AccessStatus,
}

impl Account {
    pub const NONCE_MAX: u64 = u64::MAX;

    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code.is_empty()
    }

    pub fn code_hash(&self) -> H256 {
        if self.code.is_empty() {
            EMPTY_CODE_HASH
        } else {
            keccak(&self.code)
        }
    }
}

/// The account map plus its journal.
#[derive(Debug, Default)]
pub struct EvmState {
    accounts: HashMap<Address, Account>,
    journal: Vec<JournalEntry>,
}

impl EvmState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an account without journaling; for state setup before any
    /// checkpoint exists.
    pub fn insert(&mut self, address: Address, account: Account) -> &mut Account {
        self.accounts.entry(address).or_insert(account)
    }

    pub fn find(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn find_mut(&mut self, address: &Address) -> Option<&mut Account> {
        self.accounts.get_mut(address)
    }

    pub fn accounts(&self) -> &HashMap<Address, Account> {
        &self.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut HashMap<Address, Account> {
        &mut self.accounts
    }

    /// Current journal length; rolling back to it restores this exact state.
    pub fn checkpoint(&self) -> usize {
        self.journal.len()
    }

    /// Gets an account, creating an empty journaled one when absent.
    pub fn get_or_create(&mut self, address: Address) -> &mut Account {
        if !self.accounts.contains_key(&address) {
            self.journal.push(JournalEntry::AccountCreated {
                address,
                previous: None,
            });
            self.accounts.insert(address, Account::default());
        }
        // The entry was just ensured.
        self.accounts.entry(address).or_default()
    }

    /// Replaces (or creates) an account wholesale, journaling the previous
    /// contents.
    pub fn put_account(&mut self, address: Address, account: Account) {
        let previous = self.accounts.insert(address, account).map(Box::new);
        self.journal
            .push(JournalEntry::AccountCreated { address, previous });
    }

    /// Touches an account in the [EIP-161] sense, creating it when absent.
    pub fn touch(&mut self, address: Address) -> &mut Account {
        let account = self.get_or_create(address);
        if !account.touched {
            account.touched = true;
            self.journal.push(JournalEntry::Touched { address });
        }
        // Reborrow: the journal push above ends the earlier borrow.
        self.accounts.entry(address).or_default()
    }

    /// Adjusts a balance, journaling the previous value.
    pub fn set_balance(&mut self, address: Address, balance: U256) {
        let account = self.get_or_create(address);
        let previous = account.balance;
        account.balance = balance;
        self.journal.push(JournalEntry::BalanceChange { address, previous });
    }

    /// Bumps a nonce; the journal entry undoes the increment.
    pub fn bump_nonce(&mut self, address: Address) -> bool {
        let account = self.get_or_create(address);
        if account.nonce == Account::NONCE_MAX {
            return false;
        }
        account.nonce += 1;
        self.journal.push(JournalEntry::NonceBump { address });
        true
    }

    /// Writes a storage slot's current value, journaling the previous one.
    pub fn set_storage(&mut self, address: Address, key: U256, value: U256) {
        let account = self.get_or_create(address);
        let slot = account.storage.entry(key).or_default();
        let previous = slot.current;
        slot.current = value;
        self.journal.push(JournalEntry::StorageChange {
            address,
            key,
            previous,
        });
    }

    /// Marks a storage slot warm, returning the previous status.
    pub fn access_storage_slot(&mut self, address: Address, key: U256) -> AccessStatus {
        let account = self.get_or_create(address);
        let slot = account.storage.entry(key).or_default();
        let previous = slot.access_status;
        if previous == AccessStatus::Cold {
            slot.access_status = AccessStatus::Warm;
            self.journal.push(JournalEntry::StorageAccessed { address, key });
        }
        previous
    }

    /// Marks an account warm, returning the previous status.
    pub fn access_account(&mut self, address: Address) -> AccessStatus {
        let account = self.get_or_create(address);
        let previous = account.access_status;
        if previous == AccessStatus::Cold {
            account.access_status = AccessStatus::Warm;
            self.journal.push(JournalEntry::AccountAccessed { address });
        }
        previous
    }

    /// Writes a transient storage slot, journaling the previous value.
    pub fn set_transient_storage(&mut self, address: Address, key: U256, value: U256) {
        let account = self.get_or_create(address);
        let previous = account
            .transient_storage
            .insert(key, value)
            .unwrap_or_default();
        self.journal.push(JournalEntry::TransientChange {
            address,
            key,
            previous,
        });
    }

    /// Marks an account destructed; the journal entry clears the flag.
    pub fn mark_destructed(&mut self, address: Address) {
        let account = self.get_or_create(address);
        if !account.destructed {
            account.destructed = true;
            self.journal.push(JournalEntry::Destructed { address });
        }
    }

    /// Discards the journal. Called at transaction end, once no rollback
    /// can reach back across it.
    pub fn commit(&mut self) {
        self.journal.clear();
    }

    /// Pops and undoes journal entries until the length equals `checkpoint`.
    pub fn rollback(&mut self, checkpoint: usize) {
        while self.journal.len() > checkpoint {
            // The loop condition guarantees an entry.
            if let Some(entry) = self.journal.pop() {
                journal::undo(&mut self.accounts, entry);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn journal_round_trip() {
        let mut state = EvmState::new();
        state.insert(
            addr(1),
            Account {
                balance: U256::from(100),
                nonce: 1,
                ..Default::default()
            },
        );
        state.set_storage(addr(1), U256::one(), U256::from(7));
        // Collapse the pre-checkpoint write into the baseline.
        let baseline_balance = U256::from(100);
        let checkpoint = state.checkpoint();

        state.set_balance(addr(1), U256::from(42));
        state.bump_nonce(addr(1));
        state.set_storage(addr(1), U256::one(), U256::from(9));
        state.set_transient_storage(addr(1), U256::zero(), U256::from(5));
        state.touch(addr(2));
        state.get_or_create(addr(3)).balance = U256::from(1);
        state.mark_destructed(addr(1));

        state.rollback(checkpoint);

        let account = state.find(&addr(1)).unwrap();
        assert_eq!(account.balance, baseline_balance);
        assert_eq!(account.nonce, 1);
        assert_eq!(account.storage[&U256::one()].current, U256::from(7));
        assert!(account.transient_storage.get(&U256::zero()).is_none_or(|v| v.is_zero()));
        assert!(!account.destructed);
        assert!(state.find(&addr(2)).is_none());
        assert!(state.find(&addr(3)).is_none());
    }

    #[test]
    fn rollback_restores_access_status() {
        let mut state = EvmState::new();
        state.insert(addr(1), Account::default());
        let checkpoint = state.checkpoint();

        assert_eq!(state.access_account(addr(1)), AccessStatus::Cold);
        assert_eq!(state.access_account(addr(1)), AccessStatus::Warm);
        assert_eq!(state.access_storage_slot(addr(1), U256::one()), AccessStatus::Cold);

        state.rollback(checkpoint);
        assert_eq!(state.access_account(addr(1)), AccessStatus::Cold);
        assert_eq!(state.access_storage_slot(addr(1), U256::one()), AccessStatus::Cold);
    }

    #[test]
    fn nested_checkpoints_unwind_in_order() {
        let mut state = EvmState::new();
        state.insert(addr(1), Account::default());
        let outer = state.checkpoint();
        state.set_balance(addr(1), U256::from(10));
        let inner = state.checkpoint();
        state.set_balance(addr(1), U256::from(20));

        state.rollback(inner);
        assert_eq!(state.find(&addr(1)).unwrap().balance, U256::from(10));
        state.rollback(outer);
        assert_eq!(state.find(&addr(1)).unwrap().balance, U256::zero());
    }

    #[test]
    fn replaced_account_is_restored() {
        let mut state = EvmState::new();
        state.insert(
            addr(1),
            Account {
                nonce: 3,
                ..Default::default()
            },
        );
        let checkpoint = state.checkpoint();
        state.put_account(addr(1), Account::default());
        assert_eq!(state.find(&addr(1)).unwrap().nonce, 0);
        state.rollback(checkpoint);
        assert_eq!(state.find(&addr(1)).unwrap().nonce, 3);
    }
}
