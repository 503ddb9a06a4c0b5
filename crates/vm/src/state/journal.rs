//! Tagged journal entries and their reverse replay.

use super::Account;
use crate::host::AccessStatus;
use aevm_common::{Address, U256};
use std::collections::HashMap;

/// One reversible state mutation. Entries are appended in execution order
/// and undone in reverse.
#[derive(Debug, Clone)]
pub enum JournalEntry {
    /// A balance changed; restores the previous value.
    BalanceChange { address: Address, previous: U256 },
    /// A nonce was bumped; decrements it back.
    NonceBump { address: Address },
    /// An account was touched for the first time in this window.
    Touched { address: Address },
    /// A storage slot's current value changed.
    StorageChange {
        address: Address,
        key: U256,
        previous: U256,
    },
    /// A storage slot went cold to warm.
    StorageAccessed { address: Address, key: U256 },
    /// An account went cold to warm.
    AccountAccessed { address: Address },
    /// An account was created (`previous: None`) or replaced wholesale.
    AccountCreated {
        address: Address,
        previous: Option<Box<Account>>,
    },
    /// A transient storage slot changed.
    TransientChange {
        address: Address,
        key: U256,
        previous: U256,
    },
    /// An account was scheduled for destruction.
    Destructed { address: Address },
}

/// Undoes a single journal entry against the account map.
pub(super) fn undo(accounts: &mut HashMap<Address, Account>, entry: JournalEntry) {
    match entry {
        JournalEntry::BalanceChange { address, previous } => {
            if let Some(account) = accounts.get_mut(&address) {
                account.balance = previous;
            }
        }
        JournalEntry::NonceBump { address } => {
            if let Some(account) = accounts.get_mut(&address) {
                account.nonce = account.nonce.saturating_sub(1);
            }
        }
        JournalEntry::Touched { address } => {
            if let Some(account) = accounts.get_mut(&address) {
                account.touched = false;
            }
        }
        JournalEntry::StorageChange {
            address,
            key,
            previous,
        } => {
            if let Some(slot) = accounts
                .get_mut(&address)
                .and_then(|account| account.storage.get_mut(&key))
            {
                slot.current = previous;
            }
        }
        JournalEntry::StorageAccessed { address, key } => {
            if let Some(slot) = accounts
                .get_mut(&address)
                .and_then(|account| account.storage.get_mut(&key))
            {
                slot.access_status = AccessStatus::Cold;
            }
        }
        JournalEntry::AccountAccessed { address } => {
            if let Some(account) = accounts.get_mut(&address) {
                account.access_status = AccessStatus::Cold;
            }
        }
        JournalEntry::AccountCreated { address, previous } => match previous {
            Some(account) => {
                accounts.insert(address, *account);
            }
            None => {
                accounts.remove(&address);
            }
        },
        JournalEntry::TransientChange {
            address,
            key,
            previous,
        } => {
            if let Some(account) = accounts.get_mut(&address) {
                account.transient_storage.insert(key, previous);
            }
        }
        JournalEntry::Destructed { address } => {
            if let Some(account) = accounts.get_mut(&address) {
                account.destructed = false;
            }
        }
    }
}
