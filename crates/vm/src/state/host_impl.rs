//! The canonical [`Host`] implementation over the journaled state.
//!
//! Nested calls checkpoint the journal (plus the log buffer and the
//! created-accounts set) and roll back on any non-success status. Two
//! historical quirks are preserved verbatim: a touch of address `0x03`
//! survives the rollback from Spurious Dragon on, and a failed create keeps
//! both the sender's nonce bump and the warm status of the computed address.

use crate::{
    analysis::CodeAnalysis,
    aot::{Translator, TranslatorConfig},
    errors::StatusCode,
    host::{
        AccessStatus, CallKind, ExecutionResult, Host, Message, StorageStatus, TxContext,
    },
    interpreter, precompiles,
    state::EvmState,
    utils::{calculate_create2_address, calculate_create_address},
};
use aevm_common::{
    constants::{MAX_CALL_DEPTH, MAX_CODE_SIZE},
    types::{BlockInfo, Log, Transaction, TxType},
    utils::keccak,
    Address, H256, Revision, U256,
};
use bytes::Bytes;
use rustc_hash::FxHashMap;
use std::{collections::HashSet, sync::Arc};

use crate::gas_cost::CODE_DEPOSIT_COST;

/// Which execution engine the host drives for nested frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutorKind {
    #[default]
    Baseline,
    Translated(TranslatorConfig),
}

pub struct StateHost<'a> {
    pub revision: Revision,
    pub state: &'a mut EvmState,
    pub block: &'a BlockInfo,
    pub tx: &'a Transaction,
    pub executor: ExecutorKind,
    logs: Vec<Log>,
    /// Accounts created within this transaction ([EIP-6780]).
    created: HashSet<Address>,
    /// Code analyses are immutable once produced and shared across frames.
    analysis_cache: FxHashMap<H256, Arc<CodeAnalysis>>,
}

impl<'a> StateHost<'a> {
    pub fn new(
        revision: Revision,
        state: &'a mut EvmState,
        block: &'a BlockInfo,
        tx: &'a Transaction,
        executor: ExecutorKind,
    ) -> Self {
        Self {
            revision,
            state,
            block,
            tx,
            executor,
            logs: Vec::new(),
            created: HashSet::new(),
            analysis_cache: FxHashMap::default(),
        }
    }

    pub fn take_logs(&mut self) -> Vec<Log> {
        std::mem::take(&mut self.logs)
    }

    /// Marks an account as created in this transaction.
    pub fn mark_created(&mut self, address: Address) {
        self.created.insert(address);
    }

    fn analyze(&mut self, code: &[u8]) -> Arc<CodeAnalysis> {
        let hash = keccak(code);
        if let Some(analysis) = self.analysis_cache.get(&hash) {
            return Arc::clone(analysis);
        }
        let analysis = Arc::new(CodeAnalysis::analyze(self.revision, code));
        self.analysis_cache.insert(hash, Arc::clone(&analysis));
        analysis
    }

    fn run_code(&mut self, code: &[u8], msg: &Message) -> ExecutionResult {
        let analysis = self.analyze(code);
        match self.executor {
            ExecutorKind::Baseline => interpreter::execute(self.revision, &analysis, msg, self),
            ExecutorKind::Translated(config) => {
                let program =
                    Translator::new(config).translate(self.revision, &analysis);
                program.execute(&analysis, msg, self)
            }
        }
    }

    fn execute_message(&mut self, msg: &Message) -> ExecutionResult {
        if matches!(msg.kind, CallKind::Create | CallKind::Create2) {
            return self.create(msg);
        }

        // A plain CALL touches its recipient and moves the value; the
        // executing interpreter already verified the sender's balance.
        if msg.kind == CallKind::Call {
            self.state.touch(msg.recipient);
            if !msg.value.is_zero() {
                let sender_balance = self.get_balance(msg.sender);
                let recipient_balance = self.get_balance(msg.recipient);
                self.state
                    .set_balance(msg.sender, sender_balance - msg.value);
                self.state
                    .set_balance(msg.recipient, recipient_balance + msg.value);
            }
        }

        if precompiles::is_precompile(msg.code_address, self.revision) {
            return precompiles::execute(msg.code_address, &msg.data, msg.gas, self.revision);
        }

        let code = self
            .state
            .find(&msg.code_address)
            .map(|account| account.code.clone())
            .unwrap_or_default();
        self.run_code(&code, msg)
    }

    fn create(&mut self, msg: &Message) -> ExecutionResult {
        let sender_nonce = self
            .state
            .find(&msg.sender)
            .map(|account| account.nonce)
            .unwrap_or_default();
        // At depth zero the transaction driver already bumped the nonce.
        let address_nonce = if msg.depth == 0 {
            sender_nonce.saturating_sub(1)
        } else {
            sender_nonce
        };

        let new_address = match msg.salt {
            Some(salt) => calculate_create2_address(msg.sender, keccak(&msg.data), salt),
            None => calculate_create_address(msg.sender, address_nonce),
        };

        if msg.depth != 0 && !self.state.bump_nonce(msg.sender) {
            // Light early check: no gas is consumed and the address is not
            // marked accessed.
            return ExecutionResult {
                status: StatusCode::OutOfGas,
                gas_left: msg.gas,
                gas_refund: 0,
                output: Bytes::new(),
                create_address: None,
            };
        }

        self.state.access_account(new_address);

        // Collision check: a non-zero nonce or non-empty code at the target
        // address aborts the create, charging everything.
        if let Some(existing) = self.state.find(&new_address) {
            if existing.nonce != 0 || !existing.code.is_empty() {
                return ExecutionResult {
                    status: StatusCode::OutOfGas,
                    gas_left: 0,
                    gas_refund: 0,
                    output: Bytes::new(),
                    create_address: Some(new_address),
                };
            }
        }

        // Initialize the new account, keeping a prefund if present. Storage
        // left over from a previous incarnation is dropped.
        let mut new_account = self.state.find(&new_address).cloned().unwrap_or_default();
        new_account.nonce = if self.revision >= Revision::SpuriousDragon {
            1
        } else {
            0
        };
        new_account.storage.clear();
        self.state.put_account(new_address, new_account);
        self.created.insert(new_address);

        if !msg.value.is_zero() {
            let sender_balance = self.get_balance(msg.sender);
            let new_balance = self.get_balance(new_address);
            self.state
                .set_balance(msg.sender, sender_balance - msg.value);
            self.state
                .set_balance(new_address, new_balance + msg.value);
        }

        // Execute the initcode with empty calldata.
        let create_msg = Message {
            kind: msg.kind,
            depth: msg.depth,
            gas: msg.gas,
            recipient: new_address,
            sender: msg.sender,
            code_address: new_address,
            value: msg.value,
            data: Bytes::new(),
            is_static: false,
            salt: None,
        };
        let initcode = msg.data.clone();
        let mut result = self.run_code(&initcode, &create_msg);
        result.create_address = Some(new_address);
        if !result.is_success() {
            return result;
        }

        // Deploy-code validation and deposit charge.
        let code = result.output.clone();
        if self.revision >= Revision::SpuriousDragon && code.len() > MAX_CODE_SIZE {
            return ExecutionResult {
                status: StatusCode::OutOfGas,
                gas_left: 0,
                gas_refund: 0,
                output: Bytes::new(),
                create_address: Some(new_address),
            };
        }

        let deposit_cost = code.len() as i64 * CODE_DEPOSIT_COST as i64;
        let gas_left = result.gas_left - deposit_cost;
        if gas_left < 0 {
            // Frontier keeps the remaining gas and deploys nothing.
            if self.revision == Revision::Frontier {
                return ExecutionResult {
                    status: StatusCode::Success,
                    gas_left: result.gas_left,
                    gas_refund: result.gas_refund,
                    output: Bytes::new(),
                    create_address: Some(new_address),
                };
            }
            return ExecutionResult {
                status: StatusCode::OutOfGas,
                gas_left: 0,
                gas_refund: 0,
                output: Bytes::new(),
                create_address: Some(new_address),
            };
        }

        // [EIP-3541]: deployed code must not start with 0xEF.
        if self.revision >= Revision::London && code.first() == Some(&0xEF) {
            return ExecutionResult {
                status: StatusCode::OutOfGas,
                gas_left: 0,
                gas_refund: 0,
                output: Bytes::new(),
                create_address: Some(new_address),
            };
        }

        if let Some(account) = self.state.find_mut(&new_address) {
            account.code = code;
        }

        ExecutionResult {
            status: StatusCode::Success,
            gas_left,
            gas_refund: result.gas_refund,
            output: Bytes::new(),
            create_address: Some(new_address),
        }
    }
}

impl Host for StateHost<'_> {
    fn account_exists(&self, address: Address) -> bool {
        match self.state.find(&address) {
            Some(account) => self.revision < Revision::SpuriousDragon || !account.is_empty(),
            None => false,
        }
    }

    fn get_balance(&self, address: Address) -> U256 {
        self.state
            .find(&address)
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    fn get_code_size(&self, address: Address) -> usize {
        self.state
            .find(&address)
            .map(|account| account.code.len())
            .unwrap_or_default()
    }

    fn get_code_hash(&self, address: Address) -> H256 {
        match self.state.find(&address) {
            Some(account) if !account.is_empty() => account.code_hash(),
            _ => H256::zero(),
        }
    }

    fn copy_code(&self, address: Address, code_offset: usize, buffer: &mut [u8]) -> usize {
        let code = self
            .state
            .find(&address)
            .map(|account| account.code.as_ref())
            .unwrap_or_default();
        if code_offset >= code.len() {
            return 0;
        }
        let n = buffer.len().min(code.len() - code_offset);
        buffer[..n].copy_from_slice(&code[code_offset..code_offset + n]);
        n
    }

    fn get_storage(&self, address: Address, key: U256) -> U256 {
        self.state
            .find(&address)
            .and_then(|account| account.storage.get(&key))
            .map(|slot| slot.current)
            .unwrap_or_default()
    }

    fn set_storage(&mut self, address: Address, key: U256, value: U256) -> StorageStatus {
        let (original, current) = {
            let account = self.state.get_or_create(address);
            let slot = account.storage.entry(key).or_default();
            (slot.original, slot.current)
        };

        if value == current {
            return StorageStatus::Unchanged;
        }

        // [EIP-2200] transition naming; X/Y/Z distinct non-zero, 0 zero.
        let dirty = original != current;
        let restored = original == value;
        let status = if !dirty && !restored {
            if current.is_zero() {
                StorageStatus::Added // 0 -> 0 -> Z
            } else if value.is_zero() {
                StorageStatus::Deleted // X -> X -> 0
            } else {
                StorageStatus::Modified // X -> X -> Z
            }
        } else if dirty && !restored {
            if current.is_zero() && !value.is_zero() {
                StorageStatus::DeletedAdded // X -> 0 -> Z
            } else if !current.is_zero() && value.is_zero() {
                StorageStatus::ModifiedDeleted // X -> Y -> 0
            } else {
                StorageStatus::Assigned
            }
        } else if dirty && restored {
            if current.is_zero() {
                StorageStatus::DeletedRestored // X -> 0 -> X
            } else if value.is_zero() {
                StorageStatus::AddedDeleted // 0 -> Y -> 0
            } else {
                StorageStatus::ModifiedRestored // X -> Y -> X
            }
        } else {
            StorageStatus::Assigned
        };

        self.state.set_storage(address, key, value);
        status
    }

    fn get_transient_storage(&self, address: Address, key: U256) -> U256 {
        self.state
            .find(&address)
            .and_then(|account| account.transient_storage.get(&key))
            .copied()
            .unwrap_or_default()
    }

    fn set_transient_storage(&mut self, address: Address, key: U256, value: U256) {
        self.state.set_transient_storage(address, key, value);
    }

    fn access_account(&mut self, address: Address) -> AccessStatus {
        // Precompiled contracts are always warm.
        if precompiles::is_precompile(address, self.revision) {
            return AccessStatus::Warm;
        }
        self.state.access_account(address)
    }

    fn access_storage(&mut self, address: Address, key: U256) -> AccessStatus {
        self.state.access_storage_slot(address, key)
    }

    fn emit_log(&mut self, address: Address, data: &[u8], topics: &[H256]) {
        self.logs.push(Log {
            address,
            data: Bytes::copy_from_slice(data),
            topics: topics.to_vec(),
        });
    }

    fn selfdestruct(&mut self, address: Address, beneficiary: Address) -> bool {
        let balance = self.get_balance(address);
        self.state.touch(beneficiary);

        // Transfer the whole balance immediately; this can happen several
        // times for one account when calls refill it between destructions.
        if !balance.is_zero() && beneficiary != address {
            let beneficiary_balance = self.get_balance(beneficiary);
            self.state
                .set_balance(beneficiary, beneficiary_balance + balance);
            self.state.set_balance(address, U256::zero());
        }

        // [EIP-6780]: from Cancun only accounts created in this transaction
        // are actually destructed; a self-beneficiary then burns the funds.
        let destructs =
            self.revision < Revision::Cancun || self.created.contains(&address);
        if !destructs {
            return false;
        }

        let first = !self
            .state
            .find(&address)
            .map(|account| account.destructed)
            .unwrap_or_default();
        self.state.mark_destructed(address);
        if beneficiary == address {
            self.state.set_balance(address, U256::zero());
        }
        first
    }

    fn call(&mut self, msg: &Message) -> ExecutionResult {
        if msg.depth > MAX_CALL_DEPTH {
            // The reserved gas is handed straight back to the caller.
            return ExecutionResult {
                status: StatusCode::CallDepthExceeded,
                gas_left: msg.gas,
                gas_refund: 0,
                output: Bytes::new(),
                create_address: None,
            };
        }

        let checkpoint = self.state.checkpoint();
        let logs_checkpoint = self.logs.len();
        let created_snapshot = self.created.clone();

        let result = self.execute_message(msg);

        if !result.is_success() {
            let address_03 = Address::from_low_u64_be(3);
            let was_03_touched = self
                .state
                .find(&address_03)
                .map(|account| account.touched)
                .unwrap_or_default();

            self.state.rollback(checkpoint);
            self.logs.truncate(logs_checkpoint);
            self.created = created_snapshot;

            // The 0x03 quirk: a touch of this address survives the revert.
            if was_03_touched && self.revision >= Revision::SpuriousDragon {
                self.state.touch(address_03);
            }

            if matches!(msg.kind, CallKind::Create | CallKind::Create2) {
                // The sender's nonce bump is not reverted.
                if msg.depth != 0 {
                    self.state.bump_nonce(msg.sender);
                }
                // By [EIP-2929], neither is the access to the new address.
                if let Some(created_address) = result.create_address {
                    self.state.access_account(created_address);
                }
            }
        }
        result
    }

    fn get_tx_context(&self) -> TxContext {
        let base_fee = if self.revision >= Revision::London {
            self.block.base_fee
        } else {
            U256::zero()
        };
        let priority = self
            .tx
            .max_priority_gas_price
            .min(self.tx.max_gas_price.saturating_sub(base_fee));

        TxContext {
            gas_price: base_fee + priority,
            origin: self.tx.sender,
            coinbase: self.block.coinbase,
            block_number: self.block.number,
            block_timestamp: self.block.timestamp,
            block_gas_limit: self.block.gas_limit,
            prev_randao: if self.revision >= Revision::Paris {
                self.block.prev_randao
            } else {
                // The same slot carries the difficulty pre-merge.
                H256(self.block.difficulty.to_big_endian())
            },
            chain_id: U256::from(self.tx.chain_id),
            base_fee,
            blob_base_fee: if self.revision >= Revision::Cancun {
                crate::transition::blob_gas_price(self.block.excess_blob_gas)
            } else {
                U256::zero()
            },
            blob_hashes: if self.tx.tx_type == TxType::Blob {
                self.tx.blob_hashes.clone()
            } else {
                Vec::new()
            },
        }
    }

    fn get_block_hash(&self, block_number: u64) -> H256 {
        self.block
            .known_block_hashes
            .get(&block_number)
            .copied()
            .unwrap_or_default()
    }
}
