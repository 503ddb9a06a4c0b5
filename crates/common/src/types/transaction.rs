use crate::{constants::GAS_PER_BLOB, Address};
use bytes::Bytes;
use ethereum_types::{H256, U256};
use serde::{Deserialize, Serialize};

/// Transaction envelope type ([EIP-2718]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum TxType {
    /// The RLP-encoded transaction without a leading type byte.
    #[default]
    Legacy = 0,
    /// Optional account/storage access list ([EIP-2930]).
    AccessList = 1,
    /// Priority gas price ([EIP-1559]).
    Eip1559 = 2,
    /// Blob-carrying transaction ([EIP-4844]).
    Blob = 3,
}

pub type AccessList = Vec<AccessListItem>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<U256>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_type: TxType,
    pub nonce: u64,
    pub gas_limit: u64,
    /// For legacy transactions this is the gas price; for EIP-1559 and blob
    /// transactions it is the fee cap.
    pub max_gas_price: U256,
    /// For legacy and access-list transactions this must equal
    /// `max_gas_price`.
    pub max_priority_gas_price: U256,
    /// `None` denotes contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub access_list: AccessList,
    pub blob_hashes: Vec<H256>,
    pub max_blob_gas_price: U256,
    pub chain_id: u64,
    pub sender: Address,
    pub v: U256,
    pub r: U256,
    pub s: U256,
}

impl Transaction {
    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }

    /// Total blob gas consumed by this transaction.
    pub fn blob_gas(&self) -> u64 {
        GAS_PER_BLOB * self.blob_hashes.len() as u64
    }
}
