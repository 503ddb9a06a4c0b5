mod block;
mod transaction;

pub use block::{BlockInfo, Ommer, Withdrawal};
pub use transaction::{AccessList, AccessListItem, Transaction, TxType};

use crate::Address;
use ethereum_types::H256;
use serde::{Deserialize, Serialize};

/// A log record emitted by `LOG0`..`LOG4`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub data: bytes::Bytes,
    pub topics: Vec<H256>,
}
