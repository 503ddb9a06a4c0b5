//! Execution state of a single call frame.
//!
//! Exclusively owned by the executor for the duration of one frame; nested
//! calls get a fresh one through the host.

use crate::{
    analysis::CodeAnalysis,
    errors::{ExceptionalHalt, VMError},
    host::{Host, Message, TxContext},
    memory::Memory,
    stack::Stack,
};
use aevm_common::Revision;
use bytes::Bytes;

pub struct ExecutionState<'a> {
    pub msg: &'a Message,
    pub revision: Revision,
    pub analysis: &'a CodeAnalysis,
    pub host: &'a mut dyn Host,

    pub stack: Stack,
    pub memory: Memory,
    /// Remaining gas; may go negative transiently inside a translated block,
    /// where the epilogue materializes the out-of-gas status.
    pub gas_left: i64,
    pub gas_refund: i64,
    /// Offset of the instruction being executed.
    pub pc: usize,
    pub output: Bytes,
    /// Output of the most recent nested call.
    pub return_data: Bytes,

    tx_context: Option<TxContext>,
}

impl<'a> ExecutionState<'a> {
    pub fn new(
        msg: &'a Message,
        revision: Revision,
        analysis: &'a CodeAnalysis,
        host: &'a mut dyn Host,
    ) -> Self {
        Self {
            msg,
            revision,
            analysis,
            host,
            stack: Stack::new(),
            memory: Memory::new(),
            gas_left: msg.gas,
            gas_refund: 0,
            pc: 0,
            output: Bytes::new(),
            return_data: Bytes::new(),
            tx_context: None,
        }
    }

    /// Charges dynamic gas on top of the base cost already taken by the
    /// dispatcher or block precheck.
    #[inline]
    pub fn charge_gas(&mut self, cost: u64) -> Result<(), VMError> {
        let cost = i64::try_from(cost).map_err(|_| ExceptionalHalt::OutOfGas)?;
        self.gas_left -= cost;
        if self.gas_left < 0 {
            return Err(ExceptionalHalt::OutOfGas.into());
        }
        Ok(())
    }

    /// The transaction context, fetched from the host once per frame.
    pub fn get_tx_context(&mut self) -> &TxContext {
        let host = &mut self.host;
        self.tx_context.get_or_insert_with(|| host.get_tx_context())
    }
}
