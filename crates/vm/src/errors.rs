//! Error planes of the execution engine.
//!
//! Execution faults are split in two:
//! - [`ExceptionalHalt`]: recoverable at the caller frame; becomes a
//!   [`StatusCode`] on the frame result and triggers a journal rollback to
//!   the checkpoint taken at call entry.
//! - [`InternalError`]: invariant violations that should never be observed;
//!   they abort the whole transition instead of being absorbed by a frame.
//!
//! Transaction validation has its own taxonomy ([`TxValidationError`]) and
//! never reaches the interpreter.

use serde::Serialize;
use thiserror::Error;

/// Recoverable execution fault of a single call frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExceptionalHalt {
    #[error("out of gas")]
    OutOfGas,
    #[error("invalid instruction")]
    InvalidInstruction,
    #[error("undefined instruction")]
    UndefinedInstruction,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("bad jump destination")]
    BadJumpDestination,
    #[error("invalid memory access")]
    InvalidMemoryAccess,
    #[error("static mode violation")]
    StaticModeViolation,
    #[error("precompile failure")]
    PrecompileFailure,
    #[error("call depth exceeded")]
    CallDepthExceeded,
    #[error("contract validation failure")]
    ContractValidationFailure,
    #[error("argument out of range")]
    ArgumentOutOfRange,
}

/// Invariant violation inside the engine. Never expected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("arithmetic overflow")]
    Overflow,
    #[error("arithmetic underflow")]
    Underflow,
    #[error("slice indexing out of bounds")]
    Slicing,
    #[error("type conversion failure")]
    TypeConversion,
    #[error("account unexpectedly missing from state")]
    AccountNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VMError {
    /// The REVERT instruction: not a fault, but unwinds the frame keeping
    /// gas and output.
    #[error("revert")]
    RevertOpcode,
    #[error(transparent)]
    ExceptionalHalt(#[from] ExceptionalHalt),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl VMError {
    pub fn is_internal(&self) -> bool {
        matches!(self, VMError::Internal(_))
    }
}

/// Frame result status, as observed by embedders and caller frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum StatusCode {
    #[default]
    Success,
    Revert,
    OutOfGas,
    InvalidInstruction,
    UndefinedInstruction,
    StackUnderflow,
    StackOverflow,
    BadJumpDestination,
    InvalidMemoryAccess,
    StaticModeViolation,
    PrecompileFailure,
    CallDepthExceeded,
    ContractValidationFailure,
    ArgumentOutOfRange,
    Failure,
}

impl StatusCode {
    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Success)
    }

    /// True for statuses that keep the frame's remaining gas.
    pub fn keeps_gas(&self) -> bool {
        matches!(self, StatusCode::Success | StatusCode::Revert)
    }
}

impl From<ExceptionalHalt> for StatusCode {
    fn from(halt: ExceptionalHalt) -> Self {
        match halt {
            ExceptionalHalt::OutOfGas => StatusCode::OutOfGas,
            ExceptionalHalt::InvalidInstruction => StatusCode::InvalidInstruction,
            ExceptionalHalt::UndefinedInstruction => StatusCode::UndefinedInstruction,
            ExceptionalHalt::StackUnderflow => StatusCode::StackUnderflow,
            ExceptionalHalt::StackOverflow => StatusCode::StackOverflow,
            ExceptionalHalt::BadJumpDestination => StatusCode::BadJumpDestination,
            ExceptionalHalt::InvalidMemoryAccess => StatusCode::InvalidMemoryAccess,
            ExceptionalHalt::StaticModeViolation => StatusCode::StaticModeViolation,
            ExceptionalHalt::PrecompileFailure => StatusCode::PrecompileFailure,
            ExceptionalHalt::CallDepthExceeded => StatusCode::CallDepthExceeded,
            ExceptionalHalt::ContractValidationFailure => StatusCode::ContractValidationFailure,
            ExceptionalHalt::ArgumentOutOfRange => StatusCode::ArgumentOutOfRange,
        }
    }
}

impl From<&VMError> for StatusCode {
    fn from(err: &VMError) -> Self {
        match err {
            VMError::RevertOpcode => StatusCode::Revert,
            VMError::ExceptionalHalt(halt) => (*halt).into(),
            VMError::Internal(_) => StatusCode::Failure,
        }
    }
}

/// Outcome of one opcode handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeResult {
    /// Keep executing; advance the program counter by `pc_increment`.
    /// Jump handlers set the counter themselves and return an increment of
    /// zero.
    Continue { pc_increment: usize },
    /// Terminate the frame (STOP, RETURN, SELFDESTRUCT).
    Halt,
}

/// Transaction rejection reasons. Fatal to the transaction: no state change
/// is persisted and the interpreter is never entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TxValidationError {
    #[error("intrinsic gas too low")]
    IntrinsicGasTooLow,
    #[error("nonce too high")]
    NonceTooHigh,
    #[error("nonce too low")]
    NonceTooLow,
    #[error("nonce has max value")]
    NonceHasMaxValue,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("block gas limit reached")]
    GasLimitReached,
    #[error("fee cap less than block base fee")]
    FeeCapLessThanBlocks,
    #[error("priority fee greater than fee cap")]
    TipGreaterThanFeeCap,
    #[error("transaction type not supported by revision")]
    TxTypeNotSupported,
    #[error("sender not an externally owned account")]
    SenderNotEoa,
    #[error("initcode size limit exceeded")]
    InitCodeSizeLimitExceeded,
    #[error("blob transaction must not be a create")]
    CreateBlobTx,
    #[error("blob hashes list is empty")]
    EmptyBlobHashesList,
    #[error("blob hashes list size limit exceeded")]
    BlobHashesListSizeLimitExceeded,
    #[error("invalid blob hash version")]
    InvalidBlobHashVersion,
    #[error("blob gas limit exceeded")]
    BlobGasLimitExceeded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halt_maps_to_matching_status() {
        assert_eq!(StatusCode::from(ExceptionalHalt::OutOfGas), StatusCode::OutOfGas);
        assert_eq!(
            StatusCode::from(&VMError::RevertOpcode),
            StatusCode::Revert
        );
        assert_eq!(
            StatusCode::from(&VMError::Internal(InternalError::Overflow)),
            StatusCode::Failure
        );
    }

    #[test]
    fn gas_keeping_statuses() {
        assert!(StatusCode::Success.keeps_gas());
        assert!(StatusCode::Revert.keeps_gas());
        assert!(!StatusCode::OutOfGas.keeps_gas());
        assert!(!StatusCode::BadJumpDestination.keeps_gas());
    }
}
