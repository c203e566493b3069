use thiserror::Error;

use crate::account::{AccountId, Balance};
use crate::ledger::LedgerError;
use crate::store::StoreError;
use crate::transaction::{Transaction, TransactionId, TransactionRequest, TransactionStatus};

pub mod in_memory_processor;

/// Caller mistakes when driving the state machine. These never decline a
/// transaction; declines are carried inside [`TransactionResult`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("transaction {0} does not exist")]
    UnknownTransaction(TransactionId),
    #[error("transaction {id} is already finalized as {status:?}")]
    AlreadyFinalized {
        id: TransactionId,
        status: TransactionStatus,
    },
    #[error("transaction {0} has not been validated yet")]
    NotValidated(TransactionId),
}

/// What a submit or execute call left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    pub id: TransactionId,
    pub status: TransactionStatus,
    pub reason: Option<LedgerError>,
}

pub trait TransactionProcessor {
    /// Records a transaction and validates it: WAITING moves to IN_PROGRESS,
    /// or straight to DECLINE with the validation failure as reason.
    fn submit(&self, request: TransactionRequest) -> TransactionResult;

    /// Applies an IN_PROGRESS transaction: SUCCESS on a clean application,
    /// DECLINE with reason on any ledger failure. Terminal transactions are
    /// rejected with [`ProcessError::AlreadyFinalized`] and nothing moves.
    fn execute(&self, id: TransactionId) -> Result<TransactionResult, ProcessError>;

    /// Reads back a stored transaction record.
    fn transaction(&self, id: TransactionId) -> Result<Transaction, ProcessError>;

    /// Reads the balance of one account.
    fn balance(&self, account: AccountId) -> Result<Balance, StoreError>;
}
