use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::account::{AccountId, Balance};
use crate::ledger::TransactionLedger;
use crate::store::StoreError;
use crate::transaction::{Transaction, TransactionId, TransactionRequest, TransactionStatus};

use super::{ProcessError, TransactionProcessor, TransactionResult};

/// Keeps transaction records in process memory.
///
/// The registry lock is held only for lookups and inserts; each record has
/// its own lock, so transactions over disjoint accounts execute in parallel
/// while duplicate executes of the same id serialize.
pub struct InMemoryTransactionProcessor {
    ledger: TransactionLedger,
    transactions: RwLock<HashMap<TransactionId, Arc<Mutex<Transaction>>>>,
    next_id: AtomicU64,
}

impl InMemoryTransactionProcessor {
    pub fn new(ledger: TransactionLedger) -> Self {
        Self {
            ledger,
            transactions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    fn record(&self, id: TransactionId) -> Result<Arc<Mutex<Transaction>>, ProcessError> {
        self.transactions
            .read()
            .get(&id)
            .cloned()
            .ok_or(ProcessError::UnknownTransaction(id))
    }
}

fn result_of(transaction: &Transaction) -> TransactionResult {
    TransactionResult {
        id: transaction.id,
        status: transaction.status,
        reason: transaction.decline_reason.clone(),
    }
}

impl TransactionProcessor for InMemoryTransactionProcessor {
    fn submit(&self, request: TransactionRequest) -> TransactionResult {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let validation = self.ledger.validate(&request);
        let mut transaction = Transaction::from_request(id, request);
        match validation {
            Ok(()) => {
                transaction.status = TransactionStatus::InProgress;
                debug!(tx = id, operation = ?transaction.operation, "transaction submitted");
            }
            Err(reason) => {
                warn!(tx = id, %reason, "transaction declined at validation");
                transaction.status = TransactionStatus::Decline;
                transaction.decline_reason = Some(reason);
            }
        }
        let result = result_of(&transaction);
        self.transactions
            .write()
            .insert(id, Arc::new(Mutex::new(transaction)));
        result
    }

    fn execute(&self, id: TransactionId) -> Result<TransactionResult, ProcessError> {
        let record = self.record(id)?;
        let mut transaction = record.lock();
        match transaction.status {
            TransactionStatus::Success | TransactionStatus::Decline => {
                return Err(ProcessError::AlreadyFinalized {
                    id,
                    status: transaction.status,
                });
            }
            TransactionStatus::Waiting => return Err(ProcessError::NotValidated(id)),
            TransactionStatus::InProgress => {}
        }
        match self.ledger.apply(&transaction) {
            Ok(()) => {
                transaction.status = TransactionStatus::Success;
                debug!(tx = id, "transaction applied");
            }
            Err(reason) => {
                warn!(tx = id, %reason, "transaction declined");
                transaction.status = TransactionStatus::Decline;
                transaction.decline_reason = Some(reason);
            }
        }
        Ok(result_of(&transaction))
    }

    fn transaction(&self, id: TransactionId) -> Result<Transaction, ProcessError> {
        Ok(self.record(id)?.lock().clone())
    }

    fn balance(&self, account: AccountId) -> Result<Balance, StoreError> {
        self.ledger.store().balance(account)
    }
}
