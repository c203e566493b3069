//! This module could be a separate crate on its own, to bootstrap [`bank_ledger`] within binary
//! but for simplicitly purposes, I include this module directly in binary.

use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use crate::ledger::{LedgerError, TransactionLedger};
use crate::processor::{
    ProcessError, TransactionProcessor, in_memory_processor::InMemoryTransactionProcessor,
};
use crate::store::{AccountStore, StoreError};
use crate::transaction::TransactionStatus;
use csv_parser::{AccountRow, CsvRowParser, TransactionRow};
use csv_printer::{BalanceRow, print_balances};

pub mod csv_parser;
pub mod csv_printer;

/// Non-fatal per-row failures handed to the service's error hook.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("transaction declined: {0}")]
    Declined(LedgerError),
}

pub struct Service<'w, A, T, W: 'w> {
    pub accounts: A,
    pub transactions: T,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(u64, ServiceError)>,
}

impl<'w, A, T, W> Service<'w, A, T, W>
where
    A: Read,
    T: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let store = Arc::new(AccountStore::default());

        let mut ids = Vec::new();
        for (line, row) in CsvRowParser::<_, AccountRow>::new(self.accounts) {
            let (profile, initial_balance) = row.into_parts();
            match store.open_account(profile, initial_balance) {
                Ok(id) => ids.push(id),
                Err(err) => (self.error_printer)(line, err.into()),
            }
        }

        let processor =
            InMemoryTransactionProcessor::new(TransactionLedger::new(Arc::clone(&store)));
        for (line, row) in CsvRowParser::<_, TransactionRow>::new(self.transactions) {
            let submitted = processor.submit(row.into_request());
            let outcome = if submitted.status == TransactionStatus::InProgress {
                match processor.execute(submitted.id) {
                    Ok(result) => result,
                    Err(err) => {
                        (self.error_printer)(line, err.into());
                        continue;
                    }
                }
            } else {
                submitted
            };
            if let Some(reason) = outcome.reason {
                (self.error_printer)(line, ServiceError::Declined(reason));
            }
        }

        // ids come out of the store in ascending order, so the report is stable
        let mut rows = Vec::new();
        for id in ids {
            let balance = store.balance(id)?;
            rows.push(BalanceRow {
                account: id,
                initial_balance: balance.initial(),
                current_balance: balance.current(),
            });
        }
        print_balances(self.output, rows.into_iter())
    }
}
