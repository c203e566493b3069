use std::sync::Arc;

use rust_decimal::{Decimal, prelude::Zero};
use thiserror::Error;

use crate::account::AccountId;
use crate::store::{AccountStore, StoreError};
use crate::transaction::{OperationType, PartyType, Transaction, TransactionRequest};

/// Amounts are fixed-point with 2 fractional digits.
const MAX_AMOUNT_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be positive with at most 2 decimal places, got {0}")]
    InvalidAmount(Decimal),
    #[error("{side:?} party does not fit the shape of a {operation:?} operation")]
    MismatchedPartyType { operation: OperationType, side: Side },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Applies transactions against [`AccountStore`] balances.
///
/// A transfer either lands on both accounts or on neither: the debit leg
/// runs first under both locks and a failed debit releases everything
/// untouched.
pub struct TransactionLedger {
    store: Arc<AccountStore>,
}

impl TransactionLedger {
    pub fn new(store: Arc<AccountStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Checks a request against the shape rules before any state exists:
    /// positive amount within scale, party types matching the operation,
    /// referenced accounts resolving.
    ///
    /// Deposits come from an external party into a user account, withdrawals
    /// leave a user account towards an external party, transfers connect two
    /// user accounts.
    pub fn validate(&self, request: &TransactionRequest) -> Result<(), LedgerError> {
        if request.amount <= Decimal::zero()
            || request.amount.normalize().scale() > MAX_AMOUNT_SCALE
        {
            return Err(LedgerError::InvalidAmount(request.amount));
        }
        match request.operation {
            OperationType::Deposit => {
                self.expect_external(request, Side::Source)?;
                self.expect_user(request, Side::Destination)?;
            }
            OperationType::Withdrawal => {
                self.expect_user(request, Side::Source)?;
                self.expect_external(request, Side::Destination)?;
            }
            OperationType::Transfer => {
                self.expect_user(request, Side::Source)?;
                self.expect_user(request, Side::Destination)?;
            }
        }
        Ok(())
    }

    /// Moves the money a transaction describes. All-or-nothing: on any error
    /// no balance has changed.
    pub fn apply(&self, transaction: &Transaction) -> Result<(), LedgerError> {
        let operation = transaction.operation;
        match operation {
            OperationType::Deposit => {
                let destination =
                    required(transaction.destination_account, operation, Side::Destination)?;
                self.store.apply_delta(destination, transaction.amount)?;
            }
            OperationType::Withdrawal => {
                let source = required(transaction.source_account, operation, Side::Source)?;
                self.store.apply_delta(source, -transaction.amount)?;
            }
            OperationType::Transfer => {
                let source = required(transaction.source_account, operation, Side::Source)?;
                let destination =
                    required(transaction.destination_account, operation, Side::Destination)?;
                self.transfer(source, destination, transaction.amount)?;
            }
        }
        Ok(())
    }

    fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if source == destination {
            // one lock, the legs net to zero but the debit still needs cover
            let mut handle = self.store.lock_and_get(source)?;
            handle.apply_delta(-amount)?;
            handle.apply_delta(amount)?;
            return Ok(());
        }

        // ascending id order, so opposite-direction transfers cannot deadlock
        let low = source.min(destination);
        let high = source.max(destination);
        let low_handle = self.store.lock_and_get(low)?;
        let high_handle = self.store.lock_and_get(high)?;
        let (mut debit, mut credit) = if source == low {
            (low_handle, high_handle)
        } else {
            (high_handle, low_handle)
        };
        debit.apply_delta(-amount)?;
        credit.apply_delta(amount)?;
        Ok(())
    }

    fn expect_user(&self, request: &TransactionRequest, side: Side) -> Result<(), LedgerError> {
        let (party, account) = side_fields(request, side);
        let mismatch = LedgerError::MismatchedPartyType {
            operation: request.operation,
            side,
        };
        if party != PartyType::User {
            return Err(mismatch);
        }
        let Some(id) = account else {
            return Err(mismatch);
        };
        self.store.balance(id)?;
        Ok(())
    }

    fn expect_external(&self, request: &TransactionRequest, side: Side) -> Result<(), LedgerError> {
        let (party, account) = side_fields(request, side);
        if party == PartyType::User || account.is_some() {
            return Err(LedgerError::MismatchedPartyType {
                operation: request.operation,
                side,
            });
        }
        Ok(())
    }
}

fn side_fields(request: &TransactionRequest, side: Side) -> (PartyType, Option<AccountId>) {
    match side {
        Side::Source => (request.source_type, request.source_account),
        Side::Destination => (request.destination_type, request.destination_account),
    }
}

fn required(
    account: Option<AccountId>,
    operation: OperationType,
    side: Side,
) -> Result<AccountId, LedgerError> {
    account.ok_or(LedgerError::MismatchedPartyType { operation, side })
}
