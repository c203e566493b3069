use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::account::AccountId;
use crate::ledger::LedgerError;

pub type TransactionId = u64;

/// Money movements the ledger understands.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Deposit,
    Withdrawal,
    Transfer,
}

/// Who sits on one end of a transaction. Only [`PartyType::User`] parties
/// reference an account held by the store; banks and providers are external.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PartyType {
    User,
    Bank,
    Provider,
}

/// Lifecycle of a transaction. `Success` and `Decline` are terminal, no
/// further transitions are permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Waiting,
    InProgress,
    Success,
    Decline,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Decline)
    }
}

/// Intent handed to the processor. Ids and timestamps are assigned there.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub operation: OperationType,
    pub amount: Decimal,
    pub source_type: PartyType,
    pub source_account: Option<AccountId>,
    pub destination_type: PartyType,
    pub destination_account: Option<AccountId>,
}

/// Stored transaction record. Once the status is terminal the record is
/// immutable; re-processing is rejected instead of repeated.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub operation: OperationType,
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
    pub source_type: PartyType,
    pub source_account: Option<AccountId>,
    pub destination_type: PartyType,
    pub destination_account: Option<AccountId>,
    pub status: TransactionStatus,
    pub decline_reason: Option<LedgerError>,
}

impl Transaction {
    pub fn from_request(id: TransactionId, request: TransactionRequest) -> Self {
        Self {
            id,
            operation: request.operation,
            amount: request.amount,
            transaction_date: Utc::now(),
            source_type: request.source_type,
            source_account: request.source_account,
            destination_type: request.destination_type,
            destination_account: request.destination_account,
            status: TransactionStatus::Waiting,
            decline_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_success_and_decline_are_terminal() {
        assert!(!TransactionStatus::Waiting.is_terminal());
        assert!(!TransactionStatus::InProgress.is_terminal());
        assert!(TransactionStatus::Success.is_terminal());
        assert!(TransactionStatus::Decline.is_terminal());
    }
}
