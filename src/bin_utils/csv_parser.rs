use std::io::Read;

use csv::{DeserializeRecordsIntoIter, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::account::{AccountId, AccountProfile};
use crate::transaction::{OperationType, PartyType, TransactionRequest};

/// One row of the account roster. Accounts get ids assigned in row order,
/// starting at 1.
#[derive(Debug, Deserialize)]
pub struct AccountRow {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub initial_balance: Decimal,
}

impl AccountRow {
    pub fn into_parts(self) -> (AccountProfile, Decimal) {
        let mut profile = AccountProfile::new(self.first_name, self.last_name, self.phone_number);
        profile.email = self.email;
        (profile, self.initial_balance)
    }
}

/// One row of the transaction list. Empty account columns mean the party is
/// external to the store.
#[derive(Debug, Deserialize)]
pub struct TransactionRow {
    #[serde(rename = "type")]
    pub kind: OperationType,
    pub source_type: PartyType,
    pub source: Option<AccountId>,
    pub destination_type: PartyType,
    pub destination: Option<AccountId>,
    pub amount: Decimal,
}

impl TransactionRow {
    pub fn into_request(self) -> TransactionRequest {
        TransactionRequest {
            operation: self.kind,
            amount: self.amount,
            source_type: self.source_type,
            source_account: self.source,
            destination_type: self.destination_type,
            destination_account: self.destination,
        }
    }
}

/// Parses one CSV input into typed rows, tagged with their line number
///
/// # Panics
///
/// If a row cannot be parsed
pub struct CsvRowParser<R, T> {
    iter: DeserializeRecordsIntoIter<R, T>,
}

impl<R, T> CsvRowParser<R, T>
where
    R: Read,
    T: DeserializeOwned,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R, T> Iterator for CsvRowParser<R, T>
where
    R: Read,
    T: DeserializeOwned,
{
    type Item = (u64, T);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row.unwrap()))
    }
}
