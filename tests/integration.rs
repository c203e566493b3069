use std::str::from_utf8;

use bank_ledger::bin_utils::{Service, ServiceError};

const ACCOUNTS_FILE: &str = include_str!("accounts.csv");
const TRANSACTIONS_FILE: &str = include_str!("transactions.csv");

#[test]
fn process_transactions() {
    let mut output = Vec::new();
    let service = Service {
        accounts: ACCOUNTS_FILE.as_bytes(),
        transactions: TRANSACTIONS_FILE.as_bytes(),
        output: &mut output,
        error_printer: Box::new(|line, err| {
            match err {
                ServiceError::Declined(_) => {
                    // these are not technical errors, so we don't need to print them
                }
                err => eprintln!("Error at line {line}: {err}"),
            }
        }),
    };
    service.run().unwrap();

    // Carol's roster row reuses Alice's phone number and is skipped; the
    // oversized withdrawal and the deposit to an unknown account decline
    // without touching anything. Report rows are sorted by account id.
    let lines: Vec<&str> = from_utf8(&output).unwrap().lines().collect();
    assert_eq!(
        lines,
        vec![
            "account,initial_balance,current_balance",
            "1,100.00,95.50",
            "2,50.00,60.00",
        ]
    );
}
