use std::fs::File;

use anyhow::{Context, Result};
use bank_ledger::bin_utils::{Service, ServiceError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let accounts_path = args
        .next()
        .context("Expected an accounts file as the first argument")?;
    let transactions_path = args
        .next()
        .context("Expected a transactions file as the second argument")?;
    let accounts = File::open(&accounts_path)
        .with_context(|| format!("Failed to open `{accounts_path}`"))?;
    let transactions = File::open(&transactions_path)
        .with_context(|| format!("Failed to open `{transactions_path}`"))?;

    let service = Service {
        accounts,
        transactions,
        output: &mut std::io::stdout(),
        error_printer: Box::new(|line, err| {
            match err {
                ServiceError::Declined(_) => {
                    // recorded on the transaction itself, nothing technical to report
                }
                err => eprintln!("Error at line {line}: {err}"),
            }
        }),
    };
    service.run()
}
