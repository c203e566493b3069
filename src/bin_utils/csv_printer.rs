use std::io::Write;

use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::account::AccountId;

#[derive(Debug, Serialize)]
pub struct BalanceRow {
    pub account: AccountId,
    pub initial_balance: Decimal,
    pub current_balance: Decimal,
}

pub fn print_balances<W>(
    output: &mut W,
    balances: impl Iterator<Item = BalanceRow>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for row in balances {
        if let Err(err) = writer.serialize(row) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    // Ensure all data is flushed to the output
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}
