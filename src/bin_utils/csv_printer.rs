use std::io::Write;

use crate::account::{AccountAddress, Currency};
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;

/// One output row per (account, currency) pair.
#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub account: AccountAddress,
    pub currency: Currency,
    pub balance: Decimal,
    pub unlocked: Decimal,
    pub slow: bool,
}

pub fn print_accounts<W>(
    output: &mut W,
    accounts: impl Iterator<Item = AccountSummary>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for summary in accounts {
        if let Err(err) = writer.serialize(summary) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    // Ensure all data is flushed to the output
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}
