//! This module could be a separate crate on its own, to bootstrap [`lockbox_ledger`] within binary
//! but for simplicitly purposes, I include this module directly in binary.

use std::io::{Read, Write};

use crate::{
    command::LedgerCommand,
    ledger::{Ledger, LedgerError, in_memory_ledger::InMemoryLedger},
};
use anyhow::Result;
use csv_parser::CsvTransactionParser;
use csv_printer::{AccountSummary, print_accounts};
pub mod csv_parser;
pub mod csv_printer;

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(u64, LedgerError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let parser = CsvTransactionParser::new(self.input);

        let mut ledger = InMemoryLedger::default();

        for (line, row) in parser {
            let outcome = LedgerCommand::parse_command(
                row.kind,
                row.account,
                row.currency,
                row.to,
                row.amount,
                row.metadata,
            )
            .map_err(LedgerError::from)
            .and_then(|cmd| ledger.execute_command(cmd));
            if let Err(err) = outcome {
                (self.error_printer)(line, err);
            }
        }

        print_accounts(
            self.output,
            ledger.accounts.iter().flat_map(|(address, acc)| {
                acc.balances().map(move |(currency, balance)| AccountSummary {
                    account: address.clone(),
                    currency: currency.clone(),
                    balance,
                    unlocked: acc.unlocked_amount(currency).unwrap_or_default(),
                    slow: acc.is_slow_wallet(),
                })
            }),
        )
    }
}
