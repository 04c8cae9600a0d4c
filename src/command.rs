use rust_decimal::{Decimal, prelude::Zero};
use serde::Deserialize;
use thiserror::Error;

use crate::account::{AccountAddress, Currency};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Open,
    OpenSlow,
    Deposit,
    Transfer,
    Unlock,
}

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub address: AccountAddress,
    pub currency: Currency,
    pub slow: bool,
}

#[derive(Debug, Clone)]
pub struct DepositCommand {
    pub address: AccountAddress,
    pub currency: Currency,
    pub amount: Decimal,
    pub metadata: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransferCommand {
    pub source: AccountAddress,
    pub destination: AccountAddress,
    pub currency: Currency,
    pub amount: Decimal,
    pub metadata: Option<String>,
}

/// `target` is the new cumulative unlocked total, not a delta.
#[derive(Debug, Clone)]
pub struct UnlockCommand {
    pub address: AccountAddress,
    pub target: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Amount is required for {kind:?}")]
    AmountRequired { kind: TransactionKind },
    #[error("Amount must not be negative for {kind:?}")]
    NegativeAmount { kind: TransactionKind },
    #[error("A destination account is required for {kind:?}")]
    DestinationRequired { kind: TransactionKind },
}

#[derive(Debug)]
pub enum LedgerCommand {
    Register(RegisterCommand),
    Deposit(DepositCommand),
    Transfer(TransferCommand),
    Unlock(UnlockCommand),
}

impl LedgerCommand {
    pub fn parse_command(
        kind: TransactionKind,
        account: AccountAddress,
        currency: Currency,
        to: Option<AccountAddress>,
        amount: Option<Decimal>,
        metadata: Option<String>,
    ) -> Result<Self, CommandError> {
        match kind {
            TransactionKind::Open => Ok(Self::Register(RegisterCommand {
                address: account,
                currency,
                slow: false,
            })),
            TransactionKind::OpenSlow => Ok(Self::Register(RegisterCommand {
                address: account,
                currency,
                slow: true,
            })),
            TransactionKind::Deposit => Ok(Self::Deposit(DepositCommand {
                address: account,
                currency,
                amount: Self::parse_amount(kind, amount)?,
                metadata,
            })),
            TransactionKind::Transfer => {
                let Some(destination) = to else {
                    return Err(CommandError::DestinationRequired { kind });
                };
                Ok(Self::Transfer(TransferCommand {
                    source: account,
                    destination,
                    currency,
                    amount: Self::parse_amount(kind, amount)?,
                    metadata,
                }))
            }
            TransactionKind::Unlock => Ok(Self::Unlock(UnlockCommand {
                address: account,
                target: Self::parse_amount(kind, amount)?,
            })),
        }
    }

    fn parse_amount(
        kind: TransactionKind,
        amount: Option<Decimal>,
    ) -> Result<Decimal, CommandError> {
        let Some(amount) = amount else {
            return Err(CommandError::AmountRequired { kind });
        };
        if amount < Decimal::zero() {
            return Err(CommandError::NegativeAmount { kind });
        }
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    #[test]
    fn parse_transfer() {
        let cmd = LedgerCommand::parse_command(
            TransactionKind::Transfer,
            "carol".to_owned(),
            "coin1".to_owned(),
            Some("bob".to_owned()),
            Some(Decimal::from_u32(10).unwrap()),
            Some("rent".to_owned()),
        )
        .unwrap();
        let LedgerCommand::Transfer(cmd) = cmd else {
            panic!("expected a transfer command");
        };
        assert_eq!(cmd.source, "carol");
        assert_eq!(cmd.destination, "bob");
        assert_eq!(cmd.amount, Decimal::from_u32(10).unwrap());
        assert_eq!(cmd.metadata.as_deref(), Some("rent"));
    }

    #[test]
    fn transfer_requires_destination() {
        let err = LedgerCommand::parse_command(
            TransactionKind::Transfer,
            "carol".to_owned(),
            "coin1".to_owned(),
            None,
            Some(Decimal::from_u32(10).unwrap()),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CommandError::DestinationRequired {
                kind: TransactionKind::Transfer
            }
        );
    }

    #[test]
    fn amount_validation() {
        let err = LedgerCommand::parse_command(
            TransactionKind::Deposit,
            "bob".to_owned(),
            "coin1".to_owned(),
            None,
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CommandError::AmountRequired {
                kind: TransactionKind::Deposit
            }
        );

        let err = LedgerCommand::parse_command(
            TransactionKind::Unlock,
            "alice".to_owned(),
            "coin1".to_owned(),
            None,
            Some(Decimal::from_i32(-1).unwrap()),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CommandError::NegativeAmount {
                kind: TransactionKind::Unlock
            }
        );
    }

    #[test]
    fn open_needs_no_amount() {
        let cmd = LedgerCommand::parse_command(
            TransactionKind::OpenSlow,
            "alice".to_owned(),
            "coin1".to_owned(),
            None,
            None,
            None,
        )
        .unwrap();
        let LedgerCommand::Register(cmd) = cmd else {
            panic!("expected a register command");
        };
        assert!(cmd.slow);
    }
}
