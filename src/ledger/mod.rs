use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    account::{AccountAddress, AccountError, Currency},
    capability::WithdrawCapability,
    command::{CommandError, LedgerCommand},
};

pub mod in_memory_ledger;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Unknown account `{0}`")]
    UnknownAccount(AccountAddress),
    #[error("Account `{0}` already exists")]
    DuplicateAccount(AccountAddress),
    #[error(transparent)]
    CommandErr(#[from] CommandError),
    #[error(transparent)]
    AccountErr(#[from] AccountError),
}

/// Bookkeeping record appended on every successful movement of funds.
/// `source` is `None` for external deposits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub source: Option<AccountAddress>,
    pub destination: AccountAddress,
    pub currency: Currency,
    pub amount: Decimal,
    pub metadata: Option<String>,
}

/// The store of accounts, mutated only through atomic operations: each call
/// either lands completely or leaves every account exactly as it was.
///
/// Withdrawals are gated by [`WithdrawCapability`]: `pay_from` is the only
/// way funds leave an account, and it demands a live token bound to the
/// source. Extracting the token while another is outstanding fails, which is
/// what serializes operations touching the same account.
pub trait Ledger {
    fn register_account(
        &mut self,
        address: AccountAddress,
        currency: Currency,
    ) -> Result<(), LedgerError>;

    fn register_slow_wallet(
        &mut self,
        address: AccountAddress,
        currency: Currency,
    ) -> Result<(), LedgerError>;

    /// External credit (mint/faucet side); no capability involved since no
    /// account is debited.
    fn deposit(
        &mut self,
        address: &AccountAddress,
        currency: &Currency,
        amount: Decimal,
        metadata: Option<String>,
    ) -> Result<(), LedgerError>;

    fn extract_withdraw_capability(
        &mut self,
        address: &AccountAddress,
    ) -> Result<WithdrawCapability, LedgerError>;

    fn restore_withdraw_capability(
        &mut self,
        capability: WithdrawCapability,
    ) -> Result<(), LedgerError>;

    /// Debits the capability's account and credits `destination`, both sides
    /// validated before either is touched.
    fn pay_from(
        &mut self,
        capability: &WithdrawCapability,
        destination: &AccountAddress,
        currency: &Currency,
        amount: Decimal,
        metadata: Option<String>,
    ) -> Result<(), LedgerError>;

    /// Raises a slow wallet's cumulative unlocked total to `target`.
    fn unlock(&mut self, address: &AccountAddress, target: Decimal) -> Result<(), LedgerError>;

    /// Currently withdrawable portion of `currency` held by `address`.
    fn unlocked_amount(
        &self,
        address: &AccountAddress,
        currency: &Currency,
    ) -> Result<Decimal, LedgerError>;

    /// One complete payment: extract the capability, pay, hand it back.
    /// The capability is restored whether or not the payment succeeded.
    fn transfer(
        &mut self,
        source: &AccountAddress,
        destination: &AccountAddress,
        currency: &Currency,
        amount: Decimal,
        metadata: Option<String>,
    ) -> Result<(), LedgerError> {
        let capability = self.extract_withdraw_capability(source)?;
        let payment = self.pay_from(&capability, destination, currency, amount, metadata);
        self.restore_withdraw_capability(capability)?;
        payment
    }

    fn execute_command(&mut self, command: LedgerCommand) -> Result<(), LedgerError> {
        match command {
            LedgerCommand::Register(cmd) => {
                if cmd.slow {
                    self.register_slow_wallet(cmd.address, cmd.currency)
                } else {
                    self.register_account(cmd.address, cmd.currency)
                }
            }
            LedgerCommand::Deposit(cmd) => {
                self.deposit(&cmd.address, &cmd.currency, cmd.amount, cmd.metadata)
            }
            LedgerCommand::Transfer(cmd) => self.transfer(
                &cmd.source,
                &cmd.destination,
                &cmd.currency,
                cmd.amount,
                cmd.metadata,
            ),
            LedgerCommand::Unlock(cmd) => self.unlock(&cmd.address, cmd.target),
        }
    }
}
