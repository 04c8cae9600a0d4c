use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;

pub type AccountAddress = String;
pub type Currency = String;

#[derive(Debug, PartialEq, Eq)]
pub enum AccountEventKind {
    Deposited,
    Withdrawn,
    /// Raises the slow wallet's lifetime unlocked total to the event amount.
    Unlocked,
}

#[derive(Debug)]
pub struct AccountEvent {
    currency: Currency,
    amount: Decimal,
    kind: AccountEventKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Account holds no balance in currency `{0}`")]
    CurrencyNotRegistered(Currency),
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("Amount exceeds the unlocked portion of a slow wallet")]
    LockedFundsExceeded,
    #[error("Unlock target is below the already unlocked amount")]
    UnlockRegression,
    #[error("Account is not a slow wallet")]
    NotSlowWallet,
    #[error("Amount must not be negative")]
    NegativeAmount,
    #[error("A withdraw capability for this account is already outstanding")]
    CapabilityAlreadyExtracted,
    #[error("Withdraw capability does not match account state")]
    CapabilityMismatch,
}

/// Lockup accounting for a slow wallet, covering a single designated currency.
///
/// Lifetime counters never decrease, so monotonicity of unlocks falls out of
/// the representation: the spendable portion is derived, not stored.
#[derive(Debug)]
pub struct SlowWalletState {
    currency: Currency,
    lifetime_deposited: Decimal,
    lifetime_unlocked: Decimal,
    lifetime_spent: Decimal,
}

impl SlowWalletState {
    fn new(currency: Currency) -> Self {
        Self {
            currency,
            lifetime_deposited: Decimal::ZERO,
            lifetime_unlocked: Decimal::ZERO,
            lifetime_spent: Decimal::ZERO,
        }
    }

    /// Portion of the designated currency currently eligible for withdrawal.
    pub fn spendable(&self) -> Decimal {
        self.lifetime_unlocked - self.lifetime_spent
    }

    pub fn lifetime_deposited(&self) -> Decimal {
        self.lifetime_deposited
    }

    pub fn lifetime_unlocked(&self) -> Decimal {
        self.lifetime_unlocked
    }
}

/// Per-account ledger state. Mutations happen only through [`Account::apply`]
/// with events produced by the `handle_*` methods, which validate against the
/// current state without touching it.
#[derive(Debug, Default)]
pub struct Account {
    balances: HashMap<Currency, Decimal>,
    slow_wallet: Option<SlowWalletState>,
    capability_extracted: bool,
}

impl Account {
    pub fn new(currency: Currency) -> Self {
        let mut balances = HashMap::new();
        balances.insert(currency, Decimal::ZERO);
        Self {
            balances,
            slow_wallet: None,
            capability_extracted: false,
        }
    }

    /// Creates a slow wallet whose lockup applies to `currency`.
    pub fn new_slow_wallet(currency: Currency) -> Self {
        let mut account = Self::new(currency.clone());
        account.slow_wallet = Some(SlowWalletState::new(currency));
        account
    }

    /// Adds a zero balance slot for `currency`. Existing slots are untouched.
    pub fn register_currency(&mut self, currency: Currency) {
        self.balances.entry(currency).or_insert(Decimal::ZERO);
    }

    pub fn balance(&self, currency: &str) -> Option<Decimal> {
        self.balances.get(currency).copied()
    }

    pub fn balances(&self) -> impl Iterator<Item = (&Currency, Decimal)> {
        self.balances
            .iter()
            .map(|(currency, amount)| (currency, *amount))
    }

    pub fn is_slow_wallet(&self) -> bool {
        self.slow_wallet.is_some()
    }

    pub fn slow_wallet(&self) -> Option<&SlowWalletState> {
        self.slow_wallet.as_ref()
    }

    /// The withdrawable portion of `currency`. For ordinary accounts (and for
    /// currencies outside a slow wallet's designated one) this is the full
    /// balance; for the designated currency it is the unlocked remainder.
    pub fn unlocked_amount(&self, currency: &str) -> Option<Decimal> {
        let balance = self.balance(currency)?;
        match &self.slow_wallet {
            Some(slow) if slow.currency == currency => Some(slow.spendable()),
            _ => Some(balance),
        }
    }

    pub(crate) fn capability_extracted(&self) -> bool {
        self.capability_extracted
    }

    pub(crate) fn mark_capability_extracted(&mut self) -> Result<(), AccountError> {
        if self.capability_extracted {
            return Err(AccountError::CapabilityAlreadyExtracted);
        }
        self.capability_extracted = true;
        Ok(())
    }

    pub(crate) fn clear_capability_extracted(&mut self) -> Result<(), AccountError> {
        if !self.capability_extracted {
            return Err(AccountError::CapabilityMismatch);
        }
        self.capability_extracted = false;
        Ok(())
    }

    pub fn handle_deposit(
        &self,
        currency: &str,
        amount: Decimal,
    ) -> Result<AccountEvent, AccountError> {
        if amount < Decimal::ZERO {
            return Err(AccountError::NegativeAmount);
        }
        if !self.balances.contains_key(currency) {
            return Err(AccountError::CurrencyNotRegistered(currency.to_owned()));
        }
        Ok(AccountEvent {
            currency: currency.to_owned(),
            amount,
            kind: AccountEventKind::Deposited,
        })
    }

    pub fn handle_withdrawal(
        &self,
        currency: &str,
        amount: Decimal,
    ) -> Result<AccountEvent, AccountError> {
        if amount < Decimal::ZERO {
            return Err(AccountError::NegativeAmount);
        }
        let balance = self
            .balances
            .get(currency)
            .ok_or_else(|| AccountError::CurrencyNotRegistered(currency.to_owned()))?;
        if amount > *balance {
            return Err(AccountError::InsufficientBalance);
        }
        if let Some(slow) = &self.slow_wallet {
            if slow.currency == currency && amount > slow.spendable() {
                return Err(AccountError::LockedFundsExceeded);
            }
        }
        Ok(AccountEvent {
            currency: currency.to_owned(),
            amount,
            kind: AccountEventKind::Withdrawn,
        })
    }

    /// Validates raising the lifetime unlocked total to `target`. The target
    /// is cumulative: repeating a previous target is an accepted no-op, while
    /// a lower one is rejected. Targets beyond the lifetime deposited total
    /// are capped there, so funds never unlock ahead of their deposit.
    pub fn handle_unlock(&self, target: Decimal) -> Result<AccountEvent, AccountError> {
        if target < Decimal::ZERO {
            return Err(AccountError::NegativeAmount);
        }
        let slow = self
            .slow_wallet
            .as_ref()
            .ok_or(AccountError::NotSlowWallet)?;
        if target < slow.lifetime_unlocked {
            return Err(AccountError::UnlockRegression);
        }
        Ok(AccountEvent {
            currency: slow.currency.clone(),
            amount: target.min(slow.lifetime_deposited),
            kind: AccountEventKind::Unlocked,
        })
    }

    pub fn apply(&mut self, event: &AccountEvent) {
        match event.kind {
            AccountEventKind::Deposited => {
                if let Some(balance) = self.balances.get_mut(&event.currency) {
                    *balance += event.amount;
                }
                if let Some(slow) = &mut self.slow_wallet {
                    if slow.currency == event.currency {
                        slow.lifetime_deposited += event.amount;
                    }
                }
            }
            AccountEventKind::Withdrawn => {
                if let Some(balance) = self.balances.get_mut(&event.currency) {
                    *balance -= event.amount;
                }
                if let Some(slow) = &mut self.slow_wallet {
                    if slow.currency == event.currency {
                        slow.lifetime_spent += event.amount;
                    }
                }
            }
            AccountEventKind::Unlocked => {
                if let Some(slow) = &mut self.slow_wallet {
                    slow.lifetime_unlocked = event.amount;
                }
            }
        }
    }
}
