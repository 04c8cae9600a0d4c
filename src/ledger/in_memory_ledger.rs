use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::{
    account::{Account, AccountAddress, AccountError, Currency},
    capability::WithdrawCapability,
};

use super::{Ledger, LedgerError, PaymentEvent};

/// In-memory account store. Each operation validates fully against the
/// current state, producing account events, and only then applies them, so a
/// failure never leaves a partial mutation behind.
#[derive(Default)]
pub struct InMemoryLedger {
    pub accounts: HashMap<AccountAddress, Account>,
    payments: Vec<PaymentEvent>,
}

impl InMemoryLedger {
    pub fn payments(&self) -> &[PaymentEvent] {
        &self.payments
    }

    fn account(&self, address: &AccountAddress) -> Result<&Account, LedgerError> {
        self.accounts
            .get(address)
            .ok_or_else(|| LedgerError::UnknownAccount(address.clone()))
    }

    fn account_mut(&mut self, address: &AccountAddress) -> Result<&mut Account, LedgerError> {
        self.accounts
            .get_mut(address)
            .ok_or_else(|| LedgerError::UnknownAccount(address.clone()))
    }

    fn insert_account(
        &mut self,
        address: AccountAddress,
        account: Account,
    ) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&address) {
            return Err(LedgerError::DuplicateAccount(address));
        }
        self.accounts.insert(address, account);
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn register_account(
        &mut self,
        address: AccountAddress,
        currency: Currency,
    ) -> Result<(), LedgerError> {
        self.insert_account(address, Account::new(currency))
    }

    fn register_slow_wallet(
        &mut self,
        address: AccountAddress,
        currency: Currency,
    ) -> Result<(), LedgerError> {
        self.insert_account(address, Account::new_slow_wallet(currency))
    }

    fn deposit(
        &mut self,
        address: &AccountAddress,
        currency: &Currency,
        amount: Decimal,
        metadata: Option<String>,
    ) -> Result<(), LedgerError> {
        let account = self.account_mut(address)?;
        let evt = account.handle_deposit(currency, amount)?;
        account.apply(&evt);
        self.payments.push(PaymentEvent {
            source: None,
            destination: address.clone(),
            currency: currency.clone(),
            amount,
            metadata,
        });
        Ok(())
    }

    fn extract_withdraw_capability(
        &mut self,
        address: &AccountAddress,
    ) -> Result<WithdrawCapability, LedgerError> {
        self.account_mut(address)?.mark_capability_extracted()?;
        Ok(WithdrawCapability::new(address.clone()))
    }

    fn restore_withdraw_capability(
        &mut self,
        mut capability: WithdrawCapability,
    ) -> Result<(), LedgerError> {
        // The token is surrendered either way; only the flag check can fail.
        capability.mark_restored();
        self.account_mut(capability.address())?
            .clear_capability_extracted()?;
        Ok(())
    }

    fn pay_from(
        &mut self,
        capability: &WithdrawCapability,
        destination: &AccountAddress,
        currency: &Currency,
        amount: Decimal,
        metadata: Option<String>,
    ) -> Result<(), LedgerError> {
        let source = capability.address();

        let source_account = self.account(source)?;
        if !source_account.capability_extracted() {
            // A token exists that the ledger never issued, or state diverged.
            return Err(AccountError::CapabilityMismatch.into());
        }
        let withdraw_evt = source_account.handle_withdrawal(currency, amount)?;
        let deposit_evt = self.account(destination)?.handle_deposit(currency, amount)?;

        // Both sides validated; the lookups below cannot fail.
        self.account_mut(source)?.apply(&withdraw_evt);
        self.account_mut(destination)?.apply(&deposit_evt);
        self.payments.push(PaymentEvent {
            source: Some(source.clone()),
            destination: destination.clone(),
            currency: currency.clone(),
            amount,
            metadata,
        });
        Ok(())
    }

    fn unlock(&mut self, address: &AccountAddress, target: Decimal) -> Result<(), LedgerError> {
        let account = self.account_mut(address)?;
        let evt = account.handle_unlock(target)?;
        account.apply(&evt);
        Ok(())
    }

    fn unlocked_amount(
        &self,
        address: &AccountAddress,
        currency: &Currency,
    ) -> Result<Decimal, LedgerError> {
        self.account(address)?
            .unlocked_amount(currency)
            .ok_or_else(|| AccountError::CurrencyNotRegistered(currency.clone()).into())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    fn dec(value: u32) -> Decimal {
        Decimal::from_u32(value).unwrap()
    }

    fn coin() -> Currency {
        "coin1".to_owned()
    }

    fn ledger_with_funded(address: &str, amount: u32) -> InMemoryLedger {
        let mut ledger = InMemoryLedger::default();
        ledger.register_account(address.to_owned(), coin()).unwrap();
        ledger
            .deposit(&address.to_owned(), &coin(), dec(amount), None)
            .unwrap();
        ledger
    }

    #[test]
    fn transfer_conserves_supply() {
        let mut ledger = ledger_with_funded("carol", 10);
        ledger.register_account("bob".to_owned(), coin()).unwrap();
        ledger
            .deposit(&"bob".to_owned(), &coin(), dec(10), None)
            .unwrap();

        ledger
            .transfer(
                &"carol".to_owned(),
                &"bob".to_owned(),
                &coin(),
                dec(10),
                Some("settlement".to_owned()),
            )
            .unwrap();

        let bob = ledger.accounts.get("bob").unwrap();
        let carol = ledger.accounts.get("carol").unwrap();
        assert_eq!(bob.balance("coin1"), Some(dec(20)));
        assert_eq!(carol.balance("coin1"), Some(dec(0)));
        assert_eq!(
            bob.balance("coin1").unwrap() + carol.balance("coin1").unwrap(),
            dec(20)
        );

        let payment = ledger.payments().last().unwrap();
        assert_eq!(payment.source.as_deref(), Some("carol"));
        assert_eq!(payment.destination, "bob");
        assert_eq!(payment.amount, dec(10));
        assert_eq!(payment.metadata.as_deref(), Some("settlement"));
    }

    #[test]
    fn capability_is_unique_until_restored() {
        let mut ledger = ledger_with_funded("carol", 10);
        let address = "carol".to_owned();

        let cap = ledger.extract_withdraw_capability(&address).unwrap();
        let err = ledger.extract_withdraw_capability(&address).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::AccountErr(AccountError::CapabilityAlreadyExtracted)
        ));

        ledger.restore_withdraw_capability(cap).unwrap();
        let cap = ledger.extract_withdraw_capability(&address).unwrap();
        ledger.restore_withdraw_capability(cap).unwrap();
    }

    #[test]
    fn one_capability_covers_a_batch_of_payments() {
        let mut ledger = ledger_with_funded("carol", 10);
        ledger.register_account("bob".to_owned(), coin()).unwrap();

        let cap = ledger
            .extract_withdraw_capability(&"carol".to_owned())
            .unwrap();
        ledger
            .pay_from(&cap, &"bob".to_owned(), &coin(), dec(4), None)
            .unwrap();
        ledger
            .pay_from(&cap, &"bob".to_owned(), &coin(), dec(6), None)
            .unwrap();
        ledger.restore_withdraw_capability(cap).unwrap();

        assert_eq!(
            ledger.accounts.get("bob").unwrap().balance("coin1"),
            Some(dec(10))
        );
        assert_eq!(ledger.payments().len(), 3);
    }

    #[test]
    fn slow_wallet_payment_blocked_until_unlocked() {
        let mut ledger = InMemoryLedger::default();
        ledger
            .register_slow_wallet("alice".to_owned(), coin())
            .unwrap();
        ledger.register_account("bob".to_owned(), coin()).unwrap();
        ledger
            .deposit(&"alice".to_owned(), &coin(), dec(1_000_000), None)
            .unwrap();

        let err = ledger
            .transfer(&"alice".to_owned(), &"bob".to_owned(), &coin(), dec(10), None)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::AccountErr(AccountError::LockedFundsExceeded)
        ));
        assert_eq!(
            ledger.accounts.get("alice").unwrap().balance("coin1"),
            Some(dec(1_000_000))
        );
        assert_eq!(
            ledger.accounts.get("bob").unwrap().balance("coin1"),
            Some(dec(0))
        );

        ledger.unlock(&"alice".to_owned(), dec(10)).unwrap();
        assert_eq!(
            ledger.unlocked_amount(&"alice".to_owned(), &coin()).unwrap(),
            dec(10)
        );
        ledger
            .transfer(&"alice".to_owned(), &"bob".to_owned(), &coin(), dec(10), None)
            .unwrap();
        assert_eq!(
            ledger.accounts.get("bob").unwrap().balance("coin1"),
            Some(dec(10))
        );
        assert_eq!(
            ledger.unlocked_amount(&"alice".to_owned(), &coin()).unwrap(),
            dec(0)
        );
    }

    #[test]
    fn failed_payment_repeats_identically() {
        let mut ledger = InMemoryLedger::default();
        ledger
            .register_slow_wallet("alice".to_owned(), coin())
            .unwrap();
        ledger.register_account("bob".to_owned(), coin()).unwrap();
        ledger
            .deposit(&"alice".to_owned(), &coin(), dec(100), None)
            .unwrap();

        for _ in 0..2 {
            let err = ledger
                .transfer(&"alice".to_owned(), &"bob".to_owned(), &coin(), dec(10), None)
                .unwrap_err();
            assert!(matches!(
                err,
                LedgerError::AccountErr(AccountError::LockedFundsExceeded)
            ));
            assert_eq!(
                ledger.accounts.get("alice").unwrap().balance("coin1"),
                Some(dec(100))
            );
            assert_eq!(
                ledger.accounts.get("bob").unwrap().balance("coin1"),
                Some(dec(0))
            );
        }
        // failed attempts leave no bookkeeping trace either
        assert_eq!(ledger.payments().len(), 1);
    }

    #[test]
    fn failed_payment_releases_the_capability() {
        let mut ledger = ledger_with_funded("carol", 5);
        ledger.register_account("bob".to_owned(), coin()).unwrap();

        let err = ledger
            .transfer(&"carol".to_owned(), &"bob".to_owned(), &coin(), dec(6), None)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::AccountErr(AccountError::InsufficientBalance)
        ));

        // the capability went back, so a corrected transfer goes through
        ledger
            .transfer(&"carol".to_owned(), &"bob".to_owned(), &coin(), dec(5), None)
            .unwrap();
        assert_eq!(
            ledger.accounts.get("bob").unwrap().balance("coin1"),
            Some(dec(5))
        );
    }

    #[test]
    fn unknown_accounts_rejected() {
        let mut ledger = ledger_with_funded("carol", 10);

        let err = ledger
            .extract_withdraw_capability(&"nobody".to_owned())
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownAccount(addr) if addr == "nobody"));

        let err = ledger
            .transfer(&"carol".to_owned(), &"nobody".to_owned(), &coin(), dec(1), None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownAccount(addr) if addr == "nobody"));
        // the failed destination lookup must not have debited carol
        assert_eq!(
            ledger.accounts.get("carol").unwrap().balance("coin1"),
            Some(dec(10))
        );
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut ledger = InMemoryLedger::default();
        ledger.register_account("bob".to_owned(), coin()).unwrap();
        let err = ledger
            .register_slow_wallet("bob".to_owned(), coin())
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateAccount(addr) if addr == "bob"));
    }

    #[test]
    fn currency_must_be_registered_on_both_sides() {
        let mut ledger = ledger_with_funded("carol", 10);
        ledger
            .register_account("bob".to_owned(), "coin2".to_owned())
            .unwrap();

        let err = ledger
            .transfer(&"carol".to_owned(), &"bob".to_owned(), &coin(), dec(1), None)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::AccountErr(AccountError::CurrencyNotRegistered(_))
        ));
        assert_eq!(
            ledger.accounts.get("carol").unwrap().balance("coin1"),
            Some(dec(10))
        );

        // registering the missing slot makes the same transfer valid
        ledger
            .accounts
            .get_mut("bob")
            .unwrap()
            .register_currency(coin());
        ledger
            .transfer(&"carol".to_owned(), &"bob".to_owned(), &coin(), dec(1), None)
            .unwrap();
        assert_eq!(
            ledger.accounts.get("bob").unwrap().balance("coin1"),
            Some(dec(1))
        );
    }
}
