use crate::account::AccountAddress;

/// Token proving the right to withdraw from one account's balances.
///
/// The type has no `Clone` or `Copy` and its fields are private, so a token
/// can only come from [`Ledger::extract_withdraw_capability`] and there is
/// never more than one live token per account. Holding it is the ledger's
/// exclusivity primitive: every withdrawal path goes through a token check.
///
/// Tokens are meant to be handed back via
/// [`Ledger::restore_withdraw_capability`]; dropping one on the floor leaves
/// the account unable to issue another, so the drop path flags it.
///
/// [`Ledger::extract_withdraw_capability`]: crate::ledger::Ledger::extract_withdraw_capability
/// [`Ledger::restore_withdraw_capability`]: crate::ledger::Ledger::restore_withdraw_capability
#[derive(Debug)]
pub struct WithdrawCapability {
    address: AccountAddress,
    restored: bool,
}

impl WithdrawCapability {
    pub(crate) fn new(address: AccountAddress) -> Self {
        Self {
            address,
            restored: false,
        }
    }

    /// The account this capability is bound to.
    pub fn address(&self) -> &AccountAddress {
        &self.address
    }

    pub(crate) fn mark_restored(&mut self) {
        self.restored = true;
    }
}

impl Drop for WithdrawCapability {
    fn drop(&mut self) {
        if !self.restored {
            tracing::warn!(
                account = %self.address,
                "withdraw capability dropped without being restored; \
                 the account cannot extract another one"
            );
        }
    }
}
