/// All logic related to account balances and slow wallet lockup accounting.
/// State is modified using events, which are created by handling operations
pub mod account;

/// The withdraw capability token that gates every outgoing payment.
pub mod capability;

/// Typed ledger commands parsed from untrusted input, later executed by [`ledger`].
pub mod command;

/// Ledger interface, plus "in memory" implementation.
/// Coordinates capability extraction, payments and unlock events
///
/// NOTE: Technically this interface is not necessary, but it might be
/// good integration point to replace in memory implementation with
/// something more sophisticated.
pub mod ledger;

/// Ideally, this module should exists on its own crate, as a way to
/// bootstrap core logic. However, I want to use it for integration test
/// so I put it here.
pub mod bin_utils;
