/// Account domain types: owner profiles, balances and read-only snapshots.
/// Balance state is dumb on purpose, all mutation decisions live in [`store`].
pub mod account;

/// Arena of accounts with per-account exclusive locking.
/// Every balance mutation funnels through [`store::AccountHandle::apply_delta`].
pub mod store;

/// Transaction records plus the enums describing them.
pub mod transaction;

/// Validates transactions and applies them against [`store`] balances.
pub mod ledger;

/// Transaction processor interface, plus "in memory" implementation.
/// Coordinates the WAITING -> IN_PROGRESS -> SUCCESS/DECLINE state machine.
///
/// NOTE: Technically this interface is not necessary, but it might be
/// good integration point to replace in memory implementation with
/// something more sophisticated.
pub mod processor;

/// Ideally, this module should exists on its own crate, as a way to
/// bootstrap core logic. However, I want to use it for integration test
/// so I put it here.
pub mod bin_utils;
