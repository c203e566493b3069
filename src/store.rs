use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::{Mutex, RawMutex, RwLock, lock_api::ArcMutexGuard};
use rust_decimal::{Decimal, prelude::Zero};
use thiserror::Error;
use tracing::debug;

use crate::account::{AccountId, AccountProfile, AccountSnapshot, Balance};

/// How long [`AccountStore::lock_and_get`] waits before giving up.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_millis(500);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("account {0} does not exist")]
    UnknownAccount(AccountId),
    #[error("could not acquire exclusive access to account {0} in time")]
    LockTimeout(AccountId),
    #[error("insufficient funds on account {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        available: Decimal,
        requested: Decimal,
    },
    #[error("phone number {0} is already registered to another account")]
    DuplicatePhoneNumber(String),
    #[error("email {0} is already registered to another account")]
    DuplicateEmail(String),
    #[error("initial balance must not be negative")]
    NegativeInitialBalance,
}

struct AccountEntry {
    id: AccountId,
    profile: RwLock<AccountProfile>,
    balance: Arc<Mutex<Balance>>,
}

#[derive(Default)]
struct Registry {
    accounts: HashMap<AccountId, Arc<AccountEntry>>,
    phone_index: HashMap<String, AccountId>,
    email_index: HashMap<String, AccountId>,
    next_id: AccountId,
}

/// Exclusive handle on one account's balance.
///
/// Holding the handle blocks every other mutation of the same account, so
/// keep it only for the duration of a single application.
pub struct AccountHandle {
    id: AccountId,
    guard: ArcMutexGuard<RawMutex, Balance>,
}

impl std::fmt::Debug for AccountHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountHandle").field("id", &self.id).finish()
    }
}

impl AccountHandle {
    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn balance(&self) -> Balance {
        *self.guard
    }

    /// Applies a signed delta to the balance.
    ///
    /// A negative delta that would drive the balance below zero fails with
    /// [`StoreError::InsufficientFunds`] and changes nothing. Positive deltas
    /// never fail. This is the only place balances change.
    pub fn apply_delta(&mut self, delta: Decimal) -> Result<Decimal, StoreError> {
        if delta < Decimal::zero() {
            let available = self.guard.current();
            if available + delta < Decimal::zero() {
                return Err(StoreError::InsufficientFunds {
                    account: self.id,
                    available,
                    requested: -delta,
                });
            }
        }
        self.guard.apply(delta);
        Ok(self.guard.current())
    }
}

/// Owns every account and its balance.
pub struct AccountStore {
    registry: RwLock<Registry>,
    lock_wait: Duration,
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT)
    }
}

impl AccountStore {
    pub fn new(lock_wait: Duration) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            lock_wait,
        }
    }

    /// Registers a new account and returns its id.
    ///
    /// Ids are assigned from a sequence starting at 1. Phone number and email
    /// must be unique across all accounts.
    pub fn open_account(
        &self,
        profile: AccountProfile,
        initial_balance: Decimal,
    ) -> Result<AccountId, StoreError> {
        if initial_balance < Decimal::zero() {
            return Err(StoreError::NegativeInitialBalance);
        }
        let mut registry = self.registry.write();
        if registry.phone_index.contains_key(&profile.phone_number) {
            return Err(StoreError::DuplicatePhoneNumber(profile.phone_number));
        }
        if let Some(email) = &profile.email {
            if registry.email_index.contains_key(email) {
                return Err(StoreError::DuplicateEmail(email.clone()));
            }
        }

        registry.next_id += 1;
        let id = registry.next_id;
        registry.phone_index.insert(profile.phone_number.clone(), id);
        if let Some(email) = &profile.email {
            registry.email_index.insert(email.clone(), id);
        }
        registry.accounts.insert(
            id,
            Arc::new(AccountEntry {
                id,
                profile: RwLock::new(profile),
                balance: Arc::new(Mutex::new(Balance::new(initial_balance))),
            }),
        );
        debug!(account = id, "opened account");
        Ok(id)
    }

    /// Changes the contact details of an account. `None` leaves a field
    /// untouched. Uniqueness is re-checked against all other accounts.
    pub fn update_contact(
        &self,
        id: AccountId,
        phone_number: Option<String>,
        email: Option<String>,
    ) -> Result<(), StoreError> {
        let mut registry = self.registry.write();
        let entry = registry
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::UnknownAccount(id))?;

        if let Some(phone) = &phone_number {
            if registry.phone_index.get(phone).is_some_and(|owner| *owner != id) {
                return Err(StoreError::DuplicatePhoneNumber(phone.clone()));
            }
        }
        if let Some(email) = &email {
            if registry.email_index.get(email).is_some_and(|owner| *owner != id) {
                return Err(StoreError::DuplicateEmail(email.clone()));
            }
        }

        let mut profile = entry.profile.write();
        if let Some(phone) = phone_number {
            registry.phone_index.remove(&profile.phone_number);
            registry.phone_index.insert(phone.clone(), id);
            profile.phone_number = phone;
        }
        if let Some(new_email) = email {
            if let Some(old) = &profile.email {
                registry.email_index.remove(old);
            }
            registry.email_index.insert(new_email.clone(), id);
            profile.email = Some(new_email);
        }
        Ok(())
    }

    pub fn get(&self, id: AccountId) -> Result<AccountSnapshot, StoreError> {
        let entry = self.entry(id)?;
        let profile = entry.profile.read().clone();
        let balance = *entry.balance.lock();
        Ok(AccountSnapshot {
            id,
            profile,
            balance,
        })
    }

    pub fn balance(&self, id: AccountId) -> Result<Balance, StoreError> {
        let entry = self.entry(id)?;
        let balance = *entry.balance.lock();
        Ok(balance)
    }

    /// Acquires the exclusive handle for one account, waiting at most the
    /// configured bound before failing with [`StoreError::LockTimeout`].
    ///
    /// Callers locking more than one account must acquire the handles in
    /// ascending id order, otherwise opposite-order acquisitions can
    /// deadlock until the timeout.
    pub fn lock_and_get(&self, id: AccountId) -> Result<AccountHandle, StoreError> {
        let entry = self.entry(id)?;
        match entry.balance.try_lock_arc_for(self.lock_wait) {
            Some(guard) => Ok(AccountHandle { id, guard }),
            None => Err(StoreError::LockTimeout(id)),
        }
    }

    /// Locks one account and applies a signed delta through its handle.
    pub fn apply_delta(&self, id: AccountId, delta: Decimal) -> Result<Decimal, StoreError> {
        self.lock_and_get(id)?.apply_delta(delta)
    }

    fn entry(&self, id: AccountId) -> Result<Arc<AccountEntry>, StoreError> {
        self.registry
            .read()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::UnknownAccount(id))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    fn profile(phone: &str) -> AccountProfile {
        AccountProfile::new("Jane", "Doe", phone)
    }

    fn dec(value: i64) -> Decimal {
        Decimal::from_i64(value).unwrap()
    }

    #[test]
    fn open_assigns_sequential_ids() {
        let store = AccountStore::default();
        let first = store.open_account(profile("+111"), dec(10)).unwrap();
        let second = store.open_account(profile("+222"), dec(20)).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(store.balance(first).unwrap().current(), dec(10));
        assert_eq!(store.balance(second).unwrap().current(), dec(20));
    }

    #[test]
    fn duplicate_contact_rejected() {
        let store = AccountStore::default();
        store
            .open_account(profile("+111").with_email("jane@bank.test"), dec(0))
            .unwrap();

        let err = store.open_account(profile("+111"), dec(0)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicatePhoneNumber(_)));

        let err = store
            .open_account(profile("+222").with_email("jane@bank.test"), dec(0))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(_)));
    }

    #[test]
    fn negative_initial_balance_rejected() {
        let store = AccountStore::default();
        let err = store.open_account(profile("+111"), dec(-1)).unwrap_err();
        assert!(matches!(err, StoreError::NegativeInitialBalance));
    }

    #[test]
    fn update_contact_rechecks_uniqueness() {
        let store = AccountStore::default();
        let jane = store
            .open_account(profile("+111").with_email("jane@bank.test"), dec(0))
            .unwrap();
        let john = store.open_account(profile("+222"), dec(0)).unwrap();

        let err = store
            .update_contact(john, Some("+111".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicatePhoneNumber(_)));
        let err = store
            .update_contact(john, None, Some("jane@bank.test".to_string()))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(_)));

        // updating to your own current phone is not a conflict
        store
            .update_contact(jane, Some("+111".to_string()), None)
            .unwrap();

        store
            .update_contact(john, Some("+333".to_string()), Some("john@bank.test".to_string()))
            .unwrap();
        let snapshot = store.get(john).unwrap();
        assert_eq!(snapshot.profile.phone_number, "+333");
        assert_eq!(snapshot.profile.email.as_deref(), Some("john@bank.test"));

        // freed phone number can be taken again
        store.open_account(profile("+222"), dec(0)).unwrap();
    }

    #[test]
    fn apply_delta_enforces_funds_on_debit_only() {
        let store = AccountStore::default();
        let id = store.open_account(profile("+111"), dec(100)).unwrap();

        assert_eq!(store.apply_delta(id, dec(50)).unwrap(), dec(150));
        assert_eq!(store.apply_delta(id, dec(-150)).unwrap(), dec(0));

        let err = store.apply_delta(id, dec(-1)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientFunds { account: 1, .. }
        ));
        assert_eq!(store.balance(id).unwrap().current(), dec(0));

        // credits always land, even on an empty account
        assert_eq!(store.apply_delta(id, dec(70)).unwrap(), dec(70));
    }

    #[test]
    fn unknown_account_surfaces() {
        let store = AccountStore::default();
        assert!(matches!(
            store.get(9).unwrap_err(),
            StoreError::UnknownAccount(9)
        ));
        assert!(matches!(
            store.apply_delta(9, dec(1)).unwrap_err(),
            StoreError::UnknownAccount(9)
        ));
    }

    #[test]
    fn held_handle_times_out_second_acquisition() {
        let store = AccountStore::new(Duration::from_millis(10));
        let id = store.open_account(profile("+111"), dec(5)).unwrap();

        let handle = store.lock_and_get(id).unwrap();
        let err = store.lock_and_get(id).unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout(1)));

        drop(handle);
        store.lock_and_get(id).unwrap();
    }
}
