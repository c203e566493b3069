use rust_decimal::Decimal;

pub type AccountId = u64;

/// Owner details attached to a bank account.
///
/// `phone_number` is mandatory and unique across the store, `email` is
/// optional but unique when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountProfile {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub additional_info: Option<String>,
}

impl AccountProfile {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone_number: phone_number.into(),
            email: None,
            address: None,
            additional_info: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Balance owned by exactly one account.
///
/// Invariant: `current` equals `initial` plus the signed sum of every
/// successfully applied transaction touching the account. The type itself
/// performs no checks; decisions happen in [`crate::store`] before `apply`
/// is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    initial: Decimal,
    current: Decimal,
}

impl Balance {
    pub fn new(initial: Decimal) -> Self {
        Self {
            initial,
            current: initial,
        }
    }

    pub fn initial(&self) -> Decimal {
        self.initial
    }

    pub fn current(&self) -> Decimal {
        self.current
    }

    pub fn apply(&mut self, delta: Decimal) {
        self.current += delta;
    }
}

/// Point-in-time copy of an account, safe to hand out without locks.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub profile: AccountProfile,
    pub balance: Balance,
}
