//! Validated account lifecycle and balance aggregation.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Account, AccountType};
use crate::errors::{LedgerError, Result};
use crate::storage::{AccountFilter, LedgerStore};

/// Partial changeset for [`AccountService::update`]. None leaves a field
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub account_type: Option<AccountType>,
    pub active: Option<bool>,
}

/// Outcome of closing an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountClosure {
    /// Soft-deleted: the account has transaction history to preserve.
    Deactivated,
    /// Hard-deleted: no transaction ever touched the account.
    Removed,
    /// The account was already inactive; nothing changed.
    AlreadyClosed,
}

/// Account operations over a [`LedgerStore`].
pub struct AccountService<'a> {
    store: &'a dyn LedgerStore,
}

impl<'a> AccountService<'a> {
    pub fn new(store: &'a dyn LedgerStore) -> Self {
        Self { store }
    }

    /// Creates an active account. The starting balance may be negative only
    /// for credit-card accounts (negative = existing debt).
    pub fn create(
        &self,
        name: &str,
        account_type: AccountType,
        starting_balance: Decimal,
        description: Option<String>,
    ) -> Result<Account> {
        if name.trim().is_empty() {
            return Err(LedgerError::Validation("Account name must not be blank".into()));
        }
        if self.store.account_name_exists(name, None)? {
            return Err(LedgerError::Validation(format!(
                "Account `{name}` already exists"
            )));
        }
        if starting_balance < Decimal::ZERO && account_type != AccountType::CreditCard {
            return Err(LedgerError::Validation(
                "Starting balance must not be negative".into(),
            ));
        }
        let account = Account::new(name, account_type, starting_balance, description);
        self.store.insert_account(&account)?;
        tracing::info!(
            account = %account.id,
            name = %account.name,
            "created account"
        );
        Ok(account)
    }

    /// Applies a metadata changeset. Reactivating an account that has
    /// transaction history is rejected; accounts without history may be
    /// freely reactivated.
    pub fn update(&self, id: Uuid, changes: AccountUpdate) -> Result<Account> {
        let mut account = self.get(id)?;

        if let Some(name) = changes.name {
            if name.trim().is_empty() {
                return Err(LedgerError::Validation("Account name must not be blank".into()));
            }
            if self.store.account_name_exists(&name, Some(id))? {
                return Err(LedgerError::Validation(format!(
                    "Account `{name}` already exists"
                )));
            }
            account.name = name;
        }
        if let Some(description) = changes.description {
            account.description = Some(description);
        }
        if let Some(account_type) = changes.account_type {
            account.account_type = account_type;
        }
        if let Some(active) = changes.active {
            if active && !account.active && self.store.account_has_transactions(id)? {
                return Err(LedgerError::Validation(
                    "Cannot reactivate a closed account with transaction history".into(),
                ));
            }
            account.active = active;
        }

        account.touch();
        self.store.save_account(&account)?;
        Ok(account)
    }

    /// Closes the account: soft-delete when transaction history exists,
    /// hard-delete otherwise. Idempotent on already-closed accounts.
    pub fn close(&self, id: Uuid) -> Result<AccountClosure> {
        let mut account = self.get(id)?;
        if !account.active {
            return Ok(AccountClosure::AlreadyClosed);
        }
        if self.store.account_has_transactions(id)? {
            account.active = false;
            account.touch();
            self.store.save_account(&account)?;
            tracing::info!(account = %id, "deactivated account with history");
            Ok(AccountClosure::Deactivated)
        } else {
            self.store.remove_account(id)?;
            tracing::info!(account = %id, "removed account without history");
            Ok(AccountClosure::Removed)
        }
    }

    pub fn get(&self, id: Uuid) -> Result<Account> {
        self.store
            .account(id)?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    pub fn list(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        self.store.accounts(filter)
    }

    /// Net movement since the account was opened.
    pub fn net_change(&self, id: Uuid) -> Result<Decimal> {
        Ok(self.get(id)?.net_change())
    }

    /// Sum of current balances across active accounts.
    pub fn total_balance(&self) -> Result<Decimal> {
        let filter = AccountFilter {
            active: Some(true),
            ..AccountFilter::default()
        };
        Ok(self
            .store
            .accounts(&filter)?
            .iter()
            .map(|a| a.current_balance)
            .sum())
    }

    /// Sum of current balances across active accounts of one type.
    pub fn total_balance_by_type(&self, account_type: AccountType) -> Result<Decimal> {
        let filter = AccountFilter {
            active: Some(true),
            account_type: Some(account_type),
            ..AccountFilter::default()
        };
        Ok(self
            .store
            .accounts(&filter)?
            .iter()
            .map(|a| a.current_balance)
            .sum())
    }

    /// Sum of active-account balances strictly below the threshold.
    pub fn sum_balances_below(&self, threshold: Decimal) -> Result<Decimal> {
        if threshold < Decimal::ZERO {
            return Err(LedgerError::Validation(
                "Threshold must be non-negative".into(),
            ));
        }
        let filter = AccountFilter {
            active: Some(true),
            ..AccountFilter::default()
        };
        Ok(self
            .store
            .accounts(&filter)?
            .iter()
            .filter(|a| a.current_balance < threshold)
            .map(|a| a.current_balance)
            .sum())
    }
}
