//! JSON-file storage backend.
//!
//! Wraps a [`MemoryStore`] and rewrites a single JSON document after every
//! mutation. Writes go to a temp file first and are renamed into place so a
//! crash mid-write never leaves a torn document behind.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Account, Budget, BudgetCategory, RecurringExpense, Transaction};
use crate::errors::Result;

use super::{
    AccountFilter, BudgetFilter, LedgerSnapshot, LedgerStore, MemoryStore, TemplateFilter,
    TransactionFilter,
};

const TMP_SUFFIX: &str = "tmp";

/// File-backed [`LedgerStore`] persisting one JSON snapshot document.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    store: MemoryStore,
}

impl JsonStore {
    /// Opens the store at `path`, loading an existing snapshot when present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            LedgerSnapshot::default()
        };
        Ok(Self {
            path,
            store: MemoryStore::from_snapshot(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let snapshot = self.store.snapshot()?;
        let data = serde_json::to_string_pretty(&snapshot)?;
        let tmp = self.path.with_extension(TMP_SUFFIX);
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn mutate<R>(&self, f: impl FnOnce(&MemoryStore) -> Result<R>) -> Result<R> {
        let result = f(&self.store)?;
        self.flush()?;
        Ok(result)
    }
}

impl LedgerStore for JsonStore {
    fn insert_account(&self, account: &Account) -> Result<()> {
        self.mutate(|store| store.insert_account(account))
    }

    fn account(&self, id: Uuid) -> Result<Option<Account>> {
        self.store.account(id)
    }

    fn save_account(&self, account: &Account) -> Result<()> {
        self.mutate(|store| store.save_account(account))
    }

    fn remove_account(&self, id: Uuid) -> Result<()> {
        self.mutate(|store| store.remove_account(id))
    }

    fn accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        self.store.accounts(filter)
    }

    fn account_name_exists(&self, name: &str, exclude: Option<Uuid>) -> Result<bool> {
        self.store.account_name_exists(name, exclude)
    }

    fn account_has_transactions(&self, id: Uuid) -> Result<bool> {
        self.store.account_has_transactions(id)
    }

    fn transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
        self.store.transaction(id)
    }

    fn save_transaction(&self, transaction: &Transaction) -> Result<()> {
        self.mutate(|store| store.save_transaction(transaction))
    }

    fn record_transaction(&self, transaction: &Transaction, touched: &[&Account]) -> Result<()> {
        self.mutate(|store| store.record_transaction(transaction, touched))
    }

    fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.store.transactions(filter)
    }

    fn spent_in_category(
        &self,
        category: BudgetCategory,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal> {
        self.store.spent_in_category(category, start, end)
    }

    fn reversal_exists(&self, original: Uuid) -> Result<bool> {
        self.store.reversal_exists(original)
    }

    fn generated_exists(&self, template: Uuid, scheduled: NaiveDate) -> Result<bool> {
        self.store.generated_exists(template, scheduled)
    }

    fn insert_budget(&self, budget: &Budget) -> Result<()> {
        self.mutate(|store| store.insert_budget(budget))
    }

    fn insert_budgets(&self, budgets: &[Budget]) -> Result<()> {
        self.mutate(|store| store.insert_budgets(budgets))
    }

    fn budget(&self, id: Uuid) -> Result<Option<Budget>> {
        self.store.budget(id)
    }

    fn save_budget(&self, budget: &Budget) -> Result<()> {
        self.mutate(|store| store.save_budget(budget))
    }

    fn budgets(&self, filter: &BudgetFilter) -> Result<Vec<Budget>> {
        self.store.budgets(filter)
    }

    fn budgets_overlapping(
        &self,
        category: Option<BudgetCategory>,
        start: NaiveDate,
        end: NaiveDate,
        active_only: bool,
    ) -> Result<Vec<Budget>> {
        self.store.budgets_overlapping(category, start, end, active_only)
    }

    fn insert_template(&self, template: &RecurringExpense) -> Result<()> {
        self.mutate(|store| store.insert_template(template))
    }

    fn template(&self, id: Uuid) -> Result<Option<RecurringExpense>> {
        self.store.template(id)
    }

    fn save_template(&self, template: &RecurringExpense) -> Result<()> {
        self.mutate(|store| store.save_template(template))
    }

    fn remove_template(&self, id: Uuid) -> Result<()> {
        self.mutate(|store| store.remove_template(id))
    }

    fn templates(&self, filter: &TemplateFilter) -> Result<Vec<RecurringExpense>> {
        self.store.templates(filter)
    }

    fn due_templates(&self, on: NaiveDate) -> Result<Vec<RecurringExpense>> {
        self.store.due_templates(on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AccountType;

    #[test]
    fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let account = Account::new(
            "Checking",
            AccountType::Checking,
            Decimal::new(1_000_00, 2),
            Some("primary".into()),
        );
        {
            let store = JsonStore::open(&path).unwrap();
            store.insert_account(&account).unwrap();
            let txn = Transaction::expense(
                account.id,
                Decimal::new(87_50, 2),
                BudgetCategory::Groceries,
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                "weekly shop",
            )
            .unwrap();
            store.record_transaction(&txn, &[&account]).unwrap();
        }

        let reopened = JsonStore::open(&path).unwrap();
        let loaded = reopened.account(account.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Checking");
        assert_eq!(
            reopened
                .transactions(&TransactionFilter::default())
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn open_on_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("fresh.json")).unwrap();
        assert!(store.accounts(&AccountFilter::default()).unwrap().is_empty());
    }
}
