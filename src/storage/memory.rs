//! In-memory storage backend.
//!
//! Holds all state behind a single mutex, which both provides thread-safe
//! interior mutability and serializes read-then-write sequences on the same
//! account. The default backend for tests and embedding.

use std::sync::Mutex;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    Account, Budget, BudgetCategory, RecurringExpense, Transaction, TransactionKind,
};
use crate::domain::transaction::reversal_marker;
use crate::errors::{LedgerError, Result};

use super::{
    AccountFilter, BudgetFilter, LedgerSnapshot, LedgerStore, TemplateFilter, TransactionFilter,
};

/// Thread-safe in-memory [`LedgerStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<LedgerSnapshot>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated from a snapshot.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            inner: Mutex::new(snapshot),
        }
    }

    /// Clones the current contents.
    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        self.with_lock(|inner| inner.clone())
    }

    fn with_lock<R>(&self, f: impl FnOnce(&mut LedgerSnapshot) -> R) -> Result<R> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|err| LedgerError::Storage(err.to_string()))?;
        Ok(f(&mut inner))
    }
}

fn upsert_by_id<T, K: PartialEq>(items: &mut Vec<T>, item: T, key_fn: fn(&T) -> K) {
    let key = key_fn(&item);
    if let Some(existing) = items.iter_mut().find(|candidate| key_fn(candidate) == key) {
        *existing = item;
    } else {
        items.push(item);
    }
}

fn matches_transaction(txn: &Transaction, filter: &TransactionFilter) -> bool {
    if txn.deleted {
        return false;
    }
    if let Some(from) = filter.date_from {
        if txn.date < from {
            return false;
        }
    }
    if let Some(to) = filter.date_to {
        if txn.date > to {
            return false;
        }
    }
    if let Some(category) = filter.category {
        if txn.category != Some(category) {
            return false;
        }
    }
    if let Some(account) = filter.account {
        if !txn.touches_account(account) {
            return false;
        }
    }
    if let Some(kind) = filter.kind {
        if txn.kind != kind {
            return false;
        }
    }
    true
}

impl LedgerStore for MemoryStore {
    fn insert_account(&self, account: &Account) -> Result<()> {
        let account = account.clone();
        self.with_lock(|inner| inner.accounts.push(account))
    }

    fn account(&self, id: Uuid) -> Result<Option<Account>> {
        self.with_lock(|inner| inner.accounts.iter().find(|a| a.id == id).cloned())
    }

    fn save_account(&self, account: &Account) -> Result<()> {
        let account = account.clone();
        self.with_lock(|inner| upsert_by_id(&mut inner.accounts, account, |a| a.id))
    }

    fn remove_account(&self, id: Uuid) -> Result<()> {
        self.with_lock(|inner| inner.accounts.retain(|a| a.id != id))
    }

    fn accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        self.with_lock(|inner| {
            inner
                .accounts
                .iter()
                .filter(|a| filter.active.map_or(true, |active| a.active == active))
                .filter(|a| {
                    filter
                        .account_type
                        .map_or(true, |kind| a.account_type == kind)
                })
                .filter(|a| filter.min_balance.map_or(true, |min| a.current_balance >= min))
                .filter(|a| filter.max_balance.map_or(true, |max| a.current_balance <= max))
                .filter(|a| {
                    filter
                        .name_contains
                        .as_deref()
                        .map_or(true, |needle| a.name.contains(needle))
                })
                .cloned()
                .collect()
        })
    }

    fn account_name_exists(&self, name: &str, exclude: Option<Uuid>) -> Result<bool> {
        let normalized = name.trim().to_ascii_lowercase();
        self.with_lock(|inner| {
            inner.accounts.iter().any(|a| {
                a.name.trim().to_ascii_lowercase() == normalized && exclude != Some(a.id)
            })
        })
    }

    fn account_has_transactions(&self, id: Uuid) -> Result<bool> {
        self.with_lock(|inner| inner.transactions.iter().any(|t| t.touches_account(id)))
    }

    fn transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
        self.with_lock(|inner| inner.transactions.iter().find(|t| t.id == id).cloned())
    }

    fn save_transaction(&self, transaction: &Transaction) -> Result<()> {
        let transaction = transaction.clone();
        self.with_lock(|inner| upsert_by_id(&mut inner.transactions, transaction, |t| t.id))
    }

    fn record_transaction(&self, transaction: &Transaction, touched: &[&Account]) -> Result<()> {
        let transaction = transaction.clone();
        let touched: Vec<Account> = touched.iter().map(|a| (*a).clone()).collect();
        self.with_lock(|inner| {
            inner.transactions.push(transaction);
            for account in touched {
                upsert_by_id(&mut inner.accounts, account, |a| a.id);
            }
        })
    }

    fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.with_lock(|inner| {
            let mut matches: Vec<Transaction> = inner
                .transactions
                .iter()
                .filter(|t| matches_transaction(t, filter))
                .cloned()
                .collect();
            matches.sort_by(|a, b| {
                b.date
                    .cmp(&a.date)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            });
            matches
        })
    }

    fn spent_in_category(
        &self,
        category: BudgetCategory,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal> {
        self.with_lock(|inner| {
            inner
                .transactions
                .iter()
                .filter(|t| !t.deleted && t.category == Some(category))
                .filter(|t| t.date >= start && t.date <= end)
                .fold(Decimal::ZERO, |sum, t| match t.kind {
                    TransactionKind::Expense => sum + t.amount,
                    TransactionKind::Refund => sum - t.amount,
                    TransactionKind::Income | TransactionKind::Transfer => sum,
                })
        })
    }

    fn reversal_exists(&self, original: Uuid) -> Result<bool> {
        let marker = reversal_marker(original);
        self.with_lock(|inner| {
            inner
                .transactions
                .iter()
                .any(|t| !t.deleted && t.description.contains(&marker))
        })
    }

    fn generated_exists(&self, template: Uuid, scheduled: NaiveDate) -> Result<bool> {
        self.with_lock(|inner| {
            inner
                .transactions
                .iter()
                .any(|t| t.template_id == Some(template) && t.date == scheduled)
        })
    }

    fn insert_budget(&self, budget: &Budget) -> Result<()> {
        let budget = budget.clone();
        self.with_lock(|inner| inner.budgets.push(budget))
    }

    fn insert_budgets(&self, budgets: &[Budget]) -> Result<()> {
        let budgets = budgets.to_vec();
        self.with_lock(|inner| inner.budgets.extend(budgets))
    }

    fn budget(&self, id: Uuid) -> Result<Option<Budget>> {
        self.with_lock(|inner| inner.budgets.iter().find(|b| b.id == id).cloned())
    }

    fn save_budget(&self, budget: &Budget) -> Result<()> {
        let budget = budget.clone();
        self.with_lock(|inner| upsert_by_id(&mut inner.budgets, budget, |b| b.id))
    }

    fn budgets(&self, filter: &BudgetFilter) -> Result<Vec<Budget>> {
        self.with_lock(|inner| {
            let mut matches: Vec<Budget> = inner
                .budgets
                .iter()
                .filter(|b| filter.category.map_or(true, |c| b.category == c))
                .filter(|b| filter.active.map_or(true, |active| b.active == active))
                .cloned()
                .collect();
            matches.sort_by(|a, b| b.period_start.cmp(&a.period_start));
            matches
        })
    }

    fn budgets_overlapping(
        &self,
        category: Option<BudgetCategory>,
        start: NaiveDate,
        end: NaiveDate,
        active_only: bool,
    ) -> Result<Vec<Budget>> {
        self.with_lock(|inner| {
            inner
                .budgets
                .iter()
                .filter(|b| !active_only || b.active)
                .filter(|b| category.map_or(true, |c| b.category == c))
                .filter(|b| b.overlaps(start, end))
                .cloned()
                .collect()
        })
    }

    fn insert_template(&self, template: &RecurringExpense) -> Result<()> {
        let template = template.clone();
        self.with_lock(|inner| inner.templates.push(template))
    }

    fn template(&self, id: Uuid) -> Result<Option<RecurringExpense>> {
        self.with_lock(|inner| inner.templates.iter().find(|t| t.id == id).cloned())
    }

    fn save_template(&self, template: &RecurringExpense) -> Result<()> {
        let template = template.clone();
        self.with_lock(|inner| upsert_by_id(&mut inner.templates, template, |t| t.id))
    }

    fn remove_template(&self, id: Uuid) -> Result<()> {
        self.with_lock(|inner| inner.templates.retain(|t| t.id != id))
    }

    fn templates(&self, filter: &TemplateFilter) -> Result<Vec<RecurringExpense>> {
        self.with_lock(|inner| {
            let mut matches: Vec<RecurringExpense> = inner
                .templates
                .iter()
                .filter(|t| filter.active.map_or(true, |active| t.active == active))
                .filter(|t| {
                    filter
                        .source_account
                        .map_or(true, |account| t.source_account == account)
                })
                .filter(|t| filter.frequency.map_or(true, |f| t.frequency == f))
                .cloned()
                .collect();
            matches.sort_by_key(|t| t.next_scheduled_date);
            matches
        })
    }

    fn due_templates(&self, on: NaiveDate) -> Result<Vec<RecurringExpense>> {
        self.with_lock(|inner| {
            let mut due: Vec<RecurringExpense> = inner
                .templates
                .iter()
                .filter(|t| t.active)
                .filter(|t| t.next_scheduled_date.is_some_and(|next| next <= on))
                .cloned()
                .collect();
            due.sort_by_key(|t| t.next_scheduled_date);
            due
        })
    }
}
