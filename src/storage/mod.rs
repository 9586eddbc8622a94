pub mod json;
pub mod memory;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Account, AccountType, Budget, BudgetCategory, Frequency, RecurringExpense, Transaction,
    TransactionKind,
};
use crate::errors::Result;

pub use json::JsonStore;
pub use memory::MemoryStore;

/// Abstraction over persistence backends for the ledger entities.
///
/// Each method is one serializable unit of work. `record_transaction` and
/// `insert_budgets` are the multi-entity units: everything they carry commits
/// together or not at all. Backends must serialize operations touching the
/// same account so balance read-then-write sequences cannot interleave.
pub trait LedgerStore: Send + Sync {
    // Accounts
    fn insert_account(&self, account: &Account) -> Result<()>;
    fn account(&self, id: Uuid) -> Result<Option<Account>>;
    /// Upserts by id.
    fn save_account(&self, account: &Account) -> Result<()>;
    fn remove_account(&self, id: Uuid) -> Result<()>;
    fn accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>>;
    fn account_name_exists(&self, name: &str, exclude: Option<Uuid>) -> Result<bool>;
    /// Whether any transaction, deleted or not, references the account.
    fn account_has_transactions(&self, id: Uuid) -> Result<bool>;

    // Transactions
    fn transaction(&self, id: Uuid) -> Result<Option<Transaction>>;
    /// Upserts by id. Used for metadata edits and soft deletion.
    fn save_transaction(&self, transaction: &Transaction) -> Result<()>;
    /// Persists the transaction and the touched accounts' balances as one
    /// atomic unit.
    fn record_transaction(&self, transaction: &Transaction, touched: &[&Account]) -> Result<()>;
    /// Non-deleted matches, date descending, creation stamp as tiebreak.
    fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;
    /// Derived spend for a category over an inclusive range: expense amounts
    /// minus refund amounts, non-deleted only.
    fn spent_in_category(
        &self,
        category: BudgetCategory,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal>;
    /// Whether a reversal referencing the original already exists.
    fn reversal_exists(&self, original: Uuid) -> Result<bool>;
    /// Whether the template already produced a transaction for the scheduled
    /// date. Soft-deleted transactions count: generation happened.
    fn generated_exists(&self, template: Uuid, scheduled: NaiveDate) -> Result<bool>;

    // Budgets
    fn insert_budget(&self, budget: &Budget) -> Result<()>;
    /// Atomic batch insert; either every budget lands or none do.
    fn insert_budgets(&self, budgets: &[Budget]) -> Result<()>;
    fn budget(&self, id: Uuid) -> Result<Option<Budget>>;
    /// Upserts by id.
    fn save_budget(&self, budget: &Budget) -> Result<()>;
    /// Matches ordered by period start descending.
    fn budgets(&self, filter: &BudgetFilter) -> Result<Vec<Budget>>;
    fn budgets_overlapping(
        &self,
        category: Option<BudgetCategory>,
        start: NaiveDate,
        end: NaiveDate,
        active_only: bool,
    ) -> Result<Vec<Budget>>;

    // Recurring expense templates
    fn insert_template(&self, template: &RecurringExpense) -> Result<()>;
    fn template(&self, id: Uuid) -> Result<Option<RecurringExpense>>;
    /// Upserts by id.
    fn save_template(&self, template: &RecurringExpense) -> Result<()>;
    fn remove_template(&self, id: Uuid) -> Result<()>;
    /// Matches ordered by next scheduled date ascending.
    fn templates(&self, filter: &TemplateFilter) -> Result<Vec<RecurringExpense>>;
    /// Active templates with a next scheduled date on or before `on`.
    fn due_templates(&self, on: NaiveDate) -> Result<Vec<RecurringExpense>>;
}

/// Filter criteria for account queries. All fields are optional
/// (None = no filter applied).
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub active: Option<bool>,
    pub account_type: Option<AccountType>,
    pub min_balance: Option<Decimal>,
    pub max_balance: Option<Decimal>,
    pub name_contains: Option<String>,
}

/// Filter criteria for transaction queries.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub category: Option<BudgetCategory>,
    pub account: Option<Uuid>,
    pub kind: Option<TransactionKind>,
}

/// Filter criteria for budget queries.
#[derive(Debug, Clone, Default)]
pub struct BudgetFilter {
    pub category: Option<BudgetCategory>,
    pub active: Option<bool>,
}

/// Filter criteria for recurring expense template queries.
#[derive(Debug, Clone, Default)]
pub struct TemplateFilter {
    pub active: Option<bool>,
    pub source_account: Option<Uuid>,
    pub frequency: Option<Frequency>,
}

/// Serializable snapshot of everything a store holds. The JSON backend
/// persists this as one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub templates: Vec<RecurringExpense>,
}
