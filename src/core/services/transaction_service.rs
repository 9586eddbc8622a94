//! The transaction engine: creation of the four movement kinds, metadata
//! edits, soft deletion, reversals, and filtered listing.
//!
//! Every entry point is one unit of work: the transaction record and the
//! affected balances commit together through
//! [`LedgerStore::record_transaction`], so a failed validation leaves no
//! partial effect behind.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::transaction::reversal_marker;
use crate::domain::{Account, BudgetCategory, Transaction, TransactionKind};
use crate::errors::{LedgerError, Result};
use crate::storage::{LedgerStore, TransactionFilter};

/// Command to credit income into a destination account.
#[derive(Debug, Clone)]
pub struct RecordIncome {
    pub destination_account: Uuid,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
}

/// Command to debit an expense from a source account against a category.
#[derive(Debug, Clone)]
pub struct RecordExpense {
    pub source_account: Uuid,
    pub amount: Decimal,
    pub category: BudgetCategory,
    pub date: NaiveDate,
    pub description: String,
}

/// Command to move funds between two distinct accounts.
#[derive(Debug, Clone)]
pub struct RecordTransfer {
    pub source_account: Uuid,
    pub destination_account: Uuid,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
}

/// Command to credit a refund back to the account that originally paid.
/// The optional category reduces that budget's derived spend.
#[derive(Debug, Clone)]
pub struct RecordRefund {
    pub source_account: Uuid,
    pub amount: Decimal,
    pub category: Option<BudgetCategory>,
    pub date: NaiveDate,
    pub description: String,
}

/// Transaction operations over a [`LedgerStore`].
pub struct TransactionService<'a> {
    store: &'a dyn LedgerStore,
}

impl<'a> TransactionService<'a> {
    pub fn new(store: &'a dyn LedgerStore) -> Self {
        Self { store }
    }

    pub fn record_income(&self, command: RecordIncome) -> Result<Transaction> {
        let mut destination = self.load_active(command.destination_account)?;
        let txn = Transaction::income(
            destination.id,
            command.amount,
            command.date,
            command.description,
        )?;
        destination.credit(command.amount)?;
        self.store.record_transaction(&txn, &[&destination])?;
        Ok(txn)
    }

    pub fn record_expense(&self, command: RecordExpense) -> Result<Transaction> {
        let mut source = self.load_active(command.source_account)?;
        self.ensure_sufficient(&source, command.amount)?;
        let txn = Transaction::expense(
            source.id,
            command.amount,
            command.category,
            command.date,
            command.description,
        )?;
        source.debit(command.amount)?;
        self.store.record_transaction(&txn, &[&source])?;
        Ok(txn)
    }

    pub fn record_transfer(&self, command: RecordTransfer) -> Result<Transaction> {
        let mut source = self.load_active(command.source_account)?;
        let mut destination = self.load_active(command.destination_account)?;
        self.ensure_sufficient(&source, command.amount)?;
        let txn = Transaction::transfer(
            source.id,
            destination.id,
            command.amount,
            command.date,
            command.description,
        )?;
        source.debit(command.amount)?;
        destination.credit(command.amount)?;
        self.store
            .record_transaction(&txn, &[&source, &destination])?;
        Ok(txn)
    }

    pub fn record_refund(&self, command: RecordRefund) -> Result<Transaction> {
        let mut source = self.load_active(command.source_account)?;
        let txn = Transaction::refund(
            source.id,
            command.amount,
            command.category,
            command.date,
            command.description,
        )?;
        source.credit(command.amount)?;
        self.store.record_transaction(&txn, &[&source])?;
        Ok(txn)
    }

    /// Edits the mutable metadata: date (never into the future), category
    /// (expense/refund only), description. Amount, kind, and accounts are
    /// immutable once persisted.
    pub fn update_metadata(
        &self,
        id: Uuid,
        new_date: Option<NaiveDate>,
        new_category: Option<BudgetCategory>,
        new_description: Option<String>,
    ) -> Result<Transaction> {
        let mut txn = self.get(id)?;

        if let Some(date) = new_date {
            if date > Utc::now().date_naive() {
                return Err(LedgerError::Validation(
                    "Transaction date cannot be in the future".into(),
                ));
            }
            txn.date = date;
        }
        if let Some(category) = new_category {
            if !matches!(txn.kind, TransactionKind::Expense | TransactionKind::Refund) {
                return Err(LedgerError::Validation(
                    "Budget category can only be updated for EXPENSE and REFUND transactions"
                        .into(),
                ));
            }
            txn.category = Some(category);
        }
        if let Some(description) = new_description {
            txn.description = description;
        }

        txn.touch();
        self.store.save_transaction(&txn)?;
        Ok(txn)
    }

    /// Soft delete. Balances are not reversed; use [`Self::reverse`] to undo
    /// the financial effect.
    pub fn delete(&self, id: Uuid) -> Result<()> {
        let mut txn = self.get(id)?;
        txn.delete();
        self.store.save_transaction(&txn)
    }

    pub fn get(&self, id: Uuid) -> Result<Transaction> {
        self.store
            .transaction(id)?
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    pub fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.store.transactions(filter)
    }

    /// Synthesizes the inverse transaction and applies the opposite balance
    /// deltas atomically. At most one reversal may exist per original; the
    /// new description embeds the original id for traceability.
    pub fn reverse(&self, id: Uuid, reversal_date: NaiveDate, reason: &str) -> Result<Transaction> {
        let original = self.get(id)?;
        if self.store.reversal_exists(id)? {
            return Err(LedgerError::DuplicateReversal(id));
        }

        let description = format!("REVERSAL: {reason} {}", reversal_marker(id));

        let (reversal, touched) = match original.kind {
            TransactionKind::Income => {
                // Undoing income debits the account that was credited.
                let account_id = original
                    .destination_account
                    .ok_or_else(|| LedgerError::State("income without destination".into()))?;
                let mut account = self.load_account(account_id)?;
                let txn = Transaction::expense(
                    account.id,
                    original.amount,
                    BudgetCategory::Miscellaneous,
                    reversal_date,
                    description,
                )?;
                account.debit(original.amount)?;
                (txn, vec![account])
            }
            TransactionKind::Expense => {
                // Undoing an expense refunds the source, restoring the
                // original category so derived spend drops back.
                let account_id = original
                    .source_account
                    .ok_or_else(|| LedgerError::State("expense without source".into()))?;
                let mut account = self.load_account(account_id)?;
                let txn = Transaction::refund(
                    account.id,
                    original.amount,
                    original.category,
                    reversal_date,
                    description,
                )?;
                account.credit(original.amount)?;
                (txn, vec![account])
            }
            TransactionKind::Transfer => {
                let source_id = original
                    .source_account
                    .ok_or_else(|| LedgerError::State("transfer without source".into()))?;
                let destination_id = original
                    .destination_account
                    .ok_or_else(|| LedgerError::State("transfer without destination".into()))?;
                let mut source = self.load_account(source_id)?;
                let mut destination = self.load_account(destination_id)?;
                let txn = Transaction::transfer(
                    destination.id,
                    source.id,
                    original.amount,
                    reversal_date,
                    description,
                )?;
                destination.debit(original.amount)?;
                source.credit(original.amount)?;
                (txn, vec![destination, source])
            }
            TransactionKind::Refund => {
                let account_id = original
                    .source_account
                    .ok_or_else(|| LedgerError::State("refund without source".into()))?;
                let mut account = self.load_account(account_id)?;
                let txn = Transaction::expense(
                    account.id,
                    original.amount,
                    original.category.unwrap_or(BudgetCategory::Miscellaneous),
                    reversal_date,
                    description,
                )?;
                account.debit(original.amount)?;
                (txn, vec![account])
            }
        };

        let refs: Vec<&Account> = touched.iter().collect();
        self.store.record_transaction(&reversal, &refs)?;
        tracing::info!(
            original = %id,
            reversal = %reversal.id,
            amount = %reversal.amount,
            "reversed transaction"
        );
        Ok(reversal)
    }

    fn load_account(&self, id: Uuid) -> Result<Account> {
        self.store
            .account(id)?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    fn load_active(&self, id: Uuid) -> Result<Account> {
        let account = self.load_account(id)?;
        if !account.active {
            return Err(LedgerError::InactiveAccount(id));
        }
        Ok(account)
    }

    fn ensure_sufficient(&self, source: &Account, amount: Decimal) -> Result<()> {
        if !source.is_credit_card() && !source.has_sufficient_balance(amount) {
            return Err(LedgerError::InsufficientFunds {
                account: source.id,
                balance: source.current_balance,
                requested: amount,
            });
        }
        Ok(())
    }
}
