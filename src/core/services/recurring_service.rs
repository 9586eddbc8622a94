//! Recurring expense templates and idempotent transaction generation.
//!
//! Generation is guarded by an existence check keyed on (template, scheduled
//! date): retries never emit a second transaction for the same occurrence.
//! Batch due-processing isolates failures per template.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{BudgetCategory, Frequency, RecurringExpense, Transaction};
use crate::errors::{LedgerError, Result};
use crate::storage::{LedgerStore, TemplateFilter};

use super::transaction_service::{RecordExpense, TransactionService};

/// Partial changeset for [`RecurringService::update`]. None leaves a field
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct RecurringUpdate {
    pub frequency: Option<Frequency>,
    pub next_scheduled_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub category: Option<BudgetCategory>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Aggregate outcome of a due-processing batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Recurring expense operations over a [`LedgerStore`].
pub struct RecurringService<'a> {
    store: &'a dyn LedgerStore,
}

impl<'a> RecurringService<'a> {
    pub fn new(store: &'a dyn LedgerStore) -> Self {
        Self { store }
    }

    /// Creates an active template. The source account must exist and be
    /// active.
    pub fn create(
        &self,
        frequency: Frequency,
        next_scheduled_date: NaiveDate,
        amount: Decimal,
        category: BudgetCategory,
        description: &str,
        source_account: Uuid,
    ) -> Result<RecurringExpense> {
        let account = self
            .store
            .account(source_account)?
            .ok_or(LedgerError::AccountNotFound(source_account))?;
        if !account.active {
            return Err(LedgerError::InactiveAccount(source_account));
        }
        let template = RecurringExpense::new(
            frequency,
            next_scheduled_date,
            amount,
            category,
            description,
            source_account,
        )?;
        self.store.insert_template(&template)?;
        tracing::info!(
            template = %template.id,
            frequency = ?frequency,
            amount = %amount,
            category = %category,
            "created recurring expense"
        );
        Ok(template)
    }

    /// Partial update of the template fields.
    pub fn update(&self, id: Uuid, changes: RecurringUpdate) -> Result<RecurringExpense> {
        let mut template = self.get(id)?;

        if let Some(frequency) = changes.frequency {
            template.frequency = frequency;
        }
        if let Some(next) = changes.next_scheduled_date {
            template.next_scheduled_date = Some(next);
        }
        if let Some(amount) = changes.amount {
            if amount <= Decimal::ZERO {
                return Err(LedgerError::Validation(format!(
                    "Amount must be positive, got: {amount}"
                )));
            }
            template.amount = amount;
        }
        if let Some(category) = changes.category {
            template.category = category;
        }
        if let Some(description) = changes.description {
            if description.trim().is_empty() {
                return Err(LedgerError::Validation("Description cannot be blank".into()));
            }
            template.description = description;
        }
        if let Some(active) = changes.active {
            if active {
                template.activate()?;
            } else {
                template.deactivate();
            }
        }

        template.touch();
        self.store.save_template(&template)?;
        Ok(template)
    }

    /// Hard delete of the template only. Previously generated transactions
    /// keep their template reference and become orphaned.
    pub fn delete(&self, id: Uuid) -> Result<()> {
        let template = self.get(id)?;
        self.store.remove_template(template.id)?;
        tracing::info!(
            template = %id,
            "deleted recurring expense template (generated transactions preserved)"
        );
        Ok(())
    }

    /// Returns false when already active; fails when no schedule is set.
    pub fn activate(&self, id: Uuid) -> Result<bool> {
        let mut template = self.get(id)?;
        let changed = template.activate()?;
        if changed {
            self.store.save_template(&template)?;
        }
        Ok(changed)
    }

    /// Returns false when already inactive. Schedule data is preserved.
    pub fn deactivate(&self, id: Uuid) -> Result<bool> {
        let mut template = self.get(id)?;
        let changed = template.deactivate();
        if changed {
            self.store.save_template(&template)?;
        }
        Ok(changed)
    }

    pub fn get(&self, id: Uuid) -> Result<RecurringExpense> {
        self.store
            .template(id)?
            .ok_or(LedgerError::TemplateNotFound(id))
    }

    pub fn list(&self, filter: &TemplateFilter) -> Result<Vec<RecurringExpense>> {
        self.store.templates(filter)
    }

    /// Generates the transaction for the template's current scheduled date.
    ///
    /// Idempotent: when a transaction for (template, scheduled date) already
    /// exists the call returns Ok(None) without side effect. Otherwise the
    /// expense is recorded through the transaction engine, tagged with the
    /// template reference, and the schedule advances one cadence step.
    pub fn generate(&self, id: Uuid) -> Result<Option<Transaction>> {
        let mut template = self.get(id)?;

        if !template.active {
            return Err(LedgerError::State(format!(
                "Cannot generate from inactive recurring expense: {id}"
            )));
        }
        let scheduled_date = template.next_scheduled_date.ok_or_else(|| {
            LedgerError::State(format!("Recurring expense {id} has no next scheduled date"))
        })?;

        if self.store.generated_exists(id, scheduled_date)? {
            tracing::info!(
                template = %id,
                date = %scheduled_date,
                "transaction already exists for scheduled date, skipping generation"
            );
            return Ok(None);
        }

        let transactions = TransactionService::new(self.store);
        let mut txn = transactions.record_expense(RecordExpense {
            source_account: template.source_account,
            amount: template.amount,
            category: template.category,
            date: scheduled_date,
            description: template.description.clone(),
        })?;

        txn.mark_recurring(template.id);
        self.store.save_transaction(&txn)?;

        template.advance_schedule(scheduled_date);
        self.store.save_template(&template)?;

        tracing::info!(
            template = %id,
            transaction = %txn.id,
            amount = %txn.amount,
            next = ?template.next_scheduled_date,
            "generated transaction from recurring expense"
        );
        Ok(Some(txn))
    }

    /// Generates every template due on or before `current_date`. A failure
    /// on one template is logged and counted; the rest of the batch still
    /// runs.
    pub fn process_due(&self, current_date: NaiveDate) -> Result<BatchReport> {
        let due = self.store.due_templates(current_date)?;
        if due.is_empty() {
            tracing::info!(date = %current_date, "no recurring expenses due for processing");
            return Ok(BatchReport::default());
        }

        let mut report = BatchReport::default();
        for template in due {
            match self.generate(template.id) {
                Ok(_) => report.succeeded += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::error!(
                        template = %template.id,
                        error = %err,
                        "failed to generate transaction for recurring expense"
                    );
                }
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            total = report.total(),
            "batch processing complete"
        );
        Ok(report)
    }
}
