use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::BudgetCategory;
use crate::errors::{LedgerError, Result};

const DEFAULT_CURRENCY: &str = "USD";

/// An immutable-after-creation record of one financial movement.
///
/// Amount is always a positive magnitude; direction comes from the kind and
/// which account slot is populated, never from sign. Only date, category
/// (expense/refund) and description may change after persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<BudgetCategory>,
    pub amount: Decimal,
    pub currency: String,
    pub date: NaiveDate,
    pub description: String,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Income credits the destination account. No source, no category.
    pub fn income(
        destination: Uuid,
        amount: Decimal,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Result<Self> {
        Self::build(
            TransactionKind::Income,
            None,
            Some(destination),
            None,
            amount,
            date,
            description.into(),
        )
    }

    /// Expense debits the source account and tracks against a budget category.
    pub fn expense(
        source: Uuid,
        amount: Decimal,
        category: BudgetCategory,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Result<Self> {
        Self::build(
            TransactionKind::Expense,
            Some(source),
            None,
            Some(category),
            amount,
            date,
            description.into(),
        )
    }

    /// Transfer debits the source and credits the destination, which must be
    /// distinct accounts.
    pub fn transfer(
        source: Uuid,
        destination: Uuid,
        amount: Decimal,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Result<Self> {
        if source == destination {
            return Err(LedgerError::Validation(
                "Source and destination accounts must be different".into(),
            ));
        }
        Self::build(
            TransactionKind::Transfer,
            Some(source),
            Some(destination),
            None,
            amount,
            date,
            description.into(),
        )
    }

    /// Refund credits the source account (the account that originally paid);
    /// a category, when present, reduces that budget's derived spend.
    pub fn refund(
        source: Uuid,
        amount: Decimal,
        category: Option<BudgetCategory>,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Result<Self> {
        Self::build(
            TransactionKind::Refund,
            Some(source),
            None,
            category,
            amount,
            date,
            description.into(),
        )
    }

    fn build(
        kind: TransactionKind,
        source_account: Option<Uuid>,
        destination_account: Option<Uuid>,
        category: Option<BudgetCategory>,
        amount: Decimal,
        date: NaiveDate,
        description: String,
    ) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "Amount must be positive, got: {amount}"
            )));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            source_account,
            destination_account,
            category,
            amount,
            currency: DEFAULT_CURRENCY.into(),
            date,
            description,
            recurring: false,
            template_id: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Links this transaction to the recurring template that produced it.
    pub fn mark_recurring(&mut self, template_id: Uuid) {
        self.template_id = Some(template_id);
        self.recurring = true;
        self.touch();
    }

    /// Soft-deletes the record; balances are never reversed by deletion.
    pub fn delete(&mut self) {
        self.deleted = true;
        self.touch();
    }

    /// True when this transaction debits or credits the given account.
    pub fn touches_account(&self, account: Uuid) -> bool {
        self.source_account == Some(account) || self.destination_account == Some(account)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Builds the traceability marker a reversal embeds in its description.
/// The duplicate-reversal check looks for this exact fragment.
pub fn reversal_marker(original: Uuid) -> String {
    format!("(original: {original})")
}

/// Enumerates the four movement kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
    Refund,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn factories_populate_the_right_slots() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let amount = Decimal::new(50_00, 2);
        let date = day(2024, 1, 15);

        let income = Transaction::income(a, amount, date, "salary").unwrap();
        assert_eq!(income.kind, TransactionKind::Income);
        assert_eq!(income.destination_account, Some(a));
        assert!(income.source_account.is_none());
        assert!(income.category.is_none());

        let expense =
            Transaction::expense(a, amount, BudgetCategory::Groceries, date, "food").unwrap();
        assert_eq!(expense.source_account, Some(a));
        assert!(expense.destination_account.is_none());
        assert_eq!(expense.category, Some(BudgetCategory::Groceries));

        let transfer = Transaction::transfer(a, b, amount, date, "move").unwrap();
        assert_eq!(transfer.source_account, Some(a));
        assert_eq!(transfer.destination_account, Some(b));

        let refund = Transaction::refund(a, amount, None, date, "returned item").unwrap();
        assert_eq!(refund.source_account, Some(a));
        assert!(refund.category.is_none());
    }

    #[test]
    fn transfer_to_same_account_is_rejected() {
        let a = Uuid::new_v4();
        let err = Transaction::transfer(a, a, Decimal::ONE, day(2024, 1, 1), "loop")
            .expect_err("must fail");
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let a = Uuid::new_v4();
        assert!(Transaction::income(a, Decimal::ZERO, day(2024, 1, 1), "zero").is_err());
        assert!(
            Transaction::refund(a, Decimal::new(-5, 0), None, day(2024, 1, 1), "neg").is_err()
        );
    }

    #[test]
    fn reversal_marker_embeds_the_id() {
        let id = Uuid::new_v4();
        assert!(reversal_marker(id).contains(&id.to_string()));
    }
}
