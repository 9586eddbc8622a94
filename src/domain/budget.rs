use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::BudgetCategory;
use crate::errors::{LedgerError, Result};

/// A planned spending allocation for one category over one inclusive date
/// range. Spending is never stored here; it is always derived from the
/// transaction history at read time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub category: BudgetCategory,
    pub allocated: Decimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(
        category: BudgetCategory,
        allocated: Decimal,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Self> {
        validate_allocation(allocated)?;
        validate_period(period_start, period_end)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            category,
            allocated,
            period_start,
            period_end,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Inclusive range intersection test.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.period_start <= end && self.period_end >= start
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

pub(crate) fn validate_allocation(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "Allocated amount must be positive".into(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_period(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(LedgerError::Validation(
            "Period end date must be on or after start date".into(),
        ));
    }
    Ok(())
}
