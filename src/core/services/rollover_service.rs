//! Month-end orchestration: closing budget periods, initializing new ones
//! from a template month, and aggregate period summaries.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::Budget;
use crate::errors::{LedgerError, Result};
use crate::storage::LedgerStore;

use super::budget_service::BudgetService;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// Budget performance for one calendar month.
///
/// Utilization is 0% when nothing was allocated: an explicit special case
/// here, unlike the per-budget calculation which treats it as an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodSummary {
    pub year: i32,
    pub month: u32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_allocated: Decimal,
    pub total_spent: Decimal,
    pub utilization: Decimal,
    pub over_budget_count: usize,
    pub total_budgets: usize,
}

/// Period rollover operations over a [`LedgerStore`].
pub struct RolloverService<'a> {
    store: &'a dyn LedgerStore,
}

impl<'a> RolloverService<'a> {
    pub fn new(store: &'a dyn LedgerStore) -> Self {
        Self { store }
    }

    /// Deactivates every active budget overlapping the calendar month and
    /// returns the count closed. Idempotent: a second run finds nothing
    /// active left. Strictly-future months are rejected; the month in
    /// progress may be closed.
    pub fn close_period(&self, year: i32, month: u32) -> Result<usize> {
        let (period_start, period_end) = month_range(year, month)?;

        let today = Utc::now().date_naive();
        if (year, month) > (today.year(), today.month()) {
            return Err(LedgerError::State(format!(
                "Cannot close future period {year}-{month:02}"
            )));
        }

        let active = self
            .store
            .budgets_overlapping(None, period_start, period_end, true)?;
        let closed = active.len();
        for mut budget in active {
            budget.deactivate();
            self.store.save_budget(&budget)?;
        }

        tracing::info!(year, month, closed, "closed budget period");
        Ok(closed)
    }

    /// Copies the source month's active budgets into the target month.
    ///
    /// The source must have at least one active budget and the target must
    /// have none, preventing initialization from an empty month and
    /// accidental overwrite of a populated one.
    pub fn initialize_period(
        &self,
        target_year: i32,
        target_month: u32,
        source_year: i32,
        source_month: u32,
    ) -> Result<Vec<Budget>> {
        let (source_start, source_end) = month_range(source_year, source_month)?;
        let (target_start, target_end) = month_range(target_year, target_month)?;

        let source_budgets = self
            .store
            .budgets_overlapping(None, source_start, source_end, true)?;
        if source_budgets.is_empty() {
            return Err(LedgerError::State(format!(
                "No active budgets found for source period {source_year}-{source_month:02}"
            )));
        }

        let existing_target = self
            .store
            .budgets_overlapping(None, target_start, target_end, true)?;
        if !existing_target.is_empty() {
            return Err(LedgerError::State(format!(
                "Target period {target_year}-{target_month:02} already has {} active budget(s)",
                existing_target.len()
            )));
        }

        BudgetService::new(self.store).rollover(source_start, source_end, target_start, target_end)
    }

    /// Aggregates every budget — active and inactive, for historical
    /// accuracy — overlapping the calendar month. Fails when no budget
    /// overlaps the period at all.
    pub fn summarize(&self, year: i32, month: u32) -> Result<PeriodSummary> {
        let (period_start, period_end) = month_range(year, month)?;

        let budgets = self
            .store
            .budgets_overlapping(None, period_start, period_end, false)?;
        if budgets.is_empty() {
            return Err(LedgerError::State(format!(
                "No budgets found for period {year}-{month:02}"
            )));
        }

        let mut total_allocated = Decimal::ZERO;
        let mut total_spent = Decimal::ZERO;
        let mut over_budget_count = 0usize;
        for budget in &budgets {
            let spent = self
                .store
                .spent_in_category(budget.category, period_start, period_end)?;
            total_allocated += budget.allocated;
            total_spent += spent;
            if spent > budget.allocated {
                over_budget_count += 1;
            }
        }

        let utilization = if total_allocated == Decimal::ZERO {
            Decimal::ZERO
        } else {
            (total_spent / total_allocated * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };

        Ok(PeriodSummary {
            year,
            month,
            period_start,
            period_end,
            total_allocated,
            total_spent,
            utilization,
            over_budget_count,
            total_budgets: budgets.len(),
        })
    }
}

/// First and last day of a calendar month, with the year clamped to a sane
/// business range and the month to 1..=12.
fn month_range(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(LedgerError::Validation(format!(
            "Year must be between {MIN_YEAR} and {MAX_YEAR}. Provided: {year}"
        )));
    }
    if !(1..=12).contains(&month) {
        return Err(LedgerError::Validation(format!(
            "Month must be between 1 and 12. Provided: {month}"
        )));
    }
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| LedgerError::Validation(format!("Invalid month {year}-{month:02}")))?;
    let first_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| LedgerError::Validation(format!("Invalid month {year}-{month:02}")))?;
    Ok((start, first_next.pred_opt().unwrap_or(start)))
}
