//! Budget lifecycle, derived spending calculations, and period rollover.
//!
//! Spending is never stored on a budget; every read recomputes it from the
//! transaction store so there is one source of truth.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::domain::budget::{validate_allocation, validate_period};
use crate::domain::{Budget, BudgetCategory};
use crate::errors::{LedgerError, Result};
use crate::storage::{BudgetFilter, LedgerStore};

const PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// Partial changeset for [`BudgetService::update`]. None leaves a field
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct BudgetUpdate {
    pub category: Option<BudgetCategory>,
    pub allocated: Option<Decimal>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub active: Option<bool>,
}

/// Budget operations over a [`LedgerStore`].
pub struct BudgetService<'a> {
    store: &'a dyn LedgerStore,
}

impl<'a> BudgetService<'a> {
    pub fn new(store: &'a dyn LedgerStore) -> Self {
        Self { store }
    }

    /// Creates an active budget. For a given category, no two active budgets
    /// may have overlapping periods.
    pub fn create(
        &self,
        category: BudgetCategory,
        allocated: Decimal,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Budget> {
        let budget = Budget::new(category, allocated, period_start, period_end)?;
        self.ensure_no_overlap(category, period_start, period_end, None)?;
        self.store.insert_budget(&budget)?;
        tracing::info!(
            budget = %budget.id,
            category = %category,
            allocated = %allocated,
            "created budget"
        );
        Ok(budget)
    }

    /// Partial update. Any change to the category or period re-runs overlap
    /// detection with this budget excluded from the check.
    pub fn update(&self, id: Uuid, changes: BudgetUpdate) -> Result<Budget> {
        let mut budget = self.get(id)?;
        let mut overlap_relevant = false;

        if let Some(category) = changes.category {
            if category != budget.category {
                budget.category = category;
                overlap_relevant = true;
            }
        }
        if let Some(allocated) = changes.allocated {
            validate_allocation(allocated)?;
            budget.allocated = allocated;
        }
        if changes.period_start.is_some() || changes.period_end.is_some() {
            let start = changes.period_start.unwrap_or(budget.period_start);
            let end = changes.period_end.unwrap_or(budget.period_end);
            validate_period(start, end)?;
            budget.period_start = start;
            budget.period_end = end;
            overlap_relevant = true;
        }

        if overlap_relevant {
            self.ensure_no_overlap(
                budget.category,
                budget.period_start,
                budget.period_end,
                Some(id),
            )?;
        }

        if let Some(active) = changes.active {
            budget.active = active;
        }

        budget.touch();
        self.store.save_budget(&budget)?;
        Ok(budget)
    }

    /// Soft-closes the budget. Returns false when it was already inactive.
    pub fn close(&self, id: Uuid) -> Result<bool> {
        let mut budget = self.get(id)?;
        if !budget.active {
            return Ok(false);
        }
        budget.deactivate();
        self.store.save_budget(&budget)?;
        Ok(true)
    }

    pub fn get(&self, id: Uuid) -> Result<Budget> {
        self.store.budget(id)?.ok_or(LedgerError::BudgetNotFound(id))
    }

    pub fn list(&self, filter: &BudgetFilter) -> Result<Vec<Budget>> {
        self.store.budgets(filter)
    }

    /// The single active budget covering a category on a date, if any.
    pub fn find_active_for(
        &self,
        category: BudgetCategory,
        date: NaiveDate,
    ) -> Result<Option<Budget>> {
        Ok(self
            .store
            .budgets_overlapping(Some(category), date, date, true)?
            .into_iter()
            .next())
    }

    /// Derived spend over the budget's period: expenses minus categorized
    /// refunds.
    pub fn calculate_spent(&self, id: Uuid) -> Result<Decimal> {
        let budget = self.get(id)?;
        self.store
            .spent_in_category(budget.category, budget.period_start, budget.period_end)
    }

    /// Allocation minus derived spend; negative when over budget.
    pub fn calculate_remaining(&self, id: Uuid) -> Result<Decimal> {
        let budget = self.get(id)?;
        let spent = self
            .store
            .spent_in_category(budget.category, budget.period_start, budget.period_end)?;
        Ok(budget.allocated - spent)
    }

    /// Spend as a percentage of the allocation, half-up at two decimals.
    pub fn calculate_utilization(&self, id: Uuid) -> Result<Decimal> {
        let budget = self.get(id)?;
        if budget.allocated == Decimal::ZERO {
            return Err(LedgerError::Arithmetic(
                "Cannot calculate utilization: allocated amount is zero".into(),
            ));
        }
        let spent = self
            .store
            .spent_in_category(budget.category, budget.period_start, budget.period_end)?;
        Ok(round_percent(spent / budget.allocated * PERCENT))
    }

    /// Active budgets whose derived spend exceeds the allocation, sorted by
    /// overage descending.
    pub fn find_over_budgets(&self) -> Result<Vec<Budget>> {
        let filter = BudgetFilter {
            active: Some(true),
            ..BudgetFilter::default()
        };
        let mut over: Vec<(Budget, Decimal)> = Vec::new();
        for budget in self.store.budgets(&filter)? {
            let spent = self.store.spent_in_category(
                budget.category,
                budget.period_start,
                budget.period_end,
            )?;
            if spent > budget.allocated {
                let overage = spent - budget.allocated;
                over.push((budget, overage));
            }
        }
        over.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(over.into_iter().map(|(budget, _)| budget).collect())
    }

    /// Active budgets at or above the utilization threshold (percent),
    /// sorted by utilization descending. Zero-allocation budgets are
    /// skipped rather than erroring the whole report.
    pub fn find_exceeding_threshold(&self, threshold_percent: Decimal) -> Result<Vec<Budget>> {
        if threshold_percent < Decimal::ZERO {
            return Err(LedgerError::Validation(
                "Threshold must be non-negative".into(),
            ));
        }
        let filter = BudgetFilter {
            active: Some(true),
            ..BudgetFilter::default()
        };
        let mut exceeding: Vec<(Budget, Decimal)> = Vec::new();
        for budget in self.store.budgets(&filter)? {
            if budget.allocated == Decimal::ZERO {
                continue;
            }
            let spent = self.store.spent_in_category(
                budget.category,
                budget.period_start,
                budget.period_end,
            )?;
            let utilization = round_percent(spent / budget.allocated * PERCENT);
            if utilization >= threshold_percent {
                exceeding.push((budget, utilization));
            }
        }
        exceeding.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(exceeding.into_iter().map(|(budget, _)| budget).collect())
    }

    /// Copies every active budget overlapping the source period into the
    /// target period with the same category and allocation.
    ///
    /// Every overlap check runs before any budget is created; the batch then
    /// lands atomically, so a conflict never leaves a partial set behind.
    pub fn rollover(
        &self,
        source_start: NaiveDate,
        source_end: NaiveDate,
        target_start: NaiveDate,
        target_end: NaiveDate,
    ) -> Result<Vec<Budget>> {
        validate_period(source_start, source_end)?;
        validate_period(target_start, target_end)?;

        let source_budgets =
            self.store
                .budgets_overlapping(None, source_start, source_end, true)?;

        let mut seen: HashSet<BudgetCategory> = HashSet::new();
        let mut created = Vec::with_capacity(source_budgets.len());
        for source in &source_budgets {
            let duplicate_in_batch = !seen.insert(source.category);
            if duplicate_in_batch
                || !self
                    .store
                    .budgets_overlapping(Some(source.category), target_start, target_end, true)?
                    .is_empty()
            {
                return Err(LedgerError::BudgetOverlap {
                    category: source.category,
                    period_start: target_start,
                    period_end: target_end,
                });
            }
            created.push(Budget::new(
                source.category,
                source.allocated,
                target_start,
                target_end,
            )?);
        }

        self.store.insert_budgets(&created)?;
        tracing::info!(
            count = created.len(),
            target_start = %target_start,
            target_end = %target_end,
            "rolled budgets into new period"
        );
        Ok(created)
    }

    fn ensure_no_overlap(
        &self,
        category: BudgetCategory,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<()> {
        let overlapping = self
            .store
            .budgets_overlapping(Some(category), start, end, true)?;
        let conflict = overlapping.iter().any(|b| exclude != Some(b.id));
        if conflict {
            return Err(LedgerError::BudgetOverlap {
                category,
                period_start: start,
                period_end: end,
            });
        }
        Ok(())
    }
}

fn round_percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
