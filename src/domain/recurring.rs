use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::BudgetCategory;
use crate::errors::{LedgerError, Result};

/// Enumerates the supported generation cadences.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// Advances `from` by one cadence step. Pure calendar arithmetic: month
    /// steps clamp to the target month's length (Jan 31 + 1mo = Feb 28/29)
    /// and year steps clamp Feb 29 to Feb 28 off leap years.
    pub fn next_date(&self, from: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => from + Duration::days(1),
            Frequency::Weekly => from + Duration::days(7),
            Frequency::Biweekly => from + Duration::days(14),
            Frequency::Monthly => shift_month(from, 1),
            Frequency::Quarterly => shift_month(from, 3),
            Frequency::Yearly => shift_year(from, 1),
        }
    }
}

fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    let mut day = date.day();
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }
    day = day.min(days_in_month(year, month as u32));
    NaiveDate::from_ymd_opt(year, month as u32, day).unwrap()
}

fn shift_year(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year() + years;
    let day = date.day().min(days_in_month(year, date.month()));
    NaiveDate::from_ymd_opt(year, date.month(), day).unwrap()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap());
    (first_next - Duration::days(1)).day()
}

/// A template that manufactures expense transactions on a schedule.
///
/// While active the next scheduled date must be set. At most one transaction
/// is ever generated per (template, scheduled date); deleting a template
/// orphans previously generated transactions rather than cascading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringExpense {
    pub id: Uuid,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_scheduled_date: Option<NaiveDate>,
    pub amount: Decimal,
    pub category: BudgetCategory,
    pub description: String,
    pub active: bool,
    pub source_account: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_generated_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringExpense {
    pub fn new(
        frequency: Frequency,
        next_scheduled_date: NaiveDate,
        amount: Decimal,
        category: BudgetCategory,
        description: impl Into<String>,
        source_account: Uuid,
    ) -> Result<Self> {
        let description = description.into();
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "Amount must be positive, got: {amount}"
            )));
        }
        if description.trim().is_empty() {
            return Err(LedgerError::Validation("Description cannot be blank".into()));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            frequency,
            next_scheduled_date: Some(next_scheduled_date),
            amount,
            category,
            description,
            active: true,
            source_account,
            last_generated_date: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Records a generation for `generated_on` and steps the schedule one
    /// cadence forward from it.
    pub fn advance_schedule(&mut self, generated_on: NaiveDate) {
        self.last_generated_date = Some(generated_on);
        self.next_scheduled_date = Some(self.frequency.next_date(generated_on));
        self.touch();
    }

    /// Returns false when already active; fails when no schedule is set.
    pub fn activate(&mut self) -> Result<bool> {
        if self.active {
            return Ok(false);
        }
        if self.next_scheduled_date.is_none() {
            return Err(LedgerError::State(
                "Cannot activate a recurring expense with no next scheduled date".into(),
            ));
        }
        self.active = true;
        self.touch();
        Ok(true)
    }

    /// Returns false when already inactive. Schedule data is preserved so the
    /// template can be resumed later.
    pub fn deactivate(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.touch();
        true
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
