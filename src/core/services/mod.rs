pub mod account_service;
pub mod budget_service;
pub mod recurring_service;
pub mod rollover_service;
pub mod transaction_service;

pub use account_service::{AccountClosure, AccountService, AccountUpdate};
pub use budget_service::{BudgetService, BudgetUpdate};
pub use recurring_service::{BatchReport, RecurringService, RecurringUpdate};
pub use rollover_service::{PeriodSummary, RolloverService};
pub use transaction_service::{
    RecordExpense, RecordIncome, RecordRefund, RecordTransfer, TransactionService,
};

#[cfg(test)]
mod tests;
