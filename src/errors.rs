use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::BudgetCategory;

/// Unified error type for domain/service/storage layers.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),
    #[error("Budget not found: {0}")]
    BudgetNotFound(Uuid),
    #[error("Recurring expense not found: {0}")]
    TemplateNotFound(Uuid),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Account {0} is inactive")]
    InactiveAccount(Uuid),
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: Uuid,
        balance: Decimal,
        requested: Decimal,
    },
    #[error("Budget for {category} overlaps period {period_start} to {period_end}")]
    BudgetOverlap {
        category: BudgetCategory,
        period_start: chrono::NaiveDate,
        period_end: chrono::NaiveDate,
    },
    #[error("Transaction {0} has already been reversed")]
    DuplicateReversal(Uuid),
    #[error("Invalid state: {0}")]
    State(String),
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
    #[error("Persistence error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Coarse classification used by API layers to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    State,
    Arithmetic,
    Storage,
}

impl LedgerError {
    /// Maps each variant onto the failure family it belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::AccountNotFound(_)
            | LedgerError::TransactionNotFound(_)
            | LedgerError::BudgetNotFound(_)
            | LedgerError::TemplateNotFound(_) => ErrorKind::NotFound,
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::InactiveAccount(_)
            | LedgerError::InsufficientFunds { .. }
            | LedgerError::BudgetOverlap { .. }
            | LedgerError::DuplicateReversal(_) => ErrorKind::Conflict,
            LedgerError::State(_) => ErrorKind::State,
            LedgerError::Arithmetic(_) => ErrorKind::Arithmetic,
            LedgerError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}
