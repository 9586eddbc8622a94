use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{LedgerError, Result};

/// Represents a financial container whose balance is derived from the
/// transaction history applied to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub account_type: AccountType,
    pub active: bool,
    pub starting_balance: Decimal,
    pub current_balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates an active account. The starting balance becomes the current
    /// balance immediately; no synthetic opening transaction is recorded.
    pub fn new(
        name: impl Into<String>,
        account_type: AccountType,
        starting_balance: Decimal,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            account_type,
            active: true,
            starting_balance,
            current_balance: starting_balance,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Subtracts `amount` from the current balance.
    ///
    /// Fails without mutating when the amount is not positive or the account
    /// is inactive. Sufficiency is the caller's rule, not the ledger's.
    pub fn debit(&mut self, amount: Decimal) -> Result<()> {
        self.ensure_mutable(amount)?;
        self.current_balance -= amount;
        self.touch();
        Ok(())
    }

    /// Adds `amount` to the current balance.
    pub fn credit(&mut self, amount: Decimal) -> Result<()> {
        self.ensure_mutable(amount)?;
        self.current_balance += amount;
        self.touch();
        Ok(())
    }

    /// Whether the current balance covers `amount` without going negative.
    pub fn has_sufficient_balance(&self, amount: Decimal) -> bool {
        self.current_balance >= amount
    }

    /// Net movement since the account was opened.
    pub fn net_change(&self) -> Decimal {
        self.current_balance - self.starting_balance
    }

    /// Credit-card accounts may carry a negative balance (debt).
    pub fn is_credit_card(&self) -> bool {
        self.account_type == AccountType::CreditCard
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn ensure_mutable(&self, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "Amount must be positive, got: {amount}"
            )));
        }
        if !self.active {
            return Err(LedgerError::InactiveAccount(self.id));
        }
        Ok(())
    }
}

/// Enumerates the supported account classifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Checking,
    Savings,
    CreditCard,
    Investment,
    Cash,
}
