use serde::{Deserialize, Serialize};

/// Enumerates the spending categories budgets and expenses are tracked under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetCategory {
    Housing,
    Utilities,
    Transportation,
    Groceries,
    DiningOut,
    Entertainment,
    Healthcare,
    PersonalCare,
    DebtPayment,
    Savings,
    Miscellaneous,
}

impl std::fmt::Display for BudgetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BudgetCategory::Housing => "HOUSING",
            BudgetCategory::Utilities => "UTILITIES",
            BudgetCategory::Transportation => "TRANSPORTATION",
            BudgetCategory::Groceries => "GROCERIES",
            BudgetCategory::DiningOut => "DINING_OUT",
            BudgetCategory::Entertainment => "ENTERTAINMENT",
            BudgetCategory::Healthcare => "HEALTHCARE",
            BudgetCategory::PersonalCare => "PERSONAL_CARE",
            BudgetCategory::DebtPayment => "DEBT_PAYMENT",
            BudgetCategory::Savings => "SAVINGS",
            BudgetCategory::Miscellaneous => "MISCELLANEOUS",
        };
        f.write_str(label)
    }
}
