use rust_decimal::Decimal;

use crate::core::services::{AccountClosure, AccountService, AccountUpdate, TransactionService};
use crate::core::services::transaction_service::RecordIncome;
use crate::domain::AccountType;
use crate::errors::LedgerError;
use crate::storage::{AccountFilter, MemoryStore};

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn create_rejects_blank_and_duplicate_names() {
    let store = MemoryStore::new();
    let accounts = AccountService::new(&store);

    let err = accounts
        .create("  ", AccountType::Checking, money(0), None)
        .expect_err("blank name must fail");
    assert!(matches!(err, LedgerError::Validation(_)));

    accounts
        .create("Checking", AccountType::Checking, money(100_00), None)
        .expect("first create succeeds");
    let err = accounts
        .create("checking", AccountType::Savings, money(0), None)
        .expect_err("duplicate must fail");
    assert!(matches!(err, LedgerError::Validation(ref message) if message.contains("already exists")));
}

#[test]
fn negative_starting_balance_is_credit_card_only() {
    let store = MemoryStore::new();
    let accounts = AccountService::new(&store);

    let err = accounts
        .create("Checking", AccountType::Checking, money(-50_00), None)
        .expect_err("negative start must fail for checking");
    assert!(matches!(err, LedgerError::Validation(_)));

    let card = accounts
        .create("Visa", AccountType::CreditCard, money(-250_00), None)
        .expect("credit card may start in debt");
    assert_eq!(card.current_balance, money(-250_00));
}

#[test]
fn close_hard_deletes_without_history_and_soft_deletes_with() {
    let store = MemoryStore::new();
    let accounts = AccountService::new(&store);
    let transactions = TransactionService::new(&store);

    let untouched = accounts
        .create("Untouched", AccountType::Cash, money(10_00), None)
        .unwrap();
    assert_eq!(accounts.close(untouched.id).unwrap(), AccountClosure::Removed);
    assert!(matches!(
        accounts.get(untouched.id),
        Err(LedgerError::AccountNotFound(_))
    ));

    let used = accounts
        .create("Used", AccountType::Checking, money(10_00), None)
        .unwrap();
    transactions
        .record_income(RecordIncome {
            destination_account: used.id,
            amount: money(5_00),
            date: date(2024, 1, 5),
            description: "gift".into(),
        })
        .unwrap();
    assert_eq!(accounts.close(used.id).unwrap(), AccountClosure::Deactivated);
    assert!(!accounts.get(used.id).unwrap().active);
    assert_eq!(accounts.close(used.id).unwrap(), AccountClosure::AlreadyClosed);
}

#[test]
fn reactivation_is_rejected_only_with_history() {
    let store = MemoryStore::new();
    let accounts = AccountService::new(&store);
    let transactions = TransactionService::new(&store);

    let account = accounts
        .create("Checking", AccountType::Checking, money(100_00), None)
        .unwrap();
    transactions
        .record_income(RecordIncome {
            destination_account: account.id,
            amount: money(5_00),
            date: date(2024, 1, 5),
            description: "gift".into(),
        })
        .unwrap();
    accounts.close(account.id).unwrap();

    let err = accounts
        .update(
            account.id,
            AccountUpdate {
                active: Some(true),
                ..AccountUpdate::default()
            },
        )
        .expect_err("reactivation with history must fail");
    assert!(matches!(err, LedgerError::Validation(_)));

    let fresh = accounts
        .create("Fresh", AccountType::Savings, money(0), None)
        .unwrap();
    let deactivated = accounts
        .update(
            fresh.id,
            AccountUpdate {
                active: Some(false),
                ..AccountUpdate::default()
            },
        )
        .unwrap();
    assert!(!deactivated.active);
    let reactivated = accounts
        .update(
            fresh.id,
            AccountUpdate {
                active: Some(true),
                ..AccountUpdate::default()
            },
        )
        .expect("reactivation without history is allowed");
    assert!(reactivated.active);
}

#[test]
fn balance_aggregates_cover_active_accounts_only() {
    let store = MemoryStore::new();
    let accounts = AccountService::new(&store);

    accounts
        .create("Checking", AccountType::Checking, money(400_00), None)
        .unwrap();
    accounts
        .create("Savings", AccountType::Savings, money(1_000_00), None)
        .unwrap();
    let closed = accounts
        .create("Closed", AccountType::Checking, money(50_00), None)
        .unwrap();
    accounts
        .update(
            closed.id,
            AccountUpdate {
                active: Some(false),
                ..AccountUpdate::default()
            },
        )
        .unwrap();

    assert_eq!(accounts.total_balance().unwrap(), money(1_400_00));
    assert_eq!(accounts.net_change(closed.id).unwrap(), money(0));
    assert_eq!(
        accounts.total_balance_by_type(AccountType::Savings).unwrap(),
        money(1_000_00)
    );
    assert_eq!(accounts.sum_balances_below(money(500_00)).unwrap(), money(400_00));
    assert!(accounts.sum_balances_below(money(-1_00)).is_err());
}

#[test]
fn list_applies_balance_and_name_filters() {
    let store = MemoryStore::new();
    let accounts = AccountService::new(&store);
    accounts
        .create("Main Checking", AccountType::Checking, money(400_00), None)
        .unwrap();
    accounts
        .create("Emergency Savings", AccountType::Savings, money(1_000_00), None)
        .unwrap();

    let filter = AccountFilter {
        min_balance: Some(money(500_00)),
        ..AccountFilter::default()
    };
    let rich = accounts.list(&filter).unwrap();
    assert_eq!(rich.len(), 1);
    assert_eq!(rich[0].name, "Emergency Savings");

    let filter = AccountFilter {
        name_contains: Some("Checking".into()),
        ..AccountFilter::default()
    };
    assert_eq!(accounts.list(&filter).unwrap().len(), 1);
}
