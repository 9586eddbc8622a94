use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::services::{
    AccountService, AccountUpdate, RecurringService, RecurringUpdate, TransactionService,
};
use crate::domain::{AccountType, BudgetCategory, Frequency};
use crate::errors::LedgerError;
use crate::storage::{LedgerStore, MemoryStore, TransactionFilter};

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn funded_account(store: &MemoryStore, name: &str, cents: i64) -> Uuid {
    AccountService::new(store)
        .create(name, AccountType::Checking, money(cents), None)
        .unwrap()
        .id
}

#[test]
fn create_requires_an_active_existing_source_account() {
    let store = MemoryStore::new();
    let recurring = RecurringService::new(&store);

    let err = recurring
        .create(
            Frequency::Monthly,
            date(2024, 1, 31),
            money(15_99),
            BudgetCategory::Entertainment,
            "Streaming",
            Uuid::new_v4(),
        )
        .expect_err("unknown account must fail");
    assert!(matches!(err, LedgerError::AccountNotFound(_)));

    let account = funded_account(&store, "Checking", 100_00);
    AccountService::new(&store)
        .update(
            account,
            AccountUpdate {
                active: Some(false),
                ..AccountUpdate::default()
            },
        )
        .unwrap();
    let err = recurring
        .create(
            Frequency::Monthly,
            date(2024, 1, 31),
            money(15_99),
            BudgetCategory::Entertainment,
            "Streaming",
            account,
        )
        .expect_err("inactive account must fail");
    assert!(matches!(err, LedgerError::InactiveAccount(_)));
}

#[test]
fn generate_records_expense_and_advances_schedule() {
    let store = MemoryStore::new();
    let account = funded_account(&store, "Checking", 1_000_00);
    let recurring = RecurringService::new(&store);

    let template = recurring
        .create(
            Frequency::Monthly,
            date(2024, 1, 31),
            money(15_99),
            BudgetCategory::Entertainment,
            "Streaming",
            account,
        )
        .unwrap();

    let txn = recurring.generate(template.id).unwrap().expect("generates");
    assert_eq!(txn.date, date(2024, 1, 31));
    assert_eq!(txn.template_id, Some(template.id));
    assert!(txn.recurring);

    let advanced = recurring.get(template.id).unwrap();
    // Jan 31 + 1 month clamps to leap-year Feb 29.
    assert_eq!(advanced.next_scheduled_date, Some(date(2024, 2, 29)));
    assert_eq!(advanced.last_generated_date, Some(date(2024, 1, 31)));

    assert_eq!(
        store.account(account).unwrap().unwrap().current_balance,
        money(984_01)
    );
}

#[test]
fn generate_is_idempotent_per_scheduled_date() {
    let store = MemoryStore::new();
    let account = funded_account(&store, "Checking", 1_000_00);
    let recurring = RecurringService::new(&store);

    let template = recurring
        .create(
            Frequency::Monthly,
            date(2024, 1, 31),
            money(15_99),
            BudgetCategory::Entertainment,
            "Streaming",
            account,
        )
        .unwrap();

    recurring.generate(template.id).unwrap().expect("first generates");

    // Simulate a retry that reloaded stale state: rewind the schedule to the
    // already-generated date. The existence check must swallow it.
    let mut stale = recurring.get(template.id).unwrap();
    stale.next_scheduled_date = Some(date(2024, 1, 31));
    store.save_template(&stale).unwrap();

    assert!(recurring.generate(template.id).unwrap().is_none());
    assert_eq!(
        store.transactions(&TransactionFilter::default()).unwrap().len(),
        1,
        "exactly one transaction for the occurrence"
    );
    assert_eq!(
        store.account(account).unwrap().unwrap().current_balance,
        money(984_01),
        "balance debited exactly once"
    );
}

#[test]
fn generate_rejects_inactive_template() {
    let store = MemoryStore::new();
    let account = funded_account(&store, "Checking", 100_00);
    let recurring = RecurringService::new(&store);
    let template = recurring
        .create(
            Frequency::Weekly,
            date(2024, 1, 7),
            money(10_00),
            BudgetCategory::Groceries,
            "Veg box",
            account,
        )
        .unwrap();

    assert!(recurring.deactivate(template.id).unwrap());
    let err = recurring.generate(template.id).expect_err("must fail");
    assert!(matches!(err, LedgerError::State(_)));
}

#[test]
fn activate_requires_schedule_and_deactivate_preserves_it() {
    let store = MemoryStore::new();
    let account = funded_account(&store, "Checking", 100_00);
    let recurring = RecurringService::new(&store);
    let template = recurring
        .create(
            Frequency::Quarterly,
            date(2024, 3, 1),
            money(60_00),
            BudgetCategory::Healthcare,
            "Dental plan",
            account,
        )
        .unwrap();

    assert!(!recurring.activate(template.id).unwrap(), "already active");
    assert!(recurring.deactivate(template.id).unwrap());
    assert!(!recurring.deactivate(template.id).unwrap(), "already inactive");

    let paused = recurring.get(template.id).unwrap();
    assert_eq!(paused.next_scheduled_date, Some(date(2024, 3, 1)));

    assert!(recurring.activate(template.id).unwrap());

    let mut unscheduled = recurring.get(template.id).unwrap();
    unscheduled.active = false;
    unscheduled.next_scheduled_date = None;
    store.save_template(&unscheduled).unwrap();
    let err = recurring.activate(template.id).expect_err("must fail");
    assert!(matches!(err, LedgerError::State(_)));
}

#[test]
fn process_due_isolates_per_template_failures() {
    let store = MemoryStore::new();
    let healthy_account = funded_account(&store, "Checking", 1_000_00);
    let poor_account = funded_account(&store, "Empty", 0);
    let recurring = RecurringService::new(&store);

    let healthy = recurring
        .create(
            Frequency::Monthly,
            date(2024, 1, 10),
            money(15_99),
            BudgetCategory::Entertainment,
            "Streaming",
            healthy_account,
        )
        .unwrap();
    // This one will fail on insufficient funds when it materializes.
    recurring
        .create(
            Frequency::Monthly,
            date(2024, 1, 5),
            money(500_00),
            BudgetCategory::Housing,
            "Rent share",
            poor_account,
        )
        .unwrap();
    // Not yet due; must not be touched.
    recurring
        .create(
            Frequency::Monthly,
            date(2024, 3, 1),
            money(9_99),
            BudgetCategory::PersonalCare,
            "Gym",
            healthy_account,
        )
        .unwrap();

    let report = recurring.process_due(date(2024, 1, 31)).unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.total(), 2);

    // The healthy template advanced; the failing one kept its date for retry.
    assert_eq!(
        recurring.get(healthy.id).unwrap().next_scheduled_date,
        Some(date(2024, 2, 10))
    );
    assert_eq!(
        store.transactions(&TransactionFilter::default()).unwrap().len(),
        1
    );
}

#[test]
fn delete_preserves_generated_transactions() {
    let store = MemoryStore::new();
    let account = funded_account(&store, "Checking", 1_000_00);
    let recurring = RecurringService::new(&store);
    let template = recurring
        .create(
            Frequency::Monthly,
            date(2024, 1, 31),
            money(15_99),
            BudgetCategory::Entertainment,
            "Streaming",
            account,
        )
        .unwrap();

    let txn = recurring.generate(template.id).unwrap().expect("generates");
    recurring.delete(template.id).unwrap();

    assert!(matches!(
        recurring.get(template.id),
        Err(LedgerError::TemplateNotFound(_))
    ));
    let orphan = TransactionService::new(&store).get(txn.id).unwrap();
    assert_eq!(orphan.template_id, Some(template.id), "reference dangles");
}

#[test]
fn update_validates_amount_and_description() {
    let store = MemoryStore::new();
    let account = funded_account(&store, "Checking", 100_00);
    let recurring = RecurringService::new(&store);
    let template = recurring
        .create(
            Frequency::Daily,
            date(2024, 1, 1),
            money(3_50),
            BudgetCategory::DiningOut,
            "Coffee",
            account,
        )
        .unwrap();

    let err = recurring
        .update(
            template.id,
            RecurringUpdate {
                amount: Some(Decimal::ZERO),
                ..RecurringUpdate::default()
            },
        )
        .expect_err("zero amount must fail");
    assert!(matches!(err, LedgerError::Validation(_)));

    let updated = recurring
        .update(
            template.id,
            RecurringUpdate {
                frequency: Some(Frequency::Weekly),
                amount: Some(money(4_00)),
                description: Some("Fancier coffee".into()),
                ..RecurringUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.frequency, Frequency::Weekly);
    assert_eq!(updated.amount, money(4_00));
}
