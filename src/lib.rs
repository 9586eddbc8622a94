#![doc(test(attr(deny(warnings))))]

//! Ledger Core keeps account balances, budgets, and recurring-expense
//! schedules mutually consistent as financial events are recorded.
//!
//! Balances are strictly derived from transaction history, budget spending is
//! recomputed from the transaction store at read time, and recurring
//! generation is idempotent per (template, scheduled date). Everything runs
//! against the [`storage::LedgerStore`] persistence trait; a thin API layer
//! calls the services in [`core::services`] directly.

pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

use std::sync::Once;

pub use errors::{ErrorKind, LedgerError, Result};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Ledger Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
