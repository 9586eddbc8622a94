mod account_service_tests;
mod recurring_service_tests;
