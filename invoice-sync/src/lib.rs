//! Recurring subscription invoice synchronization.
//!
//! One run fetches eligible subscription records from the tabular store,
//! decides which billing cycles are due, groups due cycles by client and
//! target month into draft invoices on the billing platform, and writes
//! the advanced counters back to the store.
pub mod billing;
pub mod clients;
pub mod config;
pub mod models;
pub mod runner;
