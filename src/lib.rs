pub mod amortization;
pub mod categorizer;
pub mod db;
pub mod error;
pub mod fmt;
pub mod importer;
pub mod ledger;
pub mod models;
pub mod periods;
pub mod recurrence;
pub mod scheduler;
pub mod settings;
pub mod transactions;
pub mod upcoming;
