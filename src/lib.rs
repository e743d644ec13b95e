// Money Manager - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod entities;
pub mod ledger;         // Balance folds over transactions
pub mod filters;        // Transaction filters and periods
pub mod cache;          // In-memory copy of every entity
pub mod db;             // SQLite schema
pub mod repository;     // Per-entity SQL
pub mod dao;            // Transactional writer: database + cache + balances
pub mod statements;     // Bank statement parsers
pub mod reconciliation; // Statement vs ledger matching
pub mod xml;            // XML / zip interchange
pub mod config;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::{MoneyError, Result};
pub use entities::{
    Account, AccountBuilder, Card, CardType, Category, CategoryType, Contact, ContactType, Currency,
    DocumentType, ExchangeSecurity, Icon, MoneyDocument, MoneyRecord, PeriodicPayment, PeriodicPaymentType,
    RecurrenceType, Transaction, TransactionBuilder, TransactionType,
};
pub use filters::{Period, TransactionFilter};
pub use cache::DataCache;
pub use dao::{MoneyDao, MoneyDump};
pub use statements::{
    detect_statement, get_parser, parse_statement, RawStatementData, Statement, StatementParser,
    StatementRecord, StatementType,
};
pub use reconciliation::{
    reconcile_statement, resolve_account, Discrepancy, DiscrepancyCategory, ReconciliationEngine,
    ReconciliationReport, ReconciliationResult, StatementMatcher,
};
pub use config::{CliArgs, Config};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
