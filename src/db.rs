// Database setup - SQLite schema for the ledger
//
// Money and dates are stored as TEXT (exact decimal strings, ISO dates);
// UUIDs as their hyphenated TEXT form; timestamps as epoch milliseconds.

use crate::error::Result;
use log::{debug, info};
use rusqlite::Connection;
use std::path::Path;

/// Tables in dependency order; dropped in reverse
pub const TABLES: &[&str] = &[
    "icon",
    "category",
    "currency",
    "exchange_security",
    "account",
    "card",
    "contact",
    "transactions",
    "document",
    "document_content",
    "periodic_payment",
];

pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    // WAL only applies to file databases
    conn.pragma_update(None, "journal_mode", "WAL")?;
    setup_database(&conn)?;
    info!("Opened database {}", path.display());
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Reference data
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS icon (
            uuid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            bytes BLOB NOT NULL,
            created INTEGER NOT NULL,
            modified INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS category (
            uuid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            comment TEXT NOT NULL,
            type TEXT NOT NULL,
            icon_uuid TEXT REFERENCES icon(uuid),
            created INTEGER NOT NULL,
            modified INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS currency (
            uuid TEXT PRIMARY KEY,
            symbol TEXT NOT NULL,
            description TEXT NOT NULL,
            format_symbol TEXT NOT NULL,
            format_symbol_position INTEGER NOT NULL,
            show_format_symbol INTEGER NOT NULL,
            def INTEGER NOT NULL,
            rate TEXT NOT NULL,
            direction INTEGER NOT NULL,
            use_thousand_separator INTEGER NOT NULL,
            created INTEGER NOT NULL,
            modified INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS exchange_security (
            uuid TEXT PRIMARY KEY,
            sec_id TEXT NOT NULL,
            name TEXT NOT NULL,
            short_name TEXT NOT NULL,
            isin TEXT NOT NULL,
            reg_number TEXT NOT NULL,
            face_value TEXT NOT NULL,
            issue_date TEXT,
            mat_date TEXT,
            days_to_redemption INTEGER,
            sec_group TEXT NOT NULL,
            group_name TEXT NOT NULL,
            sec_type TEXT NOT NULL,
            type_name TEXT NOT NULL,
            market_value TEXT NOT NULL,
            coupon_value TEXT,
            coupon_percent TEXT,
            coupon_date TEXT,
            coupon_frequency INTEGER,
            accrued_interest TEXT,
            coupon_period INTEGER,
            created INTEGER NOT NULL,
            modified INTEGER NOT NULL
        );",
    )?;

    // ==========================================================================
    // Accounts, cards, contacts
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS account (
            uuid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            comment TEXT NOT NULL,
            account_number TEXT NOT NULL,
            opening_balance TEXT NOT NULL,
            account_limit TEXT NOT NULL,
            currency_rate TEXT NOT NULL,
            type TEXT NOT NULL,
            category_uuid TEXT NOT NULL REFERENCES category(uuid),
            currency_uuid TEXT REFERENCES currency(uuid),
            security_uuid TEXT REFERENCES exchange_security(uuid),
            enabled INTEGER NOT NULL,
            interest TEXT NOT NULL,
            closing_date TEXT,
            icon_uuid TEXT REFERENCES icon(uuid),
            card_type TEXT NOT NULL,
            card_number TEXT NOT NULL,
            total TEXT NOT NULL,
            total_waiting TEXT NOT NULL,
            created INTEGER NOT NULL,
            modified INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS card (
            uuid TEXT PRIMARY KEY,
            account_uuid TEXT NOT NULL REFERENCES account(uuid),
            card_type TEXT NOT NULL,
            number TEXT NOT NULL,
            expiration TEXT,
            comment TEXT NOT NULL,
            enabled INTEGER NOT NULL,
            created INTEGER NOT NULL,
            modified INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS contact (
            uuid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            phone TEXT NOT NULL,
            mobile TEXT NOT NULL,
            email TEXT NOT NULL,
            web TEXT NOT NULL,
            comment TEXT NOT NULL,
            street TEXT NOT NULL,
            city TEXT NOT NULL,
            country TEXT NOT NULL,
            zip TEXT NOT NULL,
            icon_uuid TEXT REFERENCES icon(uuid),
            created INTEGER NOT NULL,
            modified INTEGER NOT NULL
        );",
    )?;

    // ==========================================================================
    // Transactions, documents, periodic payments
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS transactions (
            uuid TEXT PRIMARY KEY,
            amount TEXT NOT NULL,
            credit_amount TEXT NOT NULL,
            transaction_date TEXT NOT NULL,
            type TEXT NOT NULL,
            comment TEXT NOT NULL,
            checked INTEGER NOT NULL,
            account_debited_uuid TEXT NOT NULL REFERENCES account(uuid),
            account_credited_uuid TEXT NOT NULL REFERENCES account(uuid),
            account_debited_type TEXT NOT NULL,
            account_credited_type TEXT NOT NULL,
            account_debited_category_uuid TEXT NOT NULL REFERENCES category(uuid),
            account_credited_category_uuid TEXT NOT NULL REFERENCES category(uuid),
            contact_uuid TEXT REFERENCES contact(uuid),
            invoice_number TEXT NOT NULL,
            parent_uuid TEXT REFERENCES transactions(uuid),
            detailed INTEGER NOT NULL,
            statement_date TEXT NOT NULL,
            card_uuid TEXT REFERENCES card(uuid),
            created INTEGER NOT NULL,
            modified INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS document (
            uuid TEXT PRIMARY KEY,
            owner_uuid TEXT NOT NULL,
            contact_uuid TEXT NOT NULL REFERENCES contact(uuid),
            type TEXT NOT NULL,
            file_name TEXT NOT NULL,
            date TEXT NOT NULL,
            size INTEGER NOT NULL,
            compressed INTEGER NOT NULL,
            mime_type TEXT NOT NULL,
            description TEXT NOT NULL,
            created INTEGER NOT NULL,
            modified INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS document_content (
            uuid TEXT PRIMARY KEY REFERENCES document(uuid) ON DELETE CASCADE,
            bytes BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS periodic_payment (
            uuid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            payment_type TEXT NOT NULL,
            recurrence_type TEXT NOT NULL,
            amount TEXT NOT NULL,
            day_of_month INTEGER NOT NULL,
            month INTEGER NOT NULL,
            account_debited_uuid TEXT NOT NULL REFERENCES account(uuid),
            account_credited_uuid TEXT NOT NULL REFERENCES account(uuid),
            contact_uuid TEXT NOT NULL REFERENCES contact(uuid),
            comment TEXT NOT NULL,
            created INTEGER NOT NULL,
            modified INTEGER NOT NULL
        );",
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_transactions_debited ON transactions(account_debited_uuid);
        CREATE INDEX IF NOT EXISTS idx_transactions_credited ON transactions(account_credited_uuid);
        CREATE INDEX IF NOT EXISTS idx_transactions_parent ON transactions(parent_uuid);
        CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);
        CREATE INDEX IF NOT EXISTS idx_card_account ON card(account_uuid);
        CREATE INDEX IF NOT EXISTS idx_account_category ON account(category_uuid);",
    )?;

    debug!("Schema ready");
    Ok(())
}

/// Drop every table; used before a full dump import
pub fn drop_tables(conn: &Connection) -> Result<()> {
    for table in TABLES.iter().rev() {
        conn.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
    }
    Ok(())
}

/// Row count per table
pub fn table_counts(conn: &Connection) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        counts.push((*table, count));
    }
    Ok(counts)
}
