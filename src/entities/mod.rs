// Ledger entities
//
// Every record carries a client-generated UUID plus created/modified
// timestamps in epoch milliseconds. Records are replaced whole on update.

pub mod types;
pub mod icon;
pub mod category;
pub mod currency;
pub mod security;
pub mod account;
pub mod card;
pub mod contact;
pub mod transaction;
pub mod document;
pub mod periodic_payment;

pub use types::{
    CardType, CategoryType, ContactType, DocumentType, PeriodicPaymentType, RecurrenceType,
    TransactionType,
};
pub use icon::Icon;
pub use category::Category;
pub use currency::Currency;
pub use security::ExchangeSecurity;
pub use account::{Account, AccountBuilder};
pub use card::Card;
pub use contact::Contact;
pub use transaction::{Transaction, TransactionBuilder};
pub use document::MoneyDocument;
pub use periodic_payment::PeriodicPayment;

use crate::error::{MoneyError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Behaviour common to every persisted entity
pub trait MoneyRecord: Clone + std::fmt::Debug {
    /// Entity name used in logs and errors
    const ENTITY: &'static str;

    fn uuid(&self) -> Uuid;
    fn created(&self) -> i64;
    fn modified(&self) -> i64;

    /// Check required fields before the record is stored
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Zero means "not set yet"
pub(crate) fn timestamp_or_now(value: i64) -> i64 {
    if value == 0 {
        now_millis()
    } else {
        value
    }
}

pub(crate) fn decimal_one() -> Decimal {
    Decimal::ONE
}

pub(crate) fn require_name(entity: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(MoneyError::validation(format!("{} name must not be blank", entity)));
    }
    Ok(())
}

pub(crate) fn require_uuid(entity: &str, uuid: Uuid) -> Result<()> {
    if uuid.is_nil() {
        return Err(MoneyError::validation(format!("{} uuid must be set", entity)));
    }
    Ok(())
}
