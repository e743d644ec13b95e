// Error types shared by the library modules.
// Binaries wrap these in anyhow with extra context.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MoneyError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml error: {0}")]
    Xml(String),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed statement: {0}")]
    Statement(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} {uuid} not found")]
    NotFound { entity: &'static str, uuid: Uuid },

    #[error("config error: {0}")]
    Config(String),
}

impl MoneyError {
    pub fn validation(message: impl Into<String>) -> Self {
        MoneyError::Validation(message.into())
    }

    pub fn statement(message: impl Into<String>) -> Self {
        MoneyError::Statement(message.into())
    }

    pub fn xml(message: impl Into<String>) -> Self {
        MoneyError::Xml(message.into())
    }

    pub fn not_found(entity: &'static str, uuid: Uuid) -> Self {
        MoneyError::NotFound { entity, uuid }
    }

    /// True for errors caused by bad input rather than a broken store
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MoneyError::Validation(_) | MoneyError::Statement(_) | MoneyError::Xml(_) | MoneyError::Csv(_)
        )
    }
}

impl From<quick_xml::Error> for MoneyError {
    fn from(err: quick_xml::Error) -> Self {
        MoneyError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for MoneyError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        MoneyError::Xml(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MoneyError>;
