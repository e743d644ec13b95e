use super::{decimal_one, require_uuid, timestamp_or_now, MoneyRecord};
use crate::error::{MoneyError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Currency with display format and exchange rate against the default one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub uuid: Uuid,
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub format_symbol: String,
    #[serde(default)]
    pub format_symbol_position: i32,
    #[serde(default)]
    pub show_format_symbol: bool,
    /// Default currency of the ledger
    #[serde(default)]
    pub def: bool,
    #[serde(default = "decimal_one")]
    pub rate: Decimal,
    #[serde(default)]
    pub direction: i32,
    #[serde(default)]
    pub use_thousand_separator: bool,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub modified: i64,
}

impl Currency {
    pub fn new(symbol: impl Into<String>, description: impl Into<String>) -> Self {
        let now = super::now_millis();
        Currency {
            uuid: Uuid::new_v4(),
            symbol: symbol.into(),
            description: description.into(),
            format_symbol: String::new(),
            format_symbol_position: 0,
            show_format_symbol: false,
            def: false,
            rate: Decimal::ONE,
            direction: 0,
            use_thousand_separator: false,
            created: now,
            modified: now,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_default(mut self, def: bool) -> Self {
        self.def = def;
        self
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_format(mut self, format_symbol: impl Into<String>, position: i32, show: bool) -> Self {
        self.format_symbol = format_symbol.into();
        self.format_symbol_position = position;
        self.show_format_symbol = show;
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.created = timestamp_or_now(self.created);
        self.modified = timestamp_or_now(self.modified);
        self
    }

    /// Case-insensitive match on symbol or description
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.trim();
        !name.is_empty()
            && (self.symbol.eq_ignore_ascii_case(name)
                || self.description.to_lowercase() == name.to_lowercase())
    }
}

impl MoneyRecord for Currency {
    const ENTITY: &'static str = "currency";

    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn created(&self) -> i64 {
        self.created
    }

    fn modified(&self) -> i64 {
        self.modified
    }

    fn validate(&self) -> Result<()> {
        require_uuid(Self::ENTITY, self.uuid)?;
        if self.symbol.trim().is_empty() {
            return Err(MoneyError::validation("currency symbol must not be blank"));
        }
        Ok(())
    }
}
