// Bank statement parsers
// One parser per bank format; every parser produces the same Statement model

pub mod alfa;
pub mod raiffeisen;
pub mod sberbank;
pub mod yandex;

pub use alfa::AlfaCsvParser;
pub use raiffeisen::{RaiffeisenCsvParser, RaiffeisenOfxParser};
pub use sberbank::SberbankParser;
pub use yandex::YandexMoneyCsvParser;

use crate::cache::DataCache;
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Statement file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    AlfaBankCsv,
    SberbankHtml,
    RaiffeisenCsvOld,
    RaiffeisenCsvNew,
    RaiffeisenOfx,
    YandexMoneyCsv,
}

impl StatementType {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            StatementType::AlfaBankCsv => "Alfa-Bank CSV",
            StatementType::SberbankHtml => "Sberbank HTML",
            StatementType::RaiffeisenCsvOld => "Raiffeisen CSV (old)",
            StatementType::RaiffeisenCsvNew => "Raiffeisen CSV",
            StatementType::RaiffeisenOfx => "Raiffeisen OFX",
            StatementType::YandexMoneyCsv => "Yandex.Money CSV",
        }
    }

    /// Short code for logs
    pub fn code(&self) -> &str {
        match self {
            StatementType::AlfaBankCsv => "ALFA",
            StatementType::SberbankHtml => "SBER",
            StatementType::RaiffeisenCsvOld => "RBA-OLD",
            StatementType::RaiffeisenCsvNew => "RBA",
            StatementType::RaiffeisenOfx => "RBA-OFX",
            StatementType::YandexMoneyCsv => "YM",
        }
    }
}

/// One line of a bank statement
///
/// Amounts keep the bank's text after normalisation so the record can be
/// shown as-is; `amount_decimal()` gives the parsed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub actual: NaiveDate,
    pub execution: NaiveDate,
    pub description: String,
    pub counter_party: String,
    pub place: String,
    pub country: String,
    pub currency: String,
    pub currency_uuid: Option<Uuid>,
    pub amount: String,
    pub account_currency: String,
    pub account_currency_uuid: Option<Uuid>,
    pub account_amount: String,
}

impl StatementRecord {
    /// Record with execution date equal to the actual date and the account
    /// amount equal to the amount
    pub fn new(actual: NaiveDate, amount: &str) -> Self {
        let amount = normalise_amount(amount);
        StatementRecord {
            actual,
            execution: actual,
            description: String::new(),
            counter_party: String::new(),
            place: String::new(),
            country: String::new(),
            currency: String::new(),
            currency_uuid: None,
            account_amount: amount.clone(),
            amount,
            account_currency: String::new(),
            account_currency_uuid: None,
        }
    }

    pub fn with_execution(mut self, execution: NaiveDate) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_counter_party(mut self, counter_party: impl Into<String>) -> Self {
        self.counter_party = counter_party.into();
        self
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = place.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Sets the operation currency; the account currency follows unless set
    /// separately
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        if self.account_currency.is_empty() {
            self.account_currency = self.currency.clone();
        }
        self
    }

    pub fn with_account_amount(mut self, currency: impl Into<String>, amount: &str) -> Self {
        self.account_currency = currency.into();
        self.account_amount = normalise_amount(amount);
        self
    }

    pub fn amount_decimal(&self) -> Option<Decimal> {
        parse_amount(&self.amount)
    }

    pub fn account_amount_decimal(&self) -> Option<Decimal> {
        parse_amount(&self.account_amount)
    }

    /// Stable hash of the bank-provided fields
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.actual,
            self.execution,
            self.description,
            self.counter_party,
            self.currency,
            self.amount,
            self.account_amount
        ));
        format!("{:x}", hasher.finalize())
    }
}

/// Parsed statement file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub statement_type: StatementType,
    pub account_number: String,
    pub records: Vec<StatementRecord>,
    /// Closing balance when the format reports one
    pub balance: Option<Decimal>,
}

impl Statement {
    pub fn new(statement_type: StatementType, account_number: impl Into<String>, records: Vec<StatementRecord>) -> Self {
        Statement {
            statement_type,
            account_number: account_number.into(),
            records,
            balance: None,
        }
    }

    pub fn with_balance(mut self, balance: Option<Decimal>) -> Self {
        self.balance = balance;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Fills currency uuids by symbol or description
    pub fn resolve_currencies(&mut self, cache: &DataCache) {
        for record in &mut self.records {
            record.currency_uuid = cache.currency_by_name(&record.currency).map(|c| c.uuid);
            record.account_currency_uuid = cache.currency_by_name(&record.account_currency).map(|c| c.uuid);
        }
    }

    /// Newest operations first
    pub fn sort_by_actual_desc(&mut self) {
        self.records.sort_by(|a, b| b.actual.cmp(&a.actual));
    }

    /// Appends records of an overlapping statement, skipping duplicates.
    /// Returns the number of records added.
    pub fn merge(&mut self, other: Statement) -> usize {
        let mut seen: HashSet<String> = self.records.iter().map(StatementRecord::fingerprint).collect();
        let mut added = 0;
        for record in other.records {
            if seen.insert(record.fingerprint()) {
                self.records.push(record);
                added += 1;
            }
        }
        if self.account_number.is_empty() {
            self.account_number = other.account_number;
        }
        if other.balance.is_some() {
            self.balance = other.balance;
        }
        debug!("Merged {} new statement records", added);
        added
    }
}

/// Raw bytes of a statement file plus its name
#[derive(Debug, Clone)]
pub struct RawStatementData {
    file_name: String,
    bytes: Vec<u8>,
}

impl RawStatementData {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        RawStatementData {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("statement")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase file extension, empty when there is none
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default()
    }

    /// Content as UTF-8 with the byte order mark removed
    pub fn utf8_text(&self) -> String {
        let bytes = self.bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&self.bytes);
        String::from_utf8_lossy(bytes).into_owned()
    }

    /// Content decoded from Windows-1251
    pub fn cp1251_text(&self) -> String {
        let (text, _, _) = encoding_rs::WINDOWS_1251.decode(&self.bytes);
        text.into_owned()
    }
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// Bank-specific statement parser
///
/// Adding a format means implementing this trait and registering the
/// parser in `all_parsers` and `get_parser`.
pub trait StatementParser: Send + Sync {
    /// Statement type if this parser recognises the file
    fn detect(&self, data: &RawStatementData) -> Option<StatementType>;

    /// Parse a file previously recognised as `statement_type`
    fn parse(&self, data: &RawStatementData, statement_type: StatementType) -> Result<Statement>;

    /// Parser version (for logs)
    fn version(&self) -> &str {
        "1.0.0"
    }
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Parsers in detection order
pub fn all_parsers() -> Vec<Box<dyn StatementParser>> {
    vec![
        Box::new(RaiffeisenOfxParser::new()),
        Box::new(SberbankParser::new()),
        Box::new(RaiffeisenCsvParser::new()),
        Box::new(AlfaCsvParser::new()),
        Box::new(YandexMoneyCsvParser::new()),
    ]
}

/// Parser for a statement type
pub fn get_parser(statement_type: StatementType) -> Box<dyn StatementParser> {
    match statement_type {
        StatementType::AlfaBankCsv => Box::new(AlfaCsvParser::new()),
        StatementType::SberbankHtml => Box::new(SberbankParser::new()),
        StatementType::RaiffeisenCsvOld | StatementType::RaiffeisenCsvNew => Box::new(RaiffeisenCsvParser::new()),
        StatementType::RaiffeisenOfx => Box::new(RaiffeisenOfxParser::new()),
        StatementType::YandexMoneyCsv => Box::new(YandexMoneyCsvParser::new()),
    }
}

/// Detect the statement type from file content
pub fn detect_statement(data: &RawStatementData) -> Result<StatementType> {
    all_parsers()
        .iter()
        .find_map(|parser| parser.detect(data))
        .ok_or_else(|| MoneyError::statement(format!("unsupported statement format: {}", data.file_name())))
}

/// Detect and parse in one step
pub fn parse_statement(data: &RawStatementData) -> Result<Statement> {
    let statement_type = detect_statement(data)?;
    let parser = get_parser(statement_type);
    let statement = parser.parse(data, statement_type)?;
    info!(
        "Parsed {} statement {} (parser {}): {} records",
        statement_type.code(),
        data.file_name(),
        parser.version(),
        statement.len()
    );
    Ok(statement)
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// `,` becomes `.`; spaces and non-breaking spaces are dropped
pub fn normalise_amount(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != ' ' && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

/// Normalised amount rounded half-up to two decimals
pub fn parse_amount(value: &str) -> Option<Decimal> {
    let normalised = normalise_amount(value);
    Decimal::from_str(&normalised)
        .ok()
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Like `parse_amount` but a failure is a malformed statement
pub(crate) fn require_amount(value: &str) -> Result<Decimal> {
    parse_amount(value).ok_or_else(|| MoneyError::statement(format!("invalid amount '{}'", value)))
}

/// Date in the given chrono format; trailing time fields are ignored
pub(crate) fn parse_date(value: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), format)
        .map_err(|e| MoneyError::statement(format!("invalid date '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Currency;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_statement_type_names() {
        assert_eq!(StatementType::SberbankHtml.name(), "Sberbank HTML");
        assert_eq!(StatementType::RaiffeisenOfx.code(), "RBA-OFX");
    }

    #[test]
    fn test_normalise_amount() {
        assert_eq!(normalise_amount("-7 000,00"), "-7000.00");
        assert_eq!(normalise_amount("1\u{a0}234.56"), "1234.56");
        assert_eq!(parse_amount("4 563,33"), Some(dec!(4563.33)));
        assert_eq!(parse_amount("10.005"), Some(dec!(10.01)));
        assert_eq!(parse_amount("-10.005"), Some(dec!(-10.01)));
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_record_defaults() {
        let record = StatementRecord::new(date(2024, 4, 29), "-7 000,00").with_currency("RUB");
        assert_eq!(record.execution, record.actual);
        assert_eq!(record.account_amount, "-7000.00");
        assert_eq!(record.account_currency, "RUB");
        assert_eq!(record.account_amount_decimal(), Some(dec!(-7000)));
    }

    #[test]
    fn test_fingerprint_ignores_resolved_uuids() {
        let a = StatementRecord::new(date(2024, 1, 2), "5.00").with_description("Coffee");
        let mut b = a.clone();
        b.currency_uuid = Some(Uuid::new_v4());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), a.clone().with_description("Tea").fingerprint());
    }

    #[test]
    fn test_merge_skips_duplicates() {
        let first = StatementRecord::new(date(2024, 1, 1), "1.00");
        let second = StatementRecord::new(date(2024, 1, 2), "2.00");
        let mut statement = Statement::new(StatementType::RaiffeisenCsvNew, "", vec![first.clone()]);
        let other = Statement::new(StatementType::RaiffeisenCsvNew, "40817", vec![first, second])
            .with_balance(Some(dec!(3)));

        assert_eq!(statement.merge(other), 1);
        assert_eq!(statement.len(), 2);
        assert_eq!(statement.account_number, "40817");
        assert_eq!(statement.balance, Some(dec!(3)));

        statement.sort_by_actual_desc();
        assert_eq!(statement.records[0].actual, date(2024, 1, 2));
    }

    #[test]
    fn test_resolve_currencies() {
        let mut cache = DataCache::new();
        let rub = Currency::new("RUB", "Russian Ruble");
        cache.put(rub.clone());

        let mut statement = Statement::new(
            StatementType::AlfaBankCsv,
            "",
            vec![StatementRecord::new(date(2024, 1, 1), "1").with_currency("rub")],
        );
        statement.resolve_currencies(&cache);
        assert_eq!(statement.records[0].currency_uuid, Some(rub.uuid));
        assert_eq!(statement.records[0].account_currency_uuid, Some(rub.uuid));
    }

    #[test]
    fn test_raw_data_strips_bom() {
        let data = RawStatementData::new("Statement.CSV", b"\xEF\xBB\xBFabc".to_vec());
        assert_eq!(data.utf8_text(), "abc");
        assert_eq!(data.extension(), "csv");
    }

    #[test]
    fn test_detect_unknown_format() {
        let data = RawStatementData::new("notes.txt", b"hello world".to_vec());
        assert!(matches!(detect_statement(&data), Err(MoneyError::Statement(_))));
    }

    #[test]
    fn test_get_parser_handles_every_type() {
        for statement_type in [
            StatementType::AlfaBankCsv,
            StatementType::SberbankHtml,
            StatementType::RaiffeisenCsvOld,
            StatementType::RaiffeisenCsvNew,
            StatementType::RaiffeisenOfx,
            StatementType::YandexMoneyCsv,
        ] {
            assert_eq!(get_parser(statement_type).version(), "1.0.0");
        }
    }
}
