// Alfa-Bank account statement, CSV export
//
// Windows-1251, `;`-separated, one header row with nine fields:
//   0 account type, 1 account number, 2 currency, 3 date (dd.MM.yy),
//   4 reference, 5 description, 6 credit, 7 debit, 8 (empty)
// Card debits carry the real dates inside the description:
//   "<text> <execution dd.MM.yy> <actual dd.MM.yy> <card>"

use super::{parse_date, require_amount, RawStatementData, Statement, StatementParser, StatementRecord, StatementType};
use crate::error::{MoneyError, Result};
use csv::{Reader, ReaderBuilder, StringRecord};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

const FIELD_COUNT: usize = 9;
const DATE_FORMAT: &str = "%d.%m.%y";

static DESCRIPTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*)(\d{2}\.\d{2}\.\d{2})\s(\d{2}\.\d{2}\.\d{2}).*$").unwrap());

pub struct AlfaCsvParser;

impl AlfaCsvParser {
    pub fn new() -> Self {
        AlfaCsvParser
    }

    fn csv_reader(text: &str) -> Reader<&[u8]> {
        ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes())
    }

    fn read_rows(data: &RawStatementData) -> Result<Vec<StringRecord>> {
        let text = data.cp1251_text();
        let mut reader = Self::csv_reader(&text);
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn parse_row(row: &StringRecord) -> Result<StatementRecord> {
        let field = |i: usize| row.get(i).unwrap_or("").trim();

        let currency = field(2);
        let mut actual = parse_date(field(3), DATE_FORMAT)?;
        let mut execution = actual;
        let mut description = field(5).to_string();
        let credit = amount_or_zero(field(6))?;
        let debit = amount_or_zero(field(7))?;

        let sum = if debit.is_zero() {
            credit
        } else {
            if let Some(caps) = DESCRIPTION_PATTERN.captures(&description) {
                execution = parse_date(&caps[2], DATE_FORMAT)?;
                actual = parse_date(&caps[3], DATE_FORMAT)?;
                description = caps[1].trim().to_string();
            }
            -debit
        };

        Ok(StatementRecord::new(actual, &sum.to_string())
            .with_execution(execution)
            .with_description(description)
            .with_currency(currency))
    }
}

impl Default for AlfaCsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for AlfaCsvParser {
    fn detect(&self, data: &RawStatementData) -> Option<StatementType> {
        let text = data.cp1251_text();
        let mut reader = Self::csv_reader(&text);
        let header = reader.records().next()?.ok()?;
        let field = |i: usize| header.get(i).unwrap_or("").trim();
        if header.len() == FIELD_COUNT && field(1) == "Номер счета" && field(6) == "Приход" {
            Some(StatementType::AlfaBankCsv)
        } else {
            None
        }
    }

    fn parse(&self, data: &RawStatementData, _statement_type: StatementType) -> Result<Statement> {
        let rows = Self::read_rows(data)?;
        if rows.len() < 2 {
            warn!("Transactions not found in statement {}", data.file_name());
            return Ok(Statement::new(StatementType::AlfaBankCsv, "", Vec::new()));
        }
        if rows[0].len() != FIELD_COUNT {
            return Err(MoneyError::statement(format!(
                "expected {} header fields, found {}",
                FIELD_COUNT,
                rows[0].len()
            )));
        }

        let mut account_number = String::new();
        let mut records = Vec::new();
        for row in rows.iter().skip(1) {
            if row.get(4).map_or(false, |r| r.trim().eq_ignore_ascii_case("HOLD")) {
                continue;
            }
            if account_number.is_empty() {
                account_number = row.get(1).unwrap_or("").trim().to_string();
            }
            records.push(Self::parse_row(row)?);
        }

        Ok(Statement::new(StatementType::AlfaBankCsv, account_number, records))
    }
}

fn amount_or_zero(value: &str) -> Result<Decimal> {
    if value.is_empty() {
        Ok(Decimal::ZERO)
    } else {
        require_amount(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "Тип счёта;Номер счета;Валюта;Дата операции;Референс проводки;Описание операции;Приход;Расход;\n\
Текущий счёт;40817810000000000001;RUR;05.03.19;CRD_1;Перевод с карты;1000,00;0;\n\
Текущий счёт;40817810000000000001;RUR;06.03.19;CRD_2;MAGAZIN 02.03.19 01.03.19 Card ****1234;0;250,50;\n\
Текущий счёт;40817810000000000001;RUR;07.03.19;HOLD;Ожидание;0;99;\n";

    fn cp1251(text: &str) -> RawStatementData {
        let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(text);
        RawStatementData::new("alfa.csv", bytes.into_owned())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_detect() {
        let parser = AlfaCsvParser::new();
        assert_eq!(parser.detect(&cp1251(SAMPLE)), Some(StatementType::AlfaBankCsv));
        assert_eq!(parser.detect(&cp1251("a;b;c\n")), None);
    }

    #[test]
    fn test_detect_quoted_header() {
        let quoted = "\"Тип счёта\";\"Номер счета\";\"Валюта\";\"Дата операции\";\"Референс проводки\";\
\"Описание операции\";\"Приход\";\"Расход\";\n\
\"Текущий счёт\";\"40817810000000000001\";\"RUR\";\"05.03.19\";\"CRD_1\";\"Перевод\";\"1000,00\";\"0\";\n";
        let data = cp1251(quoted);
        let parser = AlfaCsvParser::new();
        assert_eq!(parser.detect(&data), Some(StatementType::AlfaBankCsv));

        let statement = parser.parse(&data, StatementType::AlfaBankCsv).unwrap();
        assert_eq!(statement.account_number, "40817810000000000001");
        assert_eq!(statement.records[0].amount, "1000.00");
    }

    #[test]
    fn test_parse_credit_and_debit() {
        let statement = AlfaCsvParser::new()
            .parse(&cp1251(SAMPLE), StatementType::AlfaBankCsv)
            .unwrap();

        assert_eq!(statement.account_number, "40817810000000000001");
        assert_eq!(statement.len(), 2, "HOLD row is skipped");

        let credit = &statement.records[0];
        assert_eq!(credit.actual, date(2019, 3, 5));
        assert_eq!(credit.execution, date(2019, 3, 5));
        assert_eq!(credit.amount, "1000.00");
        assert_eq!(credit.currency, "RUR");
        assert_eq!(credit.description, "Перевод с карты");

        let debit = &statement.records[1];
        assert_eq!(debit.amount, "-250.50");
        assert_eq!(debit.execution, date(2019, 3, 2));
        assert_eq!(debit.actual, date(2019, 3, 1));
        assert_eq!(debit.description, "MAGAZIN");
    }

    #[test]
    fn test_header_only_yields_no_records() {
        let header = SAMPLE.lines().next().unwrap();
        let statement = AlfaCsvParser::new()
            .parse(&cp1251(header), StatementType::AlfaBankCsv)
            .unwrap();
        assert!(statement.is_empty());
    }

    #[test]
    fn test_bad_date_is_malformed() {
        let text = SAMPLE.replace("05.03.19", "5 March");
        let result = AlfaCsvParser::new().parse(&cp1251(&text), StatementType::AlfaBankCsv);
        assert!(matches!(result, Err(MoneyError::Statement(_))));
    }
}
