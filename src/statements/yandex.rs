// Yandex.Money wallet history, CSV export
//
// UTF-8, `;`-separated. The first row names the wallet ("... №<number>"),
// the next rows are a free-form summary, operations start at row 6.
// Operation columns: sign, date-time, amount, currency, operation id,
// description.

use super::{parse_amount, parse_date, require_amount, RawStatementData, Statement, StatementParser, StatementRecord, StatementType};
use crate::error::{MoneyError, Result};
use csv::{ReaderBuilder, StringRecord};

const FIRST_DATA_ROW: usize = 5;
const MIN_FIELDS: usize = 6;
const DATE_FORMAT: &str = "%d.%m.%Y";
const HEADER_SIGN: &str = "+/-";
const BALANCE_LABEL: &str = "Остаток";

pub struct YandexMoneyCsvParser;

impl YandexMoneyCsvParser {
    pub fn new() -> Self {
        YandexMoneyCsvParser
    }

    fn read_rows(data: &RawStatementData) -> Result<Vec<StringRecord>> {
        let text = data.utf8_text();
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn account_number(first_row: Option<&StringRecord>) -> String {
        first_row
            .and_then(|row| row.get(0))
            .and_then(|title| title.split_once('№'))
            .map(|(_, number)| number.trim().to_string())
            .unwrap_or_default()
    }

    /// First parseable amount after the label of an "Остаток" row
    fn balance(rows: &[StringRecord]) -> Option<rust_decimal::Decimal> {
        rows.iter()
            .find(|row| row.get(0).map_or(false, |label| label.trim().starts_with(BALANCE_LABEL)))
            .and_then(|row| row.iter().skip(1).find_map(parse_amount))
    }

    fn parse_row(row: &StringRecord) -> Result<StatementRecord> {
        let field = |i: usize| row.get(i).unwrap_or("").trim();

        let date_time = field(1);
        let date = date_time
            .get(..10)
            .ok_or_else(|| MoneyError::statement(format!("invalid date '{}'", date_time)))?;
        let actual = parse_date(date, DATE_FORMAT)?;

        let mut sum = require_amount(field(2))?;
        if field(0) == "-" {
            sum = -sum;
        }

        Ok(StatementRecord::new(actual, &sum.to_string())
            .with_currency(field(3))
            .with_description(field(5)))
    }
}

impl Default for YandexMoneyCsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for YandexMoneyCsvParser {
    fn detect(&self, data: &RawStatementData) -> Option<StatementType> {
        let text = data.utf8_text();
        let mut lines = text.lines();
        let title = lines.next()?;
        let has_header = lines.any(|line| line.starts_with("+/-;"));
        (title.contains('№') && has_header).then_some(StatementType::YandexMoneyCsv)
    }

    fn parse(&self, data: &RawStatementData, _statement_type: StatementType) -> Result<Statement> {
        let rows = Self::read_rows(data)?;
        let account_number = Self::account_number(rows.first());
        let balance = Self::balance(&rows);

        let mut records = Vec::new();
        for row in rows.iter().skip(FIRST_DATA_ROW) {
            if row.len() < MIN_FIELDS || row.get(0).map(str::trim) == Some(HEADER_SIGN) {
                continue;
            }
            records.push(Self::parse_row(row)?);
        }

        Ok(Statement::new(StatementType::YandexMoneyCsv, account_number, records).with_balance(balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = "История операций кошелька №410011234567890\n\
Период;01.03.2024 - 31.03.2024\n\
Остаток;1 250,00\n\
;\n\
;\n\
+/-;Дата;Сумма;Валюта;Номер операции;Описание\n\
-;02.03.2024 14:20:11;250,00;RUB;123;Оплата услуг\n\
+;05.03.2024 09:00:00;1000,00;RUB;124;Пополнение\n\
;итого\n";

    fn csv(text: &str) -> RawStatementData {
        RawStatementData::new("yandex.csv", text.as_bytes().to_vec())
    }

    #[test]
    fn test_detect() {
        let parser = YandexMoneyCsvParser::new();
        assert_eq!(parser.detect(&csv(SAMPLE)), Some(StatementType::YandexMoneyCsv));
        assert_eq!(parser.detect(&csv("a;b\n+/-;c\n")), None);
    }

    #[test]
    fn test_parse() {
        let statement = YandexMoneyCsvParser::new()
            .parse(&csv(SAMPLE), StatementType::YandexMoneyCsv)
            .unwrap();

        assert_eq!(statement.account_number, "410011234567890");
        assert_eq!(statement.balance, Some(dec!(1250)));
        assert_eq!(statement.len(), 2, "header and short rows are skipped");

        let payment = &statement.records[0];
        assert_eq!(payment.actual, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(payment.amount, "-250.00");
        assert_eq!(payment.currency, "RUB");
        assert_eq!(payment.description, "Оплата услуг");

        assert_eq!(statement.records[1].amount, "1000.00");
    }

    #[test]
    fn test_bad_amount_is_malformed() {
        let text = SAMPLE.replace("250,00", "many");
        let result = YandexMoneyCsvParser::new().parse(&csv(&text), StatementType::YandexMoneyCsv);
        assert!(matches!(result, Err(MoneyError::Statement(_))));
    }
}
