// Raiffeisen bank statements
//
// CSV, two layouts:
//   old  Windows-1251, 6 columns, amounts signed, one date per row
//   new  UTF-8 with BOM, 11 columns, income/expense in separate columns,
//        separate "executed by bank" date
// OFX: the XML flavour, STMTTRN aggregates inside BANKTRANLIST.

use super::{parse_amount, parse_date, RawStatementData, Statement, StatementParser, StatementRecord, StatementType};
use crate::error::{MoneyError, Result};
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;

const DATE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";
const EXECUTION_DATE_FORMAT: &str = "%d.%m.%Y";

const OLD_FORMAT_HEADERS: &[&str] = &[
    "Дата транзакции",
    "Описание",
    "Валюта операции",
    "Сумма в валюте операции",
    "Валюта счета",
    "Сумма в валюте счета",
];

const NEW_FORMAT_HEADERS: &[&str] = &[
    "Дата операции",
    "Выполнено банком",
    "Номер документа",
    "Сумма в валюте операции (поступления)",
    "Сумма в валюте операции (расходы)",
    "Валюта операции",
    "Сумма в валюте счета (поступления)",
    "Сумма в валюте счета (расходы)",
    "Валюта счета",
    "Детали операции (назначение платежа)",
    "Номер карты",
];

// ============================================================================
// CSV
// ============================================================================

pub struct RaiffeisenCsvParser;

impl RaiffeisenCsvParser {
    pub fn new() -> Self {
        RaiffeisenCsvParser
    }

    fn text(data: &RawStatementData, statement_type: StatementType) -> String {
        if statement_type == StatementType::RaiffeisenCsvOld {
            data.cp1251_text()
        } else {
            data.utf8_text()
        }
    }

    fn read_rows(text: &str) -> Result<Vec<StringRecord>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn headers_match(text: &str, expected: &[&str]) -> bool {
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        match reader.records().next() {
            Some(Ok(header)) => {
                header.len() == expected.len()
                    && header
                        .iter()
                        .zip(expected)
                        .all(|(actual, expected)| actual.trim_start_matches('\u{feff}').trim() == *expected)
            }
            _ => false,
        }
    }

    fn parse_old(row: &StringRecord) -> Result<StatementRecord> {
        let field = |i: usize| row.get(i).unwrap_or("").trim();
        let actual = parse_date(field(0), DATE_TIME_FORMAT)?;
        Ok(StatementRecord::new(actual, field(3))
            .with_description(field(1))
            .with_currency(field(2))
            .with_account_amount(field(4), field(5)))
    }

    fn parse_new(row: &StringRecord) -> Result<StatementRecord> {
        let field = |i: usize| row.get(i).unwrap_or("").trim();
        let actual = parse_date(field(0), DATE_TIME_FORMAT)?;
        let execution = parse_date(field(1), EXECUTION_DATE_FORMAT)?;

        let account_amount = signed_amount(field(6), field(7));
        let amount = match signed_amount(field(3), field(4)) {
            a if parse_amount(&a).is_some() => a,
            _ => account_amount.clone(),
        };

        Ok(StatementRecord::new(actual, &amount)
            .with_execution(execution)
            .with_description(field(9))
            .with_currency(field(5))
            .with_account_amount(field(8), &account_amount))
    }
}

/// Income as is, otherwise the expense negated
fn signed_amount(income: &str, expense: &str) -> String {
    if income.is_empty() {
        format!("-{}", expense)
    } else {
        income.to_string()
    }
}

impl Default for RaiffeisenCsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for RaiffeisenCsvParser {
    fn detect(&self, data: &RawStatementData) -> Option<StatementType> {
        if Self::headers_match(&data.utf8_text(), NEW_FORMAT_HEADERS) {
            Some(StatementType::RaiffeisenCsvNew)
        } else if Self::headers_match(&data.cp1251_text(), OLD_FORMAT_HEADERS) {
            Some(StatementType::RaiffeisenCsvOld)
        } else {
            None
        }
    }

    fn parse(&self, data: &RawStatementData, statement_type: StatementType) -> Result<Statement> {
        let rows = Self::read_rows(&Self::text(data, statement_type))?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows.iter().skip(1) {
            if row.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            let record = match statement_type {
                StatementType::RaiffeisenCsvOld => Self::parse_old(row)?,
                StatementType::RaiffeisenCsvNew => Self::parse_new(row)?,
                other => {
                    return Err(MoneyError::statement(format!(
                        "{} is not a Raiffeisen CSV layout",
                        other.name()
                    )))
                }
            };
            records.push(record);
        }
        Ok(Statement::new(statement_type, "", records))
    }
}

// ============================================================================
// OFX
// ============================================================================

const OFX_DATE_FORMAT: &str = "%Y%m%d";

#[derive(Default)]
struct OfxTransaction {
    name: String,
    posted: String,
    available: String,
    amount: String,
    memo: String,
}

impl OfxTransaction {
    fn into_record(self, currency: &str) -> Result<StatementRecord> {
        let actual = ofx_date(&self.posted)?;
        let execution = if self.available.is_empty() {
            actual
        } else {
            ofx_date(&self.available)?
        };
        Ok(StatementRecord::new(actual, &self.amount)
            .with_execution(execution)
            .with_counter_party(self.name)
            .with_description(self.memo)
            .with_currency(currency))
    }
}

/// `YYYYMMDD[HHMMSS[.XXX]][[gmt offset]]`; only the date part is used
fn ofx_date(value: &str) -> Result<chrono::NaiveDate> {
    let date = value
        .get(..8)
        .ok_or_else(|| MoneyError::statement(format!("invalid OFX date '{}'", value)))?;
    parse_date(date, OFX_DATE_FORMAT)
}

pub struct RaiffeisenOfxParser;

impl RaiffeisenOfxParser {
    pub fn new() -> Self {
        RaiffeisenOfxParser
    }
}

impl Default for RaiffeisenOfxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for RaiffeisenOfxParser {
    fn detect(&self, data: &RawStatementData) -> Option<StatementType> {
        let text = data.utf8_text();
        (text.contains("<OFX>") && text.contains("<STMTTRN")).then_some(StatementType::RaiffeisenOfx)
    }

    fn parse(&self, data: &RawStatementData, _statement_type: StatementType) -> Result<Statement> {
        let mut reader = Reader::from_reader(data.bytes());
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut path: Vec<String> = Vec::new();
        let mut current: Option<OfxTransaction> = None;
        let mut transactions = Vec::new();
        let mut currency = String::new();
        let mut account_number = String::new();
        let mut balance = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    if name == "STMTTRN" {
                        current = Some(OfxTransaction::default());
                    }
                    path.push(name);
                }
                Event::End(_) => {
                    if path.pop().as_deref() == Some("STMTTRN") {
                        if let Some(transaction) = current.take() {
                            transactions.push(transaction);
                        }
                    }
                }
                Event::Text(e) => {
                    let text = e.unescape()?.trim().to_string();
                    let tag = path.last().map(String::as_str).unwrap_or("");
                    let parent = path.len().checked_sub(2).map(|i| path[i].as_str()).unwrap_or("");
                    if let Some(transaction) = current.as_mut() {
                        match tag {
                            "NAME" => transaction.name = text,
                            "DTPOSTED" => transaction.posted = text,
                            "DTAVAIL" => transaction.available = text,
                            "TRNAMT" => transaction.amount = text,
                            "MEMO" => transaction.memo = text,
                            _ => {}
                        }
                    } else {
                        match (parent, tag) {
                            (_, "CURDEF") => currency = text,
                            (_, "ACCTID") => account_number = text,
                            ("LEDGERBAL", "BALAMT") => balance = parse_amount(&text),
                            _ => {}
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let records = transactions
            .into_iter()
            .map(|t| t.into_record(&currency))
            .collect::<Result<Vec<_>>>()?;
        debug!("OFX statement {}: {} transactions", account_number, records.len());

        Ok(Statement::new(StatementType::RaiffeisenOfx, account_number, records).with_balance(balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const NEW_SAMPLE: &str = "\u{feff}Дата операции;Выполнено банком;Номер документа;Сумма в валюте операции (поступления);Сумма в валюте операции (расходы);Валюта операции;Сумма в валюте счета (поступления);Сумма в валюте счета (расходы);Валюта счета;Детали операции (назначение платежа);Номер карты\n\
29.04.2024 12:31;30.04.2024;1;4 563,33;;RUB;4 563,33;;RUB;Какой-то приход;\n\
29.04.2024 18:02;30.04.2024;2;;7 000,00;RUB;;7 000,00;RUB;Какой-то расход;1234\n";

    const OLD_SAMPLE: &str = "Дата транзакции;Описание;Валюта операции;Сумма в валюте операции;Валюта счета;Сумма в валюте счета\n\
31.12.2010 00:00;Interest;RUB;1 234.56;RUB;1 234.56\n\
30.12.2010 15:40;SHOP;USD;-10.00;RUB;-300.00\n";

    const OFX_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OFX>
  <BANKMSGSRSV1><STMTTRNRS><STMTRS>
    <CURDEF>RUB</CURDEF>
    <BANKACCTFROM><ACCTID>40817810500000000001</ACCTID></BANKACCTFROM>
    <BANKTRANLIST>
      <STMTTRN>
        <TRNTYPE>DEBIT</TRNTYPE>
        <DTPOSTED>20240301120000</DTPOSTED>
        <DTAVAIL>20240303</DTAVAIL>
        <TRNAMT>-1500.00</TRNAMT>
        <NAME>COFFEE HOUSE</NAME>
        <MEMO>Card purchase</MEMO>
      </STMTTRN>
      <STMTTRN>
        <TRNTYPE>CREDIT</TRNTYPE>
        <DTPOSTED>20240305</DTPOSTED>
        <TRNAMT>25000.00</TRNAMT>
        <NAME>EMPLOYER &amp; CO</NAME>
      </STMTTRN>
    </BANKTRANLIST>
    <LEDGERBAL><BALAMT>23500.00</BALAMT><DTASOF>20240331</DTASOF></LEDGERBAL>
  </STMTRS></STMTTRNRS></BANKMSGSRSV1>
</OFX>"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cp1251(text: &str) -> RawStatementData {
        let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(text);
        RawStatementData::new("rba.csv", bytes.into_owned())
    }

    #[test]
    fn test_detect_layouts() {
        let parser = RaiffeisenCsvParser::new();
        let new = RawStatementData::new("rba.csv", NEW_SAMPLE.as_bytes().to_vec());
        assert_eq!(parser.detect(&new), Some(StatementType::RaiffeisenCsvNew));
        assert_eq!(parser.detect(&cp1251(OLD_SAMPLE)), Some(StatementType::RaiffeisenCsvOld));
        assert_eq!(parser.detect(&cp1251("Дата;Описание\n")), None);
    }

    #[test]
    fn test_parse_new_layout() {
        let data = RawStatementData::new("rba.csv", NEW_SAMPLE.as_bytes().to_vec());
        let statement = RaiffeisenCsvParser::new()
            .parse(&data, StatementType::RaiffeisenCsvNew)
            .unwrap();

        assert_eq!(statement.len(), 2);
        assert_eq!(statement.account_number, "");

        let income = &statement.records[0];
        assert_eq!(income.actual, date(2024, 4, 29));
        assert_eq!(income.execution, date(2024, 4, 30));
        assert_eq!(income.description, "Какой-то приход");
        assert_eq!(income.amount, "4563.33");
        assert_eq!(income.account_currency, "RUB");

        let expense = &statement.records[1];
        assert_eq!(expense.account_amount, "-7000.00");
        assert_eq!(expense.account_amount_decimal(), Some(dec!(-7000)));
    }

    #[test]
    fn test_parse_old_layout() {
        let statement = RaiffeisenCsvParser::new()
            .parse(&cp1251(OLD_SAMPLE), StatementType::RaiffeisenCsvOld)
            .unwrap();

        assert_eq!(statement.len(), 2);
        let interest = &statement.records[0];
        assert_eq!(interest.actual, date(2010, 12, 31));
        assert_eq!(interest.execution, interest.actual);
        assert_eq!(interest.description, "Interest");
        assert_eq!(interest.amount, "1234.56");

        let shop = &statement.records[1];
        assert_eq!(shop.currency, "USD");
        assert_eq!(shop.amount, "-10.00");
        assert_eq!(shop.account_currency, "RUB");
        assert_eq!(shop.account_amount, "-300.00");
    }

    #[test]
    fn test_bad_date_is_malformed() {
        let text = NEW_SAMPLE.replace("29.04.2024 12:31", "yesterday");
        let data = RawStatementData::new("rba.csv", text.into_bytes());
        let result = RaiffeisenCsvParser::new().parse(&data, StatementType::RaiffeisenCsvNew);
        assert!(matches!(result, Err(MoneyError::Statement(_))));
    }

    #[test]
    fn test_parse_ofx() {
        let data = RawStatementData::new("statement.ofx", OFX_SAMPLE.as_bytes().to_vec());
        let parser = RaiffeisenOfxParser::new();
        assert_eq!(parser.detect(&data), Some(StatementType::RaiffeisenOfx));

        let statement = parser.parse(&data, StatementType::RaiffeisenOfx).unwrap();
        assert_eq!(statement.account_number, "40817810500000000001");
        assert_eq!(statement.balance, Some(dec!(23500.00)));
        assert_eq!(statement.len(), 2);

        let purchase = &statement.records[0];
        assert_eq!(purchase.actual, date(2024, 3, 1));
        assert_eq!(purchase.execution, date(2024, 3, 3));
        assert_eq!(purchase.amount, "-1500.00");
        assert_eq!(purchase.counter_party, "COFFEE HOUSE");
        assert_eq!(purchase.description, "Card purchase");
        assert_eq!(purchase.currency, "RUB");

        let salary = &statement.records[1];
        assert_eq!(salary.counter_party, "EMPLOYER & CO");
        assert_eq!(salary.execution, salary.actual);
    }

    #[test]
    fn test_ofx_bad_date_is_malformed() {
        let text = OFX_SAMPLE.replace("20240305", "2024");
        let data = RawStatementData::new("statement.ofx", text.into_bytes());
        let result = RaiffeisenOfxParser::new().parse(&data, StatementType::RaiffeisenOfx);
        assert!(matches!(result, Err(MoneyError::Statement(_))));
    }
}
