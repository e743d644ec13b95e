// Sberbank card report, HTML
//
// The report is a rendered page: a card info block with the account
// number and a `.b-trs` table of `.trs_it` rows. Each row has a head
// (name, date, sum, category) and optional details (posting date, geo).

use super::{parse_date, RawStatementData, Statement, StatementParser, StatementRecord, StatementType};
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use log::warn;
use scraper::{ElementRef, Html, Selector};

const REPORT_MARKERS: &[&str] = &["HTML_DEBIT_RUS_REPORT", "HTML_CREDIT_RUS_REPORT", "HTML_DEBIT_RUS_HISTORY"];

/// Template versions the class names below were taken from
const KNOWN_TEMPLATES: &[&str] = &[
    "HTML_DEBIT_RUS_REPORT, 07.04.2017, 2.1.6",
    "HTML_DEBIT_RUS_REPORT, 25.01.2018, 2.1.17",
    "HTML_DEBIT_RUS_REPORT, 27.11.2018, 2.1.26",
    "HTML_DEBIT_RUS_REPORT, 10.12.2019, 2.1.29",
    "HTML_CREDIT_RUS_REPORT, 07.04.2017, 2.1.6",
    "HTML_CREDIT_RUS_REPORT, 27.11.2018, 2.1.26",
    "HTML_CREDIT_RUS_REPORT, 10.12.2019, 2.1.29",
];

const DATE_FORMAT: &str = "%d.%m.%Y";
const DATE_ATTRIBUTE: &str = "data-date";
const CREDIT_CLASS: &str = "trs_st-refill";
const EXECUTION_DETAIL_CLASS: &str = "trs-post";
const GEO_DETAIL_CLASS: &str = "trs-geo";

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| MoneyError::statement(format!("invalid selector '{}': {:?}", css, e)))
}

/// Whitespace-collapsed text content
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_class(element: ElementRef, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

fn first<'a>(parent: ElementRef<'a>, css: &'static str) -> Result<Option<ElementRef<'a>>> {
    Ok(parent.select(&selector(css)?).next())
}

fn required<'a>(parent: ElementRef<'a>, css: &'static str) -> Result<ElementRef<'a>> {
    first(parent, css)?.ok_or_else(|| MoneyError::statement(format!("element '{}' not found", css)))
}

/// Date from the `.idate[data-date]` inside an element
fn element_date(element: ElementRef) -> Result<NaiveDate> {
    let idate = required(element, ".idate")?;
    let value = idate
        .value()
        .attr(DATE_ATTRIBUTE)
        .ok_or_else(|| MoneyError::statement("date element has no data-date"))?;
    parse_date(value, DATE_FORMAT)
}

pub struct SberbankParser;

impl SberbankParser {
    pub fn new() -> Self {
        SberbankParser
    }

    fn check_template(document: &Html) -> Result<()> {
        let meta = selector("[name=\"template-details\"]")?;
        let version = document
            .select(&meta)
            .next()
            .and_then(|e| e.value().attr("content"))
            .unwrap_or("");
        if !KNOWN_TEMPLATES.contains(&version) {
            warn!("Sberbank format not recognized: {}", version);
        }
        Ok(())
    }

    fn account_number(document: &Html) -> Result<String> {
        let info = selector(".b-info.b-card-info div.info_item:nth-child(2) div.info_value")?;
        let number = document
            .select(&info)
            .next()
            .map(element_text)
            .unwrap_or_default()
            .replace(' ', "");
        if number.is_empty() {
            warn!("Account number not found");
        }
        Ok(number)
    }

    fn parse_amount(head: ElementRef) -> Result<String> {
        let sum = required(head, ".trs_sum")?;
        let amount = element_text(required(sum, ".trs_sum-am")?);
        let credit = has_class(sum, CREDIT_CLASS) || sum.select(&selector(".trs_st-refill")?).next().is_some();
        Ok(if credit { amount } else { format!("-{}", amount) })
    }

    fn parse_row(row: ElementRef) -> Result<Option<StatementRecord>> {
        let head = match first(row, ".trs_head")? {
            Some(head) => head,
            None => return Ok(None),
        };

        let name = element_text(required(head, ".trs_name")?);
        let actual = element_date(required(head, ".trs_date")?)?;
        let amount = Self::parse_amount(head)?;
        let category = first(head, ".icat")?.map(element_text).unwrap_or_default();

        let mut record = StatementRecord::new(actual, &amount)
            .with_counter_party(name)
            .with_description(category);

        for detail in row.select(&selector(".trs_detail")?) {
            if has_class(detail, EXECUTION_DETAIL_CLASS) {
                record = record.with_execution(element_date(required(detail, ".trs_val")?)?);
            } else if has_class(detail, GEO_DETAIL_CLASS) {
                if let Some(country) = first(detail, ".trs_country")? {
                    record = record.with_country(element_text(country));
                }
                if let Some(city) = first(detail, ".trs_city")? {
                    record = record.with_place(element_text(city));
                }
            }
        }

        Ok(Some(record))
    }
}

impl Default for SberbankParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for SberbankParser {
    fn detect(&self, data: &RawStatementData) -> Option<StatementType> {
        let content = data.utf8_text();
        REPORT_MARKERS
            .iter()
            .any(|marker| content.contains(marker))
            .then_some(StatementType::SberbankHtml)
    }

    fn parse(&self, data: &RawStatementData, _statement_type: StatementType) -> Result<Statement> {
        let document = Html::parse_document(&data.utf8_text());
        Self::check_template(&document)?;
        let account_number = Self::account_number(&document)?;

        let table = match document.select(&selector(".b-trs")?).next() {
            Some(table) => table,
            None => {
                warn!("Transactions not found in statement");
                return Ok(Statement::new(StatementType::SberbankHtml, account_number, Vec::new()));
            }
        };

        let mut records = Vec::new();
        for row in table.select(&selector(".trs_it")?) {
            if let Some(record) = Self::parse_row(row)? {
                records.push(record);
            }
        }
        if records.is_empty() {
            warn!("Transactions not found in statement");
        }

        Ok(Statement::new(StatementType::SberbankHtml, account_number, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<html><head>
<meta name="template-details" content="HTML_DEBIT_RUS_REPORT, 10.12.2019, 2.1.29">
</head><body>
<div class="b-info b-card-info">
  <div class="info_item"><div class="info_value">Visa Classic</div></div>
  <div class="info_item"><div class="info_value">4081 7810 0000 0001</div></div>
</div>
<div class="b-trs">
  <div class="trs_it">
    <div class="trs_head">
      <div class="trs_name">PYATEROCHKA 123</div>
      <div class="trs_date"><span class="idate" data-date="12.01.2020">12 янв</span></div>
      <div class="trs_sum"><span class="trs_sum-am">1 234,50</span></div>
      <div class="icat">Супермаркеты</div>
    </div>
    <div class="trs_detail trs-post">
      <div class="trs_val"><span class="idate" data-date="14.01.2020">14 янв</span></div>
    </div>
    <div class="trs_detail trs-geo">
      <span class="trs_country">RUS</span><span class="trs_city">MOSCOW</span>
    </div>
  </div>
  <div class="trs_it">
    <div class="trs_head">
      <div class="trs_name">Зачисление зарплаты</div>
      <div class="trs_date"><span class="idate" data-date="15.01.2020">15 янв</span></div>
      <div class="trs_sum trs_st-refill"><span class="trs_sum-am">50 000,00</span></div>
    </div>
  </div>
</div>
</body></html>"#;

    fn html(text: &str) -> RawStatementData {
        RawStatementData::new("report.html", text.as_bytes().to_vec())
    }

    #[test]
    fn test_detect() {
        let parser = SberbankParser::new();
        assert_eq!(parser.detect(&html(SAMPLE)), Some(StatementType::SberbankHtml));
        assert_eq!(parser.detect(&html("<html></html>")), None);
    }

    #[test]
    fn test_parse_rows() {
        let statement = SberbankParser::new()
            .parse(&html(SAMPLE), StatementType::SberbankHtml)
            .unwrap();

        assert_eq!(statement.account_number, "4081781000000001");
        assert_eq!(statement.len(), 2);

        let purchase = &statement.records[0];
        assert_eq!(purchase.counter_party, "PYATEROCHKA 123");
        assert_eq!(purchase.actual, NaiveDate::from_ymd_opt(2020, 1, 12).unwrap());
        assert_eq!(purchase.execution, NaiveDate::from_ymd_opt(2020, 1, 14).unwrap());
        assert_eq!(purchase.amount, "-1234.50");
        assert_eq!(purchase.description, "Супермаркеты");
        assert_eq!(purchase.country, "RUS");
        assert_eq!(purchase.place, "MOSCOW");

        let salary = &statement.records[1];
        assert_eq!(salary.amount, "50000.00", "refill rows are credits");
        assert_eq!(salary.execution, salary.actual);
    }

    #[test]
    fn test_missing_table_is_empty() {
        let text = r#"<html><meta name="template-details" content="HTML_CREDIT_RUS_REPORT, x"></html>"#;
        let statement = SberbankParser::new()
            .parse(&html(text), StatementType::SberbankHtml)
            .unwrap();
        assert!(statement.is_empty());
    }

    #[test]
    fn test_missing_name_is_malformed() {
        let text = SAMPLE.replace(r#"<div class="trs_name">PYATEROCHKA 123</div>"#, "");
        let result = SberbankParser::new().parse(&html(&text), StatementType::SberbankHtml);
        assert!(matches!(result, Err(MoneyError::Statement(_))));
    }
}
