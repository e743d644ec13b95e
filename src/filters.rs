// Transaction filters used by cache queries and the REST listing

use crate::entities::Transaction;
use crate::error::MoneyError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Period relative to a reference day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    All,
    CurrentYear,
    CurrentMonth,
    CurrentWeek,
    LastYear,
    LastMonth,
    LastQuarter,
    Month { year: i32, month: u32 },
    Range { from: NaiveDate, to: NaiveDate },
}

impl Period {
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match *self {
            Period::All => true,
            Period::CurrentYear => date.year() == today.year(),
            Period::CurrentMonth => date.year() == today.year() && date.month() == today.month(),
            Period::CurrentWeek => date.iso_week() == today.iso_week(),
            Period::LastYear => date.year() == today.year() - 1,
            Period::LastMonth => {
                let (year, month) = previous_month(today.year(), today.month());
                date.year() == year && date.month() == month
            }
            Period::LastQuarter => {
                let quarter = (today.month() - 1) / 3;
                let (year, quarter) = if quarter == 0 {
                    (today.year() - 1, 3)
                } else {
                    (today.year(), quarter - 1)
                };
                date.year() == year && (date.month() - 1) / 3 == quarter
            }
            Period::Month { year, month } => date.year() == year && date.month() == month,
            Period::Range { from, to } => date >= from && date <= to,
        }
    }
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Accepts `all`, `current_year`, `current_month`, `current_week`,
/// `last_year`, `last_month`, `last_quarter`, `YYYY-MM` and
/// `YYYY-MM-DD..YYYY-MM-DD`
impl FromStr for Period {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        let period = match value.as_str() {
            "" | "all" => Period::All,
            "current_year" => Period::CurrentYear,
            "current_month" => Period::CurrentMonth,
            "current_week" => Period::CurrentWeek,
            "last_year" => Period::LastYear,
            "last_month" => Period::LastMonth,
            "last_quarter" => Period::LastQuarter,
            other => {
                if let Some((from, to)) = other.split_once("..") {
                    Period::Range {
                        from: parse_iso_date(from)?,
                        to: parse_iso_date(to)?,
                    }
                } else {
                    let date = parse_iso_date(&format!("{}-01", other))?;
                    Period::Month {
                        year: date.year(),
                        month: date.month(),
                    }
                }
            }
        };
        Ok(period)
    }
}

fn parse_iso_date(value: &str) -> Result<NaiveDate, MoneyError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| MoneyError::validation(format!("invalid period date '{}': {}", value, e)))
}

/// Conjunction of optional criteria
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    pub account: Option<Uuid>,
    pub category: Option<Uuid>,
    pub contact: Option<Uuid>,
    pub period: Period,
    pub checked: Option<bool>,
    pub include_details: bool,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        TransactionFilter {
            account: None,
            category: None,
            contact: None,
            period: Period::All,
            checked: None,
            include_details: true,
        }
    }
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account: Uuid) -> Self {
        self.account = Some(account);
        self
    }

    pub fn with_category(mut self, category: Uuid) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_contact(mut self, contact: Uuid) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn top_level_only(mut self) -> Self {
        self.include_details = false;
        self
    }

    pub fn matches(&self, t: &Transaction, today: NaiveDate) -> bool {
        if let Some(account) = self.account {
            if !t.touches(account) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if t.account_debited_category_uuid != category && t.account_credited_category_uuid != category {
                return false;
            }
        }
        if self.contact.is_some() && t.contact_uuid != self.contact {
            return false;
        }
        if let Some(checked) = self.checked {
            if t.checked != checked {
                return false;
            }
        }
        if !self.include_details && t.is_detail() {
            return false;
        }
        self.period.contains(t.transaction_date, today)
    }
}
