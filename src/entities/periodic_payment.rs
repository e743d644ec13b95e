// Periodic payment - a template for a recurring transaction

use super::{
    require_name, require_uuid, timestamp_or_now, MoneyRecord, PeriodicPaymentType,
    RecurrenceType,
};
use crate::error::{MoneyError, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicPayment {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub payment_type: PeriodicPaymentType,
    #[serde(default)]
    pub recurrence_type: RecurrenceType,
    #[serde(default)]
    pub amount: Decimal,
    pub day_of_month: u32,
    /// 1..=12, used by yearly payments only
    #[serde(default = "default_month")]
    pub month: u32,
    pub account_debited_uuid: Uuid,
    pub account_credited_uuid: Uuid,
    pub contact_uuid: Uuid,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub modified: i64,
}

fn default_month() -> u32 {
    1
}

impl PeriodicPayment {
    pub fn new(
        name: impl Into<String>,
        amount: Decimal,
        day_of_month: u32,
        account_debited_uuid: Uuid,
        account_credited_uuid: Uuid,
        contact_uuid: Uuid,
    ) -> Self {
        let now = super::now_millis();
        PeriodicPayment {
            uuid: Uuid::new_v4(),
            name: name.into(),
            payment_type: PeriodicPaymentType::ManualPayment,
            recurrence_type: RecurrenceType::Monthly,
            amount,
            day_of_month,
            month: 1,
            account_debited_uuid,
            account_credited_uuid,
            contact_uuid,
            comment: String::new(),
            created: now,
            modified: now,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_payment_type(mut self, payment_type: PeriodicPaymentType) -> Self {
        self.payment_type = payment_type;
        self
    }

    pub fn yearly(mut self, month: u32) -> Self {
        self.recurrence_type = RecurrenceType::Yearly;
        self.month = month;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.created = timestamp_or_now(self.created);
        self.modified = timestamp_or_now(self.modified);
        self
    }

    /// First payment date on or after `today`
    pub fn next_date(&self, today: NaiveDate) -> NaiveDate {
        match self.recurrence_type {
            RecurrenceType::Monthly => {
                let next = clamped_date(today.year(), today.month(), self.day_of_month);
                if next < today {
                    let (year, month) = if today.month() == 12 {
                        (today.year() + 1, 1)
                    } else {
                        (today.year(), today.month() + 1)
                    };
                    clamped_date(year, month, self.day_of_month)
                } else {
                    next
                }
            }
            RecurrenceType::Yearly => {
                let next = clamped_date(today.year(), self.month, self.day_of_month);
                if next < today {
                    clamped_date(today.year() + 1, self.month, self.day_of_month)
                } else {
                    next
                }
            }
        }
    }
}

/// Builds a date, moving days past the end of the month to its last day
fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let month = month.clamp(1, 12);
    let mut day = day.clamp(1, 31);
    loop {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return date;
        }
        day -= 1;
    }
}

impl MoneyRecord for PeriodicPayment {
    const ENTITY: &'static str = "periodic payment";

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
        require_name(Self::ENTITY, &self.name)?;
        require_uuid("debited account", self.account_debited_uuid)?;
        require_uuid("credited account", self.account_credited_uuid)?;
        require_uuid("payment contact", self.contact_uuid)?;
        if !(1..=31).contains(&self.day_of_month) {
            return Err(MoneyError::validation(format!(
                "day of month {} out of range",
                self.day_of_month
            )));
        }
        if !(1..=12).contains(&self.month) {
            return Err(MoneyError::validation(format!("month {} out of range", self.month)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_payment(day: u32) -> PeriodicPayment {
        PeriodicPayment::new(
            "Rent",
            dec!(500.00),
            day,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_monthly_later_this_month() {
        let payment = create_test_payment(20);
        assert_eq!(payment.next_date(date(2024, 3, 10)), date(2024, 3, 20));
    }

    #[test]
    fn test_monthly_same_day_is_today() {
        let payment = create_test_payment(10);
        assert_eq!(payment.next_date(date(2024, 3, 10)), date(2024, 3, 10));
    }

    #[test]
    fn test_monthly_rolls_to_next_month() {
        let payment = create_test_payment(5);
        assert_eq!(payment.next_date(date(2024, 12, 10)), date(2025, 1, 5));
    }

    #[test]
    fn test_monthly_clamps_short_month() {
        let payment = create_test_payment(31);
        assert_eq!(payment.next_date(date(2024, 2, 3)), date(2024, 2, 29));
    }

    #[test]
    fn test_yearly_rolls_to_next_year() {
        let payment = create_test_payment(15).yearly(2);
        assert_eq!(payment.next_date(date(2024, 6, 1)), date(2025, 2, 15));
        assert_eq!(payment.next_date(date(2024, 1, 1)), date(2024, 2, 15));
    }

    #[test]
    fn test_validate_day_range() {
        let payment = create_test_payment(0);
        assert!(payment.validate().is_err());
        assert!(create_test_payment(28).validate().is_ok());
    }
}
