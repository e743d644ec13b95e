use super::{require_uuid, timestamp_or_now, MoneyRecord};
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Security traded on an exchange; portfolio accounts may reference one.
/// Coupon fields are only present for bonds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSecurity {
    pub uuid: Uuid,
    pub sec_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub isin: String,
    #[serde(default)]
    pub reg_number: String,
    #[serde(default)]
    pub face_value: Decimal,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub mat_date: Option<NaiveDate>,
    #[serde(default)]
    pub days_to_redemption: Option<i32>,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub group_name: String,
    #[serde(default, rename = "type")]
    pub security_type: String,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub market_value: Decimal,
    #[serde(default)]
    pub coupon_value: Option<Decimal>,
    #[serde(default)]
    pub coupon_percent: Option<Decimal>,
    #[serde(default)]
    pub coupon_date: Option<NaiveDate>,
    #[serde(default)]
    pub coupon_frequency: Option<i32>,
    #[serde(default)]
    pub accrued_interest: Option<Decimal>,
    #[serde(default)]
    pub coupon_period: Option<i32>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub modified: i64,
}

impl ExchangeSecurity {
    pub fn new(sec_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = super::now_millis();
        ExchangeSecurity {
            uuid: Uuid::new_v4(),
            sec_id: sec_id.into(),
            name: name.into(),
            short_name: String::new(),
            isin: String::new(),
            reg_number: String::new(),
            face_value: Decimal::ZERO,
            issue_date: None,
            mat_date: None,
            days_to_redemption: None,
            group: String::new(),
            group_name: String::new(),
            security_type: String::new(),
            type_name: String::new(),
            market_value: Decimal::ZERO,
            coupon_value: None,
            coupon_percent: None,
            coupon_date: None,
            coupon_frequency: None,
            accrued_interest: None,
            coupon_period: None,
            created: now,
            modified: now,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_market(mut self, face_value: Decimal, market_value: Decimal) -> Self {
        self.face_value = face_value;
        self.market_value = market_value;
        self
    }

    pub fn with_coupon(mut self, value: Decimal, percent: Decimal, date: NaiveDate, frequency: i32) -> Self {
        self.coupon_value = Some(value);
        self.coupon_percent = Some(percent);
        self.coupon_date = Some(date);
        self.coupon_frequency = Some(frequency);
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.created = timestamp_or_now(self.created);
        self.modified = timestamp_or_now(self.modified);
        self
    }

    pub fn is_bond(&self) -> bool {
        self.coupon_value.is_some()
    }
}

impl MoneyRecord for ExchangeSecurity {
    const ENTITY: &'static str = "security";

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
        if self.sec_id.trim().is_empty() {
            return Err(MoneyError::validation("security id must not be blank"));
        }
        Ok(())
    }
}
