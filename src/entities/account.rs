// Account entity - ledger account with opening balance and running totals
//
// `total` and `total_waiting` are derived by the balance ledger and are
// never taken from client input.

use super::{
    decimal_one, now_millis, require_name, require_uuid, timestamp_or_now, CardType, CategoryType,
    MoneyRecord,
};
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub opening_balance: Decimal,
    #[serde(default)]
    pub account_limit: Decimal,
    #[serde(default = "decimal_one")]
    pub currency_rate: Decimal,
    #[serde(rename = "type")]
    pub account_type: CategoryType,
    pub category_uuid: Uuid,
    #[serde(default)]
    pub currency_uuid: Option<Uuid>,
    #[serde(default)]
    pub security_uuid: Option<Uuid>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub interest: Decimal,
    #[serde(default)]
    pub closing_date: Option<NaiveDate>,
    #[serde(default)]
    pub icon_uuid: Option<Uuid>,
    #[serde(default)]
    pub card_type: CardType,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub total_waiting: Decimal,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub modified: i64,
}

fn default_enabled() -> bool {
    true
}

impl Account {
    pub fn builder() -> AccountBuilder {
        AccountBuilder::default()
    }

    /// Builder pre-filled with this account's values
    pub fn to_builder(&self) -> AccountBuilder {
        AccountBuilder {
            uuid: Some(self.uuid),
            name: self.name.clone(),
            comment: self.comment.clone(),
            account_number: self.account_number.clone(),
            opening_balance: self.opening_balance,
            account_limit: self.account_limit,
            currency_rate: self.currency_rate,
            account_type: Some(self.account_type),
            category_uuid: Some(self.category_uuid),
            currency_uuid: self.currency_uuid,
            security_uuid: self.security_uuid,
            enabled: self.enabled,
            interest: self.interest,
            closing_date: self.closing_date,
            icon_uuid: self.icon_uuid,
            card_type: self.card_type,
            card_number: self.card_number.clone(),
            total: self.total,
            total_waiting: self.total_waiting,
            created: self.created,
            modified: self.modified,
        }
    }

    /// Opening balance plus credit limit plus running total
    pub fn balance(&self) -> Decimal {
        self.opening_balance + self.account_limit + self.total
    }

    pub fn update_balance(&self, total: Decimal, total_waiting: Decimal) -> Account {
        Account {
            total,
            total_waiting,
            modified: now_millis(),
            ..self.clone()
        }
    }

    pub fn enable(&self, enabled: bool) -> Account {
        Account {
            enabled,
            modified: now_millis(),
            ..self.clone()
        }
    }

    pub fn account_number_no_spaces(&self) -> String {
        self.account_number.replace(' ', "")
    }

    pub fn card_number_no_spaces(&self) -> String {
        self.card_number.replace(' ', "")
    }
}

impl MoneyRecord for Account {
    const ENTITY: &'static str = "account";

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
        require_uuid("account category", self.category_uuid)
    }
}

// ============================================================================
// BUILDER
// ============================================================================

#[derive(Debug, Clone)]
pub struct AccountBuilder {
    uuid: Option<Uuid>,
    name: String,
    comment: String,
    account_number: String,
    opening_balance: Decimal,
    account_limit: Decimal,
    currency_rate: Decimal,
    account_type: Option<CategoryType>,
    category_uuid: Option<Uuid>,
    currency_uuid: Option<Uuid>,
    security_uuid: Option<Uuid>,
    enabled: bool,
    interest: Decimal,
    closing_date: Option<NaiveDate>,
    icon_uuid: Option<Uuid>,
    card_type: CardType,
    card_number: String,
    total: Decimal,
    total_waiting: Decimal,
    created: i64,
    modified: i64,
}

impl Default for AccountBuilder {
    fn default() -> Self {
        AccountBuilder {
            uuid: None,
            name: String::new(),
            comment: String::new(),
            account_number: String::new(),
            opening_balance: Decimal::ZERO,
            account_limit: Decimal::ZERO,
            currency_rate: Decimal::ONE,
            account_type: None,
            category_uuid: None,
            currency_uuid: None,
            security_uuid: None,
            enabled: true,
            interest: Decimal::ZERO,
            closing_date: None,
            icon_uuid: None,
            card_type: CardType::NoCard,
            card_number: String::new(),
            total: Decimal::ZERO,
            total_waiting: Decimal::ZERO,
            created: 0,
            modified: 0,
        }
    }
}

impl AccountBuilder {
    pub fn uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn account_number(mut self, number: impl Into<String>) -> Self {
        self.account_number = number.into();
        self
    }

    pub fn opening_balance(mut self, value: Decimal) -> Self {
        self.opening_balance = value;
        self
    }

    pub fn account_limit(mut self, value: Decimal) -> Self {
        self.account_limit = value;
        self
    }

    pub fn currency_rate(mut self, value: Decimal) -> Self {
        self.currency_rate = value;
        self
    }

    pub fn account_type(mut self, account_type: CategoryType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    pub fn category_uuid(mut self, uuid: Uuid) -> Self {
        self.category_uuid = Some(uuid);
        self
    }

    pub fn currency_uuid(mut self, uuid: Option<Uuid>) -> Self {
        self.currency_uuid = uuid;
        self
    }

    pub fn security_uuid(mut self, uuid: Option<Uuid>) -> Self {
        self.security_uuid = uuid;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn interest(mut self, value: Decimal) -> Self {
        self.interest = value;
        self
    }

    pub fn closing_date(mut self, date: Option<NaiveDate>) -> Self {
        self.closing_date = date;
        self
    }

    pub fn icon_uuid(mut self, uuid: Option<Uuid>) -> Self {
        self.icon_uuid = uuid;
        self
    }

    pub fn card(mut self, card_type: CardType, number: impl Into<String>) -> Self {
        self.card_type = card_type;
        self.card_number = number.into();
        self
    }

    pub fn totals(mut self, total: Decimal, total_waiting: Decimal) -> Self {
        self.total = total;
        self.total_waiting = total_waiting;
        self
    }

    pub fn created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    pub fn modified(mut self, modified: i64) -> Self {
        self.modified = modified;
        self
    }

    pub fn build(self) -> Result<Account> {
        require_name(Account::ENTITY, &self.name)?;
        let account_type = self
            .account_type
            .ok_or_else(|| MoneyError::validation("account type must be set"))?;
        let category_uuid = self
            .category_uuid
            .ok_or_else(|| MoneyError::validation("account category must be set"))?;

        Ok(Account {
            uuid: self.uuid.unwrap_or_else(Uuid::new_v4),
            name: self.name,
            comment: self.comment,
            account_number: self.account_number,
            opening_balance: self.opening_balance,
            account_limit: self.account_limit,
            currency_rate: self.currency_rate,
            account_type,
            category_uuid,
            currency_uuid: self.currency_uuid,
            security_uuid: self.security_uuid,
            enabled: self.enabled,
            interest: self.interest,
            closing_date: self.closing_date,
            icon_uuid: self.icon_uuid,
            card_type: self.card_type,
            card_number: self.card_number,
            total: self.total,
            total_waiting: self.total_waiting,
            created: timestamp_or_now(self.created),
            modified: timestamp_or_now(self.modified),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_account() -> Account {
        Account::builder()
            .name("Checking")
            .account_type(CategoryType::BanksAndCash)
            .category_uuid(Uuid::new_v4())
            .account_number("4081 7810 0000")
            .opening_balance(dec!(100.00))
            .account_limit(dec!(50.00))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let account = create_test_account();
        assert!(account.enabled);
        assert_eq!(account.currency_rate, Decimal::ONE);
        assert_eq!(account.card_type, CardType::NoCard);
        assert!(account.created > 0, "created should default to now");
        assert_eq!(account.created, account.modified);
    }

    #[test]
    fn test_builder_requires_category() {
        let result = Account::builder()
            .name("Cash")
            .account_type(CategoryType::BanksAndCash)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_blank_name() {
        let result = Account::builder()
            .name("   ")
            .account_type(CategoryType::BanksAndCash)
            .category_uuid(Uuid::new_v4())
            .build();
        assert!(matches!(result, Err(MoneyError::Validation(_))));
    }

    #[test]
    fn test_balance_includes_opening_and_limit() {
        let account = create_test_account().update_balance(dec!(-20.00), dec!(-5.00));
        assert_eq!(account.balance(), dec!(130.00));
        assert_eq!(account.total_waiting, dec!(-5.00));
    }

    #[test]
    fn test_account_number_no_spaces() {
        let account = create_test_account();
        assert_eq!(account.account_number_no_spaces(), "408178100000");
    }

    #[test]
    fn test_to_builder_keeps_identity() {
        let account = create_test_account();
        let renamed = account.to_builder().name("Savings").build().unwrap();
        assert_eq!(renamed.uuid, account.uuid);
        assert_eq!(renamed.name, "Savings");
        assert_eq!(renamed.created, account.created);
    }
}
