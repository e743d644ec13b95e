// Transaction entity - a double-entry movement between two accounts
//
// Account types and categories of both sides are copied into the record so
// historical transactions keep their classification when accounts move.

use super::{now_millis, require_uuid, timestamp_or_now, Account, CategoryType, MoneyRecord, TransactionType};
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransactionBuilder")]
pub struct Transaction {
    pub uuid: Uuid,
    pub amount: Decimal,
    pub credit_amount: Decimal,
    pub transaction_date: NaiveDate,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub comment: String,
    pub checked: bool,
    pub account_debited_uuid: Uuid,
    pub account_credited_uuid: Uuid,
    pub account_debited_type: CategoryType,
    pub account_credited_type: CategoryType,
    pub account_debited_category_uuid: Uuid,
    pub account_credited_category_uuid: Uuid,
    pub contact_uuid: Option<Uuid>,
    pub invoice_number: String,
    /// Set on split-detail children
    pub parent_uuid: Option<Uuid>,
    /// Set on parents that have split-detail children
    pub detailed: bool,
    pub statement_date: NaiveDate,
    pub card_uuid: Option<Uuid>,
    pub created: i64,
    pub modified: i64,
}

impl Transaction {
    pub fn builder() -> TransactionBuilder {
        TransactionBuilder::default()
    }

    /// Builder pre-filled with this transaction's values
    pub fn to_builder(&self) -> TransactionBuilder {
        TransactionBuilder {
            uuid: Some(self.uuid),
            amount: self.amount,
            credit_amount: Some(self.credit_amount),
            transaction_date: Some(self.transaction_date),
            transaction_type: self.transaction_type,
            comment: self.comment.clone(),
            checked: self.checked,
            account_debited_uuid: Some(self.account_debited_uuid),
            account_credited_uuid: Some(self.account_credited_uuid),
            account_debited_type: Some(self.account_debited_type),
            account_credited_type: Some(self.account_credited_type),
            account_debited_category_uuid: Some(self.account_debited_category_uuid),
            account_credited_category_uuid: Some(self.account_credited_category_uuid),
            contact_uuid: self.contact_uuid,
            invoice_number: self.invoice_number.clone(),
            parent_uuid: self.parent_uuid,
            detailed: self.detailed,
            statement_date: Some(self.statement_date),
            card_uuid: self.card_uuid,
            created: self.created,
            modified: self.modified,
            new_contact_name: None,
        }
    }

    /// Amount as seen from the debited side: negative when money leaves the
    /// balance sheet for a different kind of account
    pub fn signed_amount(&self) -> Decimal {
        if self.account_credited_type != self.account_debited_type
            && self.account_debited_type != CategoryType::Incomes
        {
            -self.amount
        } else {
            self.amount
        }
    }

    pub fn check(&self, checked: bool) -> Transaction {
        Transaction {
            checked,
            modified: now_millis(),
            ..self.clone()
        }
    }

    pub fn with_parent(&self, parent_uuid: Option<Uuid>) -> Transaction {
        Transaction {
            parent_uuid,
            modified: now_millis(),
            ..self.clone()
        }
    }

    pub fn is_detail(&self) -> bool {
        self.parent_uuid.is_some()
    }

    /// True when either side is the given account
    pub fn touches(&self, account_uuid: Uuid) -> bool {
        self.account_debited_uuid == account_uuid || self.account_credited_uuid == account_uuid
    }

    /// Amount on the given account's side of the transaction
    pub fn amount_for(&self, account_uuid: Uuid) -> Decimal {
        if self.account_credited_uuid == account_uuid {
            self.credit_amount
        } else {
            self.amount
        }
    }
}

impl MoneyRecord for Transaction {
    const ENTITY: &'static str = "transaction";

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
        require_uuid("debited account", self.account_debited_uuid)?;
        require_uuid("credited account", self.account_credited_uuid)?;
        if self.parent_uuid == Some(self.uuid) {
            return Err(MoneyError::validation("transaction cannot be its own parent"));
        }
        Ok(())
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Also the JSON input shape: clients may omit the denormalised account
/// fields and let `resolve_accounts` fill them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionBuilder {
    uuid: Option<Uuid>,
    amount: Decimal,
    credit_amount: Option<Decimal>,
    transaction_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    comment: String,
    checked: bool,
    account_debited_uuid: Option<Uuid>,
    account_credited_uuid: Option<Uuid>,
    account_debited_type: Option<CategoryType>,
    account_credited_type: Option<CategoryType>,
    account_debited_category_uuid: Option<Uuid>,
    account_credited_category_uuid: Option<Uuid>,
    contact_uuid: Option<Uuid>,
    invoice_number: String,
    parent_uuid: Option<Uuid>,
    detailed: bool,
    statement_date: Option<NaiveDate>,
    card_uuid: Option<Uuid>,
    created: i64,
    modified: i64,
    /// Contact to create before the transaction is stored
    #[serde(skip_serializing_if = "Option::is_none")]
    new_contact_name: Option<String>,
}

impl TransactionBuilder {
    pub fn uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn get_uuid(&self) -> Option<Uuid> {
        self.uuid
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn credit_amount(mut self, amount: Decimal) -> Self {
        self.credit_amount = Some(amount);
        self
    }

    pub fn transaction_date(mut self, date: NaiveDate) -> Self {
        self.transaction_date = Some(date);
        self
    }

    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Debited side with its type and category
    pub fn debited(mut self, account: &Account) -> Self {
        self.account_debited_uuid = Some(account.uuid);
        self.account_debited_type = Some(account.account_type);
        self.account_debited_category_uuid = Some(account.category_uuid);
        self
    }

    /// Credited side with its type and category
    pub fn credited(mut self, account: &Account) -> Self {
        self.account_credited_uuid = Some(account.uuid);
        self.account_credited_type = Some(account.account_type);
        self.account_credited_category_uuid = Some(account.category_uuid);
        self
    }

    pub fn account_debited_uuid(&self) -> Option<Uuid> {
        self.account_debited_uuid
    }

    pub fn account_credited_uuid(&self) -> Option<Uuid> {
        self.account_credited_uuid
    }

    /// Fill missing denormalised fields from the referenced accounts
    pub fn resolve_accounts<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(Uuid) -> Option<Account>,
    {
        if let Some(uuid) = self.account_debited_uuid {
            if self.account_debited_type.is_none() || self.account_debited_category_uuid.is_none() {
                let account = lookup(uuid).ok_or_else(|| MoneyError::not_found(Account::ENTITY, uuid))?;
                self.account_debited_type = Some(account.account_type);
                self.account_debited_category_uuid = Some(account.category_uuid);
            }
        }
        if let Some(uuid) = self.account_credited_uuid {
            if self.account_credited_type.is_none() || self.account_credited_category_uuid.is_none() {
                let account = lookup(uuid).ok_or_else(|| MoneyError::not_found(Account::ENTITY, uuid))?;
                self.account_credited_type = Some(account.account_type);
                self.account_credited_category_uuid = Some(account.category_uuid);
            }
        }
        Ok(self)
    }

    pub fn contact_uuid(mut self, uuid: Option<Uuid>) -> Self {
        self.contact_uuid = uuid;
        self
    }

    pub fn new_contact_name(mut self, name: impl Into<String>) -> Self {
        self.new_contact_name = Some(name.into());
        self
    }

    pub fn take_new_contact_name(&mut self) -> Option<String> {
        self.new_contact_name
            .take()
            .filter(|name| !name.trim().is_empty())
    }

    pub fn invoice_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = number.into();
        self
    }

    pub fn parent_uuid(mut self, uuid: Option<Uuid>) -> Self {
        self.parent_uuid = uuid;
        self
    }

    pub fn detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    pub fn statement_date(mut self, date: NaiveDate) -> Self {
        self.statement_date = Some(date);
        self
    }

    pub fn card_uuid(mut self, uuid: Option<Uuid>) -> Self {
        self.card_uuid = uuid;
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

    pub fn build(self) -> Result<Transaction> {
        let missing = |field: &str| MoneyError::validation(format!("transaction {} must be set", field));

        let transaction_date = self.transaction_date.ok_or_else(|| missing("date"))?;
        let transaction = Transaction {
            uuid: self.uuid.unwrap_or_else(Uuid::new_v4),
            amount: self.amount,
            credit_amount: self.credit_amount.unwrap_or(self.amount),
            transaction_date,
            transaction_type: self.transaction_type,
            comment: self.comment,
            checked: self.checked,
            account_debited_uuid: self.account_debited_uuid.ok_or_else(|| missing("debited account"))?,
            account_credited_uuid: self.account_credited_uuid.ok_or_else(|| missing("credited account"))?,
            account_debited_type: self.account_debited_type.ok_or_else(|| missing("debited account type"))?,
            account_credited_type: self
                .account_credited_type
                .ok_or_else(|| missing("credited account type"))?,
            account_debited_category_uuid: self
                .account_debited_category_uuid
                .ok_or_else(|| missing("debited account category"))?,
            account_credited_category_uuid: self
                .account_credited_category_uuid
                .ok_or_else(|| missing("credited account category"))?,
            contact_uuid: self.contact_uuid,
            invoice_number: self.invoice_number,
            parent_uuid: self.parent_uuid,
            detailed: self.detailed,
            statement_date: self.statement_date.unwrap_or(transaction_date),
            card_uuid: self.card_uuid,
            created: timestamp_or_now(self.created),
            modified: timestamp_or_now(self.modified),
        };
        transaction.validate()?;
        Ok(transaction)
    }
}

impl TryFrom<TransactionBuilder> for Transaction {
    type Error = MoneyError;

    fn try_from(builder: TransactionBuilder) -> Result<Self> {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_account(name: &str, account_type: CategoryType) -> Account {
        Account::builder()
            .name(name)
            .account_type(account_type)
            .category_uuid(Uuid::new_v4())
            .build()
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_build_defaults() {
        let cash = create_test_account("Cash", CategoryType::BanksAndCash);
        let food = create_test_account("Food", CategoryType::Expenses);
        let tx = Transaction::builder()
            .amount(dec!(12.50))
            .transaction_date(date(2024, 5, 3))
            .debited(&cash)
            .credited(&food)
            .build()
            .unwrap();

        assert_eq!(tx.credit_amount, dec!(12.50), "credit amount defaults to amount");
        assert_eq!(tx.statement_date, tx.transaction_date);
        assert_eq!(tx.transaction_type, TransactionType::Undefined);
        assert_eq!(tx.account_debited_type, CategoryType::BanksAndCash);
        assert_eq!(tx.account_credited_category_uuid, food.category_uuid);
        assert!(!tx.checked);
    }

    #[test]
    fn test_build_requires_accounts() {
        let result = Transaction::builder()
            .amount(dec!(1))
            .transaction_date(date(2024, 1, 1))
            .build();
        assert!(matches!(result, Err(MoneyError::Validation(_))));
    }

    #[test]
    fn test_signed_amount() {
        let cash = create_test_account("Cash", CategoryType::BanksAndCash);
        let card = create_test_account("Card", CategoryType::BanksAndCash);
        let food = create_test_account("Food", CategoryType::Expenses);
        let salary = create_test_account("Salary", CategoryType::Incomes);

        let base = Transaction::builder().amount(dec!(10)).transaction_date(date(2024, 1, 1));

        let expense = base.clone().debited(&cash).credited(&food).build().unwrap();
        assert_eq!(expense.signed_amount(), dec!(-10));

        let transfer = base.clone().debited(&cash).credited(&card).build().unwrap();
        assert_eq!(transfer.signed_amount(), dec!(10));

        let income = base.debited(&salary).credited(&cash).build().unwrap();
        assert_eq!(income.signed_amount(), dec!(10));
    }

    #[test]
    fn test_check_updates_modified() {
        let cash = create_test_account("Cash", CategoryType::BanksAndCash);
        let food = create_test_account("Food", CategoryType::Expenses);
        let tx = Transaction::builder()
            .amount(dec!(3))
            .transaction_date(date(2024, 1, 1))
            .debited(&cash)
            .credited(&food)
            .modified(1)
            .build()
            .unwrap();

        let checked = tx.check(true);
        assert!(checked.checked);
        assert!(checked.modified > 1);
        assert_eq!(checked.uuid, tx.uuid);
    }

    #[test]
    fn test_resolve_accounts_from_lookup() {
        let cash = create_test_account("Cash", CategoryType::BanksAndCash);
        let food = create_test_account("Food", CategoryType::Expenses);
        let accounts = vec![cash.clone(), food.clone()];

        let json = format!(
            r#"{{"amount":"7.00","transaction_date":"2024-02-10","account_debited_uuid":"{}","account_credited_uuid":"{}"}}"#,
            cash.uuid, food.uuid
        );
        let builder: TransactionBuilder = serde_json::from_str(&json).unwrap();
        let tx = builder
            .resolve_accounts(|uuid| accounts.iter().find(|a| a.uuid == uuid).cloned())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(tx.account_credited_type, CategoryType::Expenses);
        assert_eq!(tx.amount, dec!(7.00));
    }

    #[test]
    fn test_amount_for_side() {
        let cash = create_test_account("Cash", CategoryType::BanksAndCash);
        let usd = create_test_account("USD", CategoryType::BanksAndCash);
        let tx = Transaction::builder()
            .amount(dec!(100))
            .credit_amount(dec!(1.10))
            .transaction_date(date(2024, 1, 1))
            .debited(&cash)
            .credited(&usd)
            .build()
            .unwrap();

        assert_eq!(tx.amount_for(cash.uuid), dec!(100));
        assert_eq!(tx.amount_for(usd.uuid), dec!(1.10));
        assert!(tx.touches(usd.uuid));
    }
}
