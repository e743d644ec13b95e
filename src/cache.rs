// Data cache - in-memory copy of every entity
//
// Loaded once from the database and kept coherent by MoneyDao. All
// read paths (REST listings, balance folds, statement matching) go
// through here instead of SQL.

use crate::entities::{
    Account, Card, Category, CategoryType, Contact, Currency, ExchangeSecurity, Icon, MoneyDocument,
    MoneyRecord, PeriodicPayment, Transaction,
};
use crate::filters::TransactionFilter;
use crate::ledger;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

// ============================================================================
// RECORD LIST
// ============================================================================

/// Insertion-ordered records with a uuid index
#[derive(Debug, Clone)]
pub struct RecordList<T> {
    records: Vec<T>,
    index: HashMap<Uuid, usize>,
}

impl<T> Default for RecordList<T> {
    fn default() -> Self {
        RecordList {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: MoneyRecord> RecordList<T> {
    pub fn get(&self, uuid: Uuid) -> Option<&T> {
        self.index.get(&uuid).map(|&i| &self.records[i])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Adds a record, replacing one with the same uuid
    pub fn put(&mut self, record: T) {
        match self.index.get(&record.uuid()) {
            Some(&i) => self.records[i] = record,
            None => {
                self.index.insert(record.uuid(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn remove(&mut self, uuid: Uuid) -> Option<T> {
        let i = self.index.remove(&uuid)?;
        let removed = self.records.remove(i);
        for position in self.index.values_mut() {
            if *position > i {
                *position -= 1;
            }
        }
        Some(removed)
    }

    pub fn replace_all(&mut self, records: Vec<T>) {
        self.index = records.iter().enumerate().map(|(i, r)| (r.uuid(), i)).collect();
        self.records = records;
    }
}

/// Maps an entity type to its list inside the cache
pub trait Cached: MoneyRecord + Sized {
    fn list(cache: &DataCache) -> &RecordList<Self>;
    fn list_mut(cache: &mut DataCache) -> &mut RecordList<Self>;
}

macro_rules! cached {
    ($type:ty, $field:ident) => {
        impl Cached for $type {
            fn list(cache: &DataCache) -> &RecordList<Self> {
                &cache.$field
            }

            fn list_mut(cache: &mut DataCache) -> &mut RecordList<Self> {
                &mut cache.$field
            }
        }
    };
}

// ============================================================================
// DATA CACHE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DataCache {
    icons: RecordList<Icon>,
    categories: RecordList<Category>,
    currencies: RecordList<Currency>,
    securities: RecordList<ExchangeSecurity>,
    accounts: RecordList<Account>,
    cards: RecordList<Card>,
    contacts: RecordList<Contact>,
    transactions: RecordList<Transaction>,
    documents: RecordList<MoneyDocument>,
    periodic_payments: RecordList<PeriodicPayment>,
}

cached!(Icon, icons);
cached!(Category, categories);
cached!(Currency, currencies);
cached!(ExchangeSecurity, securities);
cached!(Account, accounts);
cached!(Card, cards);
cached!(Contact, contacts);
cached!(Transaction, transactions);
cached!(MoneyDocument, documents);
cached!(PeriodicPayment, periodic_payments);

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Cached>(&self, uuid: Uuid) -> Option<&T> {
        T::list(self).get(uuid)
    }

    pub fn all<T: Cached>(&self) -> &[T] {
        T::list(self).as_slice()
    }

    pub fn put<T: Cached>(&mut self, record: T) {
        T::list_mut(self).put(record);
    }

    pub fn remove<T: Cached>(&mut self, uuid: Uuid) -> Option<T> {
        T::list_mut(self).remove(uuid)
    }

    pub fn replace_all<T: Cached>(&mut self, records: Vec<T>) {
        T::list_mut(self).replace_all(records);
    }

    pub fn clear(&mut self) {
        *self = DataCache::default();
    }

    // ========================================================================
    // CATEGORIES, CURRENCIES, CONTACTS
    // ========================================================================

    pub fn categories_by_type(&self, category_type: CategoryType) -> Vec<&Category> {
        self.categories
            .as_slice()
            .iter()
            .filter(|c| c.category_type == category_type)
            .collect()
    }

    pub fn default_currency(&self) -> Option<&Currency> {
        self.currencies.as_slice().iter().find(|c| c.def)
    }

    /// Case-insensitive lookup by symbol or description
    pub fn currency_by_name(&self, name: &str) -> Option<&Currency> {
        self.currencies.as_slice().iter().find(|c| c.matches_name(name))
    }

    pub fn contact_by_name(&self, name: &str) -> Option<&Contact> {
        self.contacts.as_slice().iter().find(|c| c.name == name)
    }

    // ========================================================================
    // ACCOUNTS AND CARDS
    // ========================================================================

    pub fn accounts_by_type(&self, account_type: CategoryType) -> Vec<&Account> {
        self.accounts
            .as_slice()
            .iter()
            .filter(|a| a.account_type == account_type)
            .collect()
    }

    pub fn accounts_by_category(&self, category_uuid: Uuid) -> Vec<&Account> {
        self.accounts
            .as_slice()
            .iter()
            .filter(|a| a.category_uuid == category_uuid)
            .collect()
    }

    /// Enabled account whose number matches, spaces ignored
    pub fn account_by_number(&self, number: &str) -> Option<&Account> {
        let number = number.replace(' ', "");
        if number.is_empty() {
            return None;
        }
        self.accounts
            .as_slice()
            .iter()
            .find(|a| a.enabled && a.account_number_no_spaces() == number)
    }

    /// Enabled cards of an account
    pub fn cards_by_account(&self, account_uuid: Uuid) -> Vec<&Card> {
        self.cards
            .as_slice()
            .iter()
            .filter(|c| c.enabled && c.account_uuid == account_uuid)
            .collect()
    }

    // ========================================================================
    // TRANSACTIONS
    // ========================================================================

    pub fn transactions_for_account(&self, account_uuid: Uuid) -> Vec<&Transaction> {
        self.transactions
            .as_slice()
            .iter()
            .filter(|t| t.touches(account_uuid))
            .collect()
    }

    pub fn transaction_count_for_account(&self, account_uuid: Uuid) -> usize {
        self.transactions
            .as_slice()
            .iter()
            .filter(|t| t.touches(account_uuid))
            .count()
    }

    /// Split-detail children of a transaction
    pub fn transaction_details(&self, parent_uuid: Uuid) -> Vec<&Transaction> {
        self.transactions
            .as_slice()
            .iter()
            .filter(|t| t.parent_uuid == Some(parent_uuid))
            .collect()
    }

    pub fn transactions_by_filter(&self, filter: &TransactionFilter, today: NaiveDate) -> Vec<&Transaction> {
        self.transactions
            .as_slice()
            .iter()
            .filter(|t| filter.matches(t, today))
            .collect()
    }

    /// Distinct non-blank comments, sorted; used for completion
    pub fn unique_comments(&self) -> Vec<String> {
        self.transactions
            .as_slice()
            .iter()
            .map(|t| t.comment.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    // ========================================================================
    // BALANCES
    // ========================================================================

    pub fn calculate_balance<F>(&self, account: &Account, include_opening: bool, filter: F) -> Decimal
    where
        F: Fn(&Transaction) -> bool,
    {
        ledger::calculate_balance(account, self.transactions.as_slice(), include_opening, filter)
    }

    /// Fresh (total, total_waiting) for an account
    pub fn account_totals(&self, account: &Account) -> (Decimal, Decimal) {
        ledger::account_totals(account, self.transactions.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CardType;
    use rust_decimal_macros::dec;

    fn create_test_account(name: &str, number: &str) -> Account {
        Account::builder()
            .name(name)
            .account_type(CategoryType::BanksAndCash)
            .category_uuid(Uuid::new_v4())
            .account_number(number)
            .build()
            .unwrap()
    }

    #[test]
    fn test_record_list_put_and_remove() {
        let mut cache = DataCache::new();
        let a = create_test_account("A", "1");
        let b = create_test_account("B", "2");
        let c = create_test_account("C", "3");
        cache.put(a.clone());
        cache.put(b.clone());
        cache.put(c.clone());

        assert_eq!(cache.remove::<Account>(b.uuid).unwrap().name, "B");
        assert_eq!(cache.all::<Account>().len(), 2);
        assert_eq!(cache.get::<Account>(c.uuid).unwrap().name, "C", "index shifted after removal");

        let renamed = a.to_builder().name("A2").build().unwrap();
        cache.put(renamed);
        assert_eq!(cache.all::<Account>()[0].name, "A2", "put replaces in place");
    }

    #[test]
    fn test_account_by_number_ignores_spaces_and_disabled() {
        let mut cache = DataCache::new();
        let active = create_test_account("Active", "4081 7810");
        let closed = create_test_account("Closed", "5555").enable(false);
        cache.put(active.clone());
        cache.put(closed);

        assert_eq!(cache.account_by_number("40817810").unwrap().uuid, active.uuid);
        assert!(cache.account_by_number("5555").is_none());
        assert!(cache.account_by_number(" ").is_none());
    }

    #[test]
    fn test_cards_by_account_only_enabled() {
        let mut cache = DataCache::new();
        let account = create_test_account("Card account", "1");
        cache.put(Card::new(account.uuid, CardType::Visa, "4111 1111"));
        cache.put(Card::new(account.uuid, CardType::Mir, "2200 0000").with_enabled(false));
        cache.put(Card::new(Uuid::new_v4(), CardType::Visa, "4000"));

        let cards = cache.cards_by_account(account.uuid);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].card_type, CardType::Visa);
    }

    #[test]
    fn test_currency_lookup_and_default() {
        let mut cache = DataCache::new();
        cache.put(Currency::new("USD", "US Dollar"));
        cache.put(Currency::new("RUB", "Russian Ruble").with_default(true));

        assert_eq!(cache.default_currency().unwrap().symbol, "RUB");
        assert_eq!(cache.currency_by_name("us dollar").unwrap().symbol, "USD");
    }

    #[test]
    fn test_unique_comments_and_details() {
        let mut cache = DataCache::new();
        let cash = create_test_account("Cash", "");
        let shop = create_test_account("Shop", "");
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let parent = Transaction::builder()
            .amount(dec!(10))
            .transaction_date(date)
            .debited(&cash)
            .credited(&shop)
            .comment("groceries")
            .detailed(true)
            .build()
            .unwrap();
        let child = Transaction::builder()
            .amount(dec!(4))
            .transaction_date(date)
            .debited(&cash)
            .credited(&shop)
            .comment("groceries")
            .parent_uuid(Some(parent.uuid))
            .build()
            .unwrap();
        cache.put(parent.clone());
        cache.put(child);

        assert_eq!(cache.unique_comments(), vec!["groceries".to_string()]);
        assert_eq!(cache.transaction_details(parent.uuid).len(), 1);
        assert_eq!(cache.transaction_count_for_account(cash.uuid), 2);
        assert_eq!(cache.calculate_balance(&cash, false, |_| true), dec!(-10));
    }
}
