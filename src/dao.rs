// Money DAO - the only writer of the ledger
//
// Every public operation runs inside one SQL transaction. The cache is
// updated alongside the database; when the transaction fails it is
// rolled back and the cache is reloaded from the database, so neither
// side keeps a partial change.

use crate::cache::{Cached, DataCache};
use crate::db;
use crate::entities::{
    Account, Card, Category, Contact, Currency, ExchangeSecurity, Icon, MoneyDocument, MoneyRecord,
    PeriodicPayment, Transaction, TransactionBuilder,
};
use crate::error::{MoneyError, Result};
use crate::ledger;
use crate::repository::{self, Repository};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// Everything in the ledger, in dependency order
#[derive(Debug, Clone, Default)]
pub struct MoneyDump {
    pub icons: Vec<Icon>,
    pub categories: Vec<Category>,
    pub currencies: Vec<Currency>,
    pub securities: Vec<ExchangeSecurity>,
    pub accounts: Vec<Account>,
    pub cards: Vec<Card>,
    pub contacts: Vec<Contact>,
    pub transactions: Vec<Transaction>,
    pub documents: Vec<MoneyDocument>,
    pub periodic_payments: Vec<PeriodicPayment>,
    /// Document content keyed by document uuid
    pub blobs: Vec<(Uuid, Vec<u8>)>,
}

impl MoneyDump {
    /// Top-level transactions first so children never precede their parent
    pub fn transactions_parents_first(&self) -> Vec<Transaction> {
        parents_first(&self.transactions)
    }

    pub fn record_count(&self) -> usize {
        self.icons.len()
            + self.categories.len()
            + self.currencies.len()
            + self.securities.len()
            + self.accounts.len()
            + self.cards.len()
            + self.contacts.len()
            + self.transactions.len()
            + self.documents.len()
            + self.periodic_payments.len()
    }
}

/// Entities stored with plain CRUD and no derived data
pub trait SimpleRecord: Repository + Cached {}

impl SimpleRecord for Icon {}
impl SimpleRecord for Category {}
impl SimpleRecord for Currency {}
impl SimpleRecord for ExchangeSecurity {}
impl SimpleRecord for Card {}
impl SimpleRecord for Contact {}
impl SimpleRecord for MoneyDocument {}
impl SimpleRecord for PeriodicPayment {}

pub struct MoneyDao {
    conn: Connection,
    cache: DataCache,
}

impl MoneyDao {
    pub fn open(path: &Path) -> Result<Self> {
        Self::with_connection(db::open_database(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(db::open_in_memory()?)
    }

    /// Wraps an open connection: creates missing tables and loads the cache
    pub fn with_connection(conn: Connection) -> Result<Self> {
        db::setup_database(&conn)?;
        let mut dao = MoneyDao {
            conn,
            cache: DataCache::new(),
        };
        dao.preload()?;
        Ok(dao)
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Reload every entity from the database
    pub fn preload(&mut self) -> Result<()> {
        let conn = &self.conn;
        let mut cache = DataCache::new();
        cache.replace_all(Icon::get_all(conn)?);
        cache.replace_all(Category::get_all(conn)?);
        cache.replace_all(Currency::get_all(conn)?);
        cache.replace_all(ExchangeSecurity::get_all(conn)?);
        cache.replace_all(Account::get_all(conn)?);
        cache.replace_all(Card::get_all(conn)?);
        cache.replace_all(Contact::get_all(conn)?);
        cache.replace_all(Transaction::get_all(conn)?);
        cache.replace_all(MoneyDocument::get_all(conn)?);
        cache.replace_all(PeriodicPayment::get_all(conn)?);
        debug!(
            "Preloaded {} accounts, {} transactions",
            cache.all::<Account>().len(),
            cache.all::<Transaction>().len()
        );
        self.cache = cache;
        Ok(())
    }

    /// Run `f` in one SQL transaction; commit on success, roll back and
    /// resync the cache on failure
    pub fn with_transaction<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection, &mut DataCache) -> Result<R>,
    {
        let result = {
            let tx = self.conn.transaction()?;
            match f(&*tx, &mut self.cache) {
                Ok(value) => tx.commit().map(|_| value).map_err(MoneyError::from),
                Err(e) => Err(e),
            }
        };

        if let Err(ref e) = result {
            warn!("Rolled back: {}", e);
            if let Err(reload) = self.preload() {
                error!("Cache reload after rollback failed: {}", reload);
            }
        }
        result
    }

    // ========================================================================
    // SIMPLE ENTITIES
    // ========================================================================

    pub fn get<T: Cached>(&self, uuid: Uuid) -> Option<&T> {
        self.cache.get(uuid)
    }

    pub fn insert<T: SimpleRecord>(&mut self, record: T) -> Result<T> {
        record.validate()?;
        self.with_transaction(|conn, cache| {
            T::insert(conn, &record)?;
            cache.put(record.clone());
            Ok(record)
        })
    }

    pub fn update<T: SimpleRecord>(&mut self, record: T) -> Result<T> {
        record.validate()?;
        self.with_transaction(|conn, cache| {
            T::update(conn, &record)?;
            cache.put(record.clone());
            Ok(record)
        })
    }

    /// Insert or replace
    pub fn put<T: SimpleRecord>(&mut self, record: T) -> Result<T> {
        if self.cache.get::<T>(record.uuid()).is_some() {
            self.update(record)
        } else {
            self.insert(record)
        }
    }

    pub fn delete<T: SimpleRecord>(&mut self, uuid: Uuid) -> Result<()> {
        self.with_transaction(|conn, cache| {
            if !T::delete(conn, uuid)? {
                return Err(MoneyError::not_found(T::ENTITY, uuid));
            }
            cache.remove::<T>(uuid);
            Ok(())
        })
    }

    // ========================================================================
    // ACCOUNTS
    // ========================================================================

    /// Totals always come from the ledger, whatever the record carries
    pub fn insert_account(&mut self, account: Account) -> Result<Account> {
        account.validate()?;
        self.with_transaction(|conn, cache| {
            let (total, waiting) = cache.account_totals(&account);
            let account = Account {
                total,
                total_waiting: waiting,
                ..account
            };
            Account::insert(conn, &account)?;
            cache.put(account.clone());
            Ok(account)
        })
    }

    pub fn update_account(&mut self, account: Account) -> Result<Account> {
        account.validate()?;
        self.with_transaction(|conn, cache| {
            let (total, waiting) = cache.account_totals(&account);
            let account = Account {
                total,
                total_waiting: waiting,
                ..account
            };
            Account::update(conn, &account)?;
            cache.put(account.clone());
            Ok(account)
        })
    }

    pub fn put_account(&mut self, account: Account) -> Result<Account> {
        if self.cache.get::<Account>(account.uuid).is_some() {
            self.update_account(account)
        } else {
            self.insert_account(account)
        }
    }

    pub fn delete_account(&mut self, uuid: Uuid) -> Result<()> {
        let used = self.cache.transaction_count_for_account(uuid);
        if used > 0 {
            return Err(MoneyError::validation(format!(
                "account {} is used by {} transactions",
                uuid, used
            )));
        }
        self.with_transaction(|conn, cache| {
            if !Account::delete(conn, uuid)? {
                return Err(MoneyError::not_found(Account::ENTITY, uuid));
            }
            cache.remove::<Account>(uuid);
            Ok(())
        })
    }

    // ========================================================================
    // TRANSACTIONS
    // ========================================================================

    pub fn insert_transaction(&mut self, transaction: Transaction) -> Result<Transaction> {
        self.insert_transactions(vec![transaction])
            .map(|mut inserted| inserted.remove(0))
    }

    pub fn insert_transactions(&mut self, transactions: Vec<Transaction>) -> Result<Vec<Transaction>> {
        for t in &transactions {
            t.validate()?;
        }
        self.with_transaction(|conn, cache| {
            Transaction::insert_all(conn, &transactions)?;
            for t in &transactions {
                cache.put(t.clone());
            }
            update_accounts(conn, cache, &transactions)?;
            Ok(transactions)
        })
    }

    /// Build and insert, creating the contact named in the builder first
    pub fn create_transaction(&mut self, mut builder: TransactionBuilder) -> Result<Transaction> {
        let new_contact = builder.take_new_contact_name();
        let cache = &self.cache;
        let builder = builder.resolve_accounts(|uuid| cache.get::<Account>(uuid).cloned())?;

        self.with_transaction(|conn, cache| {
            let builder = match new_contact {
                Some(name) => {
                    let contact = Contact::new(name);
                    Contact::insert(conn, &contact)?;
                    cache.put(contact.clone());
                    info!("Created contact '{}' for new transaction", contact.name);
                    builder.contact_uuid(Some(contact.uuid))
                }
                None => builder,
            };
            let transaction = builder.build()?;
            Transaction::insert(conn, &transaction)?;
            cache.put(transaction.clone());
            update_accounts(conn, cache, std::slice::from_ref(&transaction))?;
            Ok(transaction)
        })
    }

    pub fn update_transaction(&mut self, transaction: Transaction) -> Result<Transaction> {
        self.update_transactions(vec![transaction])
            .map(|mut updated| updated.remove(0))
    }

    /// Old and new versions both feed the account recompute, so a
    /// transaction moved between accounts fixes both
    pub fn update_transactions(&mut self, transactions: Vec<Transaction>) -> Result<Vec<Transaction>> {
        for t in &transactions {
            t.validate()?;
        }
        self.with_transaction(|conn, cache| {
            let mut affected = Vec::with_capacity(transactions.len() * 2);
            for t in &transactions {
                let old = cache
                    .get::<Transaction>(t.uuid)
                    .cloned()
                    .ok_or_else(|| MoneyError::not_found(Transaction::ENTITY, t.uuid))?;
                Transaction::update(conn, t)?;
                cache.put(t.clone());
                affected.push(old);
                affected.push(t.clone());
            }
            update_accounts(conn, cache, &affected)?;
            Ok(transactions)
        })
    }

    pub fn put_transaction(&mut self, transaction: Transaction) -> Result<Transaction> {
        if self.cache.get::<Transaction>(transaction.uuid).is_some() {
            self.update_transaction(transaction)
        } else {
            self.insert_transaction(transaction)
        }
    }

    pub fn delete_transaction(&mut self, uuid: Uuid) -> Result<()> {
        self.delete_transactions(&[uuid])
    }

    /// Deleting a parent also deletes its split details
    pub fn delete_transactions(&mut self, uuids: &[Uuid]) -> Result<()> {
        self.with_transaction(|conn, cache| {
            let mut removed = Vec::new();
            let mut seen = HashSet::new();
            for &uuid in uuids {
                let transaction = cache
                    .get::<Transaction>(uuid)
                    .cloned()
                    .ok_or_else(|| MoneyError::not_found(Transaction::ENTITY, uuid))?;

                let details: Vec<Transaction> = cache.transaction_details(uuid).into_iter().cloned().collect();
                for detail in details.into_iter().chain(std::iter::once(transaction)) {
                    if seen.insert(detail.uuid) {
                        Transaction::delete(conn, detail.uuid)?;
                        cache.remove::<Transaction>(detail.uuid);
                        removed.push(detail);
                    }
                }
            }
            update_accounts(conn, cache, &removed)?;
            Ok(())
        })
    }

    /// Flip the checked flag; records already in the requested state are left alone
    pub fn check_transactions(&mut self, uuids: &[Uuid], checked: bool) -> Result<usize> {
        let changed: Vec<Transaction> = uuids
            .iter()
            .filter_map(|uuid| self.cache.get::<Transaction>(*uuid))
            .filter(|t| t.checked != checked)
            .map(|t| t.check(checked))
            .collect();
        if changed.is_empty() {
            return Ok(0);
        }
        let count = changed.len();
        self.update_transactions(changed)?;
        Ok(count)
    }

    // ========================================================================
    // DOCUMENTS
    // ========================================================================

    pub fn insert_document(&mut self, document: MoneyDocument, bytes: &[u8]) -> Result<MoneyDocument> {
        let document = document.normalized().with_size(bytes.len() as i64, false);
        document.validate()?;
        self.with_transaction(|conn, cache| {
            MoneyDocument::insert(conn, &document)?;
            repository::put_document_content(conn, document.uuid, bytes)?;
            cache.put(document.clone());
            Ok(document)
        })
    }

    pub fn put_document_bytes(&mut self, uuid: Uuid, bytes: &[u8]) -> Result<MoneyDocument> {
        let document = self
            .cache
            .get::<MoneyDocument>(uuid)
            .cloned()
            .ok_or_else(|| MoneyError::not_found(MoneyDocument::ENTITY, uuid))?;
        let document = document.with_size(bytes.len() as i64, false);
        self.with_transaction(|conn, cache| {
            MoneyDocument::update(conn, &document)?;
            repository::put_document_content(conn, uuid, bytes)?;
            cache.put(document.clone());
            Ok(document)
        })
    }

    pub fn document_bytes(&self, uuid: Uuid) -> Result<Vec<u8>> {
        repository::get_document_content(&self.conn, uuid)?
            .ok_or_else(|| MoneyError::not_found(MoneyDocument::ENTITY, uuid))
    }

    // ========================================================================
    // BULK
    // ========================================================================

    /// Recompute totals of every account
    pub fn recalculate_balances(&mut self) -> Result<usize> {
        self.with_transaction(|conn, cache| {
            let uuids: Vec<Uuid> = cache.all::<Account>().iter().map(|a| a.uuid).collect();
            write_account_totals(conn, cache, uuids.iter().copied())?;
            Ok(uuids.len())
        })
    }

    /// Replace the whole ledger with `dump`
    pub fn import_full_dump(&mut self, dump: &MoneyDump) -> Result<()> {
        info!("Importing full dump with {} records", dump.record_count());
        self.with_transaction(|conn, _| {
            db::drop_tables(conn)?;
            db::setup_database(conn)?;

            Icon::insert_all(conn, &dump.icons)?;
            Category::insert_all(conn, &dump.categories)?;
            Currency::insert_all(conn, &dump.currencies)?;
            ExchangeSecurity::insert_all(conn, &dump.securities)?;
            Account::insert_all(conn, &dump.accounts)?;
            Card::insert_all(conn, &dump.cards)?;
            Contact::insert_all(conn, &dump.contacts)?;
            Transaction::insert_all(conn, &dump.transactions_parents_first())?;
            MoneyDocument::insert_all(conn, &dump.documents)?;
            PeriodicPayment::insert_all(conn, &dump.periodic_payments)?;
            for (uuid, bytes) in &dump.blobs {
                repository::put_document_content(conn, *uuid, bytes)?;
            }
            Ok(())
        })?;
        self.preload()
    }

    /// Snapshot of the whole ledger
    pub fn export_dump(&self) -> Result<MoneyDump> {
        let cache = &self.cache;
        Ok(MoneyDump {
            icons: cache.all::<Icon>().to_vec(),
            categories: cache.all::<Category>().to_vec(),
            currencies: cache.all::<Currency>().to_vec(),
            securities: cache.all::<ExchangeSecurity>().to_vec(),
            accounts: cache.all::<Account>().to_vec(),
            cards: cache.all::<Card>().to_vec(),
            contacts: cache.all::<Contact>().to_vec(),
            transactions: parents_first(cache.all::<Transaction>()),
            documents: cache.all::<MoneyDocument>().to_vec(),
            periodic_payments: cache.all::<PeriodicPayment>().to_vec(),
            blobs: repository::get_all_document_content(&self.conn)?,
        })
    }
}

fn parents_first(transactions: &[Transaction]) -> Vec<Transaction> {
    let (parents, children): (Vec<&Transaction>, Vec<&Transaction>) =
        transactions.iter().partition(|t| !t.is_detail());
    parents.into_iter().chain(children).cloned().collect()
}

/// Recompute and store totals of every account the transactions touch
fn update_accounts(conn: &Connection, cache: &mut DataCache, transactions: &[Transaction]) -> Result<()> {
    let accounts = ledger::affected_accounts(transactions);
    write_account_totals(conn, cache, accounts.into_iter())
}

fn write_account_totals(
    conn: &Connection,
    cache: &mut DataCache,
    accounts: impl Iterator<Item = Uuid>,
) -> Result<()> {
    for uuid in accounts {
        let account = cache
            .get::<Account>(uuid)
            .cloned()
            .ok_or_else(|| MoneyError::not_found(Account::ENTITY, uuid))?;
        let (total, waiting) = cache.account_totals(&account);
        if total == account.total && waiting == account.total_waiting {
            continue;
        }
        let updated = account.update_balance(total, waiting);
        Account::update(conn, &updated)?;
        debug!("Account '{}' total {} waiting {}", updated.name, total, waiting);
        cache.put(updated);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CategoryType;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct Fixture {
        dao: MoneyDao,
        cash: Account,
        card: Account,
        food: Account,
    }

    fn create_account(dao: &mut MoneyDao, name: &str, category_type: CategoryType) -> Account {
        let category = dao.insert(Category::new(name, category_type)).unwrap();
        dao.insert_account(
            Account::builder()
                .name(name)
                .account_type(category_type)
                .category_uuid(category.uuid)
                .opening_balance(dec!(100))
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    fn setup() -> Fixture {
        let mut dao = MoneyDao::open_in_memory().unwrap();
        let cash = create_account(&mut dao, "Cash", CategoryType::BanksAndCash);
        let card = create_account(&mut dao, "Card", CategoryType::BanksAndCash);
        let food = create_account(&mut dao, "Food", CategoryType::Expenses);
        Fixture { dao, cash, card, food }
    }

    fn create_test_transaction(from: &Account, to: &Account, amount: Decimal) -> Transaction {
        Transaction::builder()
            .amount(amount)
            .transaction_date(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())
            .debited(from)
            .credited(to)
            .build()
            .unwrap()
    }

    fn stored_account(dao: &MoneyDao, uuid: Uuid) -> Account {
        Account::get(dao.connection(), uuid).unwrap().unwrap()
    }

    /// Cache, database and a fresh fold all agree
    fn assert_totals(dao: &MoneyDao, uuid: Uuid, total: Decimal, waiting: Decimal) {
        let cached = dao.get::<Account>(uuid).unwrap();
        assert_eq!(cached.total, total, "cached total of {}", cached.name);
        assert_eq!(cached.total_waiting, waiting, "cached waiting of {}", cached.name);
        let stored = stored_account(dao, uuid);
        assert_eq!(stored.total, total, "stored total of {}", stored.name);
        assert_eq!(stored.total_waiting, waiting, "stored waiting of {}", stored.name);
        assert_eq!(dao.cache().account_totals(cached), (total, waiting));
    }

    #[test]
    fn test_insert_transaction_updates_both_accounts() {
        let mut f = setup();
        f.dao
            .insert_transaction(create_test_transaction(&f.cash, &f.food, dec!(25.50)))
            .unwrap();

        assert_totals(&f.dao, f.cash.uuid, dec!(-25.50), dec!(-25.50));
        assert_totals(&f.dao, f.food.uuid, dec!(25.50), dec!(25.50));
        assert_eq!(f.dao.get::<Account>(f.cash.uuid).unwrap().balance(), dec!(74.50));
    }

    #[test]
    fn test_update_moving_account_fixes_old_and_new() {
        let mut f = setup();
        let tx = f
            .dao
            .insert_transaction(create_test_transaction(&f.cash, &f.food, dec!(10)))
            .unwrap();

        let moved = tx.to_builder().debited(&f.card).build().unwrap();
        f.dao.update_transaction(moved).unwrap();

        assert_totals(&f.dao, f.cash.uuid, dec!(0), dec!(0));
        assert_totals(&f.dao, f.card.uuid, dec!(-10), dec!(-10));
        assert_totals(&f.dao, f.food.uuid, dec!(10), dec!(10));
    }

    #[test]
    fn test_check_transactions_moves_waiting() {
        let mut f = setup();
        let a = f
            .dao
            .insert_transaction(create_test_transaction(&f.cash, &f.food, dec!(10)))
            .unwrap();
        let b = f
            .dao
            .insert_transaction(create_test_transaction(&f.cash, &f.food, dec!(5)))
            .unwrap();

        assert_eq!(f.dao.check_transactions(&[a.uuid], true).unwrap(), 1);
        assert_eq!(f.dao.check_transactions(&[a.uuid, b.uuid], true).unwrap(), 1, "a is already checked");
        assert_eq!(f.dao.check_transactions(&[a.uuid, b.uuid], true).unwrap(), 0);

        assert_totals(&f.dao, f.cash.uuid, dec!(-15), dec!(0));
    }

    #[test]
    fn test_delete_parent_removes_details() {
        let mut f = setup();
        let parent = create_test_transaction(&f.cash, &f.food, dec!(30))
            .to_builder()
            .detailed(true)
            .build()
            .unwrap();
        let child = create_test_transaction(&f.cash, &f.food, dec!(20)).with_parent(Some(parent.uuid));
        f.dao.insert_transactions(vec![parent.clone(), child.clone()]).unwrap();
        assert_totals(&f.dao, f.cash.uuid, dec!(-30), dec!(-30));

        f.dao.delete_transaction(parent.uuid).unwrap();

        assert!(f.dao.get::<Transaction>(child.uuid).is_none());
        assert_eq!(Transaction::count(f.dao.connection()).unwrap(), 0);
        assert_totals(&f.dao, f.cash.uuid, dec!(0), dec!(0));
    }

    #[test]
    fn test_failed_operation_rolls_back_cache_and_db() {
        let mut f = setup();
        let good = create_test_transaction(&f.cash, &f.food, dec!(10));
        let duplicate = good.clone();

        let result = f.dao.insert_transactions(vec![good.clone(), duplicate]);
        assert!(result.is_err());

        assert!(f.dao.get::<Transaction>(good.uuid).is_none(), "cache resynced");
        assert_eq!(Transaction::count(f.dao.connection()).unwrap(), 0);
        assert_totals(&f.dao, f.cash.uuid, dec!(0), dec!(0));
    }

    #[test]
    fn test_rollback_keeps_original_error_when_reload_fails() {
        let mut f = setup();
        f.dao.connection().execute("DROP TABLE periodic_payment", []).unwrap();

        let result: Result<()> = f
            .dao
            .with_transaction(|_, _| Err(MoneyError::validation("amount must be positive")));

        match result {
            Err(MoneyError::Validation(message)) => assert_eq!(message, "amount must be positive"),
            other => panic!("expected the operation's own error, got {:?}", other),
        }
    }

    #[test]
    fn test_client_totals_are_ignored() {
        let mut f = setup();
        f.dao
            .insert_transaction(create_test_transaction(&f.cash, &f.food, dec!(7)))
            .unwrap();

        let tampered = f
            .dao
            .get::<Account>(f.cash.uuid)
            .unwrap()
            .to_builder()
            .name("Wallet")
            .totals(dec!(1000), dec!(1000))
            .build()
            .unwrap();
        let saved = f.dao.put_account(tampered).unwrap();

        assert_eq!(saved.name, "Wallet");
        assert_totals(&f.dao, f.cash.uuid, dec!(-7), dec!(-7));
    }

    #[test]
    fn test_delete_account_in_use_rejected() {
        let mut f = setup();
        f.dao
            .insert_transaction(create_test_transaction(&f.cash, &f.food, dec!(1)))
            .unwrap();
        let err = f.dao.delete_account(f.cash.uuid).unwrap_err();
        assert!(matches!(err, MoneyError::Validation(_)));
        f.dao.delete_account(f.card.uuid).unwrap();
        assert!(f.dao.get::<Account>(f.card.uuid).is_none());
    }

    #[test]
    fn test_create_transaction_with_new_contact() {
        let mut f = setup();
        let builder = Transaction::builder()
            .amount(dec!(3))
            .transaction_date(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap())
            .debited(&f.cash)
            .credited(&f.food)
            .new_contact_name("Bakery");

        let tx = f.dao.create_transaction(builder).unwrap();

        let contact = f.dao.cache().contact_by_name("Bakery").unwrap();
        assert_eq!(tx.contact_uuid, Some(contact.uuid));
        assert_totals(&f.dao, f.food.uuid, dec!(3), dec!(3));
    }

    #[test]
    fn test_simple_put_and_delete() {
        let mut f = setup();
        let contact = f.dao.put(Contact::new("Alice")).unwrap();
        let renamed = f.dao.put(contact.clone().with_email("a@example.com")).unwrap();
        assert_eq!(renamed.uuid, contact.uuid);
        assert_eq!(f.dao.cache().all::<Contact>().len(), 1);

        f.dao.delete::<Contact>(contact.uuid).unwrap();
        assert!(f.dao.get::<Contact>(contact.uuid).is_none());
        assert!(matches!(
            f.dao.delete::<Contact>(contact.uuid),
            Err(MoneyError::NotFound { .. })
        ));
    }

    #[test]
    fn test_document_bytes() {
        let mut f = setup();
        let contact = f.dao.insert(Contact::new("Bank")).unwrap();
        let document = MoneyDocument::new(contact.uuid, "statement.pdf", NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        let stored = f.dao.insert_document(document, b"%PDF-1.7").unwrap();
        assert_eq!(stored.size, 8);
        assert_eq!(f.dao.document_bytes(stored.uuid).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn test_dump_round_trip_through_import() {
        let mut f = setup();
        let parent = create_test_transaction(&f.cash, &f.food, dec!(8));
        let child = create_test_transaction(&f.cash, &f.food, dec!(3)).with_parent(Some(parent.uuid));
        // child listed first on purpose
        f.dao.insert_transactions(vec![parent.clone()]).unwrap();
        f.dao.insert_transactions(vec![child.clone()]).unwrap();

        let mut dump = f.dao.export_dump().unwrap();
        dump.transactions.reverse();

        let mut other = MoneyDao::open_in_memory().unwrap();
        other.import_full_dump(&dump).unwrap();

        assert_eq!(other.cache().all::<Account>().len(), 3);
        assert_eq!(other.cache().all::<Transaction>().len(), 2);
        assert_totals(&other, f.cash.uuid, dec!(-8), dec!(-8));
        assert_eq!(other.recalculate_balances().unwrap(), 3);
    }
}
