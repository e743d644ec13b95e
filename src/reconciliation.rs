// Reconciliation - match bank statement records against the ledger
//
// Every statement record is matched to the account's transactions by
// date and absolute amount. The report then compares the bank's view
// with the ledger's:
//   statement balance (when reported)  vs  account balance
//   statement net sum (otherwise)      vs  net sum of matched transactions

use crate::cache::DataCache;
use crate::dao::MoneyDao;
use crate::entities::{Account, Transaction};
use crate::error::{MoneyError, Result};
use crate::statements::{Statement, StatementRecord, StatementType};
use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

// ============================================================================
// STATEMENT MATCHER
// ============================================================================

/// Predicate deciding whether a transaction corresponds to a record
#[derive(Debug, Clone, Copy)]
pub struct StatementMatcher {
    account_uuid: Uuid,
    ignore_execution_date: bool,
}

impl StatementMatcher {
    pub fn new(account_uuid: Uuid, ignore_execution_date: bool) -> Self {
        StatementMatcher {
            account_uuid,
            ignore_execution_date,
        }
    }

    pub fn matches(&self, record: &StatementRecord, t: &Transaction) -> bool {
        if !t.touches(self.account_uuid) || t.is_detail() {
            return false;
        }
        if t.transaction_date != record.actual {
            return false;
        }
        if !self.ignore_execution_date && t.statement_date != record.execution {
            return false;
        }
        match record.account_amount_decimal() {
            Some(amount) => t.amount_for(self.account_uuid).abs() == amount.abs(),
            None => false,
        }
    }

    pub fn find<'a>(&self, record: &StatementRecord, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        transactions.iter().filter(|t| self.matches(record, t)).collect()
    }
}

// ============================================================================
// RECONCILIATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconciliationResult {
    /// Bank and ledger agree within tolerance
    Balanced {
        expected_balance: Decimal,
        actual_balance: Decimal,
    },

    /// Off by less than the major threshold
    MinorDiscrepancy {
        expected_balance: Decimal,
        actual_balance: Decimal,
        difference: Decimal,
        tolerance: Decimal,
    },

    /// Off by the major threshold or more
    MajorDiscrepancy {
        expected_balance: Decimal,
        actual_balance: Decimal,
        difference: Decimal,
        unmatched_records: usize,
    },
}

impl ReconciliationResult {
    pub fn is_balanced(&self) -> bool {
        matches!(self, ReconciliationResult::Balanced { .. })
    }

    pub fn has_discrepancy(&self) -> bool {
        !self.is_balanced()
    }

    pub fn difference(&self) -> Decimal {
        match self {
            ReconciliationResult::Balanced { .. } => Decimal::ZERO,
            ReconciliationResult::MinorDiscrepancy { difference, .. } => *difference,
            ReconciliationResult::MajorDiscrepancy { difference, .. } => *difference,
        }
    }
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

/// A statement record and the transactions it matched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMatch {
    pub record: StatementRecord,
    pub transactions: Vec<Uuid>,
    /// All matched transactions are already checked
    pub checked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discrepancy {
    pub description: String,
    pub amount: Decimal,
    pub category: DiscrepancyCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiscrepancyCategory {
    /// Record without a ledger transaction
    MissingTransaction,
    /// Record matched more than one transaction
    DuplicateTransaction,
    /// Balances differ
    AmountMismatch,
    /// Record matches only when the execution date is ignored
    DateMismatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub account_uuid: Uuid,
    pub account_name: String,
    pub statement_type: StatementType,
    pub account_number: String,
    /// Records with at least one match, newest first
    pub matches: Vec<RecordMatch>,
    /// Records without a match, newest first
    pub unmatched: Vec<StatementRecord>,
    pub record_count: usize,
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub result: ReconciliationResult,
    pub discrepancies: Vec<Discrepancy>,
    pub reconciled_at: chrono::DateTime<chrono::Utc>,
}

impl ReconciliationReport {
    pub fn is_balanced(&self) -> bool {
        self.result.is_balanced()
    }

    /// Distinct uuids of every matched transaction
    pub fn matched_transactions(&self) -> Vec<Uuid> {
        self.matches
            .iter()
            .flat_map(|m| m.transactions.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciliation for {} ({}): {} records, {} matched, {} unmatched, credits {:.2}, debits {:.2}, difference {:.2}",
            self.account_name,
            self.statement_type.name(),
            self.record_count,
            self.matches.len(),
            self.unmatched.len(),
            self.total_credits,
            self.total_debits,
            self.result.difference()
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine {
    /// Differences below this are balanced (default: 0.01)
    pub tolerance: Decimal,

    /// Threshold for minor vs major discrepancy (default: 10.00)
    pub major_discrepancy_threshold: Decimal,

    /// Match on the operation date only
    pub ignore_execution_date: bool,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine {
            tolerance: Decimal::new(1, 2),
            major_discrepancy_threshold: Decimal::new(1000, 2),
            ignore_execution_date: false,
        }
    }

    pub fn with_thresholds(tolerance: Decimal, major_threshold: Decimal) -> Self {
        ReconciliationEngine {
            tolerance,
            major_discrepancy_threshold: major_threshold,
            ..Self::new()
        }
    }

    pub fn with_ignore_execution_date(mut self, ignore: bool) -> Self {
        self.ignore_execution_date = ignore;
        self
    }

    /// Match every record of `statement` against `transactions` of `account`
    pub fn reconcile(
        &self,
        statement: &Statement,
        account: &Account,
        transactions: &[Transaction],
    ) -> ReconciliationReport {
        let matcher = StatementMatcher::new(account.uuid, self.ignore_execution_date);
        let relaxed = StatementMatcher::new(account.uuid, true);

        let mut records = statement.records.clone();
        records.sort_by(|a, b| b.actual.cmp(&a.actual));

        let mut matches = Vec::new();
        let mut unmatched = Vec::new();
        let mut discrepancies = Vec::new();
        let mut matched_sum = Decimal::ZERO;

        for record in records {
            let found = matcher.find(&record, transactions);
            if found.is_empty() {
                let amount = record.account_amount_decimal().unwrap_or_default();
                if !self.ignore_execution_date && !relaxed.find(&record, transactions).is_empty() {
                    discrepancies.push(Discrepancy {
                        description: format!(
                            "{} {}: execution date {} differs from the ledger",
                            record.actual, record.description, record.execution
                        ),
                        amount,
                        category: DiscrepancyCategory::DateMismatch,
                    });
                } else {
                    discrepancies.push(Discrepancy {
                        description: format!("{} {}: no matching transaction", record.actual, record.description),
                        amount,
                        category: DiscrepancyCategory::MissingTransaction,
                    });
                }
                unmatched.push(record);
                continue;
            }

            if found.len() > 1 {
                discrepancies.push(Discrepancy {
                    description: format!(
                        "{} {}: {} matching transactions",
                        record.actual,
                        record.description,
                        found.len()
                    ),
                    amount: record.account_amount_decimal().unwrap_or_default(),
                    category: DiscrepancyCategory::DuplicateTransaction,
                });
            }

            // One ledger movement per record
            matched_sum += signed_for(found[0], account.uuid);
            matches.push(RecordMatch {
                checked: found.iter().all(|t| t.checked),
                transactions: found.iter().map(|t| t.uuid).collect(),
                record,
            });
        }

        let total_credits = self.calculate_credits(statement);
        let total_debits = self.calculate_debits(statement);

        let (expected_balance, actual_balance) = match statement.balance {
            Some(balance) => (balance, account.balance()),
            None => (total_credits - total_debits, matched_sum),
        };
        let difference = (actual_balance - expected_balance).abs();

        let result = if difference < self.tolerance {
            ReconciliationResult::Balanced {
                expected_balance,
                actual_balance,
            }
        } else if difference < self.major_discrepancy_threshold {
            ReconciliationResult::MinorDiscrepancy {
                expected_balance,
                actual_balance,
                difference,
                tolerance: self.tolerance,
            }
        } else {
            ReconciliationResult::MajorDiscrepancy {
                expected_balance,
                actual_balance,
                difference,
                unmatched_records: unmatched.len(),
            }
        };

        if difference >= self.tolerance {
            discrepancies.push(Discrepancy {
                description: format!("Balance mismatch: {:.2} difference", difference),
                amount: difference,
                category: DiscrepancyCategory::AmountMismatch,
            });
        }

        debug!(
            "Reconciled {} records for {}: {} matched",
            statement.len(),
            account.name,
            matches.len()
        );

        ReconciliationReport {
            account_uuid: account.uuid,
            account_name: account.name.clone(),
            statement_type: statement.statement_type,
            account_number: statement.account_number.clone(),
            record_count: statement.len(),
            matches,
            unmatched,
            total_credits,
            total_debits,
            result,
            discrepancies,
            reconciled_at: chrono::Utc::now(),
        }
    }

    /// Sum of positive record amounts
    fn calculate_credits(&self, statement: &Statement) -> Decimal {
        statement
            .records
            .iter()
            .filter_map(StatementRecord::account_amount_decimal)
            .filter(|a| a.is_sign_positive())
            .sum()
    }

    /// Sum of negative record amounts, as a positive number
    fn calculate_debits(&self, statement: &Statement) -> Decimal {
        statement
            .records
            .iter()
            .filter_map(StatementRecord::account_amount_decimal)
            .filter(|a| a.is_sign_negative())
            .map(|a| a.abs())
            .sum()
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Movement of `t` as seen from the account: credits add, debits subtract
fn signed_for(t: &Transaction, account_uuid: Uuid) -> Decimal {
    if t.account_credited_uuid == account_uuid {
        t.credit_amount
    } else {
        -t.amount
    }
}

/// Account by uuid or by account/card number; falls back to the number
/// printed on the statement
pub fn resolve_account<'a>(cache: &'a DataCache, key: Option<&str>, statement: &Statement) -> Result<&'a Account> {
    let key = key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .unwrap_or(statement.account_number.as_str());

    if let Ok(uuid) = Uuid::parse_str(key) {
        return cache
            .get::<Account>(uuid)
            .ok_or_else(|| MoneyError::not_found("account", uuid));
    }

    let number = key.replace(' ', "");
    let account = cache.account_by_number(&number).or_else(|| {
        cache
            .all::<Account>()
            .iter()
            .find(|a| a.enabled && !number.is_empty() && a.card_number_no_spaces() == number)
    });

    match account {
        Some(account) => {
            info!("Statement account resolved to {}", account.name);
            Ok(account)
        }
        None => Err(MoneyError::validation(format!("no account matches '{}'", key))),
    }
}

/// Reconcile a parsed statement against the ledger. With `check` every
/// matched transaction is flagged as checked afterwards.
pub fn reconcile_statement(
    dao: &mut MoneyDao,
    engine: &ReconciliationEngine,
    mut statement: Statement,
    account_key: Option<&str>,
    check: bool,
) -> Result<ReconciliationReport> {
    let report = {
        let cache = dao.cache();
        statement.resolve_currencies(cache);
        let account = resolve_account(cache, account_key, &statement)?;
        engine.reconcile(&statement, account, cache.all::<Transaction>())
    };

    if check {
        let checked = dao.check_transactions(&report.matched_transactions(), true)?;
        info!("Marked {} transactions as checked", checked);
    }
    info!("{}", report.summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Category, CategoryType};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_account(name: &str, number: &str) -> Account {
        Account::builder()
            .name(name)
            .account_number(number)
            .account_type(CategoryType::BanksAndCash)
            .category_uuid(Uuid::new_v4())
            .build()
            .unwrap()
    }

    fn create_test_transaction(from: &Account, to: &Account, amount: Decimal, day: u32, posted: u32) -> Transaction {
        Transaction::builder()
            .amount(amount)
            .transaction_date(date(2024, 3, day))
            .statement_date(date(2024, 3, posted))
            .debited(from)
            .credited(to)
            .build()
            .unwrap()
    }

    fn record(day: u32, posted: u32, amount: &str) -> StatementRecord {
        StatementRecord::new(date(2024, 3, day), amount).with_execution(date(2024, 3, posted))
    }

    #[test]
    fn test_matcher_dates_and_amount() {
        let card = create_test_account("Card", "1");
        let shop = create_test_account("Shop", "");
        let t = create_test_transaction(&card, &shop, dec!(250.50), 1, 3);

        let strict = StatementMatcher::new(card.uuid, false);
        assert!(strict.matches(&record(1, 3, "-250,50"), &t));
        assert!(!strict.matches(&record(1, 2, "-250.50"), &t), "execution date differs");
        assert!(!strict.matches(&record(2, 3, "-250.50"), &t), "actual date differs");
        assert!(!strict.matches(&record(1, 3, "-250.00"), &t), "amount differs");

        let relaxed = StatementMatcher::new(card.uuid, true);
        assert!(relaxed.matches(&record(1, 2, "-250.50"), &t));

        let other = StatementMatcher::new(Uuid::new_v4(), true);
        assert!(!other.matches(&record(1, 3, "-250.50"), &t), "other account");
    }

    #[test]
    fn test_matcher_uses_credit_side_amount() {
        let rub = create_test_account("RUB", "1");
        let usd = create_test_account("USD", "2");
        let t = Transaction::builder()
            .amount(dec!(9000))
            .credit_amount(dec!(100))
            .transaction_date(date(2024, 3, 5))
            .debited(&rub)
            .credited(&usd)
            .build()
            .unwrap();

        let matcher = StatementMatcher::new(usd.uuid, true);
        assert!(matcher.matches(&record(5, 5, "100.00"), &t));
        assert!(!matcher.matches(&record(5, 5, "9000.00"), &t));
    }

    #[test]
    fn test_matcher_skips_details() {
        let card = create_test_account("Card", "1");
        let shop = create_test_account("Shop", "");
        let parent = create_test_transaction(&card, &shop, dec!(10), 1, 1);
        let child = parent.with_parent(Some(Uuid::new_v4()));
        let matcher = StatementMatcher::new(card.uuid, false);
        assert!(!matcher.matches(&record(1, 1, "-10"), &child));
    }

    #[test]
    fn test_reconcile_balanced_by_net_sum() {
        let card = create_test_account("Card", "1");
        let shop = create_test_account("Shop", "");
        let salary = create_test_account("Salary", "");
        let transactions = vec![
            create_test_transaction(&card, &shop, dec!(100), 1, 1),
            create_test_transaction(&salary, &card, dec!(1000), 2, 2),
        ];
        let statement = Statement::new(
            StatementType::RaiffeisenCsvNew,
            "",
            vec![record(1, 1, "-100.00"), record(2, 2, "1000.00")],
        );

        let report = ReconciliationEngine::new().reconcile(&statement, &card, &transactions);
        assert!(report.is_balanced(), "{}", report.summary());
        assert_eq!(report.matches.len(), 2);
        assert_eq!(report.matches[0].record.actual, date(2024, 3, 2), "newest first");
        assert_eq!(report.total_credits, dec!(1000));
        assert_eq!(report.total_debits, dec!(100));
        assert_eq!(report.matched_transactions().len(), 2);
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn test_reconcile_reports_missing_and_date_mismatch() {
        let card = create_test_account("Card", "1");
        let shop = create_test_account("Shop", "");
        let transactions = vec![create_test_transaction(&card, &shop, dec!(5), 1, 2)];
        let statement = Statement::new(
            StatementType::AlfaBankCsv,
            "",
            vec![record(1, 4, "-5.00"), record(3, 3, "-50.00")],
        );

        let report = ReconciliationEngine::new().reconcile(&statement, &card, &transactions);
        assert_eq!(report.unmatched.len(), 2);
        assert!(matches!(report.result, ReconciliationResult::MajorDiscrepancy { unmatched_records: 2, .. }));
        let categories: Vec<_> = report.discrepancies.iter().map(|d| d.category.clone()).collect();
        assert!(categories.contains(&DiscrepancyCategory::MissingTransaction));
        assert!(categories.contains(&DiscrepancyCategory::DateMismatch));
        assert!(categories.contains(&DiscrepancyCategory::AmountMismatch));

        let relaxed = ReconciliationEngine::new()
            .with_ignore_execution_date(true)
            .reconcile(&statement, &card, &transactions);
        assert_eq!(relaxed.matches.len(), 1);
    }

    #[test]
    fn test_reconcile_against_statement_balance() {
        let card = create_test_account("Card", "1")
            .to_builder()
            .opening_balance(dec!(100))
            .totals(dec!(-5), Decimal::ZERO)
            .build()
            .unwrap();
        let statement = Statement::new(StatementType::RaiffeisenOfx, "1", Vec::new()).with_balance(Some(dec!(100)));

        let report = ReconciliationEngine::new().reconcile(&statement, &card, &[]);
        assert!(matches!(report.result, ReconciliationResult::MinorDiscrepancy { .. }));
        assert_eq!(report.result.difference(), dec!(5));
    }

    #[test]
    fn test_resolve_account() {
        let mut cache = DataCache::new();
        let account = create_test_account("Current", "4081 7810");
        cache.put(account.clone());
        let statement = Statement::new(StatementType::AlfaBankCsv, "40817810", Vec::new());

        assert_eq!(resolve_account(&cache, None, &statement).unwrap().uuid, account.uuid);
        let by_uuid = account.uuid.to_string();
        assert_eq!(resolve_account(&cache, Some(&by_uuid), &statement).unwrap().uuid, account.uuid);
        assert!(resolve_account(&cache, Some("999"), &statement).is_err());
    }

    #[test]
    fn test_reconcile_statement_checks_matches() {
        let mut dao = MoneyDao::open_in_memory().unwrap();
        let category = dao.insert(Category::new("Banks", CategoryType::BanksAndCash)).unwrap();
        let mut store = |name: &str, number: &str| {
            let account = create_test_account(name, number)
                .to_builder()
                .category_uuid(category.uuid)
                .build()
                .unwrap();
            dao.insert_account(account).unwrap()
        };
        let card = store("Card", "40817810");
        let shop = store("Shop", "");
        let t = dao
            .insert_transaction(create_test_transaction(&card, &shop, dec!(42), 7, 7))
            .unwrap();
        let statement = Statement::new(StatementType::AlfaBankCsv, "40817810", vec![record(7, 7, "-42.00")]);

        let report = reconcile_statement(&mut dao, &ReconciliationEngine::new(), statement, None, true).unwrap();
        assert_eq!(report.account_uuid, card.uuid);
        assert_eq!(report.matched_transactions(), vec![t.uuid]);
        assert!(!report.matches[0].checked, "report shows the state before checking");
        assert!(dao.get::<Transaction>(t.uuid).unwrap().checked);
    }
}
