// Balance ledger - derives account totals from transactions
//
//   total         = sum over the account's top-level transactions
//   total_waiting = the same sum restricted to unchecked transactions
//
// A transaction adds its credit amount to the credited account and
// subtracts its amount from the debited account. Split-detail children
// are ignored: their parent already carries the full amount.

use crate::entities::{Account, Transaction};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Fold over `transactions` for one account
///
/// When `include_opening` is set the fold starts from the opening balance
/// plus credit limit; otherwise it starts from zero.
pub fn calculate_balance<'a, I, F>(
    account: &Account,
    transactions: I,
    include_opening: bool,
    filter: F,
) -> Decimal
where
    I: IntoIterator<Item = &'a Transaction>,
    F: Fn(&Transaction) -> bool,
{
    let initial = if include_opening {
        account.opening_balance + account.account_limit
    } else {
        Decimal::ZERO
    };

    transactions
        .into_iter()
        .filter(|t| t.touches(account.uuid) && !t.is_detail() && filter(t))
        .fold(initial, |sum, t| {
            if t.account_credited_uuid == account.uuid {
                sum + t.credit_amount
            } else {
                sum - t.amount
            }
        })
}

/// Sum of credit amounts of top-level transactions
pub fn calculate_total<'a, I>(transactions: I) -> Decimal
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .filter(|t| !t.is_detail())
        .map(|t| t.credit_amount)
        .sum()
}

/// Distinct accounts referenced on either side of the given transactions
pub fn affected_accounts<'a, I>(transactions: I) -> BTreeSet<Uuid>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut accounts = BTreeSet::new();
    for t in transactions {
        accounts.insert(t.account_debited_uuid);
        accounts.insert(t.account_credited_uuid);
    }
    accounts
}

/// Fresh (total, total_waiting) pair for one account
pub fn account_totals<'a, I>(account: &Account, transactions: I) -> (Decimal, Decimal)
where
    I: IntoIterator<Item = &'a Transaction> + Clone,
{
    let total = calculate_balance(account, transactions.clone(), false, |_| true);
    let waiting = calculate_balance(account, transactions, false, |t| !t.checked);
    (total, waiting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CategoryType;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn create_test_account(name: &str, account_type: CategoryType) -> Account {
        Account::builder()
            .name(name)
            .account_type(account_type)
            .category_uuid(Uuid::new_v4())
            .opening_balance(dec!(1000))
            .account_limit(dec!(200))
            .build()
            .unwrap()
    }

    fn create_test_transaction(from: &Account, to: &Account, amount: Decimal, checked: bool) -> Transaction {
        Transaction::builder()
            .amount(amount)
            .transaction_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .debited(from)
            .credited(to)
            .checked(checked)
            .build()
            .unwrap()
    }

    #[test]
    fn test_calculate_balance_both_sides() {
        let cash = create_test_account("Cash", CategoryType::BanksAndCash);
        let food = create_test_account("Food", CategoryType::Expenses);
        let salary = create_test_account("Salary", CategoryType::Incomes);

        let transactions = vec![
            create_test_transaction(&salary, &cash, dec!(500), true),
            create_test_transaction(&cash, &food, dec!(120.50), true),
            create_test_transaction(&cash, &food, dec!(30), false),
        ];

        assert_eq!(calculate_balance(&cash, &transactions, false, |_| true), dec!(349.50));
        assert_eq!(calculate_balance(&cash, &transactions, true, |_| true), dec!(1549.50));
        assert_eq!(calculate_balance(&food, &transactions, false, |_| true), dec!(150.50));
        assert_eq!(calculate_balance(&salary, &transactions, false, |_| true), dec!(-500));
    }

    #[test]
    fn test_details_are_ignored() {
        let cash = create_test_account("Cash", CategoryType::BanksAndCash);
        let food = create_test_account("Food", CategoryType::Expenses);

        let parent = create_test_transaction(&cash, &food, dec!(100), true);
        let child = create_test_transaction(&cash, &food, dec!(60), true).with_parent(Some(parent.uuid));
        let transactions = vec![parent, child];

        assert_eq!(calculate_balance(&cash, &transactions, false, |_| true), dec!(-100));
        assert_eq!(calculate_total(&transactions), dec!(100));
    }

    #[test]
    fn test_account_totals_waiting_counts_unchecked() {
        let cash = create_test_account("Cash", CategoryType::BanksAndCash);
        let food = create_test_account("Food", CategoryType::Expenses);

        let transactions = vec![
            create_test_transaction(&cash, &food, dec!(10), true),
            create_test_transaction(&cash, &food, dec!(5), false),
        ];

        let (total, waiting) = account_totals(&cash, &transactions);
        assert_eq!(total, dec!(-15));
        assert_eq!(waiting, dec!(-5));
    }

    #[test]
    fn test_credit_amount_used_on_credited_side() {
        let rub = create_test_account("RUB", CategoryType::BanksAndCash);
        let usd = create_test_account("USD", CategoryType::BanksAndCash);

        let exchange = Transaction::builder()
            .amount(dec!(9000))
            .credit_amount(dec!(100))
            .transaction_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .debited(&rub)
            .credited(&usd)
            .build()
            .unwrap();
        let transactions = vec![exchange];

        assert_eq!(calculate_balance(&rub, &transactions, false, |_| true), dec!(-9000));
        assert_eq!(calculate_balance(&usd, &transactions, false, |_| true), dec!(100));
    }

    #[test]
    fn test_affected_accounts_are_distinct() {
        let cash = create_test_account("Cash", CategoryType::BanksAndCash);
        let food = create_test_account("Food", CategoryType::Expenses);
        let transactions = vec![
            create_test_transaction(&cash, &food, dec!(1), true),
            create_test_transaction(&cash, &food, dec!(2), true),
        ];

        let accounts = affected_accounts(&transactions);
        assert_eq!(accounts.len(), 2);
        assert!(accounts.contains(&cash.uuid));
        assert!(accounts.contains(&food.uuid));
    }
}
