//! Point-in-time account balances.
//!
//! Balances are never stored: they are folded from the opening balance of the
//! account and every transaction that touches it. All functions here are pure
//! and do not depend on the order of the transactions.

use serde::Serialize;
use uuid::Uuid;

use crate::{
    accounts::{Account, AccountKind},
    transactions::{Movement, Transaction},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub account_id: Uuid,
    /// Opening balance plus every movement. Negative on a credit card means
    /// money owed.
    pub current: i64,
    /// What can still be spent: the current balance, or the remaining credit
    /// for a credit card.
    pub available: i64,
    /// Amount owed on a credit card; always 0 for other accounts.
    pub pending: i64,
}

/// Signed effect of `tx` on `account_id`.
fn delta(tx: &Transaction, account_id: Uuid) -> i64 {
    let mut delta = 0i64;
    if tx.account_id == account_id {
        delta = match tx.movement {
            Movement::Income { .. } => delta.saturating_add(tx.amount),
            Movement::Expense { .. } | Movement::Transfer { .. } => delta.saturating_sub(tx.amount),
        };
    }
    if tx.to_account_id() == Some(account_id) {
        delta = delta.saturating_add(tx.amount);
    }
    delta
}

pub fn compute_balance(account: &Account, transactions: &[Transaction]) -> AccountBalance {
    let current = transactions
        .iter()
        .map(|tx| delta(tx, account.id))
        .fold(account.balance, i64::saturating_add);

    match account.kind {
        AccountKind::CreditCard { credit_limit, .. } => {
            let pending = current.checked_neg().unwrap_or(i64::MAX).max(0);
            AccountBalance {
                account_id: account.id,
                current,
                available: credit_limit.saturating_sub(pending),
                pending,
            }
        }
        _ => AccountBalance {
            account_id: account.id,
            current,
            available: current,
            pending: 0,
        },
    }
}

/// Balances of the active accounts, in account order.
pub fn compute_all_balances(accounts: &[Account], transactions: &[Transaction]) -> Vec<AccountBalance> {
    accounts
        .iter()
        .filter(|account| account.is_active)
        .map(|account| compute_balance(account, transactions))
        .collect()
}

/// Sum of the current balances.
pub fn net_worth(balances: &[AccountBalance]) -> i64 {
    balances
        .iter()
        .map(|balance| balance.current)
        .fold(0, i64::saturating_add)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::{
        accounts::NewAccount,
        container::Mirrored,
        transactions::NewTransaction,
    };

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn account(name: &str, kind: AccountKind, balance: i64) -> Account {
        Account::create(NewAccount::new(name, kind, balance), Uuid::new_v4(), Utc::now()).unwrap()
    }

    fn tx(input: NewTransaction) -> Transaction {
        Transaction::create(input, Uuid::new_v4(), Utc::now()).unwrap()
    }

    fn card(credit_limit: i64) -> AccountKind {
        AccountKind::CreditCard {
            credit_limit,
            statement_day: Some(15),
            payment_day: Some(10),
        }
    }

    #[test]
    fn expense_and_income_move_a_bank_balance() {
        let bank = account("Bank", AccountKind::Bank, 10_000);
        let txs = vec![
            tx(NewTransaction::expense("rent", 3_000, "生活費", bank.id, day())),
            tx(NewTransaction::income("refund", 2_000, "その他", bank.id, day())),
        ];

        let balance = compute_balance(&bank, &txs);
        assert_eq!(balance.current, 9_000);
        assert_eq!(balance.available, 9_000);
        assert_eq!(balance.pending, 0);
    }

    #[test]
    fn credit_card_tracks_pending_and_available() {
        let card = account("Card", card(50_000), 0);
        let txs = vec![tx(NewTransaction::expense(
            "groceries",
            12_000,
            "食費",
            card.id,
            day(),
        ))];

        let balance = compute_balance(&card, &txs);
        assert_eq!(balance.current, -12_000);
        assert_eq!(balance.pending, 12_000);
        assert_eq!(balance.available, 38_000);
        assert_eq!(balance.available + balance.pending, 50_000);
    }

    #[test]
    fn credit_card_in_credit_has_nothing_pending() {
        let card = account("Card", card(50_000), 0);
        let txs = vec![tx(NewTransaction::income("cashback", 500, "その他", card.id, day()))];

        let balance = compute_balance(&card, &txs);
        assert_eq!(balance.current, 500);
        assert_eq!(balance.pending, 0);
        assert_eq!(balance.available, 50_000);
    }

    #[test]
    fn transfers_conserve_the_total() {
        let a = account("A", AccountKind::Bank, 20_000);
        let b = account("B", AccountKind::Cash, 1_000);
        let txs = vec![tx(NewTransaction::transfer("withdraw", 5_000, a.id, b.id, day()))];

        let balance_a = compute_balance(&a, &txs);
        let balance_b = compute_balance(&b, &txs);
        assert_eq!(balance_a.current, 15_000);
        assert_eq!(balance_b.current, 6_000);
        assert_eq!(balance_a.current + balance_b.current, 21_000);
    }

    #[test]
    fn unrelated_transactions_are_ignored() {
        let a = account("A", AccountKind::Bank, 100);
        let other = Uuid::new_v4();
        let txs = vec![tx(NewTransaction::expense("x", 50, "食費", other, day()))];
        assert_eq!(compute_balance(&a, &txs).current, 100);
    }

    #[test]
    fn order_does_not_matter() {
        let a = account("A", AccountKind::Bank, 0);
        let b = account("B", AccountKind::Bank, 0);
        let mut txs = vec![
            tx(NewTransaction::income("salary", 300_000, "その他", a.id, day())),
            tx(NewTransaction::transfer("move", 50_000, a.id, b.id, day())),
            tx(NewTransaction::expense("rent", 80_000, "生活費", a.id, day())),
        ];
        let forward = compute_balance(&a, &txs);
        txs.reverse();
        assert_eq!(compute_balance(&a, &txs), forward);
        assert_eq!(forward.current, 170_000);
    }

    #[test]
    fn only_active_accounts_are_listed() {
        let active = account("A", AccountKind::Bank, 1_000);
        let mut inactive = account("B", AccountKind::Bank, 2_000);
        inactive.is_active = false;

        let balances = compute_all_balances(&[active.clone(), inactive], &[]);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].account_id, active.id);
        assert_eq!(net_worth(&balances), 1_000);
    }
}
