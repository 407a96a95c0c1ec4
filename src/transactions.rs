//! Transaction writes. Every create, update and delete moves the owning
//! account's balance in the same ledger transaction.

use tracing::debug;

use crate::error::{invalid, PaydownError, Result};
use crate::ledger::Ledger;
use crate::models::{balance_effect, NewTransaction, Transaction, TransactionChanges};

fn validate_amount(amount: f64) -> Result<()> {
    if !(amount > 0.0) || !amount.is_finite() {
        return Err(invalid("amount must be greater than 0"));
    }
    Ok(())
}

fn ensure_account<L: Ledger>(ledger: &L, user_id: &str, account_id: i64) -> Result<()> {
    if ledger.find_accounts(user_id)?.iter().any(|a| a.id == account_id) {
        Ok(())
    } else {
        Err(PaydownError::NotFound(format!("account {account_id}")))
    }
}

pub fn record_transaction<L: Ledger>(ledger: &L, user_id: &str, txn: &NewTransaction) -> Result<Transaction> {
    validate_amount(txn.amount)?;
    if txn.bonus_amount.is_some_and(|b| b < 0.0) {
        return Err(invalid("bonus amount cannot be negative"));
    }
    ledger.in_transaction(|ledger| {
        ensure_account(ledger, user_id, txn.account_id)?;
        let created = ledger.create_transaction(user_id, txn)?;
        ledger.update_account_balance(created.account_id, created.balance_effect())?;
        debug!(id = created.id, kind = %created.kind, amount = created.amount, "transaction recorded");
        Ok(created)
    })
}

/// Apply `changes`, reversing the old balance effect and applying the new one
/// (on the new account when it moves).
pub fn update_transaction<L: Ledger>(
    ledger: &L,
    user_id: &str,
    id: i64,
    changes: &TransactionChanges,
) -> Result<Transaction> {
    if let Some(amount) = changes.amount {
        validate_amount(amount)?;
    }
    ledger.in_transaction(|ledger| {
        let old = ledger
            .get_transaction(user_id, id)?
            .ok_or_else(|| PaydownError::NotFound(format!("transaction {id}")))?;
        if let Some(account_id) = changes.account_id {
            ensure_account(ledger, user_id, account_id)?;
        }
        let updated = ledger.update_transaction(user_id, id, changes)?;

        ledger.update_account_balance(old.account_id, -old.balance_effect())?;
        ledger.update_account_balance(updated.account_id, updated.balance_effect())?;
        Ok(updated)
    })
}

pub fn delete_transaction<L: Ledger>(ledger: &L, user_id: &str, id: i64) -> Result<Transaction> {
    ledger.in_transaction(|ledger| {
        let txn = ledger
            .get_transaction(user_id, id)?
            .ok_or_else(|| PaydownError::NotFound(format!("transaction {id}")))?;
        ledger.delete_transaction(user_id, id)?;
        ledger.update_account_balance(txn.account_id, -balance_effect(txn.kind, txn.amount))?;
        Ok(txn)
    })
}

/// Toggle whether an income's bonus counts toward its next projected payout.
pub fn set_include_bonus_next<L: Ledger>(ledger: &L, user_id: &str, id: i64, include: bool) -> Result<()> {
    ledger.set_include_bonus_next(user_id, id, include)
}

/// Disabled transactions drop out of the upcoming feed and period totals.
pub fn set_disabled<L: Ledger>(ledger: &L, user_id: &str, id: i64, disabled: bool) -> Result<()> {
    ledger.set_transaction_disabled(user_id, id, disabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{add_account, new_txn, test_ledger};
    use crate::ledger::SqliteLedger;
    use crate::models::{AccountType, EntryKind};

    fn balance(ledger: &SqliteLedger, account_id: i64) -> f64 {
        ledger
            .find_accounts("u1")
            .unwrap()
            .into_iter()
            .find(|a| a.id == account_id)
            .unwrap()
            .balance
    }

    #[test]
    fn test_record_moves_balance() {
        let (_dir, ledger) = test_ledger();
        let account = add_account(&ledger, AccountType::Checking, 100.0);
        record_transaction(&ledger, "u1", &new_txn(account.id, EntryKind::Income, 50.0, "Refund")).unwrap();
        record_transaction(&ledger, "u1", &new_txn(account.id, EntryKind::Expense, 30.0, "Lunch")).unwrap();
        assert_eq!(balance(&ledger, account.id), 120.0);
    }

    #[test]
    fn test_record_rejects_non_positive_amount() {
        let (_dir, ledger) = test_ledger();
        let account = add_account(&ledger, AccountType::Checking, 0.0);
        let err = record_transaction(&ledger, "u1", &new_txn(account.id, EntryKind::Expense, 0.0, "Nothing"))
            .unwrap_err();
        assert!(matches!(err, PaydownError::Validation(_)));
        assert!(ledger.find_transactions("u1", &Default::default()).unwrap().is_empty());
    }

    #[test]
    fn test_record_against_foreign_account_fails() {
        let (_dir, ledger) = test_ledger();
        let account = add_account(&ledger, AccountType::Checking, 0.0);
        let err = record_transaction(&ledger, "u2", &new_txn(account.id, EntryKind::Expense, 5.0, "x")).unwrap_err();
        assert!(matches!(err, PaydownError::NotFound(_)));
        assert_eq!(balance(&ledger, account.id), 0.0);
    }

    #[test]
    fn test_update_reverses_old_effect() {
        let (_dir, ledger) = test_ledger();
        let checking = add_account(&ledger, AccountType::Checking, 0.0);
        let savings = add_account(&ledger, AccountType::Savings, 0.0);
        let txn = record_transaction(&ledger, "u1", &new_txn(checking.id, EntryKind::Expense, 40.0, "Fuel")).unwrap();

        let changes = TransactionChanges { amount: Some(60.0), ..Default::default() };
        update_transaction(&ledger, "u1", txn.id, &changes).unwrap();
        assert_eq!(balance(&ledger, checking.id), -60.0);

        let changes = TransactionChanges {
            account_id: Some(savings.id),
            kind: Some(EntryKind::Income),
            ..Default::default()
        };
        let moved = update_transaction(&ledger, "u1", txn.id, &changes).unwrap();
        assert_eq!(moved.amount, 60.0);
        assert_eq!(balance(&ledger, checking.id), 0.0);
        assert_eq!(balance(&ledger, savings.id), 60.0);
    }

    #[test]
    fn test_delete_reverses_effect() {
        let (_dir, ledger) = test_ledger();
        let account = add_account(&ledger, AccountType::Checking, 10.0);
        let txn = record_transaction(&ledger, "u1", &new_txn(account.id, EntryKind::Income, 90.0, "Gift")).unwrap();
        assert_eq!(balance(&ledger, account.id), 100.0);
        delete_transaction(&ledger, "u1", txn.id).unwrap();
        assert_eq!(balance(&ledger, account.id), 10.0);
        assert!(matches!(delete_transaction(&ledger, "u1", txn.id), Err(PaydownError::NotFound(_))));
    }

    #[test]
    fn test_toggles() {
        let (_dir, ledger) = test_ledger();
        let account = add_account(&ledger, AccountType::Checking, 0.0);
        let mut salary = new_txn(account.id, EntryKind::Income, 3000.0, "Salary");
        salary.bonus_amount = Some(200.0);
        let txn = record_transaction(&ledger, "u1", &salary).unwrap();

        set_include_bonus_next(&ledger, "u1", txn.id, true).unwrap();
        assert!(ledger.get_transaction("u1", txn.id).unwrap().unwrap().include_bonus_next);
        set_disabled(&ledger, "u1", txn.id, true).unwrap();
        assert!(ledger.get_transaction("u1", txn.id).unwrap().unwrap().is_disabled);
        assert!(set_disabled(&ledger, "u2", txn.id, true).is_err());
    }
}
