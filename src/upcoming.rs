use chrono::NaiveDate;
use tracing::debug;

use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::{EntryKind, Loan, ObligationKind, Transaction, TransactionFilter, UpcomingObligation};
use crate::recurrence::{next_due_date, projected_amount, RecurringEntity};

fn is_recurring(txn: &Transaction) -> bool {
    !txn.is_disabled && (txn.is_recurring || txn.recurrence.is_some())
}

fn is_open(loan: &Loan) -> bool {
    loan.is_active && !loan.is_paid_off && !loan.is_disabled
}

fn from_transaction(txn: &Transaction, today: NaiveDate) -> UpcomingObligation {
    let income = txn.kind == EntryKind::Income;
    UpcomingObligation {
        id: format!("txn-{}", txn.id),
        kind: match txn.kind {
            EntryKind::Income => ObligationKind::Income,
            EntryKind::Expense => ObligationKind::Expense,
        },
        name: txn.description.clone(),
        amount: projected_amount(txn),
        due_date: next_due_date(RecurringEntity::Transaction(txn), today),
        frequency: txn.recurrence.map(|r| r.to_string()),
        bonus_amount: txn.bonus_amount.filter(|_| income),
        bonus_included: income && txn.include_bonus_next,
        lender: None,
        balance: None,
    }
}

fn from_loan(loan: &Loan, today: NaiveDate) -> UpcomingObligation {
    UpcomingObligation {
        id: format!("loan-{}", loan.id),
        kind: ObligationKind::Loan,
        name: loan.name.clone(),
        amount: loan.payment_amount,
        due_date: next_due_date(RecurringEntity::Loan(loan), today),
        frequency: Some(loan.payment_frequency.to_string()),
        bonus_amount: None,
        bonus_included: false,
        lender: loan.lender.clone(),
        balance: Some(loan.current_balance),
    }
}

/// Recurring transactions and open loans as one feed, earliest due first.
/// Entries without a resolvable date go last, keeping their relative order.
pub fn merge_obligations(transactions: &[Transaction], loans: &[Loan], today: NaiveDate) -> Vec<UpcomingObligation> {
    let mut items: Vec<UpcomingObligation> = transactions
        .iter()
        .filter(|t| is_recurring(t))
        .map(|t| from_transaction(t, today))
        .chain(loans.iter().filter(|l| is_open(l)).map(|l| from_loan(l, today)))
        .collect();
    // None sorts after every date; sort_by_key is stable.
    items.sort_by_key(|item| (item.due_date.is_none(), item.due_date));
    items
}

/// The merged feed for `user_id`, cut to the first `lookahead` entries if given.
pub fn upcoming_obligations<L: Ledger>(
    ledger: &L,
    user_id: &str,
    today: NaiveDate,
    lookahead: Option<usize>,
) -> Result<Vec<UpcomingObligation>> {
    let filter = TransactionFilter {
        recurring_only: true,
        ..Default::default()
    };
    let transactions = ledger.find_transactions(user_id, &filter)?;
    let loans = ledger.find_loans(user_id)?;
    let mut items = merge_obligations(&transactions, &loans, today);
    debug!(user_id, count = items.len(), "merged upcoming obligations");
    if let Some(limit) = lookahead {
        items.truncate(limit);
    }
    Ok(items)
}
