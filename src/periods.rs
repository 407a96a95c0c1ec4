//! Period normalization of recurring payments and the cash-flow summary for a
//! reporting window.
//!
//! Conversions use an average-weeks-per-month approximation (4.33 weeks,
//! 2.17 fortnights) rather than calendar arithmetic.

use chrono::{Datelike, Days, NaiveDate};
use tracing::debug;

use crate::amortization::{days_in_month, round2};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::{AccountType, EntryKind, Loan, PaymentFrequency, TransactionFilter};

const WEEKS_PER_MONTH: f64 = 4.33;
const FORTNIGHTS_PER_MONTH: f64 = 2.17;

/// Re-express a payment made every `from` as the equivalent amount per `to`.
pub fn convert_payment(amount: f64, from: PaymentFrequency, to: PaymentFrequency) -> f64 {
    use PaymentFrequency::{Biweekly, Monthly, Weekly};
    match (from, to) {
        (Monthly, Weekly) => amount / WEEKS_PER_MONTH,
        (Monthly, Biweekly) => amount / FORTNIGHTS_PER_MONTH,
        (Weekly, Monthly) => amount * WEEKS_PER_MONTH,
        (Weekly, Biweekly) => amount * 2.0,
        (Biweekly, Monthly) => amount * FORTNIGHTS_PER_MONTH,
        (Biweekly, Weekly) => amount / 2.0,
        _ => amount,
    }
}

/// A loan's scheduled payment expressed per `period`.
pub fn normalize_to_period(loan: &Loan, period: PaymentFrequency) -> f64 {
    convert_payment(loan.payment_amount, loan.payment_frequency, period)
}

/// Inclusive date range a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Weekly: the Sunday-start week containing `today`. Biweekly: the trailing 14
/// days ending today. Monthly: the calendar month of `today`.
pub fn period_window(period: PaymentFrequency, today: NaiveDate) -> PeriodWindow {
    match period {
        PaymentFrequency::Weekly => {
            let back = u64::from(today.weekday().num_days_from_sunday());
            let start = today.checked_sub_days(Days::new(back)).unwrap_or(today);
            PeriodWindow {
                start,
                end: start.checked_add_days(Days::new(6)).unwrap_or(start),
            }
        }
        PaymentFrequency::Biweekly => PeriodWindow {
            start: today.checked_sub_days(Days::new(13)).unwrap_or(today),
            end: today,
        },
        PaymentFrequency::Monthly => {
            let last = days_in_month(today.year(), today.month());
            PeriodWindow {
                start: today.with_day(1).unwrap_or(today),
                end: today.with_day(last).unwrap_or(today),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PeriodSummary {
    pub period: PaymentFrequency,
    pub window: PeriodWindow,
    /// Account balances with credit-card balances counted as owed.
    pub total_balance: f64,
    pub income: f64,
    /// Period expenses plus every open loan's payment normalized to the period.
    pub expenses: f64,
    pub loan_payments: f64,
    pub net: f64,
    pub accounts_count: usize,
}

pub fn period_summary<L: Ledger>(
    ledger: &L,
    user_id: &str,
    period: PaymentFrequency,
    today: NaiveDate,
) -> Result<PeriodSummary> {
    let window = period_window(period, today);

    let accounts = ledger.find_accounts(user_id)?;
    let total_balance: f64 = accounts
        .iter()
        .map(|a| match a.account_type {
            AccountType::CreditCard => -a.balance.abs(),
            _ => a.balance,
        })
        .sum();

    let filter = TransactionFilter {
        from: Some(window.start),
        to: Some(window.end),
        ..Default::default()
    };
    let (mut income, mut expenses) = (0.0, 0.0);
    for txn in ledger.find_transactions(user_id, &filter)? {
        match txn.kind {
            EntryKind::Income => income += txn.amount.abs(),
            EntryKind::Expense => expenses += txn.amount.abs(),
        }
    }

    let loan_payments: f64 = ledger
        .find_loans(user_id)?
        .iter()
        .filter(|l| l.is_active && !l.is_paid_off && !l.is_disabled)
        .map(|l| normalize_to_period(l, period))
        .sum();
    expenses += loan_payments;

    debug!(user_id, %period, start = %window.start, end = %window.end, income, expenses, "period summary");

    Ok(PeriodSummary {
        period,
        window,
        total_balance: round2(total_balance),
        income: round2(income),
        expenses: round2(expenses),
        loan_payments: round2(loan_payments),
        net: round2(income - expenses),
        accounts_count: accounts.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{add_account, date, new_txn, sample_loan, test_ledger};
    use crate::models::{LoanType, NewLoan};
    use crate::models::PaymentFrequency::{Biweekly, Monthly, Weekly};
    use crate::scheduler::create_loan;

    #[test]
    fn test_convert_payment_factors() {
        assert_eq!(round2(convert_payment(433.0, Monthly, Weekly)), 100.0);
        assert_eq!(round2(convert_payment(217.0, Monthly, Biweekly)), 100.0);
        assert_eq!(round2(convert_payment(100.0, Weekly, Monthly)), 433.0);
        assert_eq!(convert_payment(100.0, Weekly, Biweekly), 200.0);
        assert_eq!(round2(convert_payment(100.0, Biweekly, Monthly)), 217.0);
        assert_eq!(convert_payment(100.0, Biweekly, Weekly), 50.0);
    }

    #[test]
    fn test_convert_payment_identity() {
        for f in PaymentFrequency::ALL {
            assert_eq!(convert_payment(123.45, *f, *f), 123.45);
        }
    }

    #[test]
    fn test_period_windows() {
        // 2025-03-05 is a Wednesday
        let today = date(2025, 3, 5);
        assert_eq!(period_window(Weekly, today), PeriodWindow { start: date(2025, 3, 2), end: date(2025, 3, 8) });
        assert_eq!(period_window(Biweekly, today), PeriodWindow { start: date(2025, 2, 20), end: today });
        assert_eq!(period_window(Monthly, date(2024, 2, 10)), PeriodWindow { start: date(2024, 2, 1), end: date(2024, 2, 29) });
        // A Sunday starts its own week
        assert_eq!(period_window(Weekly, date(2025, 3, 9)).start, date(2025, 3, 9));
    }

    #[test]
    fn test_period_summary() {
        let (_dir, ledger) = test_ledger();
        let checking = add_account(&ledger, AccountType::Checking, 2000.0);
        add_account(&ledger, AccountType::CreditCard, 300.0);

        let mut pay = new_txn(checking.id, EntryKind::Income, 3000.0, "Salary");
        pay.date = date(2025, 3, 3);
        ledger.create_transaction("u1", &pay).unwrap();
        let mut groceries = new_txn(checking.id, EntryKind::Expense, 150.0, "Groceries");
        groceries.date = date(2025, 3, 4);
        ledger.create_transaction("u1", &groceries).unwrap();
        let mut old = new_txn(checking.id, EntryKind::Expense, 999.0, "Last month");
        old.date = date(2025, 2, 27);
        ledger.create_transaction("u1", &old).unwrap();

        let weekly_loan = NewLoan {
            payment_amount: 100.0,
            payment_frequency: Weekly,
            ..sample_loan(LoanType::Personal)
        };
        create_loan(&ledger, "u1", &weekly_loan).unwrap();

        let summary = period_summary(&ledger, "u1", Monthly, date(2025, 3, 5)).unwrap();
        assert_eq!(summary.total_balance, 1700.0);
        assert_eq!(summary.accounts_count, 2);
        assert_eq!(summary.income, 3000.0);
        assert_eq!(summary.loan_payments, 433.0);
        assert_eq!(summary.expenses, 583.0);
        assert_eq!(summary.net, 2417.0);

        let weekly = period_summary(&ledger, "u1", Weekly, date(2025, 3, 5)).unwrap();
        assert_eq!(weekly.loan_payments, 100.0);
        assert_eq!(weekly.expenses, 250.0);
    }

    #[test]
    fn test_disabled_loans_do_not_count() {
        let (_dir, ledger) = test_ledger();
        let (loan, _) = create_loan(&ledger, "u1", &sample_loan(LoanType::Auto)).unwrap();
        ledger.set_loan_disabled("u1", loan.id, true).unwrap();
        let summary = period_summary(&ledger, "u1", Monthly, date(2025, 3, 5)).unwrap();
        assert_eq!(summary.loan_payments, 0.0);
        assert_eq!(summary.accounts_count, 0);
    }
}
