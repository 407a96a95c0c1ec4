use chrono::{Datelike, Days, NaiveDate};

use crate::amortization::{add_months, with_clamped_day};
use crate::models::{EntryKind, Loan, PaymentFrequency, Recurrence, Transaction};

/// One step of `recurrence` after `last_date`. Month and year steps clamp to
/// the target month's last day.
pub fn next_due(last_date: NaiveDate, recurrence: Recurrence) -> Option<NaiveDate> {
    match recurrence {
        Recurrence::Daily => last_date.checked_add_days(Days::new(1)),
        Recurrence::Weekly => last_date.checked_add_days(Days::new(7)),
        Recurrence::Biweekly => last_date.checked_add_days(Days::new(14)),
        Recurrence::Monthly => add_months(last_date, 1),
        Recurrence::Yearly => add_months(last_date, 12),
    }
}

/// Amount the next occurrence brings in or costs; income carries its bonus
/// when the bonus is flagged for the next payout.
pub fn projected_amount(txn: &Transaction) -> f64 {
    match (txn.kind, txn.bonus_amount) {
        (EntryKind::Income, Some(bonus)) if txn.include_bonus_next => txn.amount + bonus,
        _ => txn.amount,
    }
}

/// Next loan payment strictly after `today`.
///
/// For weekly and biweekly loans `payment_day` is an ISO weekday (1 = Monday,
/// 7 = Sunday, 0 also Sunday). For monthly loans it is a day of the month,
/// clamped to the month's length.
pub fn next_loan_payment(payment_day: u32, frequency: PaymentFrequency, today: NaiveDate) -> NaiveDate {
    match frequency {
        PaymentFrequency::Weekly | PaymentFrequency::Biweekly => {
            let target = payment_day % 7;
            let current = today.weekday().num_days_from_sunday();
            let ahead = match (target + 7 - current) % 7 {
                0 => 7,
                n => n,
            };
            today + Days::new(u64::from(ahead))
        }
        PaymentFrequency::Monthly => {
            let this_month = with_clamped_day(today, payment_day);
            if this_month > today {
                return this_month;
            }
            let first = today.with_day(1).unwrap_or(today);
            add_months(first, 1)
                .map(|next| with_clamped_day(next, payment_day))
                .unwrap_or(this_month)
        }
    }
}

/// Anything the upcoming feed can ask "when next?" about.
#[derive(Debug, Clone, Copy)]
pub enum RecurringEntity<'a> {
    Transaction(&'a Transaction),
    Loan(&'a Loan),
}

pub fn next_due_date(entity: RecurringEntity<'_>, today: NaiveDate) -> Option<NaiveDate> {
    match entity {
        RecurringEntity::Transaction(txn) => match txn.recurrence {
            Some(recurrence) => next_due(txn.date, recurrence),
            None => Some(txn.date),
        },
        RecurringEntity::Loan(loan) => Some(next_loan_payment(loan.payment_day, loan.payment_frequency, today)),
    }
}
