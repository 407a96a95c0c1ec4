//! Loan origination: validating new loans, generating their initial payment
//! batch by product type, and recording payments against them.

use chrono::{Datelike, Days, NaiveDate};
use tracing::debug;

use crate::amortization::{add_months, amortization_schedule, round2};
use crate::error::{invalid, PaydownError, Result};
use crate::ledger::Ledger;
use crate::models::{Loan, LoanPayment, LoanType, NewLoan, NewLoanPayment, PaymentFrequency, PaymentStatus};

/// Amortized loans get this many periods pre-generated.
pub const INITIAL_SCHEDULE_PERIODS: usize = 12;

const PAYDAY_SPLIT_DAYS: [u64; 2] = [14, 28];
const PAYDAY_DAYS_PER_TERM_MONTH: u64 = 30;

pub fn validate_loan(loan: &NewLoan) -> Result<()> {
    if loan.name.trim().is_empty() {
        return Err(invalid("loan name is required"));
    }
    if !(loan.principal > 0.0) {
        return Err(invalid("principal must be greater than 0"));
    }
    if !(loan.current_balance >= 0.0) {
        return Err(invalid("current balance cannot be negative"));
    }
    if !(0.0..=100.0).contains(&loan.interest_rate) {
        return Err(invalid("interest rate must be between 0 and 100"));
    }
    if loan.term_months == 0 {
        return Err(invalid("term must be a positive number of months"));
    }
    if !(loan.payment_amount >= 0.0) {
        return Err(invalid("payment amount cannot be negative"));
    }
    if !(1..=31).contains(&loan.payment_day) {
        return Err(invalid("payment day must be between 1 and 31"));
    }
    if !(loan.fee_amount >= 0.0) {
        return Err(invalid("fee amount cannot be negative"));
    }
    if loan.loan_type == LoanType::Bnpl && !matches!(loan.number_of_payments, Some(n) if n > 0) {
        return Err(invalid("BNPL loans need a positive number of payments"));
    }
    Ok(())
}

/// `start_date` plus the term.
pub fn loan_end_date(loan: &NewLoan) -> Result<NaiveDate> {
    add_months(loan.start_date, loan.term_months).ok_or_else(|| invalid("loan end date is out of range"))
}

fn days_after(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| invalid("payment due date is out of range"))
}

/// Day of month amortized periods fall on. Weekly and biweekly loans store a
/// weekday in `payment_day`, so their schedule keeps the start date's day.
fn schedule_day_of_month(loan: &Loan) -> u32 {
    match loan.payment_frequency {
        PaymentFrequency::Monthly => loan.payment_day,
        PaymentFrequency::Weekly | PaymentFrequency::Biweekly => loan.start_date.day(),
    }
}

fn amortized_payments(loan: &Loan) -> Vec<NewLoanPayment> {
    amortization_schedule(
        loan.current_balance,
        loan.interest_rate,
        loan.term_months,
        loan.start_date,
        schedule_day_of_month(loan),
    )
    .into_iter()
    .take(INITIAL_SCHEDULE_PERIODS)
    .map(|item| NewLoanPayment {
        due_date: item.due_date,
        amount: item.payment,
        principal: item.principal,
        interest: item.interest,
    })
    .collect()
}

/// Initial payment batch for a freshly created loan. All payments start pending.
pub fn originate_loan_payments(loan: &Loan) -> Result<Vec<NewLoanPayment>> {
    let payments = if loan.loan_type.is_amortized() {
        amortized_payments(loan)
    } else if loan.loan_type == LoanType::Bnpl {
        bnpl_installments(loan)?
    } else {
        payday_installments(loan)?
    };
    debug!(loan = %loan.name, loan_type = %loan.loan_type, count = payments.len(), "originated payments");
    Ok(payments)
}

fn bnpl_installments(loan: &Loan) -> Result<Vec<NewLoanPayment>> {
    let count = match loan.number_of_payments {
        Some(n) if n > 0 => n,
        _ => return Err(invalid("BNPL loans need a positive number of payments")),
    };
    let spacing = loan.payment_frequency.installment_days() as u64;
    let installment = round2(loan.current_balance / f64::from(count));

    let mut payments = Vec::with_capacity(count as usize);
    let mut allotted = 0.0;
    for i in 0..count {
        let amount = if i + 1 == count {
            round2(loan.current_balance - allotted)
        } else {
            installment
        };
        allotted = round2(allotted + amount);
        payments.push(NewLoanPayment {
            due_date: days_after(loan.start_date, spacing * u64::from(i))?,
            amount,
            principal: amount,
            interest: 0.0,
        });
    }
    Ok(payments)
}

fn payday_installments(loan: &Loan) -> Result<Vec<NewLoanPayment>> {
    let total = round2(loan.current_balance + loan.fee_amount);
    if !loan.allow_split_payment {
        let due_date = days_after(
            loan.start_date,
            PAYDAY_DAYS_PER_TERM_MONTH * u64::from(loan.term_months),
        )?;
        return Ok(vec![NewLoanPayment {
            due_date,
            amount: total,
            principal: loan.current_balance,
            interest: loan.fee_amount,
        }]);
    }

    // Second half takes whatever the first half's rounding left over.
    let half_amount = round2(total / 2.0);
    let half_principal = round2(loan.current_balance / 2.0);
    let half_interest = round2(loan.fee_amount / 2.0);
    let halves = [
        (half_amount, half_principal, half_interest),
        (
            round2(total - half_amount),
            round2(loan.current_balance - half_principal),
            round2(loan.fee_amount - half_interest),
        ),
    ];

    PAYDAY_SPLIT_DAYS
        .iter()
        .zip(halves)
        .map(|(days, (amount, principal, interest))| {
            Ok(NewLoanPayment {
                due_date: days_after(loan.start_date, *days)?,
                amount,
                principal,
                interest,
            })
        })
        .collect()
}

/// Validate and store a loan together with its initial payment batch.
pub fn create_loan<L: Ledger>(ledger: &L, user_id: &str, new_loan: &NewLoan) -> Result<(Loan, Vec<LoanPayment>)> {
    validate_loan(new_loan)?;
    let end_date = loan_end_date(new_loan)?;
    ledger.in_transaction(|ledger| {
        let loan = ledger.create_loan(user_id, new_loan, end_date)?;
        let batch = originate_loan_payments(&loan)?;
        let payments = ledger.create_loan_payments(loan.id, &batch)?;
        Ok((loan, payments))
    })
}

/// Set a payment's status. Marking a pending payment paid reduces the loan's
/// balance by the payment's principal, floored at zero.
pub fn record_payment<L: Ledger>(
    ledger: &L,
    user_id: &str,
    payment_id: i64,
    status: PaymentStatus,
    paid_on: NaiveDate,
) -> Result<LoanPayment> {
    ledger.in_transaction(|ledger| {
        let payment = ledger
            .get_loan_payment(user_id, payment_id)?
            .ok_or_else(|| PaydownError::NotFound(format!("loan payment {payment_id}")))?;

        match (payment.status, status) {
            (PaymentStatus::Paid, PaymentStatus::Paid) => {
                return Err(invalid(format!("payment {payment_id} is already paid")));
            }
            (PaymentStatus::Paid, PaymentStatus::Pending) => {
                return Err(invalid(format!("payment {payment_id} is paid and cannot be reopened")));
            }
            (PaymentStatus::Pending, PaymentStatus::Pending) => return Ok(payment),
            (PaymentStatus::Pending, PaymentStatus::Paid) => {}
        }

        let loan = ledger
            .get_loan(user_id, payment.loan_id)?
            .ok_or_else(|| PaydownError::NotFound(format!("loan {}", payment.loan_id)))?;
        ledger.update_loan_payment(payment_id, PaymentStatus::Paid, Some(paid_on))?;
        let balance = round2((loan.current_balance - payment.principal).max(0.0));
        ledger.set_loan_balance(loan.id, balance)?;
        debug!(loan = %loan.name, payment_id, balance, "payment recorded");

        Ok(LoanPayment {
            status: PaymentStatus::Paid,
            payment_date: Some(paid_on),
            ..payment
        })
    })
}

#[derive(Debug, Clone)]
pub struct PaymentSummary {
    /// Pending and due between today and three months out.
    pub upcoming: Vec<LoanPayment>,
    pub overdue: Vec<LoanPayment>,
    pub total_paid: f64,
    pub total_pending: f64,
}

pub fn payment_summary(payments: &[LoanPayment], today: NaiveDate) -> PaymentSummary {
    let horizon = add_months(today, 3).unwrap_or(NaiveDate::MAX);
    let pending = || payments.iter().filter(|p| p.status == PaymentStatus::Pending);

    PaymentSummary {
        upcoming: pending()
            .filter(|p| p.due_date >= today && p.due_date <= horizon)
            .cloned()
            .collect(),
        overdue: pending().filter(|p| p.due_date < today).cloned().collect(),
        total_paid: round2(
            payments
                .iter()
                .filter(|p| p.status == PaymentStatus::Paid)
                .map(|p| p.amount)
                .sum(),
        ),
        total_pending: round2(pending().map(|p| p.amount).sum()),
    }
}
