//! Loan payment math: payment sizing, amortization schedules and payoff
//! projection. Everything here is pure; amounts are rounded to cents at each
//! step the way a lender's statement would show them.

use chrono::{Datelike, Months, NaiveDate};

use crate::error::{invalid, PaydownError, Result};

/// Upper bound on simulated months (50 years).
pub const MAX_PAYOFF_MONTHS: u32 = 600;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn monthly_rate(annual_rate_pct: f64) -> f64 {
    annual_rate_pct / 100.0 / 12.0
}

/// Number of days in the month containing `year`/`month`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// `date` moved to `day` of its own month, clamped to the month's last day.
pub fn with_clamped_day(date: NaiveDate, day: u32) -> NaiveDate {
    let last = days_in_month(date.year(), date.month());
    date.with_day(day.clamp(1, last)).unwrap_or(date)
}

/// Add calendar months; the day is clamped when the target month is shorter.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

// ---------------------------------------------------------------------------
// Payment sizing
// ---------------------------------------------------------------------------

/// Fixed monthly payment: `P·c(1+c)^n / ((1+c)^n − 1)`, rounded to cents.
///
/// At a 0% rate this is exactly `principal / term_months`.
pub fn monthly_payment(principal: f64, annual_rate_pct: f64, term_months: u32) -> f64 {
    if term_months == 0 {
        return principal;
    }
    if annual_rate_pct == 0.0 {
        return principal / f64::from(term_months);
    }
    let c = monthly_rate(annual_rate_pct);
    let growth = (1.0 + c).powi(term_months as i32);
    round2(principal * (c * growth) / (growth - 1.0))
}

pub fn total_interest(principal: f64, annual_rate_pct: f64, term_months: u32) -> f64 {
    let payment = monthly_payment(principal, annual_rate_pct, term_months);
    round2(payment * f64::from(term_months) - principal)
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleItem {
    pub period: u32,
    pub due_date: NaiveDate,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub remaining_balance: f64,
}

/// Parameters accepted by [`compute_amortization_schedule`].
#[derive(Debug, Clone)]
pub struct LoanTerms {
    pub principal: f64,
    pub annual_rate_pct: f64,
    pub term_months: u32,
    pub start_date: NaiveDate,
    pub payment_day: u32,
}

impl LoanTerms {
    pub fn validate(&self) -> Result<()> {
        if !(self.principal > 0.0) {
            return Err(invalid("principal must be greater than 0"));
        }
        if !(0.0..=100.0).contains(&self.annual_rate_pct) {
            return Err(invalid("interest rate must be between 0 and 100"));
        }
        if self.term_months == 0 {
            return Err(invalid("term must be a positive number of months"));
        }
        if !(1..=31).contains(&self.payment_day) {
            return Err(invalid("payment day must be between 1 and 31"));
        }
        Ok(())
    }
}

/// Validated entry point for callers holding user-supplied loan terms.
pub fn compute_amortization_schedule(terms: &LoanTerms) -> Result<Vec<ScheduleItem>> {
    terms.validate()?;
    Ok(amortization_schedule(
        terms.principal,
        terms.annual_rate_pct,
        terms.term_months,
        terms.start_date,
        terms.payment_day,
    ))
}

/// Full period-by-period schedule. Period 1 falls in the start month; the final
/// period absorbs any rounding residue so the balance ends at exactly zero.
pub fn amortization_schedule(
    principal: f64,
    annual_rate_pct: f64,
    term_months: u32,
    start_date: NaiveDate,
    payment_day: u32,
) -> Vec<ScheduleItem> {
    let payment = monthly_payment(principal, annual_rate_pct, term_months);
    let c = monthly_rate(annual_rate_pct);
    let mut balance = round2(principal);
    let mut schedule = Vec::with_capacity(term_months as usize);

    for period in 1..=term_months {
        let Some(month) = add_months(start_date, period - 1) else {
            break;
        };
        let due_date = with_clamped_day(month, payment_day);

        let interest = round2(balance * c);
        let principal_part = if period == term_months {
            balance
        } else {
            round2((payment - interest).max(0.0)).min(balance)
        };
        balance = round2((balance - principal_part).max(0.0));

        schedule.push(ScheduleItem {
            period,
            due_date,
            payment: round2(principal_part + interest),
            principal: principal_part,
            interest,
            remaining_balance: balance,
        });
    }
    schedule
}

// ---------------------------------------------------------------------------
// Payoff projection
// ---------------------------------------------------------------------------

struct Trajectory {
    months: u32,
    interest_paid: f64,
}

fn simulate_payoff(balance: f64, annual_rate_pct: f64, payment: f64) -> Result<Trajectory> {
    if !(payment > 0.0) {
        return Err(invalid("payment must be greater than 0"));
    }
    let c = monthly_rate(annual_rate_pct);
    let mut balance = balance;
    let mut months = 0u32;
    let mut interest_paid = 0.0;

    while balance > 0.0 && months < MAX_PAYOFF_MONTHS {
        let exact_interest = balance * c;
        if payment <= exact_interest {
            return Err(PaydownError::PaymentTooLow {
                payment,
                interest: round2(exact_interest),
            });
        }
        let interest = round2(exact_interest);
        interest_paid += interest;
        balance = round2(balance - (payment - interest));
        months += 1;
    }

    Ok(Trajectory {
        months,
        interest_paid: round2(interest_paid),
    })
}

/// Date the balance reaches zero paying `payment` each month from `from`.
pub fn payoff_date(
    current_balance: f64,
    annual_rate_pct: f64,
    payment: f64,
    from: NaiveDate,
) -> Result<NaiveDate> {
    let trajectory = simulate_payoff(current_balance, annual_rate_pct, payment)?;
    add_months(from, trajectory.months)
        .ok_or_else(|| invalid("payoff date is out of range"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtraPaymentImpact {
    pub months_saved: u32,
    pub interest_saved: f64,
    pub new_payoff_date: NaiveDate,
}

/// Compare paying `regular_payment` against `regular_payment + extra_payment`.
pub fn extra_payment_impact(
    current_balance: f64,
    annual_rate_pct: f64,
    regular_payment: f64,
    extra_payment: f64,
    from: NaiveDate,
) -> Result<ExtraPaymentImpact> {
    if extra_payment < 0.0 {
        return Err(invalid("extra payment cannot be negative"));
    }
    let regular = simulate_payoff(current_balance, annual_rate_pct, regular_payment)?;
    let boosted = simulate_payoff(current_balance, annual_rate_pct, regular_payment + extra_payment)?;
    let new_payoff_date = add_months(from, boosted.months)
        .ok_or_else(|| invalid("payoff date is out of range"))?;

    Ok(ExtraPaymentImpact {
        months_saved: regular.months.saturating_sub(boosted.months),
        interest_saved: round2(regular.interest_paid - boosted.interest_paid),
        new_payoff_date,
    })
}
