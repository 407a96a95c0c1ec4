use chrono::{Datelike, NaiveDate};
use colored::Colorize;
use comfy_table::{Cell, Table};

use paydown::amortization::{extra_payment_impact, monthly_payment, payoff_date, round2};
use paydown::error::{PaydownError, Result};
use paydown::fmt::{money, percent};
use paydown::ledger::Ledger;
use paydown::models::{LoanType, NewLoan, PaymentFrequency, PaymentState, PaymentStatus};
use paydown::periods::normalize_to_period;
use paydown::recurrence::{next_due_date, RecurringEntity};
use paydown::scheduler::{create_loan, payment_summary, record_payment};
use paydown::settings::Settings;

use super::{open_ledger, today, LoanArgs};

/// Scheduled payment implied by the loan's terms when none is given.
fn default_payment(args: &LoanArgs, balance: f64) -> f64 {
    match args.loan_type {
        LoanType::Bnpl => match args.installments {
            Some(n) if n > 0 => round2(balance / f64::from(n)),
            _ => 0.0,
        },
        LoanType::Payday => {
            let total = balance + args.fee;
            round2(if args.split { total / 2.0 } else { total })
        }
        _ => round2(monthly_payment(balance, args.rate, args.term)),
    }
}

fn new_loan(args: LoanArgs, start: NaiveDate) -> NewLoan {
    let frequency = args.frequency.unwrap_or(match args.loan_type {
        LoanType::Bnpl => PaymentFrequency::Biweekly,
        _ => PaymentFrequency::Monthly,
    });
    let payment_day = args.day.unwrap_or(match frequency {
        PaymentFrequency::Monthly => start.day(),
        _ => start.weekday().number_from_monday(),
    });
    let balance = args.balance.unwrap_or(args.principal);
    let payment_amount = args.payment.unwrap_or_else(|| default_payment(&args, balance));

    NewLoan {
        name: args.name,
        loan_type: args.loan_type,
        principal: args.principal,
        current_balance: balance,
        interest_rate: args.rate,
        term_months: args.term,
        start_date: start,
        payment_amount,
        payment_day,
        payment_frequency: frequency,
        number_of_payments: args.installments,
        fee_amount: args.fee,
        allow_split_payment: args.split,
        lender: args.lender,
        notes: args.notes,
        color: None,
    }
}

pub fn add(settings: &Settings, args: LoanArgs) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let start = args.start.unwrap_or_else(today);
    let (loan, payments) = create_loan(&ledger, &settings.user_id, &new_loan(args, start))?;

    println!(
        "Added loan #{}: {} ({}), {} {}",
        loan.id,
        loan.name,
        loan.loan_type,
        money(loan.payment_amount, &settings.currency),
        loan.payment_frequency
    );
    if let (Some(first), Some(last)) = (payments.first(), payments.last()) {
        println!(
            "{} payments scheduled, {} to {}",
            payments.len(),
            first.due_date,
            last.due_date
        );
    }
    Ok(())
}

pub fn list(settings: &Settings) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let loans = ledger.find_loans(&settings.user_id)?;
    if loans.is_empty() {
        println!("No loans yet. Add one with `paydown loans add`.");
        return Ok(());
    }
    let now = today();
    let cur = settings.currency.as_str();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type", "Balance", "Rate", "Payment", "Next Due", "Lender"]);
    for loan in &loans {
        let next = if loan.is_disabled {
            "disabled".dimmed().to_string()
        } else if loan.is_paid_off {
            "paid off".green().to_string()
        } else {
            next_due_date(RecurringEntity::Loan(loan), now)
                .map(|d| d.to_string())
                .unwrap_or_default()
        };
        table.add_row(vec![
            Cell::new(loan.id),
            Cell::new(&loan.name),
            Cell::new(loan.loan_type),
            Cell::new(money(loan.current_balance, cur)),
            Cell::new(percent(loan.interest_rate)),
            Cell::new(format!("{} {}", money(loan.payment_amount, cur), loan.payment_frequency)),
            Cell::new(next),
            Cell::new(loan.lender.as_deref().unwrap_or_default()),
        ]);
    }
    println!("Loans\n{table}");

    let monthly: f64 = loans
        .iter()
        .filter(|l| l.is_active && !l.is_paid_off && !l.is_disabled)
        .map(|l| normalize_to_period(l, PaymentFrequency::Monthly))
        .sum();
    println!("Monthly commitment: {}", money(monthly, cur).bold());
    Ok(())
}

pub fn payments(settings: &Settings, loan_id: i64) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let loan = ledger
        .get_loan(&settings.user_id, loan_id)?
        .ok_or_else(|| PaydownError::NotFound(format!("loan {loan_id}")))?;
    let payments = ledger.find_loan_payments(loan.id)?;
    let now = today();
    let cur = settings.currency.as_str();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Due", "Amount", "Principal", "Interest", "Status", "Paid On"]);
    for p in &payments {
        let state = p.state_on(now);
        let status = match state {
            PaymentState::Paid => state.to_string().green().to_string(),
            PaymentState::Overdue => state.to_string().red().bold().to_string(),
            PaymentState::Pending => state.to_string(),
        };
        table.add_row(vec![
            Cell::new(p.id),
            Cell::new(p.due_date),
            Cell::new(money(p.amount, cur)),
            Cell::new(money(p.principal, cur)),
            Cell::new(money(p.interest, cur)),
            Cell::new(status),
            Cell::new(p.payment_date.map(|d| d.to_string()).unwrap_or_default()),
        ]);
    }
    println!("{} payments\n{table}", loan.name);

    let summary = payment_summary(&payments, now);
    println!("Balance:        {}", money(loan.current_balance, cur));
    println!("Paid:           {}", money(summary.total_paid, cur));
    println!("Pending:        {}", money(summary.total_pending, cur));
    println!("Due in 3 months: {}", summary.upcoming.len());
    if !summary.overdue.is_empty() {
        println!("{}", format!("Overdue:        {}", summary.overdue.len()).red());
    }
    Ok(())
}

pub fn pay(settings: &Settings, payment_id: i64, on: Option<NaiveDate>) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let paid_on = on.unwrap_or_else(today);
    let payment = record_payment(&ledger, &settings.user_id, payment_id, PaymentStatus::Paid, paid_on)?;
    let loan = ledger
        .get_loan(&settings.user_id, payment.loan_id)?
        .ok_or_else(|| PaydownError::NotFound(format!("loan {}", payment.loan_id)))?;
    println!(
        "Paid {} on {}. {} balance: {}",
        money(payment.amount, &settings.currency),
        paid_on,
        loan.name,
        money(loan.current_balance, &settings.currency)
    );
    Ok(())
}

pub fn payoff(settings: &Settings, loan_id: i64, extra: Option<f64>) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let loan = ledger
        .get_loan(&settings.user_id, loan_id)?
        .ok_or_else(|| PaydownError::NotFound(format!("loan {loan_id}")))?;
    let now = today();
    let cur = settings.currency.as_str();
    let monthly = round2(normalize_to_period(&loan, PaymentFrequency::Monthly));

    let date = payoff_date(loan.current_balance, loan.interest_rate, monthly, now)?;
    println!("{}: {} at {} per month", loan.name, money(loan.current_balance, cur), money(monthly, cur));
    println!("Paid off by {date}");

    if let Some(extra) = extra {
        let impact = extra_payment_impact(loan.current_balance, loan.interest_rate, monthly, extra, now)?;
        println!(
            "With {} extra: paid off by {}, {} months sooner, {} less interest",
            money(extra, cur),
            impact.new_payoff_date,
            impact.months_saved,
            money(impact.interest_saved, cur).green()
        );
    }
    Ok(())
}

pub fn disable(settings: &Settings, loan_id: i64, disabled: bool) -> Result<()> {
    let ledger = open_ledger(settings)?;
    ledger.set_loan_disabled(&settings.user_id, loan_id, disabled)?;
    println!("Loan #{loan_id} {}", if disabled { "disabled" } else { "enabled" });
    Ok(())
}
