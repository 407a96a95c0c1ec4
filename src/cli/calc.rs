use chrono::{Datelike, NaiveDate};
use colored::Colorize;
use comfy_table::{Cell, Table};

use paydown::amortization::{compute_amortization_schedule, extra_payment_impact, payoff_date, total_interest, LoanTerms};
use paydown::error::Result;
use paydown::fmt::money;
use paydown::settings::Settings;

use super::today;

pub fn schedule(
    settings: &Settings,
    principal: f64,
    rate: f64,
    term: u32,
    start: Option<NaiveDate>,
    day: Option<u32>,
) -> Result<()> {
    let start_date = start.unwrap_or_else(today);
    let terms = LoanTerms {
        principal,
        annual_rate_pct: rate,
        term_months: term,
        start_date,
        payment_day: day.unwrap_or(start_date.day()),
    };
    let items = compute_amortization_schedule(&terms)?;
    let cur = settings.currency.as_str();

    let mut table = Table::new();
    table.set_header(vec!["#", "Due", "Payment", "Principal", "Interest", "Balance"]);
    for item in &items {
        table.add_row(vec![
            Cell::new(item.period),
            Cell::new(item.due_date),
            Cell::new(money(item.payment, cur)),
            Cell::new(money(item.principal, cur)),
            Cell::new(money(item.interest, cur)),
            Cell::new(money(item.remaining_balance, cur)),
        ]);
    }
    println!("{table}");

    let interest: f64 = items.iter().map(|i| i.interest).sum();
    println!("Total interest: {}", money(interest, cur).bold());
    println!("Formula estimate: {}", money(total_interest(principal, rate, term), cur));
    Ok(())
}

pub fn payoff(settings: &Settings, balance: f64, rate: f64, payment: f64, extra: Option<f64>) -> Result<()> {
    let now = today();
    let cur = settings.currency.as_str();
    println!("Paid off by {}", payoff_date(balance, rate, payment, now)?);

    if let Some(extra) = extra {
        let impact = extra_payment_impact(balance, rate, payment, extra, now)?;
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
