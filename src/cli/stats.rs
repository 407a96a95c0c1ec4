use colored::Colorize;

use paydown::error::Result;
use paydown::fmt::money;
use paydown::models::PaymentFrequency;
use paydown::periods::period_summary;
use paydown::settings::Settings;

use super::{open_ledger, today};

pub fn run(settings: &Settings, period: PaymentFrequency) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let s = period_summary(&ledger, &settings.user_id, period, today())?;
    let cur = settings.currency.as_str();

    println!("{} {} to {}", format!("{period} summary").bold(), s.window.start, s.window.end);
    println!("Accounts:       {}", s.accounts_count);
    println!("Total balance:  {}", money(s.total_balance, cur));
    println!("Income:         {}", money(s.income, cur).green());
    println!("Expenses:       {}", money(s.expenses, cur).red());
    println!("  of which loans: {}", money(s.loan_payments, cur));
    let net = money(s.net, cur);
    if s.net >= 0.0 {
        println!("Net:            {}", net.green().bold());
    } else {
        println!("Net:            {}", net.red().bold());
    }
    Ok(())
}
