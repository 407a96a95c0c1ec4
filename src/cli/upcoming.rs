use colored::Colorize;
use comfy_table::{Cell, Table};

use paydown::error::Result;
use paydown::fmt::money;
use paydown::models::ObligationKind;
use paydown::settings::Settings;
use paydown::upcoming::upcoming_obligations;

use super::{open_ledger, today};

pub fn run(settings: &Settings, limit: Option<usize>) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let now = today();
    let items = upcoming_obligations(&ledger, &settings.user_id, now, limit)?;
    if items.is_empty() {
        println!("Nothing upcoming.");
        return Ok(());
    }
    let cur = settings.currency.as_str();

    let mut table = Table::new();
    table.set_header(vec!["Due", "Name", "Kind", "Amount", "Every", "Lender"]);
    for item in &items {
        let amount = money(item.amount, cur);
        let amount = match item.kind {
            ObligationKind::Income => amount.green().to_string(),
            ObligationKind::Expense => amount.red().to_string(),
            ObligationKind::Loan => amount.yellow().to_string(),
        };
        let due = match item.due_date {
            Some(d) if d < now => d.to_string().red().to_string(),
            Some(d) => d.to_string(),
            None => String::new(),
        };
        let name = match item.bonus_amount {
            Some(bonus) if item.bonus_included => format!("{} (+{} bonus)", item.name, money(bonus, cur)),
            _ => item.name.clone(),
        };
        table.add_row(vec![
            Cell::new(due),
            Cell::new(name),
            Cell::new(item.kind),
            Cell::new(amount),
            Cell::new(item.frequency.as_deref().unwrap_or_default()),
            Cell::new(item.lender.as_deref().unwrap_or_default()),
        ]);
    }
    println!("Upcoming\n{table}");
    Ok(())
}
