use colored::Colorize;
use comfy_table::{Cell, Table};

use paydown::error::Result;
use paydown::fmt::money;
use paydown::ledger::Ledger;
use paydown::models::{AccountType, NewAccount};
use paydown::settings::Settings;

use super::open_ledger;

pub fn add(
    settings: &Settings,
    name: &str,
    account_type: AccountType,
    balance: f64,
    currency: Option<&str>,
) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let account = ledger.create_account(
        &settings.user_id,
        &NewAccount {
            name: name.to_string(),
            account_type,
            balance,
            currency: currency.unwrap_or(&settings.currency).to_uppercase(),
        },
    )?;
    println!("Added account #{}: {}", account.id, account.name);
    Ok(())
}

pub fn list(settings: &Settings) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let accounts = ledger.find_accounts(&settings.user_id)?;
    if accounts.is_empty() {
        println!("No accounts yet. Add one with `paydown accounts add`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type", "Balance"]);
    for a in accounts {
        let balance = money(a.balance, &a.currency);
        let balance = if a.balance < 0.0 || a.account_type == AccountType::CreditCard {
            balance.red().to_string()
        } else {
            balance.green().to_string()
        };
        table.add_row(vec![
            Cell::new(a.id),
            Cell::new(a.name),
            Cell::new(a.account_type),
            Cell::new(balance),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
