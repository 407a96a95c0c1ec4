use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, Table};

use paydown::error::{PaydownError, Result};
use paydown::fmt::money;
use paydown::ledger::{Ledger, SqliteLedger};
use paydown::models::{EntryKind, NewTransaction, TransactionFilter};
use paydown::settings::Settings;
use paydown::transactions::{delete_transaction, record_transaction, set_disabled, set_include_bonus_next};

use super::{open_ledger, today, TransactionArgs};

fn default_account(ledger: &SqliteLedger, user_id: &str) -> Result<i64> {
    ledger
        .find_accounts(user_id)?
        .first()
        .map(|a| a.id)
        .ok_or_else(|| PaydownError::NotFound("account (add one with `paydown accounts add`)".to_string()))
}

pub fn add(settings: &Settings, args: TransactionArgs) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let user_id = settings.user_id.as_str();

    let account_id = match args.account {
        Some(id) => id,
        None => default_account(&ledger, user_id)?,
    };
    let category_id = match args.category.as_deref() {
        Some(name) => Some(
            ledger
                .match_category(user_id, name, args.kind)?
                .ok_or_else(|| PaydownError::CategoryNotFound(name.to_string()))?
                .id,
        ),
        None => None,
    };

    let txn = record_transaction(
        &ledger,
        user_id,
        &NewTransaction {
            account_id,
            category_id,
            amount: args.amount,
            kind: args.kind,
            description: args.description,
            date: args.date.unwrap_or_else(today),
            is_recurring: args.recurrence.is_some(),
            recurrence: args.recurrence,
            bonus_amount: args.bonus,
            include_bonus_next: false,
        },
    )?;
    println!("Recorded {} #{}: {} {}", txn.kind, txn.id, txn.description, money(txn.amount, &settings.currency));
    Ok(())
}

pub fn list(
    settings: &Settings,
    kind: Option<EntryKind>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: Option<usize>,
    all: bool,
) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let filter = TransactionFilter {
        kind,
        from,
        to,
        limit,
        include_disabled: all,
        ..Default::default()
    };
    let txns = ledger.find_transactions(&settings.user_id, &filter)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount", "Repeats", "Account"]);
    for t in &txns {
        let amount = money(t.amount, &settings.currency);
        let amount = match t.kind {
            EntryKind::Income => amount.green().to_string(),
            EntryKind::Expense => amount.red().to_string(),
        };
        let description = if t.is_disabled {
            format!("{} (disabled)", t.description).dimmed().to_string()
        } else {
            t.description.clone()
        };
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(t.date),
            Cell::new(description),
            Cell::new(amount),
            Cell::new(t.recurrence.map(|r| r.to_string()).unwrap_or_default()),
            Cell::new(t.account_id),
        ]);
    }
    println!("Transactions ({})\n{table}", txns.len());
    Ok(())
}

pub fn delete(settings: &Settings, id: i64) -> Result<()> {
    let ledger = open_ledger(settings)?;
    let txn = delete_transaction(&ledger, &settings.user_id, id)?;
    println!("Deleted transaction #{}: {}", txn.id, txn.description);
    Ok(())
}

pub fn bonus(settings: &Settings, id: i64, include: bool) -> Result<()> {
    let ledger = open_ledger(settings)?;
    set_include_bonus_next(&ledger, &settings.user_id, id, include)?;
    if include {
        println!("Bonus included in the next payout of #{id}");
    } else {
        println!("Bonus no longer included for #{id}");
    }
    Ok(())
}

pub fn disable(settings: &Settings, id: i64, disabled: bool) -> Result<()> {
    let ledger = open_ledger(settings)?;
    set_disabled(&ledger, &settings.user_id, id, disabled)?;
    println!("Transaction #{id} {}", if disabled { "disabled" } else { "enabled" });
    Ok(())
}
