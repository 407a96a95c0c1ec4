use std::io::Read;

use colored::Colorize;

use paydown::error::Result;
use paydown::importer::{import_tabular_data, ImportOptions};
use paydown::settings::Settings;

use super::{open_ledger, today};

fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        Ok(std::fs::read_to_string(file)?)
    }
}

pub fn run(settings: &Settings, file: &str) -> Result<()> {
    let raw = read_input(file)?;
    let ledger = open_ledger(settings)?;
    let options = ImportOptions {
        user_id: settings.user_id.clone(),
        today: today(),
        currency: settings.currency.clone(),
    };

    let result = import_tabular_data(&ledger, &raw, &options)?;
    println!("{}", result.message());
    if !result.errors.is_empty() {
        println!("{}", format!("{} rows skipped:", result.errors.len()).yellow());
        for error in &result.errors {
            println!("  {error}");
        }
    }
    Ok(())
}
