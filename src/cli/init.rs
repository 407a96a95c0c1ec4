use paydown::error::Result;
use paydown::settings::{save_settings, settings_path, Settings};

use super::open_ledger;

pub fn run(mut settings: Settings, currency: Option<String>, user: Option<String>) -> Result<()> {
    if let Some(currency) = currency {
        settings.currency = currency.to_uppercase();
    }
    if let Some(user) = user {
        settings.user_id = user;
    }

    open_ledger(&settings)?;
    save_settings(&settings)?;

    println!("Data dir:   {}", settings.data_path().display());
    println!("Database:   {}", settings.db_path().display());
    println!("Settings:   {}", settings_path().display());
    println!("User:       {}", settings.user_id);
    println!("Currency:   {}", settings.currency);
    Ok(())
}
