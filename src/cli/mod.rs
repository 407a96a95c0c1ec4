pub mod accounts;
pub mod calc;
pub mod demo;
pub mod import;
pub mod init;
pub mod loans;
pub mod stats;
pub mod transactions;
pub mod upcoming;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use paydown::db::seed_categories;
use paydown::error::Result;
use paydown::ledger::SqliteLedger;
use paydown::models::{AccountType, EntryKind, LoanType, PaymentFrequency, Recurrence};
use paydown::settings::{expand_home, load_settings, Settings};

/// Saved settings with the `--data-dir` override applied.
pub fn resolve_settings(data_dir: Option<&str>) -> Settings {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = expand_home(dir);
    }
    settings
}

/// Open the ledger under the configured data dir, creating the schema and the
/// user's default categories on first use.
pub(crate) fn open_ledger(settings: &Settings) -> Result<SqliteLedger> {
    std::fs::create_dir_all(settings.data_path())?;
    let ledger = SqliteLedger::open(&settings.db_path())?;
    seed_categories(ledger.conn(), &settings.user_id)?;
    Ok(ledger)
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Parser)]
#[command(name = "paydown", about = "Track loans, recurring bills and income, and see what is due next.")]
pub struct Cli {
    /// Data directory holding paydown.db (overrides saved settings)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save settings and initialize the database.
    Init {
        /// Currency code for new accounts (e.g. AUD, USD)
        #[arg(long)]
        currency: Option<String>,
        /// Ledger owner id
        #[arg(long)]
        user: Option<String>,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Record and manage income and expense transactions.
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommands,
    },
    /// Manage loans and their payment schedules.
    Loans {
        #[command(subcommand)]
        command: LoansCommands,
    },
    /// Loan calculators that do not touch the database.
    Calc {
        #[command(subcommand)]
        command: CalcCommands,
    },
    /// Import a pasted budget spreadsheet (tab or comma separated).
    Import {
        /// Path to the file, or `-` to read stdin
        file: String,
    },
    /// List upcoming bills, income and loan payments, soonest first.
    Upcoming {
        /// Show at most this many entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Income, expenses and net cash flow for the current period.
    Stats {
        /// weekly, biweekly or monthly
        #[arg(long, default_value = "monthly")]
        period: PaymentFrequency,
    },
    /// Load sample accounts, loans and recurring transactions.
    Demo,
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        /// Account name, e.g. 'Everyday Checking'
        name: String,
        /// checking, savings, credit_card, cash, investment
        #[arg(long = "type", default_value = "checking")]
        account_type: AccountType,
        /// Opening balance
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        balance: f64,
        /// Currency code (default: from settings)
        #[arg(long)]
        currency: Option<String>,
    },
    /// List all accounts.
    List,
}

#[derive(Args)]
pub struct TransactionArgs {
    /// What the money was for
    pub description: String,
    #[arg(long)]
    pub amount: f64,
    /// income or expense
    #[arg(long, default_value = "expense")]
    pub kind: EntryKind,
    /// Account ID (default: first account)
    #[arg(long)]
    pub account: Option<i64>,
    /// Category name
    #[arg(long)]
    pub category: Option<String>,
    /// YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// daily, weekly, biweekly, monthly, yearly
    #[arg(long)]
    pub recurrence: Option<Recurrence>,
    /// Bonus paid on top of an income amount
    #[arg(long)]
    pub bonus: Option<f64>,
}

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// Record a transaction and update the account balance.
    Add(TransactionArgs),
    /// List transactions, newest first.
    List {
        #[arg(long)]
        kind: Option<EntryKind>,
        /// Start date YYYY-MM-DD
        #[arg(long = "from")]
        from: Option<NaiveDate>,
        /// End date YYYY-MM-DD
        #[arg(long = "to")]
        to: Option<NaiveDate>,
        #[arg(long)]
        limit: Option<usize>,
        /// Include disabled transactions
        #[arg(long)]
        all: bool,
    },
    /// Delete a transaction and reverse its balance effect.
    Delete { id: i64 },
    /// Include an income's bonus in its next projected payout.
    Bonus {
        id: i64,
        /// Stop including the bonus
        #[arg(long)]
        off: bool,
    },
    /// Hide a transaction from upcoming and stats.
    Disable {
        id: i64,
        /// Re-enable instead
        #[arg(long)]
        enable: bool,
    },
}

#[derive(Args)]
pub struct LoanArgs {
    /// Loan name, e.g. 'Car Loan'
    pub name: String,
    /// personal, mortgage, auto, student, credit_card, bnpl, payday, other
    #[arg(long = "type", default_value = "personal")]
    pub loan_type: LoanType,
    #[arg(long)]
    pub principal: f64,
    /// Annual interest rate in percent
    #[arg(long, default_value = "0")]
    pub rate: f64,
    /// Term in months
    #[arg(long)]
    pub term: u32,
    /// Outstanding balance (default: principal)
    #[arg(long)]
    pub balance: Option<f64>,
    /// Scheduled payment (default: computed from the terms)
    #[arg(long)]
    pub payment: Option<f64>,
    /// Day of month, or weekday 1-7 for weekly and biweekly loans
    #[arg(long)]
    pub day: Option<u32>,
    /// weekly, biweekly or monthly (BNPL defaults to biweekly)
    #[arg(long)]
    pub frequency: Option<PaymentFrequency>,
    /// Start date YYYY-MM-DD (default: today)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Number of BNPL installments
    #[arg(long)]
    pub installments: Option<u32>,
    /// Upfront fee
    #[arg(long, default_value = "0")]
    pub fee: f64,
    /// Split a payday loan across two pay cycles
    #[arg(long)]
    pub split: bool,
    #[arg(long)]
    pub lender: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand)]
pub enum LoansCommands {
    /// Add a loan and generate its first payments.
    Add(LoanArgs),
    /// List all loans with their next due date.
    List,
    /// Show a loan's payments and totals.
    Payments { loan_id: i64 },
    /// Mark a payment as paid.
    Pay {
        payment_id: i64,
        /// Date paid, YYYY-MM-DD (default: today)
        #[arg(long)]
        on: Option<NaiveDate>,
    },
    /// Project the payoff date, optionally with an extra monthly payment.
    Payoff {
        loan_id: i64,
        #[arg(long)]
        extra: Option<f64>,
    },
    /// Hide a loan from upcoming and stats.
    Disable {
        loan_id: i64,
        /// Re-enable instead
        #[arg(long)]
        enable: bool,
    },
}

#[derive(Subcommand)]
pub enum CalcCommands {
    /// Print a full amortization schedule.
    Schedule {
        #[arg(long)]
        principal: f64,
        /// Annual interest rate in percent
        #[arg(long)]
        rate: f64,
        /// Term in months
        #[arg(long)]
        term: u32,
        /// First payment month, YYYY-MM-DD (default: today)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Day of month payments fall on (default: start day)
        #[arg(long)]
        day: Option<u32>,
    },
    /// Months and interest until a balance is paid off.
    Payoff {
        #[arg(long)]
        balance: f64,
        #[arg(long)]
        rate: f64,
        /// Monthly payment
        #[arg(long)]
        payment: f64,
        /// Extra monthly payment to compare against
        #[arg(long)]
        extra: Option<f64>,
    },
}
