mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{AccountsCommands, CalcCommands, Cli, Commands, LoansCommands, TransactionsCommands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli::resolve_settings(cli.data_dir.as_deref());

    let result = match cli.command {
        Commands::Init { currency, user } => cli::init::run(settings, currency, user),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add {
                name,
                account_type,
                balance,
                currency,
            } => cli::accounts::add(&settings, &name, account_type, balance, currency.as_deref()),
            AccountsCommands::List => cli::accounts::list(&settings),
        },
        Commands::Transactions { command } => match command {
            TransactionsCommands::Add(args) => cli::transactions::add(&settings, args),
            TransactionsCommands::List {
                kind,
                from,
                to,
                limit,
                all,
            } => cli::transactions::list(&settings, kind, from, to, limit, all),
            TransactionsCommands::Delete { id } => cli::transactions::delete(&settings, id),
            TransactionsCommands::Bonus { id, off } => cli::transactions::bonus(&settings, id, !off),
            TransactionsCommands::Disable { id, enable } => cli::transactions::disable(&settings, id, !enable),
        },
        Commands::Loans { command } => match command {
            LoansCommands::Add(args) => cli::loans::add(&settings, args),
            LoansCommands::List => cli::loans::list(&settings),
            LoansCommands::Payments { loan_id } => cli::loans::payments(&settings, loan_id),
            LoansCommands::Pay { payment_id, on } => cli::loans::pay(&settings, payment_id, on),
            LoansCommands::Payoff { loan_id, extra } => cli::loans::payoff(&settings, loan_id, extra),
            LoansCommands::Disable { loan_id, enable } => cli::loans::disable(&settings, loan_id, !enable),
        },
        Commands::Calc { command } => match command {
            CalcCommands::Schedule {
                principal,
                rate,
                term,
                start,
                day,
            } => cli::calc::schedule(&settings, principal, rate, term, start, day),
            CalcCommands::Payoff {
                balance,
                rate,
                payment,
                extra,
            } => cli::calc::payoff(&settings, balance, rate, payment, extra),
        },
        Commands::Import { file } => cli::import::run(&settings, &file),
        Commands::Upcoming { limit } => cli::upcoming::run(&settings, limit),
        Commands::Stats { period } => cli::stats::run(&settings, period),
        Commands::Demo => cli::demo::run(&settings),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
