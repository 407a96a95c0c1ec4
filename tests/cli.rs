use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SPREADSHEET: &str = "\
Income Source\tDetails\tTotal Amount\tAmount Due\tFrequency
Salary\tAcme Pty Ltd\t$3,200.00\t$250.00\tFortnightly
Fixed Costs
Rent\t600\t720\tWeekly
Afterpay\tTV\t$400\t$100\tFortnightly\t5/11/2025
Loans & Debt
Car Loan\tToyota Finance\t$18,500\t$466.08\tMonthly\tNovember 15, 2025
Discretionary
Groceries\t\t$150\tWeekly
";

/// A `paydown` invocation isolated to its own home and data directory.
struct Sandbox {
    home: TempDir,
    data: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
            data: tempfile::tempdir().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("paydown").unwrap();
        cmd.env("HOME", self.home.path())
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .arg("--data-dir")
            .arg(self.data.path());
        cmd
    }
}

#[test]
fn init_writes_settings_and_database() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["init", "--currency", "usd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Currency:   USD"));

    assert!(sb.data.path().join("paydown.db").exists());
    let settings = std::fs::read_to_string(sb.home.path().join(".config/paydown/settings.json")).unwrap();
    assert!(settings.contains("\"currency\": \"USD\""));
}

#[test]
fn accounts_add_and_list() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["accounts", "add", "Everyday", "--balance", "1500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added account #1: Everyday"));
    sb.cmd()
        .args(["accounts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Everyday").and(predicate::str::contains("1,500.00")));
}

#[test]
fn transaction_without_account_fails() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["transactions", "add", "Coffee", "--amount", "4.50"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error: Not found"));
}

#[test]
fn transactions_add_list_delete() {
    let sb = Sandbox::new();
    sb.cmd().args(["accounts", "add", "Everyday"]).assert().success();
    sb.cmd()
        .args(["transactions", "add", "Rent", "--amount", "720", "--category", "rent", "--recurrence", "weekly"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded expense #1: Rent"));
    sb.cmd()
        .args(["transactions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Transactions (1)"));
    sb.cmd()
        .args(["accounts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-$720.00"));

    sb.cmd().args(["transactions", "delete", "1"]).assert().success();
    sb.cmd()
        .args(["accounts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$0.00"));
}

#[test]
fn import_from_stdin_reports_counts() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["import", "-"])
        .write_stdin(SPREADSHEET)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 income, 2 expenses, 2 loans"));

    sb.cmd()
        .args(["import", "-"])
        .write_stdin(SPREADSHEET)
        .assert()
        .success()
        .stdout(predicate::str::contains("5 duplicates skipped"));

    sb.cmd()
        .args(["loans", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Afterpay").and(predicate::str::contains("Car Loan")));
}

#[test]
fn import_from_file() {
    let sb = Sandbox::new();
    let path = sb.data.path().join("budget.csv");
    std::fs::write(&path, "Fixed Costs\nInternet,,$89.00,Monthly\n").unwrap();
    sb.cmd()
        .arg("import")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 0 income, 1 expenses, 0 loans"));
}

#[test]
fn loan_lifecycle() {
    let sb = Sandbox::new();
    sb.cmd()
        .args([
            "loans", "add", "Car Loan", "--type", "auto", "--principal", "25000", "--rate", "4.5", "--term", "60",
            "--start", "2025-01-15", "--lender", "Chase Auto Finance",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added loan #1: Car Loan (auto)").and(predicate::str::contains(
            "12 payments scheduled, 2025-01-15 to 2025-12-15",
        )));

    sb.cmd()
        .args(["loans", "payments", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$466.08"));

    sb.cmd()
        .args(["loans", "pay", "1", "--on", "2025-01-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Car Loan balance:"));

    sb.cmd()
        .args(["loans", "pay", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already paid"));

    sb.cmd()
        .args(["loans", "payoff", "1", "--extra", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("months sooner"));
}

#[test]
fn bnpl_without_installments_is_rejected() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["loans", "add", "Laptop", "--type", "bnpl", "--principal", "1200", "--term", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation error"));
}

#[test]
fn calc_schedule_ends_at_zero() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["calc", "schedule", "--principal", "1200", "--rate", "0", "--term", "12", "--start", "2025-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-02-28").and(predicate::str::contains("Total interest: $0.00")));
}

#[test]
fn calc_payoff_rejects_payment_below_interest() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["calc", "payoff", "--balance", "10000", "--rate", "24", "--payment", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not cover"));
}

#[test]
fn upcoming_and_stats_after_demo() {
    let sb = Sandbox::new();
    sb.cmd()
        .arg("upcoming")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing upcoming."));

    sb.cmd()
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Demo data loaded!"));
    sb.cmd()
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("already loaded"));

    sb.cmd()
        .args(["upcoming", "--limit", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Upcoming"));
    sb.cmd()
        .args(["stats", "--period", "weekly"])
        .assert()
        .success()
        .stdout(predicate::str::contains("weekly summary"));
}
