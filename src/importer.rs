use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::{debug, warn};

use crate::categorizer::{
    classify, expense_category_for, find_category, is_column_header, loan_type_for, payment_frequency_for,
    recurrence_for, section_for, RowClass,
};
use crate::error::{PaydownError, Result};
use crate::ledger::Ledger;
use crate::models::{
    Account, AccountType, Category, EntryKind, ImportRow, ImportSection, NewAccount, NewLoan, NewTransaction,
    PaymentFrequency, TransactionFilter,
};
use crate::scheduler::create_loan;
use crate::transactions::record_transaction;

/// Color tag marking loans that came in through an import.
pub const IMPORT_LOAN_COLOR: &str = "#9333EA";
pub const DEFAULT_ACCOUNT_NAME: &str = "Main Account";

const IMPORT_TERM_MONTHS: u32 = 12;
const AMOUNT_TOLERANCE: f64 = 0.01;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[-+]?\s*[$€£¥]?\s*(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$").expect("amount regex")
    })
}

fn frequency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)daily|weekly|fortnightly|monthly|yearly").expect("frequency regex"))
}

fn numeric_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})[/\-](\d{1,2})[/\-](\d{2,4})$").expect("numeric date regex"))
}

fn month_name_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2})(?:,?\s+(\d{4}))?$",
        )
        .expect("month date regex")
    })
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("iso date regex"))
}

const MONTH_NAMES: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september", "october",
    "november", "december",
];

/// Extra layouts tried after the day-first and month-name forms.
const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%d %b %Y", "%b %d, %Y", "%b %d %Y"];

pub fn is_amount(cell: &str) -> bool {
    amount_re().is_match(cell)
}

fn is_date(cell: &str) -> bool {
    numeric_date_re().is_match(cell) || month_name_date_re().is_match(cell) || iso_date_re().is_match(cell)
}

/// Parse a spreadsheet amount such as `$1,234.50` or `-£20`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ',') && !c.is_whitespace())
        .collect();
    cleaned.parse().ok()
}

/// Day-first numeric dates (`5/11/2025`, `05-11-25`), month names
/// (`November 5`, `November 5, 2025`; the year defaults to `today`'s) and a
/// few generic layouts.
pub fn parse_due_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Some(caps) = numeric_date_re().captures(raw) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        let year = if year < 100 { 2000 + year } else { year };
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(caps) = month_name_date_re().captures(raw) {
        let name = caps[1].to_lowercase();
        let month = MONTH_NAMES.iter().position(|m| *m == name)? as u32 + 1;
        let day: u32 = caps[2].parse().ok()?;
        let year = match caps.get(3) {
            Some(y) => y.as_str().parse().ok()?,
            None => today.year(),
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

// ---------------------------------------------------------------------------
// Parse stage
// ---------------------------------------------------------------------------

/// Split pasted spreadsheet text into rows, tracking which section each row
/// falls under. Section and column-header lines produce no rows.
pub fn parse_import_data(raw: &str) -> Vec<ImportRow> {
    let raw = raw.trim();
    let first_line = raw.lines().next().unwrap_or("");
    let delimiter = if first_line.contains('\t') { b'\t' } else { b',' };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let mut rows = Vec::new();
    let mut section: Option<ImportSection> = None;

    for result in rdr.records() {
        let Ok(record) = result else { continue };
        let columns: Vec<&str> = record.iter().map(str::trim).collect();
        let first = columns.first().copied().unwrap_or("");

        if let Some(heading) = section_for(first) {
            section = Some(heading);
            continue;
        }
        if columns.iter().any(|c| is_column_header(c)) {
            continue;
        }
        if first.is_empty() {
            continue;
        }
        rows.push(parse_row(&columns, section));
    }
    debug!(rows = rows.len(), tab_delimited = delimiter == b'\t', "parsed import data");
    rows
}

fn parse_row(columns: &[&str], section: Option<ImportSection>) -> ImportRow {
    let mut row = ImportRow {
        description: columns[0].to_string(),
        section,
        ..Default::default()
    };
    let mut consumed = vec![false; columns.len()];
    consumed[0] = true;

    let amounts: Vec<(usize, f64)> = columns
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, c)| is_amount(c))
        .filter_map(|(i, c)| parse_amount(c).map(|v| (i, v)))
        .collect();
    match amounts.as_slice() {
        [] => {}
        [(_, payment)] => row.payment_amount = Some(*payment),
        [(_, total), (_, payment), ..] => {
            row.total_amount = Some(*total);
            row.payment_amount = Some(*payment);
        }
    }
    // Numeric columns past the second are ignored, and never become details.
    for (i, _) in &amounts {
        consumed[*i] = true;
    }

    if let Some(i) = (1..columns.len()).find(|&i| !consumed[i] && is_date(columns[i])) {
        row.due_date = Some(columns[i].to_string());
        consumed[i] = true;
    }
    if let Some(i) = (1..columns.len()).find(|&i| !consumed[i] && frequency_re().is_match(columns[i])) {
        row.frequency = Some(columns[i].to_string());
        consumed[i] = true;
    }
    if columns.len() > 1 && !consumed[1] && !columns[1].is_empty() {
        row.details = Some(columns[1].to_string());
    }
    row
}

// ---------------------------------------------------------------------------
// Classify + import stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub user_id: String,
    /// Date stamped on imported transactions and default loan start.
    pub today: NaiveDate,
    /// Currency for the account created when the user has none.
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportResult {
    pub income_count: usize,
    pub expense_count: usize,
    pub loan_count: usize,
    pub duplicate_count: usize,
    pub errors: Vec<String>,
}

impl ImportResult {
    pub fn message(&self) -> String {
        let mut msg = format!(
            "Imported {} income, {} expenses, {} loans",
            self.income_count, self.expense_count, self.loan_count
        );
        if self.duplicate_count > 0 {
            msg.push_str(&format!(", {} duplicates skipped", self.duplicate_count));
        }
        msg
    }
}

/// What the ledger already holds, plus everything created during this batch.
#[derive(Default)]
struct Snapshot {
    loans: Vec<(String, String, f64)>,
    transactions: Vec<(String, EntryKind, f64)>,
}

impl Snapshot {
    fn has_loan(&self, name: &str, lender: &str, principal: f64) -> bool {
        self.loans.iter().any(|(n, l, p)| {
            n.eq_ignore_ascii_case(name) && l.eq_ignore_ascii_case(lender) && (p - principal).abs() < AMOUNT_TOLERANCE
        })
    }

    fn has_transaction(&self, description: &str, kind: EntryKind, amount: f64) -> bool {
        self.transactions.iter().any(|(d, k, a)| {
            *k == kind && d.to_lowercase() == description.to_lowercase() && (a - amount).abs() < AMOUNT_TOLERANCE
        })
    }
}

enum Outcome {
    Created(RowClass),
    Duplicate,
}

struct ImportContext<'a> {
    options: &'a ImportOptions,
    account: Account,
    categories: Vec<Category>,
    snapshot: Snapshot,
}

/// Parse `raw` and write its rows to the ledger.
pub fn import_tabular_data<L: Ledger>(ledger: &L, raw: &str, options: &ImportOptions) -> Result<ImportResult> {
    let rows = parse_import_data(raw);
    import_rows(ledger, &rows, options)
}

/// Classify and store already-parsed rows. Only the initial ledger reads can
/// fail the whole batch; a failing row is reported in `errors` and skipped.
pub fn import_rows<L: Ledger>(ledger: &L, rows: &[ImportRow], options: &ImportOptions) -> Result<ImportResult> {
    let user_id = options.user_id.as_str();
    let account = match ledger.find_accounts(user_id)?.into_iter().next() {
        Some(account) => account,
        None => ledger.create_account(
            user_id,
            &NewAccount {
                name: DEFAULT_ACCOUNT_NAME.to_string(),
                account_type: AccountType::Checking,
                balance: 0.0,
                currency: options.currency.clone(),
            },
        )?,
    };
    let categories = ledger.find_categories(user_id)?;
    let mut snapshot = Snapshot::default();
    for loan in ledger.find_loans(user_id)? {
        snapshot
            .loans
            .push((loan.name, loan.lender.unwrap_or_default(), loan.principal));
    }
    let all = TransactionFilter {
        include_disabled: true,
        ..Default::default()
    };
    for txn in ledger.find_transactions(user_id, &all)? {
        snapshot.transactions.push((txn.description, txn.kind, txn.amount));
    }

    let mut ctx = ImportContext { options, account, categories, snapshot };
    let mut result = ImportResult::default();

    for row in rows {
        match import_row(ledger, &mut ctx, row) {
            Ok(Outcome::Created(RowClass::Loan)) => result.loan_count += 1,
            Ok(Outcome::Created(RowClass::Income)) => result.income_count += 1,
            Ok(Outcome::Created(RowClass::Expense)) => result.expense_count += 1,
            Ok(Outcome::Duplicate) => result.duplicate_count += 1,
            Err(e) => {
                warn!(description = %row.description, error = %e, "import row skipped");
                let message = match &e {
                    PaydownError::CategoryNotFound(_) => e.to_string(),
                    _ => format!("Error importing {}: {e}", row.description),
                };
                result.errors.push(message);
            }
        }
    }

    debug!(
        income = result.income_count,
        expenses = result.expense_count,
        loans = result.loan_count,
        duplicates = result.duplicate_count,
        errors = result.errors.len(),
        "import finished"
    );
    Ok(result)
}

fn with_details(row: &ImportRow) -> String {
    match &row.details {
        Some(details) => format!("{} - {}", row.description, details),
        None => row.description.clone(),
    }
}

fn import_row<L: Ledger>(ledger: &L, ctx: &mut ImportContext<'_>, row: &ImportRow) -> Result<Outcome> {
    let class = classify(row);
    debug!(description = %row.description, ?class, section = ?row.section, "classified import row");
    match class {
        RowClass::Loan => import_loan(ledger, ctx, row),
        RowClass::Income | RowClass::Expense => import_transaction(ledger, ctx, row, class),
    }
}

fn import_loan<L: Ledger>(ledger: &L, ctx: &mut ImportContext<'_>, row: &ImportRow) -> Result<Outcome> {
    let name = with_details(row);
    let lender = row.details.clone().unwrap_or_else(|| "Unknown".to_string());
    let principal = row.total_amount.or(row.payment_amount).unwrap_or(0.0);
    let payment = row.payment_amount.or(row.total_amount).unwrap_or(0.0);

    if ctx.snapshot.has_loan(&name, &lender, principal) {
        return Ok(Outcome::Duplicate);
    }

    let frequency = payment_frequency_for(row.frequency.as_deref());
    let due = row
        .due_date
        .as_deref()
        .and_then(|d| parse_due_date(d, ctx.options.today));
    let (start_date, payment_day) = match due {
        Some(date) if frequency == PaymentFrequency::Monthly => (date, date.day()),
        Some(date) => (date, date.weekday().number_from_monday()),
        None => (ctx.options.today, 1),
    };

    let new_loan = NewLoan {
        name: name.clone(),
        loan_type: loan_type_for(&row.description),
        principal,
        current_balance: principal,
        interest_rate: 0.0,
        term_months: IMPORT_TERM_MONTHS,
        start_date,
        payment_amount: payment,
        payment_day,
        payment_frequency: frequency,
        number_of_payments: Some(IMPORT_TERM_MONTHS),
        fee_amount: 0.0,
        allow_split_payment: false,
        lender: Some(lender.clone()),
        notes: row.frequency.as_ref().map(|f| format!("{f} payments")),
        color: Some(IMPORT_LOAN_COLOR.to_string()),
    };
    create_loan(ledger, &ctx.options.user_id, &new_loan)?;
    ctx.snapshot.loans.push((name, lender, principal));
    Ok(Outcome::Created(RowClass::Loan))
}

fn import_transaction<L: Ledger>(
    ledger: &L,
    ctx: &mut ImportContext<'_>,
    row: &ImportRow,
    class: RowClass,
) -> Result<Outcome> {
    let description = with_details(row);
    let lone = row.payment_amount.or(row.total_amount).unwrap_or(0.0);
    let (kind, amount, bonus_amount, category_name) = match class {
        RowClass::Income => match (row.total_amount, row.payment_amount) {
            (Some(total), Some(payment)) if (total - payment).abs() >= AMOUNT_TOLERANCE => {
                (EntryKind::Income, total, Some(payment), "Salary")
            }
            _ => (EntryKind::Income, lone, None, "Salary"),
        },
        _ => (EntryKind::Expense, lone, None, expense_category_for(&row.description)),
    };

    if ctx.snapshot.has_transaction(&description, kind, amount) {
        return Ok(Outcome::Duplicate);
    }

    let category = find_category(&ctx.categories, category_name, kind)
        .ok_or_else(|| PaydownError::CategoryNotFound(row.description.clone()))?;

    let recurrence = row.frequency.as_deref().and_then(recurrence_for);
    let new_txn = NewTransaction {
        account_id: ctx.account.id,
        category_id: Some(category.id),
        amount,
        kind,
        description: description.clone(),
        date: ctx.options.today,
        is_recurring: recurrence.is_some(),
        recurrence,
        bonus_amount,
        include_bonus_next: false,
    };
    record_transaction(ledger, &ctx.options.user_id, &new_txn)?;
    ctx.snapshot.transactions.push((description, kind, amount));
    Ok(Outcome::Created(class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{add_account, date, test_ledger};
    use crate::ledger::SqliteLedger;
    use crate::models::{
        Loan, LoanPayment, LoanType, NewLoanPayment, PaymentStatus, Recurrence, Transaction, TransactionChanges,
    };

    const SAMPLE: &str = "\
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

    fn options() -> ImportOptions {
        ImportOptions {
            user_id: "u1".to_string(),
            today: date(2025, 10, 1),
            currency: "AUD".to_string(),
        }
    }

    fn all_transactions(ledger: &SqliteLedger) -> Vec<Transaction> {
        ledger
            .find_transactions("u1", &TransactionFilter { include_disabled: true, ..Default::default() })
            .unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.50"), Some(1234.5));
        assert_eq!(parse_amount("£20"), Some(20.0));
        assert_eq!(parse_amount("-45.10"), Some(-45.1));
        assert_eq!(parse_amount("abc"), None);
        assert!(is_amount("€ 1,000"));
        assert!(!is_amount("5/11/2025"));
        assert!(!is_amount("12abc"));
    }

    #[test]
    fn test_parse_due_date_formats() {
        let today = date(2025, 10, 1);
        assert_eq!(parse_due_date("5/11/2025", today), Some(date(2025, 11, 5)));
        assert_eq!(parse_due_date("05-11-25", today), Some(date(2025, 11, 5)));
        assert_eq!(parse_due_date("November 15, 2026", today), Some(date(2026, 11, 15)));
        assert_eq!(parse_due_date("march 3", today), Some(date(2025, 3, 3)));
        assert_eq!(parse_due_date("2025-12-24", today), Some(date(2025, 12, 24)));
        assert_eq!(parse_due_date("31/02/2025", today), None);
        assert_eq!(parse_due_date("soon", today), None);
    }

    #[test]
    fn test_parse_sections_and_headers() {
        let rows = parse_import_data(SAMPLE);
        let described: Vec<(&str, Option<ImportSection>)> =
            rows.iter().map(|r| (r.description.as_str(), r.section)).collect();
        assert_eq!(
            described,
            vec![
                ("Salary", Some(ImportSection::IncomeSource)),
                ("Rent", Some(ImportSection::FixedCosts)),
                ("Afterpay", Some(ImportSection::FixedCosts)),
                ("Car Loan", Some(ImportSection::LoansAndDebt)),
                ("Groceries", Some(ImportSection::Discretionary)),
            ]
        );
    }

    #[test]
    fn test_parse_row_columns() {
        let rows = parse_import_data(SAMPLE);
        assert_eq!(
            rows[0],
            ImportRow {
                description: "Salary".to_string(),
                details: Some("Acme Pty Ltd".to_string()),
                total_amount: Some(3200.0),
                payment_amount: Some(250.0),
                frequency: Some("Fortnightly".to_string()),
                due_date: None,
                section: Some(ImportSection::IncomeSource),
            }
        );
        // A numeric second column is an amount, not details
        assert_eq!(rows[1].details, None);
        assert_eq!(rows[1].total_amount, Some(600.0));
        assert_eq!(rows[1].payment_amount, Some(720.0));
        assert_eq!(rows[2].due_date.as_deref(), Some("5/11/2025"));
        assert_eq!(rows[3].due_date.as_deref(), Some("November 15, 2025"));
        // Single amount becomes the payment
        assert_eq!(rows[4].details, None);
        assert_eq!(rows[4].total_amount, None);
        assert_eq!(rows[4].payment_amount, Some(150.0));
    }

    #[test]
    fn test_parse_comma_delimited_with_quotes() {
        let raw = "Fixed Costs\n\"Internet, NBN\",Telstra,\"$89.00\",Monthly\n\n,,\n";
        let rows = parse_import_data(raw);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "Internet, NBN");
        assert_eq!(rows[0].details.as_deref(), Some("Telstra"));
        assert_eq!(rows[0].payment_amount, Some(89.0));
        assert_eq!(rows[0].frequency.as_deref(), Some("Monthly"));
    }

    #[test]
    fn test_rent_row_is_an_expense() {
        let (_dir, ledger) = test_ledger();
        let row = ImportRow {
            description: "Rent".to_string(),
            total_amount: Some(600.0),
            payment_amount: Some(720.0),
            frequency: Some("Weekly".to_string()),
            section: Some(ImportSection::FixedCosts),
            ..Default::default()
        };
        let result = import_rows(&ledger, &[row], &options()).unwrap();
        assert_eq!(result.expense_count, 1);
        assert_eq!(result.loan_count, 0);

        let txns = all_transactions(&ledger);
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].amount, 720.0);
        assert_eq!(txns[0].kind, EntryKind::Expense);
        assert_eq!(txns[0].recurrence, Some(Recurrence::Weekly));
        let rent = ledger.match_category("u1", "Rent", EntryKind::Expense).unwrap().unwrap();
        assert_eq!(txns[0].category_id, Some(rent.id));

        let accounts = ledger.find_accounts("u1").unwrap();
        assert_eq!(accounts[0].name, DEFAULT_ACCOUNT_NAME);
        assert_eq!(accounts[0].balance, -720.0);
    }

    #[test]
    fn test_afterpay_in_fixed_costs_is_a_loan() {
        let (_dir, ledger) = test_ledger();
        let row = ImportRow {
            description: "Afterpay".to_string(),
            details: Some("TV".to_string()),
            total_amount: Some(400.0),
            payment_amount: Some(100.0),
            frequency: Some("Fortnightly".to_string()),
            due_date: Some("5/11/2025".to_string()),
            section: Some(ImportSection::FixedCosts),
        };
        let result = import_rows(&ledger, &[row], &options()).unwrap();
        assert_eq!(result.loan_count, 1);
        assert_eq!(result.expense_count, 0);

        let loans: Vec<Loan> = ledger.find_loans("u1").unwrap();
        let loan = &loans[0];
        assert_eq!(loan.name, "Afterpay - TV");
        assert_eq!(loan.lender.as_deref(), Some("TV"));
        assert_eq!(loan.principal, 400.0);
        assert_eq!(loan.payment_amount, 100.0);
        assert_eq!(loan.payment_frequency, PaymentFrequency::Biweekly);
        assert_eq!(loan.start_date, date(2025, 11, 5));
        // 2025-11-05 is a Wednesday
        assert_eq!(loan.payment_day, 3);
        assert_eq!(loan.color.as_deref(), Some(IMPORT_LOAN_COLOR));
        assert_eq!(loan.notes.as_deref(), Some("Fortnightly payments"));
        assert_eq!(loan.interest_rate, 0.0);
        assert_eq!(loan.term_months, 12);
        assert_eq!(ledger.find_loan_payments(loan.id).unwrap().len(), 12);
        assert!(all_transactions(&ledger).is_empty());
    }

    #[test]
    fn test_fortnightly_import_schedule_starts_on_due_date() {
        let (_dir, ledger) = test_ledger();
        import_tabular_data(&ledger, "Afterpay\tTV\t$400\t$100\tFortnightly\t5/11/2025\n", &options()).unwrap();

        let loan = &ledger.find_loans("u1").unwrap()[0];
        let payments = ledger.find_loan_payments(loan.id).unwrap();
        assert_eq!(payments[0].due_date, loan.start_date);
        assert!(payments.iter().all(|p| p.due_date >= loan.start_date));
        assert!(payments.iter().all(|p| p.due_date.day() == loan.start_date.day()));
    }

    #[test]
    fn test_import_sample_block() {
        let (_dir, ledger) = test_ledger();
        let result = import_tabular_data(&ledger, SAMPLE, &options()).unwrap();
        assert_eq!(result.income_count, 1);
        assert_eq!(result.expense_count, 2);
        assert_eq!(result.loan_count, 2);
        assert_eq!(result.duplicate_count, 0);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.message(), "Imported 1 income, 2 expenses, 2 loans");

        let salary = all_transactions(&ledger)
            .into_iter()
            .find(|t| t.kind == EntryKind::Income)
            .unwrap();
        assert_eq!(salary.description, "Salary - Acme Pty Ltd");
        assert_eq!(salary.amount, 3200.0);
        assert_eq!(salary.bonus_amount, Some(250.0));
        assert_eq!(salary.recurrence, Some(Recurrence::Biweekly));

        let car = ledger
            .find_loans("u1")
            .unwrap()
            .into_iter()
            .find(|l| l.name.starts_with("Car Loan"))
            .unwrap();
        assert_eq!(car.loan_type, LoanType::Auto);
        assert_eq!(car.payment_day, 15);
        assert_eq!(car.payment_frequency, PaymentFrequency::Monthly);

        // 3200 - 720 - 150
        assert_eq!(ledger.find_accounts("u1").unwrap()[0].balance, 2330.0);
    }

    #[test]
    fn test_second_import_is_all_duplicates() {
        let (_dir, ledger) = test_ledger();
        import_tabular_data(&ledger, SAMPLE, &options()).unwrap();
        let loans_before = ledger.find_loans("u1").unwrap().len();
        let txns_before = all_transactions(&ledger).len();

        let again = import_tabular_data(&ledger, SAMPLE, &options()).unwrap();
        assert_eq!(again.duplicate_count, 5);
        assert_eq!(again.income_count + again.expense_count + again.loan_count, 0);
        assert_eq!(again.message(), "Imported 0 income, 0 expenses, 0 loans, 5 duplicates skipped");
        assert_eq!(ledger.find_loans("u1").unwrap().len(), loans_before);
        assert_eq!(all_transactions(&ledger).len(), txns_before);
    }

    #[test]
    fn test_duplicates_within_one_batch() {
        let (_dir, ledger) = test_ledger();
        let raw = "Discretionary\nCoffee,,4.50\ncoffee,,4.50\nCoffee,,5.00\n";
        let result = import_tabular_data(&ledger, raw, &options()).unwrap();
        assert_eq!(result.expense_count, 2);
        assert_eq!(result.duplicate_count, 1);
    }

    #[test]
    fn test_existing_account_is_used() {
        let (_dir, ledger) = test_ledger();
        let savings = add_account(&ledger, AccountType::Savings, 1000.0);
        import_tabular_data(&ledger, "Food,,$50", &options()).unwrap();
        let accounts = ledger.find_accounts("u1").unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, savings.id);
        assert_eq!(accounts[0].balance, 950.0);
    }

    #[test]
    fn test_missing_categories_are_reported_per_row() {
        let dir = tempfile::tempdir().unwrap();
        // No categories seeded for this ledger
        let ledger = SqliteLedger::open(&dir.path().join("bare.db")).unwrap();
        let raw = "Gym,,30\nAfterpay,,200\n";
        let result = import_tabular_data(&ledger, raw, &options()).unwrap();
        assert_eq!(result.errors, vec!["No category found for: Gym".to_string()]);
        assert_eq!(result.loan_count, 1);
    }

    #[test]
    fn test_row_without_amount_is_reported() {
        let (_dir, ledger) = test_ledger();
        let result = import_tabular_data(&ledger, "Mystery\nRent,,900\n", &options()).unwrap();
        assert_eq!(result.expense_count, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Error importing Mystery: Validation error"));
    }

    /// Delegates to a real ledger but refuses to store one description.
    struct FlakyLedger {
        inner: SqliteLedger,
        poison: &'static str,
    }

    impl Ledger for FlakyLedger {
        fn find_accounts(&self, user_id: &str) -> Result<Vec<Account>> {
            self.inner.find_accounts(user_id)
        }
        fn create_account(&self, user_id: &str, account: &NewAccount) -> Result<Account> {
            self.inner.create_account(user_id, account)
        }
        fn update_account_balance(&self, account_id: i64, delta: f64) -> Result<()> {
            self.inner.update_account_balance(account_id, delta)
        }
        fn find_categories(&self, user_id: &str) -> Result<Vec<Category>> {
            self.inner.find_categories(user_id)
        }
        fn create_transaction(&self, user_id: &str, txn: &NewTransaction) -> Result<Transaction> {
            if txn.description == self.poison {
                return Err(PaydownError::Ledger(rusqlite::Error::QueryReturnedNoRows));
            }
            self.inner.create_transaction(user_id, txn)
        }
        fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>> {
            self.inner.get_transaction(user_id, id)
        }
        fn update_transaction(&self, user_id: &str, id: i64, changes: &TransactionChanges) -> Result<Transaction> {
            self.inner.update_transaction(user_id, id, changes)
        }
        fn delete_transaction(&self, user_id: &str, id: i64) -> Result<()> {
            self.inner.delete_transaction(user_id, id)
        }
        fn set_include_bonus_next(&self, user_id: &str, id: i64, include: bool) -> Result<()> {
            self.inner.set_include_bonus_next(user_id, id, include)
        }
        fn set_transaction_disabled(&self, user_id: &str, id: i64, disabled: bool) -> Result<()> {
            self.inner.set_transaction_disabled(user_id, id, disabled)
        }
        fn find_transactions(&self, user_id: &str, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
            self.inner.find_transactions(user_id, filter)
        }
        fn create_loan(&self, user_id: &str, loan: &NewLoan, end_date: NaiveDate) -> Result<Loan> {
            self.inner.create_loan(user_id, loan, end_date)
        }
        fn create_loan_payments(&self, loan_id: i64, payments: &[NewLoanPayment]) -> Result<Vec<LoanPayment>> {
            self.inner.create_loan_payments(loan_id, payments)
        }
        fn find_loans(&self, user_id: &str) -> Result<Vec<Loan>> {
            self.inner.find_loans(user_id)
        }
        fn get_loan(&self, user_id: &str, loan_id: i64) -> Result<Option<Loan>> {
            self.inner.get_loan(user_id, loan_id)
        }
        fn set_loan_balance(&self, loan_id: i64, balance: f64) -> Result<()> {
            self.inner.set_loan_balance(loan_id, balance)
        }
        fn set_loan_disabled(&self, user_id: &str, loan_id: i64, disabled: bool) -> Result<()> {
            self.inner.set_loan_disabled(user_id, loan_id, disabled)
        }
        fn find_loan_payments(&self, loan_id: i64) -> Result<Vec<LoanPayment>> {
            self.inner.find_loan_payments(loan_id)
        }
        fn get_loan_payment(&self, user_id: &str, payment_id: i64) -> Result<Option<LoanPayment>> {
            self.inner.get_loan_payment(user_id, payment_id)
        }
        fn update_loan_payment(
            &self,
            payment_id: i64,
            status: PaymentStatus,
            payment_date: Option<NaiveDate>,
        ) -> Result<()> {
            self.inner.update_loan_payment(payment_id, status, payment_date)
        }
    }

    #[test]
    fn test_ledger_failure_on_one_row_keeps_the_rest() {
        let (_dir, inner) = test_ledger();
        let ledger = FlakyLedger { inner, poison: "Fuel" };
        let raw = "Rent,,900\nFuel,,60\nFood,,120\n";
        let result = import_tabular_data(&ledger, raw, &options()).unwrap();
        assert_eq!(result.expense_count, 2);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Error importing Fuel: Ledger error"));

        let descriptions: Vec<String> = all_transactions(&ledger.inner).into_iter().map(|t| t.description).collect();
        assert_eq!(descriptions.len(), 2);
        assert!(!descriptions.contains(&"Fuel".to_string()));
        assert_eq!(ledger.inner.find_accounts("u1").unwrap()[0].balance, -1020.0);
    }
}
