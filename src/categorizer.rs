use crate::models::{Category, EntryKind, ImportRow, ImportSection, LoanType, PaymentFrequency, Recurrence};

/// How a rule's patterns are tested against lowercased text.
#[derive(Debug, Clone, Copy)]
enum MatchType {
    Contains,
    StartsWith,
}

/// One entry of an ordered rule table; the first rule whose patterns match wins.
struct Rule<T> {
    patterns: &'static [&'static str],
    match_type: MatchType,
    result: T,
}

const fn contains<T>(patterns: &'static [&'static str], result: T) -> Rule<T> {
    Rule { patterns, match_type: MatchType::Contains, result }
}

fn matches(text: &str, pattern: &str, match_type: MatchType) -> bool {
    match match_type {
        MatchType::Contains => text.contains(pattern),
        MatchType::StartsWith => text.starts_with(pattern),
    }
}

fn first_match<T: Copy>(rules: &[Rule<T>], text: &str) -> Option<T> {
    let lowered = text.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| matches(&lowered, p, rule.match_type)))
        .map(|rule| rule.result)
}

// ---- Rule tables ----

const LOAN_KEYWORDS: &[&str] = &["loan", "credit card", "bnpl", "afterpay", "laybuy", "zip", "klarna"];

const LOAN_TYPE_RULES: &[Rule<LoanType>] = &[
    contains(&["student"], LoanType::Student),
    contains(&["credit card"], LoanType::CreditCard),
    contains(&["mortgage", "home"], LoanType::Mortgage),
    contains(&["car", "auto"], LoanType::Auto),
];

const EXPENSE_CATEGORY_RULES: &[Rule<&str>] = &[
    contains(&["rent"], "Rent"),
    contains(&["utilit"], "Utilities"),
    contains(&["health"], "Healthcare"),
    contains(&["internet", "mobile"], "Subscriptions"),
    contains(&["groceries", "food"], "Groceries"),
    contains(&["transport", "fuel", "car"], "Transport"),
];

const FREQUENCY_RULES: &[Rule<PaymentFrequency>] = &[
    contains(&["fort", "biweek"], PaymentFrequency::Biweekly),
    contains(&["week"], PaymentFrequency::Weekly),
];

const RECURRENCE_RULES: &[Rule<Recurrence>] = &[
    contains(&["daily"], Recurrence::Daily),
    contains(&["fortnight", "biweek"], Recurrence::Biweekly),
    contains(&["week"], Recurrence::Weekly),
    contains(&["month"], Recurrence::Monthly),
    contains(&["year", "annual"], Recurrence::Yearly),
];

const SECTION_RULES: &[Rule<ImportSection>] = &[
    contains(&["income source"], ImportSection::IncomeSource),
    contains(&["fixed costs"], ImportSection::FixedCosts),
    contains(&["loans & debt"], ImportSection::LoansAndDebt),
    contains(&["discretionary"], ImportSection::Discretionary),
];

const COLUMN_HEADER_RULES: &[Rule<()>] = &[Rule {
    patterns: &["detailed category", "total amount", "amount due", "due date"],
    match_type: MatchType::StartsWith,
    result: (),
}];

// ---- Classification ----

/// Which ledger entity an imported row becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Loan,
    Income,
    Expense,
}

/// Loans first (section or lender keywords), then the income section, else expense.
pub fn classify(row: &ImportRow) -> RowClass {
    let description = row.description.to_lowercase();
    if row.section == Some(ImportSection::LoansAndDebt)
        || LOAN_KEYWORDS.iter().any(|k| description.contains(k))
    {
        RowClass::Loan
    } else if row.section == Some(ImportSection::IncomeSource) {
        RowClass::Income
    } else {
        RowClass::Expense
    }
}

pub fn loan_type_for(description: &str) -> LoanType {
    first_match(LOAN_TYPE_RULES, description).unwrap_or(LoanType::Personal)
}

pub fn expense_category_for(description: &str) -> &'static str {
    first_match(EXPENSE_CATEGORY_RULES, description).unwrap_or("Other Expense")
}

/// Loan payment cadence from free-form frequency text; monthly when absent or unknown.
pub fn payment_frequency_for(frequency: Option<&str>) -> PaymentFrequency {
    frequency
        .and_then(|f| first_match(FREQUENCY_RULES, f))
        .unwrap_or(PaymentFrequency::Monthly)
}

pub fn recurrence_for(frequency: &str) -> Option<Recurrence> {
    first_match(RECURRENCE_RULES, frequency)
}

/// Section named by a spreadsheet heading cell, if any.
pub fn section_for(cell: &str) -> Option<ImportSection> {
    first_match(SECTION_RULES, cell)
}

pub fn is_column_header(cell: &str) -> bool {
    first_match(COLUMN_HEADER_RULES, cell).is_some()
}

/// Best category of `kind` for `name`: exact (case-insensitive), then a partial
/// match either way round, then the first category of that kind.
pub fn find_category<'a>(categories: &'a [Category], name: &str, kind: EntryKind) -> Option<&'a Category> {
    let needle = name.to_lowercase();
    let of_kind = || categories.iter().filter(move |c| c.kind == kind);

    of_kind()
        .find(|c| c.name.to_lowercase() == needle)
        .or_else(|| {
            of_kind().find(|c| {
                let hay = c.name.to_lowercase();
                hay.contains(&needle) || needle.contains(&hay)
            })
        })
        .or_else(|| of_kind().next())
}
