use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

/// Raised when a stored or user-supplied label does not name a known variant.
#[derive(Debug, Error)]
#[error("unrecognized {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Generates `as_str`, `Display` and `FromStr` for a string-backed enum.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_lowercase();
                $name::ALL
                    .iter()
                    .find(|v| v.as_str() == needle)
                    .copied()
                    .ok_or_else(|| UnknownVariant { kind: $kind, value: s.to_string() })
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Checking,
    Savings,
    CreditCard,
    Cash,
    Investment,
}

string_enum!(AccountType, "account type", {
    Checking => "checking",
    Savings => "savings",
    CreditCard => "credit_card",
    Cash => "cash",
    Investment => "investment",
});

/// Direction of money for categories and transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Income,
    Expense,
}

string_enum!(EntryKind, "entry kind", {
    Income => "income",
    Expense => "expense",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
}

string_enum!(Recurrence, "recurrence", {
    Daily => "daily",
    Weekly => "weekly",
    Biweekly => "biweekly",
    Monthly => "monthly",
    Yearly => "yearly",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanType {
    Personal,
    Mortgage,
    Auto,
    Student,
    CreditCard,
    Bnpl,
    Payday,
    Other,
}

string_enum!(LoanType, "loan type", {
    Personal => "personal",
    Mortgage => "mortgage",
    Auto => "auto",
    Student => "student",
    CreditCard => "credit_card",
    Bnpl => "bnpl",
    Payday => "payday",
    Other => "other",
});

impl LoanType {
    /// Products whose schedule comes from the amortization formula.
    pub fn is_amortized(&self) -> bool {
        !matches!(self, Self::Bnpl | Self::Payday)
    }
}

/// Cadence of loan payments, also used as the reporting period for stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentFrequency {
    Weekly,
    Biweekly,
    #[default]
    Monthly,
}

string_enum!(PaymentFrequency, "payment frequency", {
    Weekly => "weekly",
    Biweekly => "biweekly",
    Monthly => "monthly",
});

impl PaymentFrequency {
    /// Days between BNPL installments.
    pub fn installment_days(&self) -> i64 {
        match self {
            Self::Weekly => 7,
            Self::Biweekly => 14,
            Self::Monthly => 30,
        }
    }
}

/// Persisted payment status. Overdue is derived, see [`PaymentState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

string_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Paid => "paid",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    Pending,
    Paid,
    Overdue,
}

string_enum!(PaymentState, "payment state", {
    Pending => "pending",
    Paid => "paid",
    Overdue => "overdue",
});

// ---------------------------------------------------------------------------
// Ledger records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub account_type: AccountType,
    pub balance: f64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    pub balance: f64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub kind: EntryKind,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub amount: f64,
    pub kind: EntryKind,
    pub description: String,
    pub date: NaiveDate,
    pub is_recurring: bool,
    pub recurrence: Option<Recurrence>,
    pub bonus_amount: Option<f64>,
    pub include_bonus_next: bool,
    pub is_disabled: bool,
}

impl Transaction {
    /// Signed change this transaction applies to its account balance.
    pub fn balance_effect(&self) -> f64 {
        balance_effect(self.kind, self.amount)
    }
}

pub fn balance_effect(kind: EntryKind, amount: f64) -> f64 {
    match kind {
        EntryKind::Income => amount,
        EntryKind::Expense => -amount,
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub amount: f64,
    pub kind: EntryKind,
    pub description: String,
    pub date: NaiveDate,
    pub is_recurring: bool,
    pub recurrence: Option<Recurrence>,
    pub bonus_amount: Option<f64>,
    pub include_bonus_next: bool,
}

/// Partial update of a transaction; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct TransactionChanges {
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub amount: Option<f64>,
    pub kind: Option<EntryKind>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<EntryKind>,
    /// Only transactions flagged recurring or carrying a recurrence.
    pub recurring_only: bool,
    pub include_disabled: bool,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Loan {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub loan_type: LoanType,
    pub principal: f64,
    pub current_balance: f64,
    pub interest_rate: f64,
    pub term_months: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payment_amount: f64,
    pub payment_day: u32,
    pub payment_frequency: PaymentFrequency,
    pub number_of_payments: Option<u32>,
    pub fee_amount: f64,
    pub allow_split_payment: bool,
    pub lender: Option<String>,
    pub notes: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub is_paid_off: bool,
    pub is_disabled: bool,
}

#[derive(Debug, Clone)]
pub struct NewLoan {
    pub name: String,
    pub loan_type: LoanType,
    pub principal: f64,
    pub current_balance: f64,
    pub interest_rate: f64,
    pub term_months: u32,
    pub start_date: NaiveDate,
    pub payment_amount: f64,
    pub payment_day: u32,
    pub payment_frequency: PaymentFrequency,
    pub number_of_payments: Option<u32>,
    pub fee_amount: f64,
    pub allow_split_payment: bool,
    pub lender: Option<String>,
    pub notes: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoanPayment {
    pub id: i64,
    pub loan_id: i64,
    pub due_date: NaiveDate,
    pub amount: f64,
    pub principal: f64,
    pub interest: f64,
    pub status: PaymentStatus,
    pub payment_date: Option<NaiveDate>,
}

impl LoanPayment {
    /// Display state as of `today`; a pending payment past its due date is overdue.
    pub fn state_on(&self, today: NaiveDate) -> PaymentState {
        match self.status {
            PaymentStatus::Paid => PaymentState::Paid,
            PaymentStatus::Pending if self.due_date < today => PaymentState::Overdue,
            PaymentStatus::Pending => PaymentState::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLoanPayment {
    pub due_date: NaiveDate,
    pub amount: f64,
    pub principal: f64,
    pub interest: f64,
}

// ---------------------------------------------------------------------------
// Transient views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSection {
    IncomeSource,
    FixedCosts,
    LoansAndDebt,
    Discretionary,
}

string_enum!(ImportSection, "import section", {
    IncomeSource => "income source",
    FixedCosts => "fixed costs",
    LoansAndDebt => "loans & debt",
    Discretionary => "discretionary",
});

/// One data line of a pasted spreadsheet, before classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRow {
    pub description: String,
    pub details: Option<String>,
    pub total_amount: Option<f64>,
    pub payment_amount: Option<f64>,
    pub frequency: Option<String>,
    pub due_date: Option<String>,
    pub section: Option<ImportSection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObligationKind {
    Income,
    Expense,
    Loan,
}

string_enum!(ObligationKind, "obligation kind", {
    Income => "income",
    Expense => "expense",
    Loan => "loan",
});

#[derive(Debug, Clone)]
pub struct UpcomingObligation {
    pub id: String,
    pub kind: ObligationKind,
    pub name: String,
    pub amount: f64,
    pub due_date: Option<NaiveDate>,
    pub frequency: Option<String>,
    pub bonus_amount: Option<f64>,
    pub bonus_included: bool,
    pub lender: Option<String>,
    pub balance: Option<f64>,
}
