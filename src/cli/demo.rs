use chrono::{Days, Months, NaiveDate};

use paydown::amortization::{monthly_payment, round2};
use paydown::error::Result;
use paydown::ledger::{Ledger, SqliteLedger};
use paydown::models::{AccountType, EntryKind, LoanType, NewAccount, NewLoan, NewTransaction, PaymentFrequency, Recurrence};
use paydown::scheduler::create_loan;
use paydown::settings::Settings;
use paydown::transactions::record_transaction;

use super::{open_ledger, today};

const ACCOUNT_NAME: &str = "Everyday Checking";

struct DemoLoan {
    name: &'static str,
    loan_type: LoanType,
    principal: f64,
    rate: f64,
    term_months: u32,
    /// How long ago the loan started.
    months_ago: u32,
    payment_day: u32,
    lender: &'static str,
}

const AMORTIZED: &[DemoLoan] = &[
    DemoLoan {
        name: "Car Loan",
        loan_type: LoanType::Auto,
        principal: 25000.0,
        rate: 4.5,
        term_months: 60,
        months_ago: 6,
        payment_day: 15,
        lender: "Chase Auto Finance",
    },
    DemoLoan {
        name: "Student Loan",
        loan_type: LoanType::Student,
        principal: 18000.0,
        rate: 5.05,
        term_months: 120,
        months_ago: 14,
        payment_day: 1,
        lender: "Federal Student Aid",
    },
    DemoLoan {
        name: "Visa Card",
        loan_type: LoanType::CreditCard,
        principal: 3200.0,
        rate: 19.99,
        term_months: 24,
        months_ago: 2,
        payment_day: 22,
        lender: "Commonwealth Bank",
    },
];

struct DemoRecurring {
    description: &'static str,
    kind: EntryKind,
    amount: f64,
    recurrence: Recurrence,
    category: &'static str,
    days_ago: u64,
}

const RECURRING: &[DemoRecurring] = &[
    DemoRecurring { description: "Salary", kind: EntryKind::Income, amount: 3200.0, recurrence: Recurrence::Biweekly, category: "Salary", days_ago: 9 },
    DemoRecurring { description: "Rent", kind: EntryKind::Expense, amount: 1800.0, recurrence: Recurrence::Monthly, category: "Rent", days_ago: 20 },
    DemoRecurring { description: "Electricity", kind: EntryKind::Expense, amount: 145.0, recurrence: Recurrence::Monthly, category: "Utilities", days_ago: 12 },
    DemoRecurring { description: "Groceries", kind: EntryKind::Expense, amount: 180.0, recurrence: Recurrence::Weekly, category: "Groceries", days_ago: 3 },
    DemoRecurring { description: "Netflix", kind: EntryKind::Expense, amount: 22.99, recurrence: Recurrence::Monthly, category: "Subscriptions", days_ago: 25 },
    DemoRecurring { description: "Car Insurance", kind: EntryKind::Expense, amount: 960.0, recurrence: Recurrence::Yearly, category: "Transport", days_ago: 200 },
];

pub(crate) struct DemoCounts {
    pub loans: usize,
    pub payments: usize,
    pub transactions: usize,
}

fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}

fn demo_loans(now: NaiveDate) -> Vec<NewLoan> {
    let mut loans: Vec<NewLoan> = AMORTIZED
        .iter()
        .map(|l| NewLoan {
            name: l.name.to_string(),
            loan_type: l.loan_type,
            principal: l.principal,
            current_balance: l.principal,
            interest_rate: l.rate,
            term_months: l.term_months,
            start_date: months_before(now, l.months_ago),
            payment_amount: round2(monthly_payment(l.principal, l.rate, l.term_months)),
            payment_day: l.payment_day,
            payment_frequency: PaymentFrequency::Monthly,
            number_of_payments: None,
            fee_amount: 0.0,
            allow_split_payment: false,
            lender: Some(l.lender.to_string()),
            notes: None,
            color: None,
        })
        .collect();

    loans.push(NewLoan {
        name: "Headphones".to_string(),
        loan_type: LoanType::Bnpl,
        principal: 480.0,
        current_balance: 480.0,
        interest_rate: 0.0,
        term_months: 2,
        start_date: now,
        payment_amount: 120.0,
        payment_day: 3,
        payment_frequency: PaymentFrequency::Biweekly,
        number_of_payments: Some(4),
        fee_amount: 0.0,
        allow_split_payment: false,
        lender: Some("Afterpay".to_string()),
        notes: None,
        color: None,
    });
    loans.push(NewLoan {
        name: "Cash Advance".to_string(),
        loan_type: LoanType::Payday,
        principal: 400.0,
        current_balance: 400.0,
        interest_rate: 0.0,
        term_months: 1,
        start_date: now,
        payment_amount: 240.0,
        payment_day: 1,
        payment_frequency: PaymentFrequency::Monthly,
        number_of_payments: None,
        fee_amount: 80.0,
        allow_split_payment: true,
        lender: Some("QuickCash".to_string()),
        notes: Some("split over two pay cycles".to_string()),
        color: None,
    });
    loans
}

pub(crate) fn insert_demo_data(ledger: &SqliteLedger, settings: &Settings, now: NaiveDate) -> Result<DemoCounts> {
    let user_id = settings.user_id.as_str();
    ledger.in_transaction(|ledger| {
        let account = ledger.create_account(
            user_id,
            &NewAccount {
                name: ACCOUNT_NAME.to_string(),
                account_type: AccountType::Checking,
                balance: 4250.0,
                currency: settings.currency.clone(),
            },
        )?;

        let mut counts = DemoCounts { loans: 0, payments: 0, transactions: 0 };
        for loan in demo_loans(now) {
            let (_, payments) = create_loan(ledger, user_id, &loan)?;
            counts.loans += 1;
            counts.payments += payments.len();
        }

        for r in RECURRING {
            let category = ledger.match_category(user_id, r.category, r.kind)?;
            record_transaction(
                ledger,
                user_id,
                &NewTransaction {
                    account_id: account.id,
                    category_id: category.map(|c| c.id),
                    amount: r.amount,
                    kind: r.kind,
                    description: r.description.to_string(),
                    date: now - Days::new(r.days_ago),
                    is_recurring: true,
                    recurrence: Some(r.recurrence),
                    bonus_amount: (r.kind == EntryKind::Income).then_some(500.0),
                    include_bonus_next: false,
                },
            )?;
            counts.transactions += 1;
        }
        Ok(counts)
    })
}

pub fn run(settings: &Settings) -> Result<()> {
    let ledger = open_ledger(settings)?;

    if ledger
        .find_accounts(&settings.user_id)?
        .iter()
        .any(|a| a.name == ACCOUNT_NAME)
    {
        println!("Demo data already loaded (account '{ACCOUNT_NAME}' exists).");
        return Ok(());
    }

    let counts = insert_demo_data(&ledger, settings, today())?;

    println!("Demo data loaded!");
    println!("  Account:      {ACCOUNT_NAME}");
    println!("  Loans:        {}", counts.loans);
    println!("  Payments:     {}", counts.payments);
    println!("  Recurring:    {}", counts.transactions);
    println!();
    println!("Try these next:");
    println!("  paydown upcoming");
    println!("  paydown loans list");
    println!("  paydown loans payments 1");
    println!("  paydown stats --period weekly");
    Ok(())
}
