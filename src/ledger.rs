//! The ledger collaborator: every read and write the scheduling and import
//! engine performs against stored accounts, categories, transactions and
//! loans goes through [`Ledger`]. [`SqliteLedger`] is the rusqlite backend.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{ToSql, Type};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::categorizer::find_category;
use crate::db::{get_connection, init_db};
use crate::error::{PaydownError, Result};
use crate::models::{
    Account, Category, EntryKind, Loan, LoanPayment, NewAccount, NewLoan, NewLoanPayment,
    NewTransaction, PaymentStatus, Transaction, TransactionChanges, TransactionFilter,
    UnknownVariant,
};

pub trait Ledger {
    fn find_accounts(&self, user_id: &str) -> Result<Vec<Account>>;
    fn create_account(&self, user_id: &str, account: &NewAccount) -> Result<Account>;
    fn update_account_balance(&self, account_id: i64, delta: f64) -> Result<()>;

    fn find_categories(&self, user_id: &str) -> Result<Vec<Category>>;

    /// Best category of `kind` for `name`: exact, then partial, then any of that kind.
    fn match_category(&self, user_id: &str, name: &str, kind: EntryKind) -> Result<Option<Category>> {
        let categories = self.find_categories(user_id)?;
        Ok(find_category(&categories, name, kind).cloned())
    }

    fn create_transaction(&self, user_id: &str, txn: &NewTransaction) -> Result<Transaction>;
    fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>>;
    /// Rewrite the stored row only; balance bookkeeping is the caller's job.
    fn update_transaction(&self, user_id: &str, id: i64, changes: &TransactionChanges) -> Result<Transaction>;
    fn delete_transaction(&self, user_id: &str, id: i64) -> Result<()>;
    fn set_include_bonus_next(&self, user_id: &str, id: i64, include: bool) -> Result<()>;
    fn set_transaction_disabled(&self, user_id: &str, id: i64, disabled: bool) -> Result<()>;
    fn find_transactions(&self, user_id: &str, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    fn create_loan(&self, user_id: &str, loan: &NewLoan, end_date: NaiveDate) -> Result<Loan>;
    fn create_loan_payments(&self, loan_id: i64, payments: &[NewLoanPayment]) -> Result<Vec<LoanPayment>>;
    fn find_loans(&self, user_id: &str) -> Result<Vec<Loan>>;
    fn get_loan(&self, user_id: &str, loan_id: i64) -> Result<Option<Loan>>;
    fn set_loan_balance(&self, loan_id: i64, balance: f64) -> Result<()>;
    fn set_loan_disabled(&self, user_id: &str, loan_id: i64, disabled: bool) -> Result<()>;
    fn find_loan_payments(&self, loan_id: i64) -> Result<Vec<LoanPayment>>;
    /// A payment, provided it belongs to one of `user_id`'s loans.
    fn get_loan_payment(&self, user_id: &str, payment_id: i64) -> Result<Option<LoanPayment>>;
    fn update_loan_payment(
        &self,
        payment_id: i64,
        status: PaymentStatus,
        payment_date: Option<NaiveDate>,
    ) -> Result<()>;

    /// Run `f` so that all of its writes commit together or not at all.
    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T>,
    {
        f(self)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = UnknownVariant>,
{
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}

const ACCOUNT_COLUMNS: &str = "id, user_id, name, account_type, balance, currency";

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        account_type: parse_text(row, 3)?,
        balance: row.get(4)?,
        currency: row.get(5)?,
    })
}

const TRANSACTION_COLUMNS: &str = "id, user_id, account_id, category_id, amount, kind, description, date, \
     is_recurring, recurrence, bonus_amount, include_bonus_next, is_disabled";

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        account_id: row.get(2)?,
        category_id: row.get(3)?,
        amount: row.get(4)?,
        kind: parse_text(row, 5)?,
        description: row.get(6)?,
        date: row.get(7)?,
        is_recurring: row.get(8)?,
        recurrence: parse_opt_text(row, 9)?,
        bonus_amount: row.get(10)?,
        include_bonus_next: row.get(11)?,
        is_disabled: row.get(12)?,
    })
}

const LOAN_COLUMNS: &str = "id, user_id, name, loan_type, principal, current_balance, interest_rate, \
     term_months, start_date, end_date, payment_amount, payment_day, payment_frequency, \
     number_of_payments, fee_amount, allow_split_payment, lender, notes, color, is_active, \
     is_paid_off, is_disabled";

fn loan_from_row(row: &Row<'_>) -> rusqlite::Result<Loan> {
    Ok(Loan {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        loan_type: parse_text(row, 3)?,
        principal: row.get(4)?,
        current_balance: row.get(5)?,
        interest_rate: row.get(6)?,
        term_months: row.get(7)?,
        start_date: row.get(8)?,
        end_date: row.get(9)?,
        payment_amount: row.get(10)?,
        payment_day: row.get(11)?,
        payment_frequency: parse_text(row, 12)?,
        number_of_payments: row.get(13)?,
        fee_amount: row.get(14)?,
        allow_split_payment: row.get(15)?,
        lender: row.get(16)?,
        notes: row.get(17)?,
        color: row.get(18)?,
        is_active: row.get(19)?,
        is_paid_off: row.get(20)?,
        is_disabled: row.get(21)?,
    })
}

const PAYMENT_COLUMNS: &str = "id, loan_id, due_date, amount, principal, interest, status, payment_date";

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<LoanPayment> {
    Ok(LoanPayment {
        id: row.get(0)?,
        loan_id: row.get(1)?,
        due_date: row.get(2)?,
        amount: row.get(3)?,
        principal: row.get(4)?,
        interest: row.get(5)?,
        status: parse_text(row, 6)?,
        payment_date: row.get(7)?,
    })
}

// ---------------------------------------------------------------------------
// SQLite backend
// ---------------------------------------------------------------------------

pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open (creating if needed) the database at `db_path` and ensure the schema.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn expect_changed(changed: usize, what: &str, id: i64) -> Result<()> {
        if changed == 0 {
            return Err(PaydownError::NotFound(format!("{what} {id}")));
        }
        Ok(())
    }
}

impl Ledger for SqliteLedger {
    fn find_accounts(&self, user_id: &str) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map([user_id], account_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn create_account(&self, user_id: &str, account: &NewAccount) -> Result<Account> {
        self.conn.execute(
            "INSERT INTO accounts (user_id, name, account_type, balance, currency) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                user_id,
                account.name,
                account.account_type.as_str(),
                account.balance,
                account.currency,
            ],
        )?;
        Ok(Account {
            id: self.conn.last_insert_rowid(),
            user_id: user_id.to_string(),
            name: account.name.clone(),
            account_type: account.account_type,
            balance: account.balance,
            currency: account.currency.clone(),
        })
    }

    fn update_account_balance(&self, account_id: i64, delta: f64) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE accounts SET balance = balance + ?1 WHERE id = ?2",
            rusqlite::params![delta, account_id],
        )?;
        Self::expect_changed(changed, "account", account_id)
    }

    fn find_categories(&self, user_id: &str) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, kind, icon, color FROM categories WHERE user_id = ?1 ORDER BY kind, id",
        )?;
        let rows = stmt
            .query_map([user_id], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    kind: parse_text(row, 3)?,
                    icon: row.get(4)?,
                    color: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn create_transaction(&self, user_id: &str, txn: &NewTransaction) -> Result<Transaction> {
        self.conn.execute(
            "INSERT INTO transactions (user_id, account_id, category_id, amount, kind, description, date, \
             is_recurring, recurrence, bonus_amount, include_bonus_next) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                user_id,
                txn.account_id,
                txn.category_id,
                txn.amount,
                txn.kind.as_str(),
                txn.description,
                txn.date,
                txn.is_recurring,
                txn.recurrence.map(|r| r.as_str()),
                txn.bonus_amount,
                txn.include_bonus_next,
            ],
        )?;
        Ok(Transaction {
            id: self.conn.last_insert_rowid(),
            user_id: user_id.to_string(),
            account_id: txn.account_id,
            category_id: txn.category_id,
            amount: txn.amount,
            kind: txn.kind,
            description: txn.description.clone(),
            date: txn.date,
            is_recurring: txn.is_recurring,
            recurrence: txn.recurrence,
            bonus_amount: txn.bonus_amount,
            include_bonus_next: txn.include_bonus_next,
            is_disabled: false,
        })
    }

    fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>> {
        let txn = self
            .conn
            .query_row(
                &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1 AND user_id = ?2"),
                rusqlite::params![id, user_id],
                transaction_from_row,
            )
            .optional()?;
        Ok(txn)
    }

    fn update_transaction(&self, user_id: &str, id: i64, changes: &TransactionChanges) -> Result<Transaction> {
        let mut txn = self
            .get_transaction(user_id, id)?
            .ok_or_else(|| PaydownError::NotFound(format!("transaction {id}")))?;
        if let Some(account_id) = changes.account_id {
            txn.account_id = account_id;
        }
        if let Some(category_id) = changes.category_id {
            txn.category_id = Some(category_id);
        }
        if let Some(amount) = changes.amount {
            txn.amount = amount;
        }
        if let Some(kind) = changes.kind {
            txn.kind = kind;
        }
        if let Some(description) = &changes.description {
            txn.description = description.clone();
        }
        if let Some(date) = changes.date {
            txn.date = date;
        }
        self.conn.execute(
            "UPDATE transactions SET account_id = ?1, category_id = ?2, amount = ?3, kind = ?4, \
             description = ?5, date = ?6 WHERE id = ?7",
            rusqlite::params![
                txn.account_id,
                txn.category_id,
                txn.amount,
                txn.kind.as_str(),
                txn.description,
                txn.date,
                id,
            ],
        )?;
        Ok(txn)
    }

    fn delete_transaction(&self, user_id: &str, id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM transactions WHERE id = ?1 AND user_id = ?2",
            rusqlite::params![id, user_id],
        )?;
        Self::expect_changed(changed, "transaction", id)
    }

    fn set_include_bonus_next(&self, user_id: &str, id: i64, include: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE transactions SET include_bonus_next = ?1 WHERE id = ?2 AND user_id = ?3",
            rusqlite::params![include, id, user_id],
        )?;
        Self::expect_changed(changed, "transaction", id)
    }

    fn set_transaction_disabled(&self, user_id: &str, id: i64, disabled: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE transactions SET is_disabled = ?1 WHERE id = ?2 AND user_id = ?3",
            rusqlite::params![disabled, id, user_id],
        )?;
        Self::expect_changed(changed, "transaction", id)
    }

    fn find_transactions(&self, user_id: &str, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut clauses = vec!["user_id = ?1".to_string()];
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.to_string())];
        if let Some(kind) = filter.kind {
            params.push(Box::new(kind.as_str()));
            clauses.push(format!("kind = ?{}", params.len()));
        }
        if filter.recurring_only {
            clauses.push("(is_recurring = 1 OR recurrence IS NOT NULL)".to_string());
        }
        if !filter.include_disabled {
            clauses.push("is_disabled = 0".to_string());
        }
        if let Some(from) = filter.from {
            params.push(Box::new(from));
            clauses.push(format!("date >= ?{}", params.len()));
        }
        if let Some(to) = filter.to {
            params.push(Box::new(to));
            clauses.push(format!("date <= ?{}", params.len()));
        }
        let mut sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE {} ORDER BY date DESC, id DESC",
            clauses.join(" AND ")
        );
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_values: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt
            .query_map(param_values.as_slice(), transaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn create_loan(&self, user_id: &str, loan: &NewLoan, end_date: NaiveDate) -> Result<Loan> {
        self.conn.execute(
            "INSERT INTO loans (user_id, name, loan_type, principal, current_balance, interest_rate, \
             term_months, start_date, end_date, payment_amount, payment_day, payment_frequency, \
             number_of_payments, fee_amount, allow_split_payment, lender, notes, color) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            rusqlite::params![
                user_id,
                loan.name,
                loan.loan_type.as_str(),
                loan.principal,
                loan.current_balance,
                loan.interest_rate,
                loan.term_months,
                loan.start_date,
                end_date,
                loan.payment_amount,
                loan.payment_day,
                loan.payment_frequency.as_str(),
                loan.number_of_payments,
                loan.fee_amount,
                loan.allow_split_payment,
                loan.lender,
                loan.notes,
                loan.color,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_loan(user_id, id)?
            .ok_or_else(|| PaydownError::NotFound(format!("loan {id}")))
    }

    fn create_loan_payments(&self, loan_id: i64, payments: &[NewLoanPayment]) -> Result<Vec<LoanPayment>> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO loan_payments (loan_id, due_date, amount, principal, interest, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, 'pending')",
        )?;
        let mut created = Vec::with_capacity(payments.len());
        for p in payments {
            stmt.execute(rusqlite::params![loan_id, p.due_date, p.amount, p.principal, p.interest])?;
            created.push(LoanPayment {
                id: self.conn.last_insert_rowid(),
                loan_id,
                due_date: p.due_date,
                amount: p.amount,
                principal: p.principal,
                interest: p.interest,
                status: PaymentStatus::Pending,
                payment_date: None,
            });
        }
        Ok(created)
    }

    fn find_loans(&self, user_id: &str) -> Result<Vec<Loan>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE user_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map([user_id], loan_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_loan(&self, user_id: &str, loan_id: i64) -> Result<Option<Loan>> {
        let loan = self
            .conn
            .query_row(
                &format!("SELECT {LOAN_COLUMNS} FROM loans WHERE id = ?1 AND user_id = ?2"),
                rusqlite::params![loan_id, user_id],
                loan_from_row,
            )
            .optional()?;
        Ok(loan)
    }

    fn set_loan_balance(&self, loan_id: i64, balance: f64) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE loans SET current_balance = ?1 WHERE id = ?2",
            rusqlite::params![balance, loan_id],
        )?;
        Self::expect_changed(changed, "loan", loan_id)
    }

    fn set_loan_disabled(&self, user_id: &str, loan_id: i64, disabled: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE loans SET is_disabled = ?1 WHERE id = ?2 AND user_id = ?3",
            rusqlite::params![disabled, loan_id, user_id],
        )?;
        Self::expect_changed(changed, "loan", loan_id)
    }

    fn find_loan_payments(&self, loan_id: i64) -> Result<Vec<LoanPayment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM loan_payments WHERE loan_id = ?1 ORDER BY due_date, id"
        ))?;
        let rows = stmt
            .query_map([loan_id], payment_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_loan_payment(&self, user_id: &str, payment_id: i64) -> Result<Option<LoanPayment>> {
        let payment = self
            .conn
            .query_row(
                "SELECT p.id, p.loan_id, p.due_date, p.amount, p.principal, p.interest, p.status, p.payment_date \
                 FROM loan_payments p JOIN loans l ON p.loan_id = l.id \
                 WHERE p.id = ?1 AND l.user_id = ?2",
                rusqlite::params![payment_id, user_id],
                payment_from_row,
            )
            .optional()?;
        Ok(payment)
    }

    fn update_loan_payment(
        &self,
        payment_id: i64,
        status: PaymentStatus,
        payment_date: Option<NaiveDate>,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE loan_payments SET status = ?1, payment_date = ?2 WHERE id = ?3",
            rusqlite::params![status.as_str(), payment_date, payment_id],
        )?;
        Self::expect_changed(changed, "loan payment", payment_id)
    }

    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        // Already inside an outer transaction: join it.
        if !self.conn.is_autocommit() {
            return f(self);
        }
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }
}
