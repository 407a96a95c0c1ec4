use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const DB_FILE: &str = "paydown.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    account_type TEXT NOT NULL,
    balance REAL NOT NULL DEFAULT 0,
    currency TEXT NOT NULL DEFAULT 'AUD',
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    icon TEXT,
    color TEXT,
    UNIQUE (user_id, name, kind)
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    account_id INTEGER NOT NULL,
    category_id INTEGER,
    amount REAL NOT NULL,
    kind TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    date TEXT NOT NULL,
    is_recurring INTEGER NOT NULL DEFAULT 0,
    recurrence TEXT,
    bonus_amount REAL,
    include_bonus_next INTEGER NOT NULL DEFAULT 0,
    is_disabled INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (category_id) REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS loans (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    loan_type TEXT NOT NULL,
    principal REAL NOT NULL,
    current_balance REAL NOT NULL,
    interest_rate REAL NOT NULL DEFAULT 0,
    term_months INTEGER NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    payment_amount REAL NOT NULL,
    payment_day INTEGER NOT NULL,
    payment_frequency TEXT NOT NULL DEFAULT 'monthly',
    number_of_payments INTEGER,
    fee_amount REAL NOT NULL DEFAULT 0,
    allow_split_payment INTEGER NOT NULL DEFAULT 0,
    lender TEXT,
    notes TEXT,
    color TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    is_paid_off INTEGER NOT NULL DEFAULT 0,
    is_disabled INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS loan_payments (
    id INTEGER PRIMARY KEY,
    loan_id INTEGER NOT NULL,
    due_date TEXT NOT NULL,
    amount REAL NOT NULL,
    principal REAL NOT NULL DEFAULT 0,
    interest REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending',
    payment_date TEXT,
    FOREIGN KEY (loan_id) REFERENCES loans(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id, date);
CREATE INDEX IF NOT EXISTS idx_loan_payments_loan ON loan_payments(loan_id, due_date);
";

// (name, kind, icon, color)
const DEFAULT_CATEGORIES: &[(&str, &str, &str, &str)] = &[
    // Income
    ("Salary", "income", "💰", "#10b981"),
    ("Freelance", "income", "💼", "#3b82f6"),
    ("Investment", "income", "📈", "#8b5cf6"),
    ("Other Income", "income", "💵", "#06b6d4"),
    // Expenses
    ("Groceries", "expense", "🛒", "#f59e0b"),
    ("Rent", "expense", "🏠", "#ef4444"),
    ("Utilities", "expense", "⚡", "#6366f1"),
    ("Transport", "expense", "🚗", "#14b8a6"),
    ("Entertainment", "expense", "🎬", "#ec4899"),
    ("Healthcare", "expense", "🏥", "#f43f5e"),
    ("Education", "expense", "📚", "#8b5cf6"),
    ("Shopping", "expense", "🛍️", "#f97316"),
    ("Subscriptions", "expense", "📱", "#06b6d4"),
    ("Other Expense", "expense", "📝", "#6b7280"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Give `user_id` the default income/expense categories. Existing ones are kept.
pub fn seed_categories(conn: &Connection, user_id: &str) -> Result<usize> {
    let mut inserted = 0;
    for (name, kind, icon, color) in DEFAULT_CATEGORIES {
        inserted += conn.execute(
            "INSERT OR IGNORE INTO categories (user_id, name, kind, icon, color) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![user_id, name, kind, icon, color],
        )?;
    }
    Ok(inserted)
}
