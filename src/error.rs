use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaydownError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payment of {payment:.2} does not cover the {interest:.2} interest accrued per period")]
    PaymentTooLow { payment: f64, interest: f64 },

    #[error("No category found for: {0}")]
    CategoryNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, PaydownError>;

/// Shorthand for building a `Validation` error from anything displayable.
pub fn invalid(msg: impl Into<String>) -> PaydownError {
    PaydownError::Validation(msg.into())
}
