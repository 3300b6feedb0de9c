//! Error types for the ledger.

use crate::payment::PaymentId;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Broad category of a [`LedgerError`].
///
/// Every category except `Input` is an expected business outcome that the
/// ledger rejects before touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown account or payment id.
    NotFound,
    /// Malformed argument: empty id, non-positive amount, self-merge, ...
    Validation,
    /// Well-formed request the current state cannot satisfy.
    BusinessRule,
    /// Caller does not own the referenced payment.
    Authorization,
    /// Script, file or argument problems at the CLI boundary.
    Input,
}

/// Errors that can occur during ledger operation.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No live account with this id
    #[error("Account {0} not found")]
    AccountNotFound(String),

    /// No scheduled payment with this id
    #[error("Payment {0} not found")]
    PaymentNotFound(PaymentId),

    /// Account ids must be non-empty
    #[error("Account id must not be empty")]
    InvalidAccountId,

    /// Account id already registered
    #[error("Account {0} already exists")]
    DuplicateAccount(String),

    /// Amounts must be strictly positive minor units
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    /// An account cannot be merged into itself
    #[error("Cannot merge account {0} into itself")]
    SelfMerge(String),

    /// Cashback percentage could not be parsed or is negative
    #[error("Invalid cashback percentage: {0}")]
    InvalidPercentage(String),

    /// Sender balance does not cover the amount
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: String,
        balance: i64,
        requested: i64,
    },

    /// Crediting would push the balance past `i64::MAX`
    #[error("Crediting {amount} to account {account} would overflow its balance of {balance}")]
    BalanceOverflow {
        account: String,
        balance: i64,
        amount: i64,
    },

    /// Recording the transfer would push the outgoing total past `i64::MAX`
    #[error("Recording {amount} for account {account} would overflow its outgoing total of {total}")]
    OutgoingOverflow {
        account: String,
        total: i64,
        amount: i64,
    },

    /// Payment status requested by an account that does not send it
    #[error("Account {account} is not authorized to view payment {payment}")]
    Unauthorized { account: String, payment: PaymentId },

    /// Failed to open, read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid script record
    #[error("Invalid command at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Missing script file argument
    #[error("Missing script file argument. Usage: temporal-ledger <script.csv> [accounts_out.csv]")]
    MissingArgument,
}

impl LedgerError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::AccountNotFound(_) | LedgerError::PaymentNotFound(_) => ErrorKind::NotFound,
            LedgerError::InvalidAccountId
            | LedgerError::DuplicateAccount(_)
            | LedgerError::NonPositiveAmount(_)
            | LedgerError::SelfMerge(_)
            | LedgerError::InvalidPercentage(_) => ErrorKind::Validation,
            LedgerError::InsufficientFunds { .. }
            | LedgerError::BalanceOverflow { .. }
            | LedgerError::OutgoingOverflow { .. } => ErrorKind::BusinessRule,
            LedgerError::Unauthorized { .. } => ErrorKind::Authorization,
            LedgerError::Io(_)
            | LedgerError::Csv(_)
            | LedgerError::InvalidRecord { .. }
            | LedgerError::MissingArgument => ErrorKind::Input,
        }
    }
}
