//! Script command models for CSV parsing and internal representation.

use crate::account::Timestamp;
use crate::error::{LedgerError, Result};
use crate::payment::PaymentId;
use crate::percent::Percentage;
use serde::Deserialize;
use std::str::FromStr;

/// Raw command record as read from a script CSV.
///
/// Columns not used by an operation may be left empty.
#[derive(Debug, Default, Deserialize)]
pub struct CommandRecord {
    /// Operation name, e.g. `transfer` or `top_spenders`
    pub op: String,

    pub timestamp: Option<Timestamp>,

    /// Acting account: sender, depositor, merge survivor, status requester
    pub account: Option<String>,

    /// Counterparty: receiver, or the account absorbed by a merge
    pub target: Option<String>,

    /// Amount in minor units, or `n` for `top_spenders`
    pub amount: Option<i64>,

    /// Cashback percent for `schedule_payment`, payment id for `payment_status`
    pub extra: Option<String>,
}

impl CommandRecord {
    /// Parses the raw record into a typed command.
    ///
    /// `row` is only used to label the error.
    pub fn parse(&self, row: usize) -> Result<Command> {
        let op = self.op.trim().to_lowercase();

        let command = match op.as_str() {
            "create_account" => Command::CreateAccount {
                timestamp: self.timestamp(row)?,
                account: self.account(row)?,
            },
            "deposit" => Command::Deposit {
                timestamp: self.timestamp(row)?,
                account: self.account(row)?,
                amount: self.amount(row)?,
            },
            "transfer" => Command::Transfer {
                timestamp: self.timestamp(row)?,
                from: self.account(row)?,
                to: self.target(row)?,
                amount: self.amount(row)?,
            },
            "top_spenders" => Command::TopSpenders {
                timestamp: self.timestamp(row)?,
                n: usize::try_from(self.amount(row)?).unwrap_or(0),
            },
            "schedule_payment" => Command::SchedulePayment {
                timestamp: self.timestamp(row)?,
                from: self.account(row)?,
                to: self.target(row)?,
                amount: self.amount(row)?,
                cashback: match self.extra() {
                    Some(text) => Percentage::from_str(text).map_err(|e| invalid(row, e))?,
                    None => Percentage::ZERO,
                },
            },
            "payment_status" => Command::PaymentStatus {
                timestamp: self.timestamp(row)?,
                account: self.account(row)?,
                payment: self
                    .extra()
                    .map(PaymentId::from)
                    .ok_or_else(|| invalid(row, "missing payment id in extra"))?,
            },
            "process_scheduled" => Command::ProcessScheduled {
                timestamp: self.timestamp(row)?,
            },
            "merge_accounts" => Command::MergeAccounts {
                survivor: self.account(row)?,
                absorbed: self.target(row)?,
            },
            "balance" => Command::Balance {
                account: self.account(row)?,
            },
            other => return Err(invalid(row, format!("unknown operation '{}'", other))),
        };

        Ok(command)
    }

    fn timestamp(&self, row: usize) -> Result<Timestamp> {
        self.timestamp.ok_or_else(|| invalid(row, "missing timestamp"))
    }

    fn account(&self, row: usize) -> Result<String> {
        non_empty(&self.account).ok_or_else(|| invalid(row, "missing account"))
    }

    fn target(&self, row: usize) -> Result<String> {
        non_empty(&self.target).ok_or_else(|| invalid(row, "missing target"))
    }

    fn amount(&self, row: usize) -> Result<i64> {
        self.amount.ok_or_else(|| invalid(row, "missing amount"))
    }

    fn extra(&self) -> Option<&str> {
        self.extra
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn invalid(row: usize, message: impl ToString) -> LedgerError {
    LedgerError::InvalidRecord {
        row,
        message: message.to_string(),
    }
}

/// A parsed command ready to run against a ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateAccount {
        timestamp: Timestamp,
        account: String,
    },
    Deposit {
        timestamp: Timestamp,
        account: String,
        amount: i64,
    },
    Transfer {
        timestamp: Timestamp,
        from: String,
        to: String,
        amount: i64,
    },
    /// Non-positive `n` from the script becomes 0.
    TopSpenders { timestamp: Timestamp, n: usize },
    SchedulePayment {
        timestamp: Timestamp,
        from: String,
        to: String,
        amount: i64,
        cashback: Percentage,
    },
    PaymentStatus {
        timestamp: Timestamp,
        account: String,
        payment: PaymentId,
    },
    ProcessScheduled { timestamp: Timestamp },
    MergeAccounts { survivor: String, absorbed: String },
    Balance { account: String },
}

impl Command {
    /// Operation name as written in scripts.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateAccount { .. } => "create_account",
            Command::Deposit { .. } => "deposit",
            Command::Transfer { .. } => "transfer",
            Command::TopSpenders { .. } => "top_spenders",
            Command::SchedulePayment { .. } => "schedule_payment",
            Command::PaymentStatus { .. } => "payment_status",
            Command::ProcessScheduled { .. } => "process_scheduled",
            Command::MergeAccounts { .. } => "merge_accounts",
            Command::Balance { .. } => "balance",
        }
    }
}
