//! Scheduled payments and their identifiers.

use crate::account::Timestamp;
use crate::percent::Percentage;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque, globally unique payment identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PaymentId {
    fn from(id: String) -> Self {
        PaymentId(id)
    }
}

impl From<&str> for PaymentId {
    fn from(id: &str) -> Self {
        PaymentId(id.to_string())
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of fresh payment ids.
///
/// Injected into the ledger so tests and replays can use predictable ids.
pub trait PaymentIdGenerator: Send + Sync {
    fn next_id(&self) -> PaymentId;
}

/// Yields `payment1`, `payment2`, ...
#[derive(Debug, Default)]
pub struct SequentialPaymentIds {
    counter: AtomicU64,
}

impl SequentialPaymentIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentIdGenerator for SequentialPaymentIds {
    fn next_id(&self) -> PaymentId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        PaymentId(format!("payment{}", n))
    }
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidPaymentIds;

impl PaymentIdGenerator for UuidPaymentIds {
    fn next_id(&self) -> PaymentId {
        PaymentId(uuid::Uuid::new_v4().to_string())
    }
}

/// Lifecycle of a scheduled payment. Leaves `Scheduled` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Scheduled,
    Processed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Scheduled => "scheduled",
            PaymentStatus::Processed => "processed",
            PaymentStatus::Failed => "failed",
        }
    }

    /// `true` once the payment has been processed or has failed.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Scheduled)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deferred transfer with sender cashback.
///
/// Only the ledger mutates it: merges repoint `from`/`to`, processing sets
/// the terminal status. Retained after processing for status queries.
#[derive(Debug, Clone)]
pub struct ScheduledPayment {
    pub id: PaymentId,
    pub from: String,
    pub to: String,
    pub scheduled_at: Timestamp,
    pub amount: i64,
    pub cashback: Percentage,
    pub status: PaymentStatus,
}

impl ScheduledPayment {
    pub fn new(
        id: PaymentId,
        from: impl Into<String>,
        to: impl Into<String>,
        scheduled_at: Timestamp,
        amount: i64,
        cashback: Percentage,
    ) -> Self {
        ScheduledPayment {
            id,
            from: from.into(),
            to: to.into(),
            scheduled_at,
            amount,
            cashback,
            status: PaymentStatus::Scheduled,
        }
    }

    /// Still pending and due at `now`.
    pub fn is_due(&self, now: Timestamp) -> bool {
        !self.status.is_terminal() && self.scheduled_at <= now
    }
}
