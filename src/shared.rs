//! Thread-safe handle over a [`Ledger`].
//!
//! One `RwLock` guards balances, histories, payments and the ranking
//! together. Each mutation holds the write lock for its whole duration, so
//! no reader can see a debited balance without the matching rank update,
//! and a merge holds both of its accounts at once.

use crate::account::Timestamp;
use crate::error::Result;
use crate::ledger::{AccountSnapshot, Ledger, ProcessingReport};
use crate::payment::{PaymentId, PaymentIdGenerator, PaymentStatus};
use crate::percent::Percentage;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable, `Send + Sync` ledger handle.
#[derive(Clone, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    pub fn new() -> Self {
        Self::from_ledger(Ledger::new())
    }

    pub fn with_id_generator(ids: Box<dyn PaymentIdGenerator>) -> Self {
        Self::from_ledger(Ledger::with_id_generator(ids))
    }

    pub fn from_ledger(ledger: Ledger) -> Self {
        SharedLedger {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    // Ledger operations mutate only after validation, bounds included; a
    // poisoned lock still guards a consistent ledger.
    fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_account(&self, id: &str, timestamp: Timestamp) -> Result<()> {
        self.write().create_account(id, timestamp)
    }

    pub fn deposit(&self, id: &str, timestamp: Timestamp, amount: i64) -> Result<i64> {
        self.write().deposit(id, timestamp, amount)
    }

    pub fn transfer(&self, from: &str, to: &str, timestamp: Timestamp, amount: i64) -> Result<i64> {
        self.write().transfer(from, to, timestamp, amount)
    }

    pub fn top_spenders(&self, timestamp: Timestamp, n: usize) -> Vec<String> {
        self.read().top_spenders(timestamp, n)
    }

    pub fn schedule_payment(
        &self,
        from: &str,
        to: &str,
        timestamp: Timestamp,
        amount: i64,
        cashback: Percentage,
    ) -> Result<PaymentId> {
        self.write()
            .schedule_payment(from, to, timestamp, amount, cashback)
    }

    pub fn payment_status(
        &self,
        account: &str,
        timestamp: Timestamp,
        payment: &PaymentId,
    ) -> Result<PaymentStatus> {
        self.read().payment_status(account, timestamp, payment)
    }

    pub fn process_scheduled_payments(&self, now: Timestamp) -> ProcessingReport {
        self.write().process_scheduled_payments(now)
    }

    pub fn merge_accounts(&self, survivor: &str, absorbed: &str) -> Result<()> {
        self.write().merge_accounts(survivor, absorbed)
    }

    pub fn balance(&self, id: &str) -> Result<i64> {
        self.read().balance(id)
    }

    pub fn snapshot(&self) -> Vec<AccountSnapshot> {
        self.read().snapshot()
    }

    /// Runs `f` with shared access to the whole ledger, for multi-step reads
    /// that must observe one consistent state.
    pub fn with_ledger<T>(&self, f: impl FnOnce(&Ledger) -> T) -> T {
        f(&self.read())
    }
}
