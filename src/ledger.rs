//! Core ledger.
//!
//! Owns the account registry, the scheduled-payment registry and the
//! top-spender ranking, and keeps the three consistent: every path that
//! changes an account's outgoing total (transfer, scheduled payment, merge)
//! updates the ranking in the same call.
//!
//! Operations validate everything up front and only then mutate, so a
//! rejected call leaves the ledger untouched.

use crate::account::{Account, Timestamp};
use crate::error::{LedgerError, Result};
use crate::payment::{
    PaymentId, PaymentIdGenerator, PaymentStatus, ScheduledPayment, SequentialPaymentIds,
};
use crate::percent::Percentage;
use crate::ranking::RankingIndex;
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;

/// Final state of one account, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    pub account: String,
    pub balance: i64,
    pub outgoing_total: i64,
}

/// Outcome of one [`Ledger::process_scheduled_payments`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingReport {
    /// Payments that transferred, in processing order.
    pub processed: Vec<PaymentId>,
    /// Payments that could not transfer, in processing order.
    pub failed: Vec<PaymentId>,
    /// Sum of cashback credited to senders.
    pub cashback_paid: i64,
}

/// The in-memory ledger.
///
/// # Watermark
///
/// `watermark` is the greatest timestamp passed to a transfer or a schedule
/// call. No outgoing event is ever recorded past it, so the maintained
/// ranking answers any query at or after the watermark exactly; earlier
/// queries are recomputed from each account's prefix index.
pub struct Ledger {
    accounts: HashMap<String, Account>,

    /// Payments in scheduling order; never removed.
    payments: Vec<ScheduledPayment>,
    payment_index: HashMap<PaymentId, usize>,

    ranking: RankingIndex,
    watermark: Timestamp,
    ids: Box<dyn PaymentIdGenerator>,
}

impl Ledger {
    /// Creates an empty ledger issuing `payment1`, `payment2`, ... ids.
    pub fn new() -> Self {
        Self::with_id_generator(Box::new(SequentialPaymentIds::new()))
    }

    /// Creates an empty ledger drawing payment ids from `ids`.
    pub fn with_id_generator(ids: Box<dyn PaymentIdGenerator>) -> Self {
        Ledger {
            accounts: HashMap::new(),
            payments: Vec::new(),
            payment_index: HashMap::new(),
            ranking: RankingIndex::new(),
            watermark: 0,
            ids,
        }
    }

    /// Registers a zero-balance account.
    pub fn create_account(&mut self, id: &str, timestamp: Timestamp) -> Result<()> {
        if id.is_empty() {
            return Err(LedgerError::InvalidAccountId);
        }
        if self.accounts.contains_key(id) {
            return Err(LedgerError::DuplicateAccount(id.to_string()));
        }

        self.accounts.insert(id.to_string(), Account::new(id));
        self.ranking.set(id, 0);
        debug!("t={}: Created account {}", timestamp, id);
        Ok(())
    }

    /// Credits `amount` to `id`. Returns the new balance.
    ///
    /// Deposits are not outgoing and leave the ranking alone.
    pub fn deposit(&mut self, id: &str, timestamp: Timestamp, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        let account = self.account_mut(id)?;
        if !account.deposit(amount) {
            return Err(LedgerError::BalanceOverflow {
                account: id.to_string(),
                balance: account.balance(),
                amount,
            });
        }
        let balance = account.balance();

        debug!("t={}: Deposited {} to {}", timestamp, amount, id);
        Ok(balance)
    }

    /// Moves `amount` from `from` to `to`. Returns the sender's new balance.
    ///
    /// Either every step applies (debit, credit, history, ranking, watermark)
    /// or, on rejection, none does.
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        timestamp: Timestamp,
        amount: i64,
    ) -> Result<i64> {
        let balance = self.apply_transfer(from, to, timestamp, amount, 0)?;
        debug!(
            "t={}: Transferred {} from {} to {}",
            timestamp, amount, from, to
        );
        Ok(balance)
    }

    /// Transfers `amount` and credits `cashback` back to the sender.
    ///
    /// Every arithmetic bound is checked before the first mutation.
    fn apply_transfer(
        &mut self,
        from: &str,
        to: &str,
        timestamp: Timestamp,
        amount: i64,
        cashback: i64,
    ) -> Result<i64> {
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        let receiver = self
            .accounts
            .get(to)
            .ok_or_else(|| LedgerError::AccountNotFound(to.to_string()))?;
        let sender = self
            .accounts
            .get(from)
            .ok_or_else(|| LedgerError::AccountNotFound(from.to_string()))?;

        if sender.balance() < amount {
            return Err(LedgerError::InsufficientFunds {
                account: from.to_string(),
                balance: sender.balance(),
                requested: amount,
            });
        }
        // A self-transfer leaves the balance where it was.
        if from != to && !receiver.can_credit(amount) {
            return Err(LedgerError::BalanceOverflow {
                account: to.to_string(),
                balance: receiver.balance(),
                amount,
            });
        }
        let sender_after = if from == to {
            sender.balance()
        } else {
            sender.balance() - amount
        };
        if sender_after.checked_add(cashback).is_none() {
            return Err(LedgerError::BalanceOverflow {
                account: from.to_string(),
                balance: sender_after,
                amount: cashback,
            });
        }
        // The ranking total mirrors the outgoing total, so this bounds both.
        if !sender.can_record_outgoing(amount) {
            return Err(LedgerError::OutgoingOverflow {
                account: from.to_string(),
                total: sender.outgoing_total(),
                amount,
            });
        }

        // Safety: both accounts were looked up above and nothing has been removed since
        let sender = self.accounts.get_mut(from).expect("sender account exists");
        sender.withdraw(amount);
        sender.record_outgoing(timestamp, amount);
        self.accounts
            .get_mut(to)
            .expect("receiver account exists")
            .deposit(amount);
        if cashback > 0 {
            self.accounts
                .get_mut(from)
                .expect("sender account exists")
                .deposit(cashback);
        }

        self.ranking.add(from, amount);
        self.watermark = self.watermark.max(timestamp);

        self.balance(from)
    }

    /// The `n` accounts with the largest outgoing totals as of `timestamp`,
    /// ties broken by account id ascending.
    pub fn top_spenders(&self, timestamp: Timestamp, n: usize) -> Vec<String> {
        if n == 0 {
            return Vec::new();
        }
        if timestamp >= self.watermark {
            return self.ranking.top(n);
        }
        self.top_spenders_from_history(timestamp, n)
    }

    /// [`top_spenders`](Self::top_spenders) computed from every account's
    /// prefix index, ignoring the maintained ranking.
    pub fn top_spenders_from_history(&self, timestamp: Timestamp, n: usize) -> Vec<String> {
        let mut totals: Vec<(&str, i64)> = self
            .accounts
            .values()
            .map(|a| (a.id(), a.outgoing_sum_up_to(timestamp)))
            .collect();
        totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        totals
            .into_iter()
            .take(n)
            .map(|(id, _)| id.to_string())
            .collect()
    }

    /// Registers a payment from `from` to `to`, due at `timestamp`.
    pub fn schedule_payment(
        &mut self,
        from: &str,
        to: &str,
        timestamp: Timestamp,
        amount: i64,
        cashback: Percentage,
    ) -> Result<PaymentId> {
        for id in [from, to] {
            if !self.accounts.contains_key(id) {
                return Err(LedgerError::AccountNotFound(id.to_string()));
            }
        }
        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        if cashback.cashback_on(amount).is_none() {
            return Err(LedgerError::InvalidPercentage(cashback.to_string()));
        }

        let id = self.ids.next_id();
        self.payment_index.insert(id.clone(), self.payments.len());
        self.payments.push(ScheduledPayment::new(
            id.clone(),
            from,
            to,
            timestamp,
            amount,
            cashback,
        ));
        self.watermark = self.watermark.max(timestamp);

        debug!(
            "t={}: Scheduled {} of {} from {} to {} with {} cashback",
            timestamp, id, amount, from, to, cashback
        );
        Ok(id)
    }

    /// Status of `payment` as seen by `account`.
    ///
    /// Only the payment's current sender may query it. `timestamp` does not
    /// gate the answer.
    pub fn payment_status(
        &self,
        account: &str,
        _timestamp: Timestamp,
        payment: &PaymentId,
    ) -> Result<PaymentStatus> {
        let p = self
            .payment(payment)
            .ok_or_else(|| LedgerError::PaymentNotFound(payment.clone()))?;
        if p.from != account {
            return Err(LedgerError::Unauthorized {
                account: account.to_string(),
                payment: payment.clone(),
            });
        }
        Ok(p.status)
    }

    /// Executes every pending payment due at `now`.
    ///
    /// Payments run one at a time in `(scheduled_at, scheduling order)`, each
    /// against the balances left by the ones before it. A successful payment
    /// credits `floor(amount * cashback / 100)` back to its sender; cashback
    /// is not outgoing and does not rank. Failures are final.
    pub fn process_scheduled_payments(&mut self, now: Timestamp) -> ProcessingReport {
        let mut due: Vec<usize> = self
            .payments
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_due(now))
            .map(|(idx, _)| idx)
            .collect();
        due.sort_by_key(|&idx| (self.payments[idx].scheduled_at, idx));

        let mut report = ProcessingReport::default();
        for idx in due {
            let p = self.payments[idx].clone();
            let cashback = p.cashback.cashback_on(p.amount).unwrap_or(0);
            match self.apply_transfer(&p.from, &p.to, p.scheduled_at, p.amount, cashback) {
                Ok(_) => {
                    report.cashback_paid = report.cashback_paid.saturating_add(cashback);
                    self.payments[idx].status = PaymentStatus::Processed;
                    debug!(
                        "t={}: Processed {} ({} from {} to {}, cashback {})",
                        now, p.id, p.amount, p.from, p.to, cashback
                    );
                    report.processed.push(p.id);
                }
                Err(e) => {
                    self.payments[idx].status = PaymentStatus::Failed;
                    debug!("t={}: Payment {} failed: {}", now, p.id, e);
                    report.failed.push(p.id);
                }
            }
        }

        if !report.processed.is_empty() || !report.failed.is_empty() {
            info!(
                "t={}: Scheduled payments processed={} failed={} cashback={}",
                now,
                report.processed.len(),
                report.failed.len(),
                report.cashback_paid
            );
        }
        report
    }

    /// Folds `absorbed` into `survivor`.
    ///
    /// Balance and outgoing history move over, payments referencing
    /// `absorbed` are repointed, `absorbed` leaves the registry, and the
    /// ranking drops `absorbed` and re-derives `survivor`'s combined total.
    pub fn merge_accounts(&mut self, survivor: &str, absorbed: &str) -> Result<()> {
        if survivor == absorbed {
            return Err(LedgerError::SelfMerge(survivor.to_string()));
        }
        let survivor_account = self
            .accounts
            .get(survivor)
            .ok_or_else(|| LedgerError::AccountNotFound(survivor.to_string()))?;
        let absorbed_account = self
            .accounts
            .get(absorbed)
            .ok_or_else(|| LedgerError::AccountNotFound(absorbed.to_string()))?;

        if !survivor_account.can_credit(absorbed_account.balance()) {
            return Err(LedgerError::BalanceOverflow {
                account: survivor.to_string(),
                balance: survivor_account.balance(),
                amount: absorbed_account.balance(),
            });
        }
        if !survivor_account.can_record_outgoing(absorbed_account.outgoing_total()) {
            return Err(LedgerError::OutgoingOverflow {
                account: survivor.to_string(),
                total: survivor_account.outgoing_total(),
                amount: absorbed_account.outgoing_total(),
            });
        }

        // Safety: both accounts were looked up above and differ
        let absorbed_account = self
            .accounts
            .remove(absorbed)
            .expect("absorbed account exists");
        let absorbed_total = self.ranking.remove(absorbed).unwrap_or(0);
        let account = self
            .accounts
            .get_mut(survivor)
            .expect("survivor account exists");
        let survivor_total = account.outgoing_total();
        account.merge_from(absorbed_account);
        let combined = account.outgoing_total();
        debug_assert_eq!(combined, survivor_total + absorbed_total);
        self.ranking.set(survivor, combined);

        let mut repointed = 0;
        for p in &mut self.payments {
            if p.from == absorbed {
                p.from = survivor.to_string();
                repointed += 1;
            }
            if p.to == absorbed {
                p.to = survivor.to_string();
                repointed += 1;
            }
        }

        info!(
            "Merged account {} into {} (outgoing total {}, {} payment references repointed)",
            absorbed, survivor, combined, repointed
        );
        Ok(())
    }

    /// Current balance of `id`.
    pub fn balance(&self, id: &str) -> Result<i64> {
        self.account(id)
            .map(Account::balance)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    /// Amount `id` had sent as of `timestamp`.
    pub fn outgoing_sum_up_to(&self, id: &str, timestamp: Timestamp) -> Result<i64> {
        self.account(id)
            .map(|a| a.outgoing_sum_up_to(timestamp))
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.get(id)
    }

    fn account_mut(&mut self, id: &str) -> Result<&mut Account> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    pub fn payment(&self, id: &PaymentId) -> Option<&ScheduledPayment> {
        self.payment_index.get(id).map(|&idx| &self.payments[idx])
    }

    /// All payments in scheduling order.
    pub fn payments(&self) -> &[ScheduledPayment] {
        &self.payments
    }

    /// Live account ids, sorted.
    pub fn account_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.accounts.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn watermark(&self) -> Timestamp {
        self.watermark
    }

    /// Every live account, sorted by id for deterministic output.
    pub fn snapshot(&self) -> Vec<AccountSnapshot> {
        let mut accounts: Vec<_> = self.accounts.values().collect();
        accounts.sort_by(|a, b| a.id().cmp(b.id()));

        accounts
            .into_iter()
            .map(|a| AccountSnapshot {
                account: a.id().to_string(),
                balance: a.balance(),
                outgoing_total: a.outgoing_total(),
            })
            .collect()
    }

    /// Verifies that the ranking mirrors the accounts exactly.
    pub fn check_invariant(&self) -> bool {
        self.ranking.check_invariant()
            && self.ranking.len() == self.accounts.len()
            && self.accounts.values().all(|a| {
                a.check_invariant() && self.ranking.total_of(a.id()) == Some(a.outgoing_total())
            })
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
