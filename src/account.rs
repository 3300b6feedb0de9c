//! Account model with a point-in-time outgoing-spend index.
//!
//! Every completed outgoing transfer is kept as an [`OutgoingEvent`] and
//! folded into a prefix-sum map keyed by timestamp, so "how much had this
//! account sent as of `t`" is a single ordered-map lookup.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

/// Caller-supplied logical time. Not derived from a clock.
pub type Timestamp = u64;

/// One completed outgoing transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutgoingEvent {
    pub timestamp: Timestamp,
    pub amount: i64,
}

/// A ledger account.
///
/// # Invariants
///
/// - `balance` is never negative after a completed operation
/// - `outgoing_prefix[t]` is the sum of every event with timestamp `<= t`,
///   so values never decrease as the key grows
#[derive(Debug, Clone)]
pub struct Account {
    id: String,
    balance: i64,
    outgoing_events: Vec<OutgoingEvent>,
    outgoing_prefix: BTreeMap<Timestamp, i64>,
}

impl Account {
    /// Creates a new account with a zero balance and no history.
    pub fn new(id: impl Into<String>) -> Self {
        Account {
            id: id.into(),
            balance: 0,
            outgoing_events: Vec::new(),
            outgoing_prefix: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Outgoing events in the order they were recorded (or spliced in by a merge).
    pub fn outgoing_events(&self) -> &[OutgoingEvent] {
        &self.outgoing_events
    }

    /// Credits the account.
    ///
    /// Returns `false` without touching the balance if:
    /// - `amount <= 0`
    /// - The new balance would not fit in `i64`
    pub fn deposit(&mut self, amount: i64) -> bool {
        if amount <= 0 {
            return false;
        }

        match self.balance.checked_add(amount) {
            Some(balance) => {
                self.balance = balance;
                true
            }
            None => false,
        }
    }

    /// Whether crediting `amount` keeps the balance within `i64`.
    pub fn can_credit(&self, amount: i64) -> bool {
        self.balance.checked_add(amount).is_some()
    }

    /// Whether recording `amount` of outgoing spend keeps every prefix slot within `i64`.
    ///
    /// The latest slot holds the largest value, so checking the total is enough.
    pub fn can_record_outgoing(&self, amount: i64) -> bool {
        self.outgoing_total().checked_add(amount).is_some()
    }

    /// Debits the account.
    ///
    /// Returns `true` if the withdrawal succeeded, `false` if:
    /// - `amount <= 0`
    /// - Insufficient funds (`balance < amount`)
    pub fn withdraw(&mut self, amount: i64) -> bool {
        if amount <= 0 || self.balance < amount {
            return false;
        }

        self.balance -= amount;
        true
    }

    /// Records a completed outgoing transfer.
    ///
    /// The prefix index is maintained incrementally: the slot at `timestamp`
    /// is created from the floor value (or bumped if it exists) and every
    /// later slot is shifted by `amount`. Appending at or after the latest
    /// timestamp touches a single entry.
    pub fn record_outgoing(&mut self, timestamp: Timestamp, amount: i64) {
        if amount <= 0 {
            return;
        }

        self.outgoing_events.push(OutgoingEvent { timestamp, amount });

        let floor = self.outgoing_sum_up_to(timestamp);
        *self.outgoing_prefix.entry(timestamp).or_insert(floor) += amount;
        for (_, cumulative) in self.outgoing_prefix.range_mut((Excluded(timestamp), Unbounded)) {
            *cumulative += amount;
        }
    }

    /// Total sent by this account in events with timestamp `<= timestamp`.
    ///
    /// Returns 0 when there is no such event.
    pub fn outgoing_sum_up_to(&self, timestamp: Timestamp) -> i64 {
        self.outgoing_prefix
            .range(..=timestamp)
            .next_back()
            .map(|(_, cumulative)| *cumulative)
            .unwrap_or(0)
    }

    /// Total sent by this account across its whole history.
    pub fn outgoing_total(&self) -> i64 {
        self.outgoing_prefix
            .last_key_value()
            .map(|(_, cumulative)| *cumulative)
            .unwrap_or(0)
    }

    /// Absorbs `other`: its balance and its outgoing history move into `self`.
    ///
    /// `other` is consumed; removing it from any registry is the caller's job.
    /// Callers check that the combined balance and outgoing total fit first.
    pub fn merge_from(&mut self, other: Account) {
        self.balance += other.balance;
        self.outgoing_events.extend(other.outgoing_events);
        self.rebuild_prefix();
    }

    /// Recomputes the prefix index from the event log.
    ///
    /// Events sharing a timestamp collapse into one slot holding the
    /// cumulative value after all of them.
    fn rebuild_prefix(&mut self) {
        self.outgoing_events.sort_by_key(|e| e.timestamp);
        self.outgoing_prefix.clear();

        let mut cumulative = 0;
        for event in &self.outgoing_events {
            cumulative += event.amount;
            self.outgoing_prefix.insert(event.timestamp, cumulative);
        }
    }

    /// Verifies that the prefix index matches a from-scratch fold of the events.
    pub fn check_invariant(&self) -> bool {
        let mut sorted = self.outgoing_events.clone();
        sorted.sort_by_key(|e| e.timestamp);

        let mut expected = BTreeMap::new();
        let mut cumulative = 0;
        for event in &sorted {
            cumulative += event.amount;
            expected.insert(event.timestamp, cumulative);
        }

        self.balance >= 0 && expected == self.outgoing_prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_is_empty() {
        let account = Account::new("A");
        assert_eq!(account.id(), "A");
        assert_eq!(account.balance(), 0);
        assert_eq!(account.outgoing_total(), 0);
        assert_eq!(account.outgoing_sum_up_to(u64::MAX), 0);
        assert!(account.outgoing_events().is_empty());
    }

    #[test]
    fn test_deposit_ignores_non_positive_amounts() {
        let mut account = Account::new("A");
        assert!(!account.deposit(0));
        assert!(!account.deposit(-5));
        assert_eq!(account.balance(), 0);

        assert!(account.deposit(100));
        assert_eq!(account.balance(), 100);
    }

    #[test]
    fn test_deposit_rejects_balance_overflow() {
        let mut account = Account::new("A");
        assert!(account.deposit(i64::MAX));

        assert!(!account.can_credit(1));
        assert!(!account.deposit(1));
        assert_eq!(account.balance(), i64::MAX);

        assert!(account.withdraw(10));
        assert!(account.can_credit(10));
        assert!(account.deposit(10));
        assert_eq!(account.balance(), i64::MAX);
    }

    #[test]
    fn test_outgoing_headroom() {
        let mut a = Account::new("A");
        a.record_outgoing(1, i64::MAX - 5);
        assert!(a.can_record_outgoing(5));
        assert!(!a.can_record_outgoing(6));

        a.record_outgoing(2, 5);
        assert_eq!(a.outgoing_total(), i64::MAX);
        assert!(!a.can_record_outgoing(1));
        assert!(a.check_invariant());
    }

    #[test]
    fn test_withdraw_rejects_overdraft() {
        let mut account = Account::new("A");
        account.deposit(100);

        assert!(!account.withdraw(150));
        assert_eq!(account.balance(), 100);

        assert!(account.withdraw(100));
        assert_eq!(account.balance(), 0);

        assert!(!account.withdraw(0));
    }

    #[test]
    fn test_outgoing_sum_is_floor_lookup() {
        let mut account = Account::new("A");
        account.record_outgoing(3, 200);
        account.record_outgoing(4, 150);
        account.record_outgoing(9, 50);

        assert_eq!(account.outgoing_sum_up_to(0), 0);
        assert_eq!(account.outgoing_sum_up_to(2), 0);
        assert_eq!(account.outgoing_sum_up_to(3), 200);
        assert_eq!(account.outgoing_sum_up_to(4), 350);
        assert_eq!(account.outgoing_sum_up_to(8), 350);
        assert_eq!(account.outgoing_sum_up_to(9), 400);
        assert_eq!(account.outgoing_sum_up_to(1_000), 400);
        assert_eq!(account.outgoing_total(), 400);
        assert!(account.check_invariant());
    }

    #[test]
    fn test_tied_timestamps_report_full_group() {
        let mut account = Account::new("A");
        account.record_outgoing(5, 10);
        account.record_outgoing(5, 20);
        account.record_outgoing(5, 30);

        assert_eq!(account.outgoing_sum_up_to(4), 0);
        assert_eq!(account.outgoing_sum_up_to(5), 60);
        assert!(account.check_invariant());
    }

    #[test]
    fn test_out_of_order_event_shifts_suffix() {
        let mut account = Account::new("A");
        account.record_outgoing(10, 100);
        account.record_outgoing(20, 100);
        account.record_outgoing(15, 7);
        account.record_outgoing(1, 3);

        assert_eq!(account.outgoing_sum_up_to(1), 3);
        assert_eq!(account.outgoing_sum_up_to(10), 103);
        assert_eq!(account.outgoing_sum_up_to(15), 110);
        assert_eq!(account.outgoing_sum_up_to(20), 210);
        assert!(account.check_invariant());
    }

    #[test]
    fn test_record_outgoing_ignores_non_positive() {
        let mut account = Account::new("A");
        account.record_outgoing(1, 0);
        account.record_outgoing(2, -4);
        assert!(account.outgoing_events().is_empty());
        assert_eq!(account.outgoing_total(), 0);
    }

    #[test]
    fn test_merge_combines_balance_and_history() {
        let mut a = Account::new("A");
        a.deposit(500);
        a.record_outgoing(2, 100);
        a.record_outgoing(6, 40);

        let mut b = Account::new("B");
        b.deposit(70);
        b.record_outgoing(4, 30);
        b.record_outgoing(6, 5);

        let before: Vec<i64> = (0..8)
            .map(|t| a.outgoing_sum_up_to(t) + b.outgoing_sum_up_to(t))
            .collect();

        a.merge_from(b);

        assert_eq!(a.balance(), 570);
        assert_eq!(a.outgoing_events().len(), 4);
        let after: Vec<i64> = (0..8).map(|t| a.outgoing_sum_up_to(t)).collect();
        assert_eq!(before, after);
        assert_eq!(a.outgoing_total(), 175);
        assert!(a.check_invariant());
    }
}
