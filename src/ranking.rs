//! Ordered top-spender index.
//!
//! A materialized view over every live account's all-time outgoing total,
//! ordered by total descending then account id ascending. The ledger updates
//! it in the same step as the account mutation that changes a total.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// An `(account, total)` pair in ranking order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    pub account: String,
    pub total: i64,
}

impl Ord for RankEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .total
            .cmp(&self.total)
            .then_with(|| self.account.cmp(&other.account))
    }
}

impl PartialOrd for RankEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ranking of accounts by cumulative outgoing total.
///
/// `totals` is the lookup side (account -> current total) used to find the
/// exact entry to remove from `order` before re-inserting it.
#[derive(Debug, Default)]
pub struct RankingIndex {
    order: BTreeSet<RankEntry>,
    totals: HashMap<String, i64>,
}

impl RankingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ranked accounts.
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Current total for `account`, if ranked.
    pub fn total_of(&self, account: &str) -> Option<i64> {
        self.totals.get(account).copied()
    }

    /// Sets the total for `account`, replacing any previous entry.
    pub fn set(&mut self, account: &str, total: i64) {
        if let Some(old) = self.totals.insert(account.to_string(), total) {
            self.order.remove(&RankEntry {
                account: account.to_string(),
                total: old,
            });
        }
        self.order.insert(RankEntry {
            account: account.to_string(),
            total,
        });
    }

    /// Adds `delta` to `account`'s total and re-ranks it. Returns the new total.
    pub fn add(&mut self, account: &str, delta: i64) -> i64 {
        let total = self.total_of(account).unwrap_or(0) + delta;
        self.set(account, total);
        total
    }

    /// Drops `account` from the ranking, returning its last total.
    pub fn remove(&mut self, account: &str) -> Option<i64> {
        let total = self.totals.remove(account)?;
        self.order.remove(&RankEntry {
            account: account.to_string(),
            total,
        });
        Some(total)
    }

    /// The first `n` accounts in ranking order.
    pub fn top(&self, n: usize) -> Vec<String> {
        self.order
            .iter()
            .take(n)
            .map(|entry| entry.account.clone())
            .collect()
    }

    /// Both sides of the index describe the same set of entries.
    pub fn check_invariant(&self) -> bool {
        self.order.len() == self.totals.len()
            && self
                .order
                .iter()
                .all(|e| self.totals.get(&e.account) == Some(&e.total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_by_total_desc_then_id_asc() {
        let mut index = RankingIndex::new();
        index.set("C", 0);
        index.set("B", 100);
        index.set("A", 100);
        index.set("D", 350);

        assert_eq!(index.top(10), vec!["D", "A", "B", "C"]);
        assert_eq!(index.top(2), vec!["D", "A"]);
        assert!(index.top(0).is_empty());
        assert!(index.check_invariant());
    }

    #[test]
    fn test_add_re_ranks_entry() {
        let mut index = RankingIndex::new();
        index.set("A", 0);
        index.set("B", 0);

        assert_eq!(index.add("B", 50), 50);
        assert_eq!(index.top(2), vec!["B", "A"]);

        assert_eq!(index.add("A", 60), 60);
        assert_eq!(index.top(2), vec!["A", "B"]);
        assert_eq!(index.len(), 2);
        assert!(index.check_invariant());
    }

    #[test]
    fn test_set_replaces_single_entry() {
        let mut index = RankingIndex::new();
        index.set("A", 10);
        index.set("A", 20);
        index.set("A", 5);

        assert_eq!(index.len(), 1);
        assert!(index.check_invariant());
        assert_eq!(index.total_of("A"), Some(5));
    }

    #[test]
    fn test_remove_drops_entry() {
        let mut index = RankingIndex::new();
        index.set("A", 10);
        index.set("B", 20);

        assert_eq!(index.remove("B"), Some(20));
        assert_eq!(index.remove("B"), None);
        assert_eq!(index.top(5), vec!["A"]);
        assert!(index.check_invariant());
    }
}
