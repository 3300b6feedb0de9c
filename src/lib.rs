//! # Temporal Ledger
//!
//! An in-memory ledger that tracks balances and outgoing-transfer history
//! per account, answers "who spent the most as of timestamp T", runs
//! scheduled payments with cashback, and merges accounts.
//!
//! ## Design Principles
//!
//! - **Point-in-time sums**: each account keeps a prefix-sum map keyed by
//!   timestamp, so historical spend is one `O(log m)` lookup
//! - **Maintained ranking**: an ordered index of all-time spend is updated
//!   with every transfer and merge and serves queries at or after the
//!   watermark directly
//! - **Check then act**: rejected operations never mutate state
//! - **Injected ids**: payment ids come from a [`PaymentIdGenerator`]
//!
//! ## Example
//!
//! ```
//! use temporal_ledger::{Ledger, Percentage};
//!
//! let mut ledger = Ledger::new();
//! ledger.create_account("A", 1).unwrap();
//! ledger.create_account("B", 1).unwrap();
//! ledger.deposit("A", 2, 1000).unwrap();
//! ledger.transfer("A", "B", 3, 200).unwrap();
//! assert_eq!(ledger.top_spenders(3, 2), vec!["A", "B"]);
//!
//! let id = ledger
//!     .schedule_payment("A", "B", 10, 300, "5".parse::<Percentage>().unwrap())
//!     .unwrap();
//! ledger.process_scheduled_payments(10);
//! assert_eq!(ledger.balance("A").unwrap(), 515);
//! assert_eq!(ledger.payment_status("A", 10, &id).unwrap().to_string(), "processed");
//! ```

pub mod account;
pub mod command;
pub mod error;
pub mod ledger;
pub mod payment;
pub mod percent;
pub mod ranking;
pub mod replay;
pub mod shared;

pub use account::{Account, OutgoingEvent, Timestamp};
pub use command::{Command, CommandRecord};
pub use error::{ErrorKind, LedgerError, Result};
pub use ledger::{AccountSnapshot, Ledger, ProcessingReport};
pub use payment::{
    PaymentId, PaymentIdGenerator, PaymentStatus, ScheduledPayment, SequentialPaymentIds,
    UuidPaymentIds,
};
pub use percent::Percentage;
pub use ranking::{RankEntry, RankingIndex};
pub use replay::{Outcome, OutcomeRow, Replay};
pub use shared::SharedLedger;
