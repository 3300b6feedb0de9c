//! Script replay.
//!
//! Streams a CSV script of ledger commands, runs each against a [`Ledger`]
//! and records one outcome row per command. Malformed rows are logged at
//! warn level and reported as rejected; the replay keeps going.

use crate::command::{Command, CommandRecord};
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::{debug, warn};
use serde::Serialize;
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Rejected,
}

/// Result of one script row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeRow {
    pub row: usize,
    pub op: String,
    pub outcome: Outcome,
    /// Returned value on success, error message on rejection.
    pub detail: String,
}

/// Replays scripts against a ledger it owns.
#[derive(Default)]
pub struct Replay {
    ledger: Ledger,
    outcomes: Vec<OutcomeRow>,
}

impl Replay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays against an existing ledger, e.g. one with a custom id generator.
    pub fn with_ledger(ledger: Ledger) -> Self {
        Replay {
            ledger,
            outcomes: Vec::new(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn outcomes(&self) -> &[OutcomeRow] {
        &self.outcomes
    }

    /// Processes commands from a CSV reader in streaming fashion.
    pub fn process_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        for (row_idx, result) in csv_reader.deserialize::<CommandRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            let (op, result) = match result {
                Ok(record) => match record.parse(row_num) {
                    Ok(command) => (command.name().to_string(), self.execute(command)),
                    Err(e) => {
                        warn!("Row {}: {}", row_num, e);
                        (record.op.trim().to_lowercase(), Err(e))
                    }
                },
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                    let e = LedgerError::InvalidRecord {
                        row: row_num,
                        message: e.to_string(),
                    };
                    (String::new(), Err(e))
                }
            };

            self.record(row_num, op, result);
        }

        Ok(())
    }

    fn record(&mut self, row: usize, op: String, result: Result<String>) {
        let (outcome, detail) = match result {
            Ok(detail) => {
                debug!("Row {}: {} -> {}", row, op, detail);
                (Outcome::Ok, detail)
            }
            Err(e) => {
                debug!("Row {}: {} rejected: {}", row, op, e);
                (Outcome::Rejected, rejection_detail(&e))
            }
        };

        self.outcomes.push(OutcomeRow {
            row,
            op,
            outcome,
            detail,
        });
    }

    /// Runs one command, returning its rendered result.
    pub fn execute(&mut self, command: Command) -> Result<String> {
        let ledger = &mut self.ledger;

        let detail = match command {
            Command::CreateAccount { timestamp, account } => {
                ledger.create_account(&account, timestamp)?;
                "true".to_string()
            }
            Command::Deposit {
                timestamp,
                account,
                amount,
            } => ledger.deposit(&account, timestamp, amount)?.to_string(),
            Command::Transfer {
                timestamp,
                from,
                to,
                amount,
            } => ledger.transfer(&from, &to, timestamp, amount)?.to_string(),
            Command::TopSpenders { timestamp, n } => ledger.top_spenders(timestamp, n).join(";"),
            Command::SchedulePayment {
                timestamp,
                from,
                to,
                amount,
                cashback,
            } => ledger
                .schedule_payment(&from, &to, timestamp, amount, cashback)?
                .to_string(),
            Command::PaymentStatus {
                timestamp,
                account,
                payment,
            } => ledger
                .payment_status(&account, timestamp, &payment)?
                .to_string(),
            Command::ProcessScheduled { timestamp } => {
                let report = ledger.process_scheduled_payments(timestamp);
                format!(
                    "processed={} failed={} cashback={}",
                    report.processed.len(),
                    report.failed.len(),
                    report.cashback_paid
                )
            }
            Command::MergeAccounts { survivor, absorbed } => {
                ledger.merge_accounts(&survivor, &absorbed)?;
                "true".to_string()
            }
            Command::Balance { account } => ledger.balance(&account)?.to_string(),
        };

        Ok(detail)
    }

    /// Writes one CSV row per processed command.
    pub fn write_results<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);

        csv_writer.write_record(["row", "op", "outcome", "detail"])?;
        for outcome in &self.outcomes {
            csv_writer.serialize(outcome)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Writes final account states to CSV, sorted by account id.
    pub fn write_accounts<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);

        csv_writer.write_record(["account", "balance", "outgoing_total"])?;
        for snapshot in self.ledger.snapshot() {
            csv_writer.serialize(snapshot)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

/// Payment-status rejections render as the bare `not_found` / `unauthorized`
/// answers; everything else as its message.
fn rejection_detail(error: &LedgerError) -> String {
    match error {
        LedgerError::PaymentNotFound(_) => "not_found".to_string(),
        LedgerError::Unauthorized { .. } => "unauthorized".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::Outcome::{Ok as Accepted, Rejected};
    use std::io::Cursor;

    fn replay_str(csv: &str) -> Replay {
        let mut replay = Replay::new();
        replay.process_csv(Cursor::new(csv)).unwrap();
        replay
    }

    fn details(replay: &Replay) -> Vec<(Outcome, &str)> {
        replay
            .outcomes()
            .iter()
            .map(|o| (o.outcome, o.detail.as_str()))
            .collect()
    }

    #[test]
    fn test_basic_script() {
        let csv = r#"op,timestamp,account,target,amount,extra
create_account,1,A,,,
create_account,2,B,,,
deposit,3,A,,1000,
transfer,4,A,B,300,
top_spenders,5,,,2,
balance,,B,,,"#;

        let replay = replay_str(csv);
        assert_eq!(
            details(&replay),
            vec![
                (Accepted, "true"),
                (Accepted, "true"),
                (Accepted, "1000"),
                (Accepted, "700"),
                (Accepted, "A;B"),
                (Accepted, "300"),
            ]
        );
        assert_eq!(replay.outcomes()[3].op, "transfer");
        assert_eq!(replay.outcomes()[3].row, 5);
    }

    #[test]
    fn test_rejections_are_reported_and_replay_continues() {
        let csv = r#"op,timestamp,account,target,amount,extra
create_account,1,A,,,
create_account,1,A,,,
deposit,2,A,,-5,
frobnicate,3,A,,,
deposit,x,A,,5,
deposit,4,A,,5,"#;

        let replay = replay_str(csv);
        let outcomes = replay.outcomes();
        assert_eq!(outcomes.len(), 6);
        assert_eq!(outcomes[1].outcome, Rejected);
        assert_eq!(outcomes[1].detail, "Account A already exists");
        assert_eq!(outcomes[2].detail, "Amount must be positive, got -5");
        assert_eq!(outcomes[3].op, "frobnicate");
        assert!(outcomes[3].detail.contains("unknown operation"));
        assert_eq!(outcomes[4].outcome, Rejected);
        assert_eq!(outcomes[4].op, "");
        assert_eq!((outcomes[5].outcome, outcomes[5].detail.as_str()), (Accepted, "5"));
    }

    #[test]
    fn test_payment_status_answers() {
        let csv = r#"op,timestamp,account,target,amount,extra
create_account,1,A,,,
create_account,1,B,,,
deposit,2,A,,1000,
schedule_payment,3,A,B,300,5
payment_status,4,A,,,payment1
payment_status,4,B,,,payment1
payment_status,4,A,,,payment9
process_scheduled,3,,,,
payment_status,4,A,,,payment1
balance,,A,,,"#;

        let replay = replay_str(csv);
        assert_eq!(
            details(&replay)[3..],
            [
                (Accepted, "payment1"),
                (Accepted, "scheduled"),
                (Rejected, "unauthorized"),
                (Rejected, "not_found"),
                (Accepted, "processed=1 failed=0 cashback=15"),
                (Accepted, "processed"),
                (Accepted, "715"),
            ]
        );
    }

    #[test]
    fn test_replay_onto_existing_ledger() {
        let mut ledger = Ledger::new();
        ledger.create_account("A", 1).unwrap();
        ledger.deposit("A", 1, 50).unwrap();

        let mut replay = Replay::with_ledger(ledger);
        let csv = "op,timestamp,account,target,amount,extra\ncreate_account,2,B,,,\ntransfer,3,A,B,20,\n";
        replay.process_csv(Cursor::new(csv)).unwrap();

        assert_eq!(replay.ledger().balance("B").unwrap(), 20);
        assert_eq!(replay.ledger().watermark(), 3);
    }

    #[test]
    fn test_write_results_format() {
        let csv = "op,timestamp,account,target,amount,extra\ncreate_account,1,A,,,\n";
        let replay = replay_str(csv);

        let mut output = Vec::new();
        replay.write_results(&mut output).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output, "row,op,outcome,detail\n2,create_account,ok,true\n");
    }

    #[test]
    fn test_write_accounts_format() {
        let csv = r#"op,timestamp,account,target,amount,extra
create_account,1,B,,,
create_account,1,A,,,
deposit,2,A,,100,
transfer,3,A,B,40,"#;
        let replay = replay_str(csv);

        let mut output = Vec::new();
        replay.write_accounts(&mut output).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output, "account,balance,outgoing_total\nA,60,40\nB,40,0\n");
    }
}
