//! Temporal Ledger CLI
//!
//! Replays a CSV script of ledger commands and writes one result row per
//! command to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- script.csv > results.csv
//! cargo run -- script.csv accounts.csv > results.csv
//! ```
//!
//! The optional second argument receives the final account states.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::process;
use temporal_ledger::{LedgerError, Replay, Result};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(LedgerError::MissingArgument);
    }

    let script_path = &args[1];
    let file = File::open(script_path)?;
    let reader = BufReader::new(file);

    let mut replay = Replay::new();
    replay.process_csv(reader)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    replay.write_results(handle)?;

    if let Some(accounts_path) = args.get(2) {
        let file = File::create(accounts_path)?;
        replay.write_accounts(BufWriter::new(file))?;
    }

    Ok(())
}
