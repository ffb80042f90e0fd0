//! Correct the quantity of a lot.
//!
//! The correction is posted as a movement so that a later recompute
//! reproduces it: a load at the lot's cost for an increase, a destroy
//! against the lot for a decrease.

use crate::cmd::common::{self, StoreArgs};
use crate::report;
use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use floraledger_core::LotId;
use std::io::{self, Write};
use std::process::ExitCode;

/// Bring a lot to a counted quantity.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Store options
    #[command(flatten)]
    pub store: StoreArgs,

    /// Lot number (as shown by fl-lots, without the L)
    #[arg(value_name = "LOT")]
    pub lot: u64,

    /// Counted quantity
    #[arg(value_name = "QUANTITY")]
    pub quantity: u32,

    /// When the count was taken (defaults to now)
    #[arg(long, value_name = "YYYY-MM-DDTHH:MM:SS")]
    pub at: Option<NaiveDateTime>,
}

/// Run the command, writing results to `out`. Returns the diagnostic count.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<usize> {
    let ledger = args.store.open()?;
    let lot = LotId(args.lot);
    let at = args.at.unwrap_or_else(|| Local::now().naive_local());

    let Some(posting) = ledger.adjust_quantity(lot, args.quantity, at)? else {
        if args.store.json() {
            report::write_json(out, &serde_json::json!({ "movements": [] }))?;
        } else {
            writeln!(out, "{lot} already holds {}", args.quantity)?;
        }
        return Ok(0);
    };

    if args.store.json() {
        let movements: Vec<u64> = posting.movements.iter().map(|m| m.0).collect();
        report::write_json(out, &serde_json::json!({ "movements": movements }))?;
    } else {
        for movement in &posting.movements {
            writeln!(out, "posted {movement} to bring {lot} to {}", args.quantity)?;
        }
        report::write_diagnostics(out, &posting.diagnostics)?;
    }
    Ok(posting.diagnostics.len())
}

/// Main entry point for the adjust command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    common::init_tracing(args.store.verbose);
    let result = run(&args, &mut io::stdout().lock());
    common::exit(result, args.store.deny_diagnostics)
}
