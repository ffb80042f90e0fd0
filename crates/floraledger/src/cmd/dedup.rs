//! Collapse duplicate lot records.

use crate::cmd::common::{self, json_diagnostics, JsonDiagnostic, StoreArgs};
use crate::report;
use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::io::{self, Write};
use std::process::ExitCode;

/// Find lots that share a key and keep one record per key.
///
/// The fate of the duplicate quantity follows the `dedup_policy` option.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Store options
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Serialize)]
struct JsonReport {
    removed: Vec<u64>,
    movements: Vec<u64>,
    changed: Vec<String>,
    diagnostics: Vec<JsonDiagnostic>,
}

/// Run the command, writing results to `out`. Returns the diagnostic count.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<usize> {
    let ledger = args.store.open()?;
    let outcome = ledger.dedup_lots()?;

    if args.store.json() {
        report::write_json(
            out,
            &JsonReport {
                removed: outcome.removed.iter().map(|l| l.0).collect(),
                movements: outcome.movements.iter().map(|m| m.0).collect(),
                changed: outcome.changed.iter().map(ToString::to_string).collect(),
                diagnostics: json_diagnostics(&outcome.diagnostics),
            },
        )?;
    } else if outcome.removed.is_empty() {
        writeln!(out, "no duplicate lots")?;
    } else {
        let ids: Vec<String> = outcome.removed.iter().map(ToString::to_string).collect();
        writeln!(out, "removed {}", ids.join(", "))?;
        if !outcome.movements.is_empty() {
            let ids: Vec<String> = outcome.movements.iter().map(ToString::to_string).collect();
            writeln!(out, "posted {}", ids.join(", "))?;
        }
        report::write_diagnostics(out, &outcome.diagnostics)?;
    }
    Ok(outcome.diagnostics.len())
}

/// Main entry point for the dedup command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    common::init_tracing(args.store.verbose);
    let result = run(&args, &mut io::stdout().lock());
    common::exit(result, args.store.deny_diagnostics)
}
