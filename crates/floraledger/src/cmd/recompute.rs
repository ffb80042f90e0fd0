//! Rebuild the lot set from the full movement log.

use crate::cmd::common::{self, json_diagnostics, JsonDiagnostic, StoreArgs};
use crate::report;
use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::io::{self, Write};
use std::process::ExitCode;

/// Reconcile every movement and merge the result into the stored lots.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Store options
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Serialize)]
struct JsonReport {
    lots: usize,
    created: Vec<u64>,
    removed: Vec<u64>,
    changed: Vec<String>,
    diagnostics: Vec<JsonDiagnostic>,
}

/// Run the command, writing results to `out`. Returns the diagnostic count.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<usize> {
    let ledger = args.store.open()?;
    let outcome = ledger.recompute_all()?;

    if args.store.json() {
        report::write_json(
            out,
            &JsonReport {
                lots: outcome.lots,
                created: outcome.created.iter().map(|l| l.0).collect(),
                removed: outcome.removed.iter().map(|l| l.0).collect(),
                changed: outcome.changed.iter().map(ToString::to_string).collect(),
                diagnostics: json_diagnostics(&outcome.diagnostics),
            },
        )?;
    } else {
        writeln!(
            out,
            "{} lots ({} created, {} removed)",
            outcome.lots,
            outcome.created.len(),
            outcome.removed.len()
        )?;
        report::write_changed(out, &outcome.changed)?;
        report::write_diagnostics(out, &outcome.diagnostics)?;
    }
    Ok(outcome.diagnostics.len())
}

/// Main entry point for the recompute command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    common::init_tracing(args.store.verbose);
    let result = run(&args, &mut io::stdout().lock());
    common::exit(result, args.store.deny_diagnostics)
}
