//! List lots in stock.

use crate::cmd::common::{self, StoreArgs};
use crate::report;
use anyhow::Result;
use clap::Parser;
use floraledger_core::VariantId;
use std::io::{self, Write};
use std::process::ExitCode;

/// List the lots currently in stock.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Store options
    #[command(flatten)]
    pub store: StoreArgs,

    /// Only show lots of this variant
    #[arg(value_name = "VARIANT")]
    pub variant: Option<String>,
}

/// Run the command, writing results to `out`.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<usize> {
    let ledger = args.store.open()?;
    let variant = args.variant.as_deref().map(VariantId::from);
    let lots = ledger.list_lots(variant.as_ref())?;

    if args.store.json() {
        report::write_json(out, &lots)?;
    } else {
        report::write_lots(out, &lots)?;
    }
    Ok(0)
}

/// Main entry point for the lots command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    common::init_tracing(args.store.verbose);
    let result = run(&args, &mut io::stdout().lock());
    common::exit(result, args.store.deny_diagnostics)
}
