//! Set an explicit sale price on a lot.

use crate::cmd::common::{self, StoreArgs};
use crate::report;
use anyhow::Result;
use clap::Parser;
use floraledger_core::{LotId, Money};
use std::io::{self, Write};
use std::process::ExitCode;

/// Set the sale price of a lot.
///
/// An explicit price is kept by every later recompute.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Store options
    #[command(flatten)]
    pub store: StoreArgs,

    /// Lot number (as shown by fl-lots, without the L)
    #[arg(value_name = "LOT")]
    pub lot: u64,

    /// Sale price per stem (e.g. 3.90 or 3,90)
    #[arg(value_name = "PRICE")]
    pub price: Money,
}

/// Run the command, writing results to `out`.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<usize> {
    let ledger = args.store.open()?;
    let lot = ledger.set_sale_price(LotId(args.lot), args.price)?;

    if args.store.json() {
        report::write_json(out, &lot)?;
    } else {
        writeln!(out, "{} {} now sells at {}", lot.id, lot.key, lot.sale_price)?;
    }
    Ok(0)
}

/// Main entry point for the price command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    common::init_tracing(args.store.verbose);
    let result = run(&args, &mut io::stdout().lock());
    common::exit(result, args.store.deny_diagnostics)
}
