//! Post stock movements to the ledger.
//!
//! A single movement can be described with flags; a batch is read as JSON
//! (one draft object or an array of them) from a file or stdin.

use crate::cmd::common::{self, json_diagnostics, JsonDiagnostic, StoreArgs};
use crate::report;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use floraledger_core::{MovementDraft, MovementKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

/// Post load, unload and destroy movements.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Store options
    #[command(flatten)]
    pub store: StoreArgs,

    /// Read movement drafts as JSON from FILE ("-" for stdin)
    #[arg(long, short = 'i', value_name = "FILE", conflicts_with = "kind")]
    pub input: Option<PathBuf>,

    /// Movement kind: load, unload or destroy
    #[arg(long, required_unless_present = "input")]
    pub kind: Option<MovementKind>,

    /// Product variant
    #[arg(long, required_unless_present = "input")]
    pub variant: Option<String>,

    /// Number of stems
    #[arg(long, short = 'q', required_unless_present = "input", allow_negative_numbers = true)]
    pub quantity: Option<i64>,

    /// Packaging multiple
    #[arg(long, short = 'p', required_unless_present = "input", allow_negative_numbers = true)]
    pub package: Option<i64>,

    /// Acquisition cost per stem (required for loads)
    #[arg(long, short = 'c')]
    pub cost: Option<Decimal>,

    /// Source invoice or document
    #[arg(long)]
    pub invoice: Option<String>,

    /// Supplier
    #[arg(long)]
    pub supplier: Option<String>,

    /// Explicit sale price per stem
    #[arg(long)]
    pub price: Option<Decimal>,

    /// When the movement happened (defaults to now)
    #[arg(long, value_name = "YYYY-MM-DDTHH:MM:SS")]
    pub at: Option<NaiveDateTime>,

    /// Free-form note
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Input {
    Many(Vec<MovementDraft>),
    One(Box<MovementDraft>),
}

#[derive(Serialize)]
struct JsonPosting {
    movements: Vec<u64>,
    changed: Vec<String>,
    diagnostics: Vec<JsonDiagnostic>,
}

impl Args {
    fn drafts(&self) -> Result<Vec<MovementDraft>> {
        if let Some(path) = &self.input {
            return read_drafts(path);
        }

        let (Some(kind), Some(variant), Some(quantity), Some(package)) =
            (self.kind, &self.variant, self.quantity, self.package)
        else {
            anyhow::bail!(
                "--kind, --variant, --quantity and --package are required without --input"
            );
        };

        let at = self.at.unwrap_or_else(|| Local::now().naive_local());
        let mut draft = MovementDraft::new(variant.as_str(), kind, quantity, package, at);
        if let Some(cost) = self.cost {
            draft = draft.with_unit_cost(cost);
        }
        if let Some(invoice) = &self.invoice {
            draft = draft.with_invoice(invoice.as_str());
        }
        if let Some(supplier) = &self.supplier {
            draft = draft.with_supplier(supplier.as_str());
        }
        if let Some(price) = self.price {
            draft = draft.with_sale_price(price);
        }
        if let Some(note) = &self.note {
            draft = draft.with_note(note.as_str());
        }
        Ok(vec![draft])
    }
}

fn read_drafts(path: &Path) -> Result<Vec<MovementDraft>> {
    let text = if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        text
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    };

    let drafts = match serde_json::from_str(&text)
        .with_context(|| format!("{} is not a movement or a list of movements", path.display()))?
    {
        Input::Many(drafts) => drafts,
        Input::One(draft) => vec![*draft],
    };
    debug!(count = drafts.len(), path = %path.display(), "read movement drafts");
    Ok(drafts)
}

/// Run the command, writing results to `out`. Returns the diagnostic count.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<usize> {
    let drafts = args.drafts()?;
    if drafts.is_empty() {
        writeln!(out, "nothing to post")?;
        return Ok(0);
    }

    let ledger = args.store.open()?;
    let posting = ledger.ingest_batch(drafts)?;

    if args.store.json() {
        report::write_json(
            out,
            &JsonPosting {
                movements: posting.movements.iter().map(|m| m.0).collect(),
                changed: posting.changed.iter().map(ToString::to_string).collect(),
                diagnostics: json_diagnostics(&posting.diagnostics),
            },
        )?;
    } else {
        let ids: Vec<String> = posting.movements.iter().map(ToString::to_string).collect();
        writeln!(out, "posted {}", ids.join(", "))?;
        report::write_changed(out, &posting.changed)?;
        report::write_diagnostics(out, &posting.diagnostics)?;
    }
    Ok(posting.diagnostics.len())
}

/// Main entry point for the ingest command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    common::init_tracing(args.store.verbose);
    let result = run(&args, &mut io::stdout().lock());
    common::exit(result, args.store.deny_diagnostics)
}
