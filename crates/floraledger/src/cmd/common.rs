//! Arguments and plumbing shared by every command.

use anyhow::{Context, Result};
use clap::ValueEnum;
use floraledger_reconcile::Diagnostic;
use floraledger_store::{JsonStore, Ledger};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output for scripts and other tools
    Json,
}

/// Options every command accepts.
#[derive(clap::Args, Debug)]
pub struct StoreArgs {
    /// The ledger store file
    #[arg(long, short = 's', value_name = "FILE", default_value = "floraledger.json")]
    pub store: PathBuf,

    /// Override a stored option for this run (repeatable)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,

    /// Exit with status 1 when the run produced diagnostics
    #[arg(long)]
    pub deny_diagnostics: bool,

    /// Show debug logging (otherwise `RUST_LOG` applies)
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl StoreArgs {
    /// Open the ledger with the overrides applied.
    pub fn open(&self) -> Result<Ledger<JsonStore>> {
        let mut ledger = Ledger::new(JsonStore::new(&self.store));
        for assignment in &self.options {
            ledger = ledger
                .with_override(assignment)
                .with_context(|| format!("bad -o {assignment}"))?;
        }
        Ok(ledger)
    }

    /// Whether JSON output was requested.
    pub fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// A diagnostic in JSON format.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    /// Severity, always "warning"
    pub severity: &'static str,
    /// Diagnostic code (e.g., "R1001")
    pub code: &'static str,
    /// Message
    pub message: String,
    /// Variant concerned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Movement that triggered it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement: Option<u64>,
    /// Lot concerned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot: Option<u64>,
}

impl From<&Diagnostic> for JsonDiagnostic {
    fn from(d: &Diagnostic) -> Self {
        Self {
            severity: "warning",
            code: d.code.code(),
            message: d.message.clone(),
            variant: d.variant_id.as_ref().map(ToString::to_string),
            movement: d.movement.map(|m| m.0),
            lot: d.lot.map(|l| l.0),
        }
    }
}

/// Convert diagnostics for JSON output.
pub fn json_diagnostics(diagnostics: &[Diagnostic]) -> Vec<JsonDiagnostic> {
    diagnostics.iter().map(JsonDiagnostic::from).collect()
}

/// Set up logging to stderr.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when commands run in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Map a command result to the process exit code.
///
/// `Ok` carries the number of diagnostics the run produced.
pub fn exit(result: Result<usize>, deny_diagnostics: bool) -> ExitCode {
    match result {
        Ok(diagnostics) if deny_diagnostics && diagnostics > 0 => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
