//! Engine options stored in the document and overridable per run.

use floraledger_core::Money;
use floraledger_reconcile::{DedupPolicy, EngineOptions, ReductionPolicy, DEFAULT_MARKUP};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::StoreError;

/// Known option names.
const KNOWN_OPTIONS: &[&str] = &["cost_tolerance", "markup", "reduction_policy", "dedup_policy"];

/// Option validation warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionWarning {
    /// Warning code (S7001, S7002).
    pub code: &'static str,
    /// Warning message.
    pub message: String,
    /// Option name.
    pub option: String,
    /// Option value.
    pub value: String,
}

/// Ledger options.
///
/// These come from the `options` object of the store document, optionally
/// overridden on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Two unit costs closer than this are the same cost.
    pub cost_tolerance: Money,

    /// Markup applied to the unit cost for derived sale prices.
    pub markup: Decimal,

    /// Resolution of reductions that do not name an exact lot.
    pub reduction_policy: ReductionPolicy,

    /// Fate of duplicate quantities in the dedup sweep.
    pub dedup_policy: DedupPolicy,

    /// Any other custom options.
    pub custom: BTreeMap<String, String>,

    /// Validation warnings collected while reading options.
    pub warnings: Vec<OptionWarning>,
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl Options {
    /// Create new options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cost_tolerance: Money::CENT,
            markup: DEFAULT_MARKUP,
            reduction_policy: ReductionPolicy::default(),
            dedup_policy: DedupPolicy::default(),
            custom: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Read options from a document's `options` object.
    ///
    /// Invalid values keep the default and leave a warning behind.
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, serde_json::Value>) -> Self {
        let mut options = Self::new();
        for (key, value) in map {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            options.set(key, &value);
        }
        options
    }

    /// Set an option by name.
    ///
    /// Validates the option and collects any warnings in `self.warnings`.
    pub fn set(&mut self, key: &str, value: &str) {
        if !KNOWN_OPTIONS.contains(&key) {
            self.warn("S7001", format!("Unknown option \"{key}\""), key, value);
            self.custom.insert(key.to_string(), value.to_string());
            return;
        }

        let value = value.trim();
        match key {
            "cost_tolerance" => match Money::from_str(value) {
                Ok(tolerance) if !tolerance.is_negative() => self.cost_tolerance = tolerance,
                _ => self.invalid(key, value, "expected a non-negative amount"),
            },
            "markup" => match Decimal::from_str(value) {
                Ok(markup) if markup > Decimal::ZERO => self.markup = markup,
                _ => self.invalid(key, value, "expected a positive decimal number"),
            },
            "reduction_policy" => match value.parse() {
                Ok(policy) => self.reduction_policy = policy,
                Err(_) => self.invalid(key, value, "expected one of FIFO, STRICT"),
            },
            "dedup_policy" => match value.parse() {
                Ok(policy) => self.dedup_policy = policy,
                Err(_) => self.invalid(key, value, "expected one of KEEP_CANONICAL, SUM"),
            },
            _ => {}
        }
    }

    /// Apply a `key=value` override.
    ///
    /// Unlike [`Options::set`], a bad override is an error: it was typed by
    /// whoever is running the command and should not be silently ignored.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), StoreError> {
        let Some((key, value)) = assignment.split_once('=') else {
            return Err(StoreError::InvalidOption {
                key: assignment.to_string(),
                message: "expected KEY=VALUE".to_string(),
            });
        };
        let key = key.trim();

        let before = self.warnings.len();
        self.set(key, value);
        match self.warnings.drain(before..).next() {
            Some(warning) => Err(StoreError::InvalidOption {
                key: key.to_string(),
                message: warning.message,
            }),
            None => Ok(()),
        }
    }

    /// The engine settings these options select.
    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            cost_tolerance: self.cost_tolerance,
            markup: self.markup,
            reduction_policy: self.reduction_policy,
            dedup_policy: self.dedup_policy,
        }
    }

    fn invalid(&mut self, key: &str, value: &str, expected: &str) {
        self.warn(
            "S7002",
            format!("Invalid value \"{value}\" for option \"{key}\": {expected}"),
            key,
            value,
        );
    }

    fn warn(&mut self, code: &'static str, message: String, key: &str, value: &str) {
        self.warnings.push(OptionWarning {
            code,
            message,
            option: key.to_string(),
            value: value.to_string(),
        });
    }
}
