//! Text and JSON rendering of command results.

use floraledger_core::{Lot, Money, VariantId};
use floraledger_reconcile::Diagnostic;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{self, Write};

/// Write any serializable value as pretty JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)
}

/// Write diagnostics, one per line.
pub fn write_diagnostics<W: Write>(writer: &mut W, diagnostics: &[Diagnostic]) -> io::Result<()> {
    for d in diagnostics {
        writeln!(writer, "warning[{}]: {}", d.code, d.message)?;
    }
    Ok(())
}

/// Write the list of changed variants, if any.
pub fn write_changed<W: Write>(writer: &mut W, changed: &BTreeSet<VariantId>) -> io::Result<()> {
    if changed.is_empty() {
        return writeln!(writer, "no lots changed");
    }
    let names: Vec<&str> = changed.iter().map(VariantId::as_str).collect();
    writeln!(writer, "lots changed for: {}", names.join(", "))
}

/// Write lots as an aligned table with a totals line.
pub fn write_lots<W: Write>(writer: &mut W, lots: &[Lot]) -> io::Result<()> {
    if lots.is_empty() {
        return writeln!(writer, "no lots in stock");
    }

    let rows: Vec<[String; 8]> = lots
        .iter()
        .map(|lot| {
            [
                lot.id.to_string(),
                lot.variant_id().to_string(),
                lot.key
                    .source_invoice_id
                    .as_ref()
                    .map_or_else(|| "-".to_string(), ToString::to_string),
                lot.key.unit_cost.to_string(),
                lot.key.package_size.to_string(),
                lot.quantity.to_string(),
                lot.sale_price.to_string(),
                lot.acquisition_date.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();

    let header = [
        "LOT", "VARIANT", "INVOICE", "COST", "PKG", "QTY", "PRICE", "ACQUIRED",
    ];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: &[&str]| -> String {
        cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                // Numbers right-aligned, text left-aligned.
                if (3..=6).contains(&i) {
                    format!("{cell:>width$}")
                } else {
                    format!("{cell:<width$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(writer, "{}", line(&header))?;
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        writeln!(writer, "{}", line(&cells))?;
    }

    let stems: u64 = lots.iter().map(|l| l.quantity).sum();
    let value = lots
        .iter()
        .map(Lot::book_value)
        .fold(Money::ZERO, |acc, v| acc + v);
    writeln!(
        writer,
        "{} lots, {stems} stems, book value {value}",
        lots.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use floraledger_core::{LotId, LotKey, SalePrice};
    use floraledger_reconcile::DiagnosticCode;

    fn lot() -> Lot {
        Lot {
            id: LotId(3),
            key: LotKey::new("rosa", Some("FT-1".into()), Money::from_cents(250), 10),
            quantity: 30,
            acquisition_date: NaiveDate::from_ymd_opt(2024, 4, 1)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
            supplier_id: None,
            sale_price: SalePrice::Derived(Money::from_cents(400)),
        }
    }

    #[test]
    fn test_write_lots_table() {
        let mut out = Vec::new();
        write_lots(&mut out, &[lot()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("LOT  VARIANT  INVOICE"));
        assert!(lines[1].starts_with("L3   rosa     FT-1"));
        assert!(lines[1].contains("4.00*"));
        assert!(lines[1].ends_with("2024-04-01 06:00"));
        assert_eq!(lines[2], "1 lots, 30 stems, book value 75.00");
    }

    #[test]
    fn test_write_empty() {
        let mut out = Vec::new();
        write_lots(&mut out, &[]).unwrap();
        write_changed(&mut out, &BTreeSet::new()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "no lots in stock\nno lots changed\n"
        );
    }

    #[test]
    fn test_write_diagnostics() {
        let mut out = Vec::new();
        let d = Diagnostic::new(DiagnosticCode::UnmatchedReduction, "nothing to unload");
        write_diagnostics(&mut out, &[d]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "warning[R1001]: nothing to unload\n"
        );
    }
}
