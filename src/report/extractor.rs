//! Turning data-region rows into [`TradingResult`] records.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{Result, SpimexError};
use crate::models::{ProductLine, TradingResult};
use crate::report::layout::ReportLayout;
use crate::report::table::{Cell, Table};

/// How a data-region row takes part in extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// A traded product line.
    Data,
    /// The summary row; it and everything after it is dropped.
    Terminator,
    /// A product without trades that day, or a row without a product code.
    Excluded,
}

pub fn classify_row(region: &Table, row: usize, layout: &ReportLayout) -> RowKind {
    let code = region.cell(row, &layout.code_column).text();
    if code == layout.terminator_text {
        RowKind::Terminator
    } else if code.is_empty()
        || region.cell(row, &layout.count_column).text() == layout.no_trade_marker
    {
        RowKind::Excluded
    } else {
        RowKind::Data
    }
}

/// Extract the trading results of one report, all dated `date`.
///
/// Rows are read in order up to the terminator row. Empty or zero figures
/// are stored as absent; a figure that is present but not numeric is a
/// [`SpimexError::Decode`].
pub fn extract_records(
    region: &Table,
    date: NaiveDate,
    layout: &ReportLayout,
) -> Result<Vec<TradingResult>> {
    let mut records = Vec::new();
    for row in 0..region.len() {
        match classify_row(region, row, layout) {
            RowKind::Terminator => break,
            RowKind::Excluded => continue,
            RowKind::Data => {
                let line = read_line(region, row, layout)?;
                records.push(TradingResult::new(line, date));
            }
        }
    }
    Ok(records)
}

fn read_line(region: &Table, row: usize, layout: &ReportLayout) -> Result<ProductLine> {
    Ok(ProductLine {
        exchange_product_id: region.cell(row, &layout.code_column).text(),
        exchange_product_name: region.cell(row, &layout.name_column).text(),
        delivery_basis_name: region.cell(row, &layout.basis_name_column).text(),
        volume: parse_int(region.cell(row, &layout.volume_column))
            .map_err(|e| field_error(row, &layout.volume_column, e))?,
        total: parse_decimal(region.cell(row, &layout.total_column))
            .map_err(|e| field_error(row, &layout.total_column, e))?,
        count: parse_int(region.cell(row, &layout.count_column))
            .map_err(|e| field_error(row, &layout.count_column, e))?,
    })
}

fn field_error(row: usize, column: &str, detail: String) -> SpimexError {
    SpimexError::Decode(format!("row {row}, column {column:?}: {detail}"))
}

/// Parse an optional integer; fractional values are truncated.
pub fn parse_int(cell: &Cell) -> std::result::Result<Option<i64>, String> {
    if cell.is_falsy() {
        return Ok(None);
    }
    match cell {
        Cell::Int(n) => Ok(Some(*n)),
        Cell::Float(f) if f.is_finite() => Ok(Some(f.trunc() as i64)),
        Cell::Bool(b) => Ok(Some(i64::from(*b))),
        other => {
            let text = normalize_number(&other.text());
            text.parse::<i64>()
                .ok()
                .or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
                .map(Some)
                .ok_or_else(|| format!("{:?} is not an integer", other.text()))
        }
    }
}

/// Parse an optional amount, rounded to two decimal places.
pub fn parse_decimal(cell: &Cell) -> std::result::Result<Option<Decimal>, String> {
    if cell.is_falsy() {
        return Ok(None);
    }
    let parsed = match cell {
        Cell::Int(n) => Some(Decimal::from(*n)),
        Cell::Float(f) => Decimal::from_str(&f.to_string())
            .ok()
            .or_else(|| Decimal::try_from(*f).ok()),
        other => {
            let text = normalize_number(&other.text());
            Decimal::from_str(&text)
                .ok()
                .or_else(|| Decimal::from_scientific(&text).ok())
        }
    };
    parsed
        .map(|d| Some(d.round_dp(2)))
        .ok_or_else(|| format!("{:?} is not a decimal amount", cell.text()))
}

/// Drop digit-group spaces and accept a decimal comma.
fn normalize_number(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}
