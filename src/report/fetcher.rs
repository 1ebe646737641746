//! Downloading listing pages and report spreadsheets.

use std::io::Cursor;
use std::time::Duration;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use reqwest::blocking::Client;
use tracing::debug;

use crate::error::{Result, SpimexError};
use crate::report::table::{Cell, Table};

/// Where listing pages and report files come from.
///
/// [`HttpSource`] is the production implementation; tests substitute
/// canned pages and tables.
pub trait ReportSource: Send + Sync {
    /// Fetch the HTML of the report listing page.
    fn fetch_listing(&self, url: &str) -> Result<String>;

    /// Download a report and decode its first sheet.
    fn fetch_report(&self, url: &str) -> Result<Table>;
}

/// Fetches from the exchange website over HTTP.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Build an HTTP source whose requests time out after `timeout`.
    ///
    /// A timed-out request surfaces as [`SpimexError::Network`].
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "downloading");
        let resp = self.client.get(url).send()?.error_for_status()?;
        Ok(resp.bytes()?.to_vec())
    }
}

impl ReportSource for HttpSource {
    fn fetch_listing(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send()?.error_for_status()?;
        Ok(resp.text()?)
    }

    fn fetch_report(&self, url: &str) -> Result<Table> {
        let bytes = self.download(url)?;
        decode_table(&bytes)
    }
}

/// Decode spreadsheet bytes (xls or xlsx) into a [`Table`].
///
/// The first row of the first sheet becomes the header. Leading empty
/// columns are kept so that positional column names match the sheet.
pub fn decode_table(bytes: &[u8]) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| SpimexError::Decode(format!("not a readable spreadsheet: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SpimexError::Decode("workbook contains no sheets".into()))?
        .map_err(|e| SpimexError::Decode(format!("unreadable sheet: {e}")))?;

    let col_offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let grid: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| {
            let mut cells = vec![Cell::Empty; col_offset];
            cells.extend(row.iter().map(to_cell));
            cells
        })
        .collect();

    debug!(rows = grid.len(), "decoded report sheet");
    Ok(Table::from_grid(grid))
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from(s.as_str()),
        Data::Int(n) => Cell::Int(*n),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        other => Cell::Text(other.to_string()),
    }
}
