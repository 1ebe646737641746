//! Shared test fixtures for the SPIMEX SDK integration tests.
//!
//! Provides `setup_sample_db()` which creates an in-memory DuckDB connection
//! holding five stored trading results, plus builders for synthetic report
//! sheets and listing pages served by [`FakeSource`] or a local HTTP server.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_xlsxwriter::Workbook;
use spimex_sdk::report::{Cell, Table};
use spimex_sdk::{Connection, ReportLayout, ReportSource, Result, SpimexError, TradingResult};

pub const LISTING_URL: &str = "https://spimex.com/markets/oil_products/trades/results/";

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

// ---------------------------------------------------------------------------
// Stored sample data
// ---------------------------------------------------------------------------

fn sample_row(
    oil_id: &str,
    product_id: &str,
    name: &str,
    total: &str,
    volume: i64,
    count: i64,
    day: &str,
) -> TradingResult {
    let created = timestamp(&format!("{day}T09:05:26"));
    TradingResult {
        id: None,
        exchange_product_id: product_id.to_string(),
        exchange_product_name: name.to_string(),
        oil_id: oil_id.to_string(),
        delivery_basis_id: "BASIS001".to_string(),
        delivery_basis_name: "Test Basis".to_string(),
        delivery_type_id: "TYPE001".to_string(),
        volume: Some(volume),
        total: Some(Decimal::from_str(total).unwrap()),
        count: Some(count),
        date: date(day),
        created_on: Some(created),
        updated_on: Some(created),
    }
}

/// Five trading results over five distinct days; OIL001 trades twice.
pub fn sample_results() -> Vec<TradingResult> {
    vec![
        sample_row("OIL001", "TEST001", "Test Oil", "50000.50", 1000, 10, "2025-01-15"),
        sample_row("OIL001", "TEST001", "Another Oil", "75000.75", 2000, 15, "2025-01-16"),
        sample_row("OIL002", "TEST003", "Premium Oil", "90000.25", 1500, 12, "2025-01-17"),
        sample_row("OIL003", "TEST004", "Standard Oil", "120000.00", 3000, 20, "2025-01-18"),
        sample_row("OIL004", "TEST005", "Economy Oil", "80000.50", 2500, 18, "2025-01-19"),
    ]
}

/// An in-memory `Connection` with [`sample_results`] stored under ids 1..=5.
pub fn setup_sample_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.insert_results(&sample_results()).unwrap();
    conn
}

// ---------------------------------------------------------------------------
// Synthetic report sheets
// ---------------------------------------------------------------------------

const SHEET_WIDTH: usize = 15;

fn blank_row() -> Vec<Cell> {
    vec![Cell::Empty; SHEET_WIDTH]
}

fn text_row(col: usize, text: &str) -> Vec<Cell> {
    let mut row = blank_row();
    row[col] = Cell::from(text);
    row
}

/// One product line laid out in the report's positional columns.
pub fn product_row(code: &str, name: &str, basis: &str, volume: Cell, total: Cell, count: Cell) -> Vec<Cell> {
    let mut row = blank_row();
    row[1] = Cell::from(code);
    row[2] = Cell::from(name);
    row[3] = Cell::from(basis);
    row[4] = volume;
    row[5] = total;
    row[14] = count;
    row
}

/// A traded line with integer figures.
pub fn traded(code: &str, volume: i64, total: i64, count: i64) -> Vec<Cell> {
    product_row(
        code,
        &format!("Product {code}"),
        &format!("Basis {code}"),
        Cell::Int(volume),
        Cell::Int(total),
        Cell::Int(count),
    )
}

/// A line marked as not traded.
pub fn untraded(code: &str) -> Vec<Cell> {
    product_row(code, "Idle product", "Idle basis", Cell::from("-"), Cell::from("-"), Cell::from("-"))
}

pub fn total_row() -> Vec<Cell> {
    text_row(1, "Итого:")
}

/// The raw sheet of a report: title block, legend row, two column-heading
/// rows, then `body` (data lines plus whatever follows them). Column A is
/// left empty, as on the published sheets.
pub fn report_grid(body: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
    let mut grid = vec![
        text_row(1, "Форма СЭТ-БТ"),
        text_row(1, "Бюллетень по итогам торгов в Секции «Нефтепродукты»"),
        text_row(1, "Единица измерения: Метрическая тонна"),
        text_row(1, "Код Инструмента"),
        text_row(4, "Объем Договоров в единицах измерения"),
    ];
    grid.extend(body);
    grid
}

/// [`report_grid`] decoded into a table.
pub fn report_table(body: Vec<Vec<Cell>>) -> Table {
    Table::from_grid(report_grid(body))
}

/// A typical day: two traded lines, one untraded line, the summary row and a
/// trailing signature block.
pub fn standard_body() -> Vec<Vec<Cell>> {
    vec![
        traded("A592ACH005A", 60, 3_720_000, 2),
        untraded("A592UFM060F"),
        traded("DTSCANK065F", 120, 7_560_000, 4),
        total_row(),
        traded("ZZZZAFTER1X", 1, 1, 1),
    ]
}

pub fn standard_report() -> Table {
    report_table(standard_body())
}

// ---------------------------------------------------------------------------
// Workbooks
// ---------------------------------------------------------------------------

/// Write `grid` to the first sheet of an xlsx workbook. Empty cells are not
/// written, so leading blank columns stay outside the sheet's used range.
pub fn workbook_bytes(grid: &[Vec<Cell>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in grid.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(r, c, s.as_str()).unwrap();
                }
                Cell::Int(n) => {
                    sheet.write_number(r, c, *n as f64).unwrap();
                }
                Cell::Float(f) => {
                    sheet.write_number(r, c, *f).unwrap();
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(r, c, *b).unwrap();
                }
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

/// [`standard_body`] as a downloadable workbook.
pub fn standard_workbook() -> Vec<u8> {
    workbook_bytes(&report_grid(standard_body()))
}

// ---------------------------------------------------------------------------
// Listing pages
// ---------------------------------------------------------------------------

/// A listing page whose report container holds `entries` of
/// `(date label, href)`.
pub fn listing_html(entries: &[(&str, &str)]) -> String {
    let layout = ReportLayout::default();
    let items: String = entries
        .iter()
        .map(|(label, href)| {
            format!(
                r#"<div class="accordeon-inner__wrap-item">
                     <a class="accordeon-inner__item-title link xls" href="{href}">Бюллетень</a>
                     <p>Дата торгов: <span> {label} </span></p>
                   </div>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><div id="{}">{items}</div></body></html>"#,
        layout.container_id
    )
}

/// The relative href used for a day's report in fixtures.
pub fn report_href(label: &str) -> String {
    let compact: String = label.split('.').rev().collect();
    format!("/upload/reports/oil_xls/oil_xls_{compact}162000.xls?r=4921")
}

/// The absolute, query-free URL the locator should produce for [`report_href`].
pub fn report_url(label: &str) -> String {
    let compact: String = label.split('.').rev().collect();
    format!("https://spimex.com/upload/reports/oil_xls/oil_xls_{compact}162000.xls")
}

// ---------------------------------------------------------------------------
// FakeSource
// ---------------------------------------------------------------------------

/// Serves a fixed listing page and decoded reports keyed by URL.
#[derive(Default)]
pub struct FakeSource {
    pub listing: String,
    pub reports: HashMap<String, Table>,
    pub report_downloads: AtomicUsize,
}

impl FakeSource {
    /// A source publishing `days` of `(label, table)`.
    pub fn publishing(days: Vec<(&str, Table)>) -> Self {
        let entries: Vec<(String, String)> = days
            .iter()
            .map(|(label, _)| (label.to_string(), report_href(label)))
            .collect();
        let refs: Vec<(&str, &str)> = entries
            .iter()
            .map(|(l, h)| (l.as_str(), h.as_str()))
            .collect();
        Self {
            listing: listing_html(&refs),
            reports: days
                .into_iter()
                .map(|(label, table)| (report_url(label), table))
                .collect(),
            report_downloads: AtomicUsize::new(0),
        }
    }

    pub fn downloads(&self) -> usize {
        self.report_downloads.load(Ordering::SeqCst)
    }
}

impl ReportSource for FakeSource {
    fn fetch_listing(&self, _url: &str) -> Result<String> {
        Ok(self.listing.clone())
    }

    fn fetch_report(&self, url: &str) -> Result<Table> {
        self.report_downloads.fetch_add(1, Ordering::SeqCst);
        self.reports
            .get(url)
            .cloned()
            .ok_or_else(|| SpimexError::NotFound(format!("no report at {url}")))
    }
}

// ---------------------------------------------------------------------------
// Local HTTP server
// ---------------------------------------------------------------------------

/// A canned HTTP response.
#[derive(Clone)]
pub struct Page {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Page {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn xlsx(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            body,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: b"unavailable".to_vec(),
        }
    }
}

/// Serve `pages` keyed by request path (query strings ignored) on a local
/// port and return the server's origin, e.g. `http://127.0.0.1:40213`.
/// Unknown paths answer 404.
pub fn serve(pages: Vec<(&str, Page)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    let pages: HashMap<String, Page> = pages
        .into_iter()
        .map(|(path, page)| (path.to_string(), page))
        .collect();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let page = request_path(&stream)
                .and_then(|path| pages.get(&path).cloned())
                .unwrap_or_else(|| Page::status(404));
            let head = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                page.status,
                if page.status == 200 { "OK" } else { "Error" },
                page.content_type,
                page.body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&page.body);
        }
    });
    origin
}

/// Accept connections and never answer them.
pub fn serve_nothing() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    origin
}

/// An origin on a local port nothing listens on.
pub fn closed_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn request_path(stream: &TcpStream) -> Option<String> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) | Err(_) => break,
            Ok(_) if header == "\r\n" => break,
            Ok(_) => {}
        }
    }
    let target = request_line.split_whitespace().nth(1)?;
    Some(target.split('?').next().unwrap_or(target).to_string())
}
