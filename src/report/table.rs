//! In-memory tabular data decoded from a report sheet.

use std::collections::HashMap;
use std::fmt;

/// A single decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Empty cells, blank text, zero and `false` all count as "no value".
    pub fn is_falsy(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Int(n) => *n == 0,
            Cell::Float(f) => *f == 0.0 || f.is_nan(),
            Cell::Bool(b) => !b,
        }
    }

    /// Trimmed text rendering of the cell (`""` for empty cells).
    pub fn text(&self) -> String {
        self.to_string().trim().to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Int(n) => write!(f, "{n}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Int(n)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Rows of cells under named columns.
///
/// Column names are taken verbatim from the sheet's first row. Blank header
/// cells are named `Unnamed: {index}` and repeated names get a `.{n}` suffix,
/// so positional columns keep stable names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            columns,
            index,
            rows,
        }
    }

    /// Build a table from a raw grid whose first row is the header.
    pub fn from_grid(mut grid: Vec<Vec<Cell>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let header = grid.remove(0);
        let width = grid
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut columns = Vec::with_capacity(width);
        for i in 0..width {
            let raw = header.get(i).map(Cell::text).unwrap_or_default();
            let base = if raw.is_empty() {
                format!("Unnamed: {i}")
            } else {
                raw
            };
            let dupes = seen.entry(base.clone()).or_insert(0);
            let name = if *dupes == 0 {
                base
            } else {
                format!("{base}.{dupes}")
            };
            *dupes += 1;
            columns.push(name);
        }

        Self::new(columns, grid)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Cell at `row` under `column`; missing cells read as [`Cell::Empty`].
    pub fn cell(&self, row: usize, column: &str) -> &Cell {
        self.column_index(column)
            .and_then(|c| self.rows.get(row).and_then(|r| r.get(c)))
            .unwrap_or(&EMPTY)
    }

    /// Rows from `start` to the end, under the same columns.
    pub fn tail_from(&self, start: usize) -> Table {
        let rows = self.rows.get(start..).map(<[_]>::to_vec).unwrap_or_default();
        Table {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows,
        }
    }
}
