//! SQL builder with parameterized query construction.
//!
//! All user-supplied values go through DuckDB's parameter binding (`?` placeholders),
//! never through string interpolation. Builder methods return `&mut Self` for chaining.
//!
//! # Example
//!
//! ```rust
//! use spimex_sdk::SqlBuilder;
//! let (sql, params) = SqlBuilder::new("spimex_trading_results")
//!     .where_eq("oil_id", "A592")
//!     .order_by(&["date DESC"])
//!     .limit(10)
//!     .build();
//! ```

/// Builds parameterized SQL queries safely.
///
/// All user-supplied values go through DuckDB's parameter binding (`?` placeholders),
/// never through string interpolation. Methods return `&mut Self` for chaining.
pub struct SqlBuilder {
    select_cols: Vec<String>,
    is_distinct: bool,
    from_table: String,
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_by_cols: Vec<String>,
    limit_val: Option<usize>,
}

impl SqlBuilder {
    /// Create a builder targeting the given table.
    pub fn new(table: &str) -> Self {
        Self {
            select_cols: vec!["*".to_string()],
            is_distinct: false,
            from_table: table.to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_by_cols: Vec::new(),
            limit_val: None,
        }
    }

    /// Set the columns to select (replaces the default `*`).
    pub fn select(&mut self, cols: &[&str]) -> &mut Self {
        self.select_cols = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add DISTINCT to the SELECT clause.
    pub fn distinct(&mut self) -> &mut Self {
        self.is_distinct = true;
        self
    }

    /// Add an equality condition: `{column} = ?`.
    pub fn where_eq(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses
            .push(format!("{} = ?", column));
        self.params.push(value.to_string());
        self
    }

    /// Add an inclusive range condition on a DATE column:
    /// `{column} BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)`.
    pub fn where_date_between(&mut self, column: &str, start: &str, end: &str) -> &mut Self {
        self.where_clauses.push(format!(
            "{} BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)",
            column
        ));
        self.params.push(start.to_string());
        self.params.push(end.to_string());
        self
    }

    /// Add ORDER BY clauses (e.g. `"date DESC"`).
    pub fn order_by(&mut self, clauses: &[&str]) -> &mut Self {
        self.order_by_cols
            .extend(clauses.iter().map(|c| c.to_string()));
        self
    }

    /// Set the maximum number of rows to return.
    pub fn limit(&mut self, n: usize) -> &mut Self {
        self.limit_val = Some(n);
        self
    }

    /// Build the final SQL string and parameter list.
    ///
    /// Returns a tuple of `(sql_string, params_list)` ready for execution.
    pub fn build(&self) -> (String, Vec<String>) {
        let distinct = if self.is_distinct { "DISTINCT " } else { "" };
        let cols = self.select_cols.join(", ");
        let mut parts = vec![
            format!("SELECT {}{}", distinct, cols),
            format!("FROM {}", self.from_table),
        ];

        if !self.where_clauses.is_empty() {
            parts.push(format!("WHERE {}", self.where_clauses.join(" AND ")));
        }

        if !self.order_by_cols.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by_cols.join(", ")));
        }

        if let Some(n) = self.limit_val {
            parts.push(format!("LIMIT {}", n));
        }

        (parts.join("\n"), self.params.clone())
    }
}
