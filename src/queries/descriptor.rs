//! Storage-agnostic query descriptors over the trading results table.
//!
//! The functions here only compose descriptors; nothing is executed until a
//! descriptor is translated with [`QueryDescriptor::to_sql`] and run against
//! a [`Connection`](crate::connection::Connection).

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::ResultFilters;
use crate::sql_builder::SqlBuilder;

/// Row limit of [`trading_results`] when the caller gives none.
pub const DEFAULT_RESULTS_LIMIT: usize = 5;

/// What a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Full trading result rows.
    Records,
    /// Distinct trading dates only.
    DistinctDates,
}

/// Filter, ordering, range and limit intent for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub selection: Selection,
    /// Equality filters, column → value. Only present, non-empty values.
    pub filters: BTreeMap<&'static str, String>,
    /// Inclusive `[start, end]` bound on the trading date.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Order by trading date, newest first.
    pub newest_first: bool,
    pub limit: Option<usize>,
}

impl QueryDescriptor {
    fn records() -> Self {
        Self {
            selection: Selection::Records,
            filters: BTreeMap::new(),
            date_range: None,
            newest_first: false,
            limit: None,
        }
    }

    /// Translate into parameterised SQL against `table`.
    pub fn to_sql(&self, table: &str) -> (String, Vec<String>) {
        let mut qb = SqlBuilder::new(table);

        if self.selection == Selection::DistinctDates {
            qb.select(&["date"]).distinct();
        }

        if let Some((start, end)) = &self.date_range {
            qb.where_date_between("date", &start.to_string(), &end.to_string());
        }

        for (column, value) in &self.filters {
            qb.where_eq(column, value);
        }

        if self.newest_first {
            qb.order_by(&["date DESC"]);
        }

        if let Some(n) = self.limit {
            qb.limit(n);
        }

        qb.build()
    }
}

/// Keep only the fields whose value is present and non-empty.
pub fn build_filter_set(fields: &[(&'static str, Option<&str>)]) -> BTreeMap<&'static str, String> {
    fields
        .iter()
        .filter_map(|(name, value)| match value {
            Some(v) if !v.is_empty() => Some((*name, v.to_string())),
            _ => None,
        })
        .collect()
}

fn result_filter_set(filters: &ResultFilters) -> BTreeMap<&'static str, String> {
    build_filter_set(&[
        ("oil_id", filters.oil_id.as_deref()),
        ("delivery_basis_id", filters.delivery_basis_id.as_deref()),
        ("delivery_type_id", filters.delivery_type_id.as_deref()),
    ])
}

/// Every stored record, in storage order.
pub fn all() -> QueryDescriptor {
    QueryDescriptor::records()
}

/// The `limit` most recent distinct trading dates, newest first.
pub fn latest_dates(limit: usize) -> QueryDescriptor {
    QueryDescriptor {
        selection: Selection::DistinctDates,
        newest_first: true,
        limit: Some(limit),
        ..QueryDescriptor::records()
    }
}

/// Records dated within `[start, end]`, narrowed by any present filters.
pub fn dynamics(start: NaiveDate, end: NaiveDate, filters: &ResultFilters) -> QueryDescriptor {
    QueryDescriptor {
        filters: result_filter_set(filters),
        date_range: Some((start, end)),
        ..QueryDescriptor::records()
    }
}

/// The most recent records matching any present filters, newest first.
pub fn trading_results(limit: Option<usize>, filters: &ResultFilters) -> QueryDescriptor {
    QueryDescriptor {
        filters: result_filter_set(filters),
        newest_first: true,
        limit: Some(limit.unwrap_or(DEFAULT_RESULTS_LIMIT)),
        ..QueryDescriptor::records()
    }
}

// ---------------------------------------------------------------------------
// Cache keys
// ---------------------------------------------------------------------------

// Keys mirror the endpoint plus its parameters; absent filters render as `None`.

fn key_part(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "None",
    }
}

pub fn all_key() -> String {
    "all".to_string()
}

pub fn latest_dates_key(limit: usize) -> String {
    format!("last_trading_dates:{limit}")
}

pub fn dynamics_key(start: NaiveDate, end: NaiveDate, filters: &ResultFilters) -> String {
    format!(
        "get_dynamics:{}_{}_{}_{start}_{end}",
        key_part(filters.oil_id.as_deref()),
        key_part(filters.delivery_basis_id.as_deref()),
        key_part(filters.delivery_type_id.as_deref()),
    )
}

pub fn trading_results_key(limit: Option<usize>, filters: &ResultFilters) -> String {
    format!(
        "trading_results:{}_{}_{}_{}",
        key_part(filters.oil_id.as_deref()),
        key_part(filters.delivery_basis_id.as_deref()),
        key_part(filters.delivery_type_id.as_deref()),
        limit.unwrap_or(DEFAULT_RESULTS_LIMIT),
    )
}
