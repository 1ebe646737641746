//! Unit tests for the SqlBuilder query construction.

use spimex_sdk::SqlBuilder;

const TABLE: &str = "spimex_trading_results";

// ---------------------------------------------------------------------------
// Basic construction
// ---------------------------------------------------------------------------

#[test]
fn new_creates_select_star_from_table() {
    let (sql, params) = SqlBuilder::new(TABLE).build();
    assert_eq!(sql, "SELECT *\nFROM spimex_trading_results");
    assert!(params.is_empty());
}

#[test]
fn select_distinct_column() {
    let (sql, _) = SqlBuilder::new(TABLE).select(&["date"]).distinct().build();
    assert!(sql.starts_with("SELECT DISTINCT date\n"));
}

// ---------------------------------------------------------------------------
// WHERE conditions
// ---------------------------------------------------------------------------

#[test]
fn where_eq_adds_equality_with_param() {
    let (sql, params) = SqlBuilder::new(TABLE).where_eq("oil_id", "A592").build();
    assert!(sql.contains("WHERE oil_id = ?"));
    assert_eq!(params, vec!["A592"]);
}

#[test]
fn where_date_between_binds_both_bounds() {
    let (sql, params) = SqlBuilder::new(TABLE)
        .where_date_between("date", "2025-01-15", "2025-01-20")
        .build();
    assert!(sql.contains("WHERE date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)"));
    assert_eq!(params, vec!["2025-01-15", "2025-01-20"]);
}

#[test]
fn multiple_where_clauses_joined_with_and() {
    let (sql, params) = SqlBuilder::new(TABLE)
        .where_eq("oil_id", "A592")
        .where_eq("delivery_type_id", "F")
        .build();
    assert!(sql.contains("WHERE oil_id = ? AND delivery_type_id = ?"));
    assert_eq!(params, vec!["A592", "F"]);
}

#[test]
fn values_are_never_interpolated() {
    let (sql, params) = SqlBuilder::new(TABLE)
        .where_eq("oil_id", "'; DROP TABLE spimex_trading_results; --")
        .build();
    assert!(!sql.contains("DROP"));
    assert_eq!(params.len(), 1);
}

// ---------------------------------------------------------------------------
// ORDER BY / LIMIT
// ---------------------------------------------------------------------------

#[test]
fn order_by_adds_clause() {
    let (sql, _) = SqlBuilder::new(TABLE).order_by(&["date DESC"]).build();
    assert!(sql.contains("ORDER BY date DESC"));
}

#[test]
fn limit_adds_clause() {
    let (sql, _) = SqlBuilder::new(TABLE).limit(5).build();
    assert!(sql.ends_with("LIMIT 5"));
}

// ---------------------------------------------------------------------------
// Combined / chained
// ---------------------------------------------------------------------------

#[test]
fn combined_builder_chains_correctly() {
    let (sql, params) = SqlBuilder::new(TABLE)
        .where_date_between("date", "2025-01-15", "2025-01-20")
        .where_eq("oil_id", "A592")
        .order_by(&["date DESC"])
        .limit(10)
        .build();

    assert_eq!(
        sql,
        "SELECT *\nFROM spimex_trading_results\n\
         WHERE date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE) AND oil_id = ?\n\
         ORDER BY date DESC\nLIMIT 10"
    );
    assert_eq!(params, vec!["2025-01-15", "2025-01-20", "A592"]);
}
