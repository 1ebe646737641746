use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ProductLine: One traded line item as read from a report
// ---------------------------------------------------------------------------

/// Raw figures for one exchange product, before the trading date and the
/// derived code fields are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLine {
    pub exchange_product_id: String,
    pub exchange_product_name: String,
    pub delivery_basis_name: String,
    pub volume: Option<i64>,
    pub total: Option<Decimal>,
    pub count: Option<i64>,
}

// ---------------------------------------------------------------------------
// TradingResult: Normalized trading result (persisted row)
// ---------------------------------------------------------------------------

/// A normalized daily trading result for one exchange product.
///
/// `oil_id`, `delivery_basis_id` and `delivery_type_id` are substrings of
/// `exchange_product_id`; [`TradingResult::new`] derives them. `id`,
/// `created_on` and `updated_on` are assigned by storage and stay `None`
/// until the record has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingResult {
    #[serde(default)]
    pub id: Option<i64>,
    pub exchange_product_id: String,
    pub exchange_product_name: String,
    pub oil_id: String,
    pub delivery_basis_id: String,
    pub delivery_basis_name: String,
    pub delivery_type_id: String,
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub count: Option<i64>,
    pub date: NaiveDate,
    #[serde(default)]
    pub created_on: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_on: Option<NaiveDateTime>,
}

impl TradingResult {
    pub fn new(line: ProductLine, date: NaiveDate) -> Self {
        let code = line.exchange_product_id.as_str();
        Self {
            id: None,
            oil_id: oil_id_of(code),
            delivery_basis_id: delivery_basis_id_of(code),
            delivery_type_id: delivery_type_id_of(code),
            exchange_product_id: line.exchange_product_id,
            exchange_product_name: line.exchange_product_name,
            delivery_basis_name: line.delivery_basis_name,
            volume: line.volume,
            total: line.total,
            count: line.count,
            date,
            created_on: None,
            updated_on: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Product code slicing
// ---------------------------------------------------------------------------

// Offsets count characters, not bytes; short codes yield short (or empty) parts.

/// Oil type: the first four characters of the product code.
pub fn oil_id_of(product_code: &str) -> String {
    product_code.chars().take(4).collect()
}

/// Delivery basis: characters 4..7 of the product code.
pub fn delivery_basis_id_of(product_code: &str) -> String {
    product_code.chars().skip(4).take(3).collect()
}

/// Delivery type: the last character of the product code.
pub fn delivery_type_id_of(product_code: &str) -> String {
    product_code.chars().last().map(String::from).unwrap_or_default()
}
