//! Query modules for the SPIMEX SDK.
//!
//! [`descriptor`] composes storage-agnostic query descriptors;
//! [`trading_results`] executes them against a
//! [`Connection`](crate::connection::Connection) with optional caching.

pub mod descriptor;
pub mod trading_results;

pub use descriptor::{build_filter_set, QueryDescriptor, Selection, DEFAULT_RESULTS_LIMIT};
pub use trading_results::TradingResultQuery;
