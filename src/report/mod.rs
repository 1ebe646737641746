//! Daily report scraping: locate, download, trim and extract.

pub mod extractor;
pub mod fetcher;
pub mod filter;
pub mod layout;
pub mod locator;
pub mod table;

pub use extractor::{classify_row, extract_records, RowKind};
pub use fetcher::{decode_table, HttpSource, ReportSource};
pub use filter::filter_data_region;
pub use layout::ReportLayout;
pub use locator::{parse_href, ReportLocator};
pub use table::{Cell, Table};
