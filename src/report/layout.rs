//! Site and spreadsheet layout of the published daily reports.
//!
//! The scraping heuristics (listing container, legend marker, row offsets,
//! sentinel values) live here as data so that a change on the exchange's side
//! is a configuration change.

use crate::config;

/// Describes where reports are listed and how a report sheet is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    /// Absolute origin that relative download links are resolved against.
    pub site_origin: String,
    /// Page listing the published reports.
    pub listing_url: String,
    /// `id` of the element holding the report list.
    pub container_id: String,
    /// CSS selector of one report entry inside the container.
    pub item_selector: String,
    /// CSS selector of the entry's visible date label.
    pub label_selector: String,
    /// CSS selector of the entry's download link.
    pub link_selector: String,

    /// Text of the legend cell closing the header block.
    pub marker_text: String,
    /// Rows between the legend row and the first data row.
    pub data_offset: usize,
    /// Product-code value of the summary row that ends the data region.
    pub terminator_text: String,
    /// Count-column value meaning "no trades for this product".
    pub no_trade_marker: String,

    pub code_column: String,
    pub name_column: String,
    pub basis_name_column: String,
    pub volume_column: String,
    pub total_column: String,
    pub count_column: String,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            site_origin: config::SITE_ORIGIN.to_string(),
            listing_url: config::LISTING_URL.to_string(),
            container_id: "comp_d609bce6ada86eff0b6f7e49e6bae904".to_string(),
            item_selector: "div.accordeon-inner__wrap-item".to_string(),
            label_selector: "span".to_string(),
            link_selector: "a.accordeon-inner__item-title.link.xls".to_string(),

            marker_text: "Единица измерения: Метрическая тонна".to_string(),
            data_offset: 3,
            terminator_text: "Итого:".to_string(),
            no_trade_marker: "-".to_string(),

            code_column: "Форма СЭТ-БТ".to_string(),
            name_column: "Unnamed: 2".to_string(),
            basis_name_column: "Unnamed: 3".to_string(),
            volume_column: "Unnamed: 4".to_string(),
            total_column: "Unnamed: 5".to_string(),
            count_column: "Unnamed: 14".to_string(),
        }
    }
}
