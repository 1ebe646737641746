use crate::report::layout::ReportLayout;
use crate::report::table::Table;

/// Trim a raw report down to its data region.
///
/// The first row with a cell containing the legend marker closes the header
/// block; data starts `layout.data_offset` rows below it and runs to the end
/// of the table. Returns `None` when no row carries the marker.
pub fn filter_data_region(table: &Table, layout: &ReportLayout) -> Option<Table> {
    let marker_row = table.rows().iter().position(|row| {
        row.iter()
            .any(|cell| cell.to_string().contains(&layout.marker_text))
    })?;
    Some(table.tail_from(marker_row + layout.data_offset))
}
