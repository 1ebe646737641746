use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpimexError};

/// Format of the date labels used on the listing page and in requests.
pub const DATE_LABEL_FORMAT: &str = "%d.%m.%Y";

// ---------------------------------------------------------------------------
// ReportRequest: One requested trading day
// ---------------------------------------------------------------------------

/// A request for the report of one trading day, labelled `dd.mm.yyyy`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportRequest {
    label: String,
    date: NaiveDate,
}

impl ReportRequest {
    /// Parse a `dd.mm.yyyy` label.
    pub fn parse(label: &str) -> Result<Self> {
        let trimmed = label.trim();
        if trimmed.chars().count() != 10 {
            return Err(SpimexError::InvalidArgument(format!(
                "Date label must be 10 characters (dd.mm.yyyy), got {label:?}"
            )));
        }
        let date = NaiveDate::parse_from_str(trimmed, DATE_LABEL_FORMAT).map_err(|e| {
            SpimexError::InvalidArgument(format!("Invalid date label {label:?}: {e}"))
        })?;
        Ok(Self {
            label: trimmed.to_string(),
            date,
        })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            label: date.format(DATE_LABEL_FORMAT).to_string(),
            date,
        }
    }

    /// The label as it appears on the listing page.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

// ---------------------------------------------------------------------------
// ResultFilters: Optional equality filters on the derived code fields
// ---------------------------------------------------------------------------

/// Optional equality filters shared by the dynamics and trading-result queries.
///
/// Absent and empty values impose no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFilters {
    pub oil_id: Option<String>,
    pub delivery_basis_id: Option<String>,
    pub delivery_type_id: Option<String>,
}

impl ResultFilters {
    pub fn oil(oil_id: &str) -> Self {
        Self {
            oil_id: Some(oil_id.to_string()),
            ..Default::default()
        }
    }
}
