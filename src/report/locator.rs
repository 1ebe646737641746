//! Finding a day's report on the listing page.

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::{Result, SpimexError};
use crate::report::fetcher::ReportSource;
use crate::report::layout::ReportLayout;

/// Looks up download links on the exchange's report listing page.
pub struct ReportLocator<'a> {
    source: &'a dyn ReportSource,
    layout: &'a ReportLayout,
}

impl<'a> ReportLocator<'a> {
    pub fn new(source: &'a dyn ReportSource, layout: &'a ReportLayout) -> Self {
        Self { source, layout }
    }

    /// Fetch the listing page and return the download URL for `label`.
    ///
    /// `Ok(None)` means no entry carries that label (not published yet).
    /// A listing page without the report container is a [`SpimexError::Layout`].
    pub fn locate(&self, label: &str) -> Result<Option<String>> {
        let html = self.source.fetch_listing(&self.layout.listing_url)?;
        let href = parse_href(&html, label, self.layout)?;
        debug!(label, found = href.is_some(), "scanned report listing");
        Ok(href)
    }
}

/// Scan listing HTML for the entry labelled `label` and return its download
/// link as an absolute URL with query string and fragment removed.
///
/// Only the first matching entry is considered.
pub fn parse_href(html: &str, label: &str, layout: &ReportLayout) -> Result<Option<String>> {
    let doc = Html::parse_document(html);
    let container_sel = selector(&format!("#{}", layout.container_id))?;
    let item_sel = selector(&layout.item_selector)?;
    let label_sel = selector(&layout.label_selector)?;
    let link_sel = selector(&layout.link_selector)?;

    let container = doc.select(&container_sel).next().ok_or_else(|| {
        SpimexError::Layout(format!(
            "listing container #{} not found",
            layout.container_id
        ))
    })?;

    let wanted = label.trim();
    let Some(item) = container
        .select(&item_sel)
        .find(|item| entry_label(item, &label_sel).as_deref() == Some(wanted))
    else {
        return Ok(None);
    };

    let href = item
        .select(&link_sel)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| {
            SpimexError::Layout(format!("listing entry {wanted:?} has no download link"))
        })?;

    clean_url(&layout.site_origin, href).map(Some)
}

fn entry_label(item: &ElementRef<'_>, label_sel: &Selector) -> Option<String> {
    item.select(label_sel)
        .next()
        .map(|span| span.text().collect::<String>().trim().to_string())
}

/// Resolve `href` against `origin` and drop the query string and fragment.
pub fn clean_url(origin: &str, href: &str) -> Result<String> {
    let base = Url::parse(origin)
        .map_err(|e| SpimexError::InvalidArgument(format!("Invalid site origin {origin:?}: {e}")))?;
    let mut url = base
        .join(href.trim())
        .map_err(|e| SpimexError::Layout(format!("Unusable download link {href:?}: {e}")))?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| SpimexError::InvalidArgument(format!("Invalid selector {css:?}: {e:?}")))
}
