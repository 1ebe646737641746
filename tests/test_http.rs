//! HTTP source tests against a local server: listing and report downloads,
//! status errors, timeouts and refused connections.

mod common;

use std::time::Duration;

use spimex_sdk::report::HttpSource;
use spimex_sdk::{ReportLayout, ReportSource, SpimexError, SpimexSdk};

const LISTING_PATH: &str = "/markets/oil_products/trades/results/";

fn source() -> HttpSource {
    HttpSource::new(Duration::from_secs(5)).unwrap()
}

fn report_path(label: &str) -> String {
    let compact: String = label.split('.').rev().collect();
    format!("/upload/reports/oil_xls/oil_xls_{compact}162000.xls")
}

/// The default layout pointed at `origin` instead of the exchange website.
fn local_layout(origin: &str) -> ReportLayout {
    ReportLayout {
        site_origin: origin.to_string(),
        listing_url: format!("{origin}{LISTING_PATH}"),
        ..ReportLayout::default()
    }
}

// ---------------------------------------------------------------------------
// Successful downloads
// ---------------------------------------------------------------------------

#[test]
fn fetch_listing_returns_page_text() {
    let html = common::listing_html(&[("12.09.2025", "/a.xls")]);
    let origin = common::serve(vec![(LISTING_PATH, common::Page::html(&html))]);

    let body = source()
        .fetch_listing(&format!("{origin}{LISTING_PATH}"))
        .unwrap();
    assert_eq!(body, html);
}

#[test]
fn fetch_report_decodes_workbook() {
    let path = report_path("12.09.2025");
    let origin = common::serve(vec![(
        path.as_str(),
        common::Page::xlsx(common::standard_workbook()),
    )]);

    let table = source().fetch_report(&format!("{origin}{path}")).unwrap();
    assert_eq!(table.columns(), common::standard_report().columns());
    assert_eq!(table.len(), common::standard_report().len());
}

#[test]
fn sdk_ingests_and_stores_over_http() {
    let label = "12.09.2025";
    let href = common::report_href(label);
    let html = common::listing_html(&[(label, href.as_str())]);
    let path = report_path(label);
    let origin = common::serve(vec![
        (LISTING_PATH, common::Page::html(&html)),
        (path.as_str(), common::Page::xlsx(common::standard_workbook())),
    ]);

    let sdk = SpimexSdk::builder()
        .in_memory()
        .layout(local_layout(&origin))
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let stored = sdk.ingest_and_store(&[label]).unwrap();

    let codes: Vec<&str> = stored.iter().map(|r| r.exchange_product_id.as_str()).collect();
    assert_eq!(codes, vec!["A592ACH005A", "DTSCANK065F"]);
    assert!(stored.iter().all(|r| r.id.is_some()));
    assert_eq!(sdk.connection().count_results().unwrap(), 2);
}

// ---------------------------------------------------------------------------
// Transport failures
// ---------------------------------------------------------------------------

#[test]
fn error_status_is_network_error() {
    let origin = common::serve(vec![(LISTING_PATH, common::Page::status(503))]);

    let err = source()
        .fetch_listing(&format!("{origin}{LISTING_PATH}"))
        .unwrap_err();
    assert!(
        matches!(&err, SpimexError::Network(e) if e.status().map(|s| s.as_u16()) == Some(503)),
        "{err}"
    );
}

#[test]
fn missing_report_file_is_network_error() {
    let origin = common::serve(vec![]);

    let err = source()
        .fetch_report(&format!("{origin}{}", report_path("12.09.2025")))
        .unwrap_err();
    assert!(
        matches!(&err, SpimexError::Network(e) if e.status().map(|s| s.as_u16()) == Some(404)),
        "{err}"
    );
}

#[test]
fn slow_server_times_out_as_network_error() {
    let origin = common::serve_nothing();
    let source = HttpSource::new(Duration::from_millis(300)).unwrap();

    let err = source
        .fetch_listing(&format!("{origin}{LISTING_PATH}"))
        .unwrap_err();
    assert!(matches!(&err, SpimexError::Network(e) if e.is_timeout()), "{err}");
}

#[test]
fn refused_connection_is_network_error() {
    let origin = common::closed_origin();

    let err = source()
        .fetch_report(&format!("{origin}{}", report_path("12.09.2025")))
        .unwrap_err();
    assert!(matches!(err, SpimexError::Network(_)), "{err}");
}

#[test]
fn network_failure_while_ingesting_names_the_day() {
    let origin = common::closed_origin();
    let sdk = SpimexSdk::builder()
        .in_memory()
        .layout(local_layout(&origin))
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let err = sdk.ingest_and_store(&["12.09.2025"]).unwrap_err();
    assert!(matches!(&err, SpimexError::Ingest { date, .. } if date == "12.09.2025"), "{err}");
    assert!(matches!(err.root(), SpimexError::Network(_)), "{err}");
    assert_eq!(sdk.connection().count_results().unwrap(), 0);
}
