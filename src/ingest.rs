//! Concurrent ingestion of several trading days.
//!
//! Each requested day runs locate → fetch → filter → extract as one unit of
//! work on a scoped worker thread. At most `max_concurrency` units run at
//! once. Results come back in request order, not completion order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use tracing::{debug, info, warn};

use crate::config;
use crate::error::{Result, SpimexError};
use crate::models::{ReportRequest, TradingResult};
use crate::report::{extract_records, filter_data_region, ReportLayout, ReportLocator, ReportSource};

/// Result of ingesting one requested day.
#[derive(Debug)]
pub struct DateOutcome {
    pub request: ReportRequest,
    pub result: Result<Vec<TradingResult>>,
}

/// Runs the per-day report pipeline over a batch of requests.
pub struct Ingestor<'a> {
    source: &'a dyn ReportSource,
    layout: &'a ReportLayout,
    max_concurrency: usize,
}

impl<'a> Ingestor<'a> {
    pub fn new(source: &'a dyn ReportSource, layout: &'a ReportLayout) -> Self {
        Self {
            source,
            layout,
            max_concurrency: config::DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Bound the number of reports downloaded at the same time (minimum 1).
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    /// Run the full pipeline for a single day.
    pub fn process(&self, request: &ReportRequest) -> Result<Vec<TradingResult>> {
        let label = request.label();
        let url = ReportLocator::new(self.source, self.layout)
            .locate(label)?
            .ok_or_else(|| SpimexError::ReportNotFound {
                date: label.to_string(),
            })?;

        let table = self.source.fetch_report(&url)?;
        let region = filter_data_region(&table, self.layout).ok_or_else(|| {
            SpimexError::Layout(format!(
                "legend marker {:?} missing from report for {label}",
                self.layout.marker_text
            ))
        })?;

        let records = extract_records(&region, request.date(), self.layout)?;
        debug!(date = label, records = records.len(), "extracted report");
        Ok(records)
    }

    /// Ingest every request and report each day's outcome separately.
    pub fn ingest_each(&self, requests: &[ReportRequest]) -> Vec<DateOutcome> {
        if requests.is_empty() {
            return Vec::new();
        }

        let next = AtomicUsize::new(0);
        let slots: Vec<Mutex<Option<Result<Vec<TradingResult>>>>> =
            requests.iter().map(|_| Mutex::new(None)).collect();
        let workers = self.max_concurrency.min(requests.len());

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(request) = requests.get(i) else {
                        break;
                    };
                    let result = self.process(request);
                    if let Err(e) = &result {
                        warn!(date = request.label(), error = %e, "report ingestion failed");
                    }
                    match slots[i].lock() {
                        Ok(mut slot) => *slot = Some(result),
                        Err(poisoned) => *poisoned.into_inner() = Some(result),
                    }
                });
            }
        });

        requests
            .iter()
            .cloned()
            .zip(slots)
            .map(|(request, slot)| {
                let result = slot
                    .into_inner()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .unwrap_or_else(|| {
                        Err(SpimexError::NotFound(format!(
                            "no ingestion result recorded for {}",
                            request.label()
                        )))
                    });
                DateOutcome { request, result }
            })
            .collect()
    }

    /// Ingest every request, failing the whole batch if any day fails.
    ///
    /// The error names the first failed day in request order.
    pub fn ingest(&self, requests: &[ReportRequest]) -> Result<Vec<TradingResult>> {
        let mut records = Vec::new();
        for outcome in self.ingest_each(requests) {
            match outcome.result {
                Ok(batch) => records.extend(batch),
                Err(e) => {
                    return Err(SpimexError::Ingest {
                        date: outcome.request.label().to_string(),
                        source: Box::new(e),
                    })
                }
            }
        }
        info!(days = requests.len(), records = records.len(), "ingested reports");
        Ok(records)
    }
}
