//! Timing for multi-page fetch loops
//!
//! Paged tables are read by clicking NEXT until the last page. The loop owner
//! reports each page and each page transition to a [`PageNavigationObserver`];
//! [`PageTimings`] classifies every transition against the same bands.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::sla::{Classification, SlaBands, SlaLevel};
use crate::soft::SoftAssertions;
use crate::timer::elapsed_millis_since;

/// Callbacks from a paging loop
pub trait PageNavigationObserver {
    /// Called after a page's rows were read
    fn on_page(&mut self, _page: u32) {}

    /// Called after NEXT was clicked and the new page finished loading
    fn on_timing(&mut self, _from_page: u32, _to_page: u32, _elapsed_ms: u64) {}
}

/// Run `transition` and report how long it took
pub fn time_transition<O, T, F>(observer: &mut O, from_page: u32, to_page: u32, transition: F) -> T
where
    O: PageNavigationObserver + ?Sized,
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let out = transition();
    observer.on_timing(from_page, to_page, elapsed_millis_since(start));
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTiming {
    pub from_page: u32,
    pub to_page: u32,
    pub classification: Classification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationSummary {
    pub label: String,
    pub pages: usize,
    pub transitions: usize,
    pub total_ms: u64,
    pub slowest: Option<PageTiming>,
    pub worst: SlaLevel,
}

/// Collects and classifies page transitions
#[derive(Debug, Clone)]
pub struct PageTimings {
    label: String,
    bands: SlaBands,
    pages: Vec<u32>,
    timings: Vec<PageTiming>,
}

impl PageTimings {
    pub fn new(label: impl Into<String>, bands: SlaBands) -> Self {
        Self {
            label: label.into(),
            bands,
            pages: Vec::new(),
            timings: Vec::new(),
        }
    }

    pub fn pages(&self) -> &[u32] {
        &self.pages
    }

    pub fn timings(&self) -> &[PageTiming] {
        &self.timings
    }

    pub fn total_ms(&self) -> u64 {
        self.timings
            .iter()
            .map(|t| t.classification.elapsed_ms)
            .fold(0u64, u64::saturating_add)
    }

    pub fn slowest(&self) -> Option<&PageTiming> {
        self.timings
            .iter()
            .max_by_key(|t| t.classification.elapsed_ms)
    }

    pub fn worst_level(&self) -> SlaLevel {
        self.timings
            .iter()
            .map(|t| t.classification.level)
            .max()
            .unwrap_or(SlaLevel::Ok)
    }

    /// Push every FAIL transition into `soft`
    pub fn record_into(&self, soft: &mut SoftAssertions) {
        for timing in &self.timings {
            soft.record(&timing.classification);
        }
    }

    pub fn summary(&self) -> PaginationSummary {
        PaginationSummary {
            label: self.label.clone(),
            pages: self.pages.len(),
            transitions: self.timings.len(),
            total_ms: self.total_ms(),
            slowest: self.slowest().cloned(),
            worst: self.worst_level(),
        }
    }
}

impl PageNavigationObserver for PageTimings {
    fn on_page(&mut self, page: u32) {
        self.pages.push(page);
    }

    fn on_timing(&mut self, from_page: u32, to_page: u32, elapsed_ms: u64) {
        let label = format!("{} page {} → {}", self.label, from_page, to_page);
        let classification = self.bands.classify(elapsed_ms, &label);
        self.timings.push(PageTiming {
            from_page,
            to_page,
            classification,
        });
    }
}
