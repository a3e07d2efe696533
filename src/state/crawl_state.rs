//! In-memory progress of one crawl
//!
//! Rebuilt from page 1 on every run; completed items are recognised through
//! the record store, never through this state.

use crate::state::EngineState;
use crate::HarvestError;

/// Transient crawl progress owned by the engine
#[derive(Debug, Clone)]
pub struct CrawlState {
    engine: EngineState,
    page: u32,
    total_items: Option<u32>,
    page_processed: bool,
}

impl CrawlState {
    pub fn new() -> Self {
        Self {
            engine: EngineState::Init,
            page: 1,
            total_items: None,
            page_processed: false,
        }
    }

    pub fn engine(&self) -> EngineState {
        self.engine
    }

    /// Moves the engine to `next`
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::InvalidTransition` when `next` is not reachable
    /// from the current state.
    pub fn transition(&mut self, next: EngineState) -> Result<(), HarvestError> {
        if !self.engine.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.engine,
                to: next,
            });
        }
        tracing::debug!("Engine state {} -> {}", self.engine, next);
        self.engine = next;
        Ok(())
    }

    /// Current listing page, starting at 1
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Total result count, known once the first page has been read
    pub fn total_items(&self) -> Option<u32> {
        self.total_items
    }

    /// Records the reported total; only the first report is kept
    pub fn record_total(&mut self, total: u32) {
        if self.total_items.is_none() {
            self.total_items = Some(total);
        }
    }

    pub fn is_page_processed(&self) -> bool {
        self.page_processed
    }

    pub fn mark_page_processed(&mut self) {
        self.page_processed = true;
    }

    /// Moves to the next listing page, clearing the processed flag
    pub fn advance_page(&mut self) {
        self.page += 1;
        self.page_processed = false;
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}
