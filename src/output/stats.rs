//! Run statistics
//!
//! Counters the engine keeps while it works, printed once a query finishes.

use chrono::{DateTime, Utc};

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Listing pages read
    pub pages_visited: u32,

    /// Items captured during this run
    pub items_captured: u32,

    /// Items already on disk from an earlier run
    pub items_skipped: u32,

    /// Retries spent on items, summed over all items
    pub item_retries: u32,

    /// Whether the listing stayed at its default page size
    pub expansion_failed: bool,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlStats {
    /// Starts the clock
    pub fn started(now: DateTime<Utc>) -> Self {
        Self {
            started_at: Some(now),
            ..Self::default()
        }
    }

    pub fn finish(&mut self, now: DateTime<Utc>) {
        self.finished_at = Some(now);
    }

    /// Items in the consolidated artifact
    pub fn items_total(&self) -> u32 {
        self.items_captured + self.items_skipped
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => Some((finished - started).num_seconds()),
            _ => None,
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Listing pages visited: {}", stats.pages_visited);
    println!("  Items captured: {}", stats.items_captured);
    println!("  Items skipped (already on disk): {}", stats.items_skipped);
    println!("  Items total: {}", stats.items_total());
    println!();

    println!("Retries:");
    println!("  Item retries: {}", stats.item_retries);
    if stats.expansion_failed {
        println!("  Page size expansion failed; default page size used");
    }
    println!();

    if let Some(seconds) = stats.duration_seconds() {
        let rate = if seconds > 0 {
            stats.items_captured as f64 / seconds as f64 * 60.0
        } else {
            0.0
        };
        println!(
            "Duration: {}m {}s ({:.1} items/min)",
            seconds / 60,
            seconds % 60,
            rate
        );
    }
}
