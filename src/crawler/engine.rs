//! Crawl engine - the state machine driving one query
//!
//! The engine walks the listing page by page and captures every item that is
//! not on disk yet. It is generic over its collaborators so the whole loop
//! runs against scripted fakes in tests.

use crate::config::Config;
use crate::crawler::pagination::{is_last_page, next_page_target};
use crate::crawler::retry::{no_recovery, RetryPolicy};
use crate::crawler::traits::{
    ListingPage, ListingRow, Navigator, PageReader, PageTarget, PageWindow,
};
use crate::output::CrawlStats;
use crate::query::{Query, QueryKey};
use crate::record::{CompanyRecord, ItemRecord};
use crate::state::{CrawlState, EngineState};
use crate::storage::{ItemKey, RecordStore};
use crate::{HarvestError, StepError, StepResult};
use chrono::Utc;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;

/// Result of a completed query
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub query_key: QueryKey,
    /// Consolidated artifact written by the store
    pub artifact: PathBuf,
    /// Every item record of the query, captured or loaded back
    pub records: Vec<ItemRecord>,
    pub stats: CrawlStats,
}

/// Retry policies, one per kind of step
#[derive(Debug, Clone, Copy)]
struct Policies {
    submit: RetryPolicy,
    expand: RetryPolicy,
    listing: RetryPolicy,
    item: RetryPolicy,
    pagination: RetryPolicy,
}

impl Policies {
    fn from_config(config: &Config) -> Self {
        let retry = &config.retry;
        let timing = &config.timing;
        Self {
            submit: RetryPolicy::fixed(1, timing.fail_delay()),
            expand: RetryPolicy::fixed(retry.expand_attempts, timing.fail_delay()),
            listing: RetryPolicy::fixed(retry.listing_attempts, timing.fail_delay()),
            item: RetryPolicy::new(
                retry.item_attempts,
                timing.fail_delay(),
                timing.long_fail_delay(),
                retry.item_short_delay_threshold,
            ),
            pagination: RetryPolicy::fixed(retry.pagination_attempts, timing.fail_delay()),
        }
    }
}

/// Main crawl engine structure
pub struct CrawlEngine<N, R, S> {
    navigator: N,
    reader: R,
    store: S,
    short_settle: Duration,
    long_settle: Duration,
    policies: Policies,
    state: CrawlState,
    stats: CrawlStats,
}

impl<N, R, S> CrawlEngine<N, R, S>
where
    N: Navigator,
    R: PageReader,
    S: RecordStore,
{
    /// Creates a new engine instance
    ///
    /// # Arguments
    ///
    /// * `navigator` - Drives the browser session
    /// * `reader` - Extracts data from page snapshots
    /// * `store` - Persists records and answers the resume check
    /// * `config` - Retry budgets and settle delays
    pub fn new(navigator: N, reader: R, store: S, config: &Config) -> Self {
        Self {
            navigator,
            reader,
            store,
            short_settle: config.timing.short_settle(),
            long_settle: config.timing.long_settle(),
            policies: Policies::from_config(config),
            state: CrawlState::new(),
            stats: CrawlStats::default(),
        }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Gives the collaborators back
    pub fn into_parts(self) -> (N, R, S) {
        (self.navigator, self.reader, self.store)
    }

    /// Crawls every listing page of `query`
    ///
    /// Items already on disk are skipped without any navigation. When the last
    /// page is done, every item record of the query is consolidated.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::Exhausted` naming the item or page whose retry
    /// budget ran out, or `HarvestError::Storage` if consolidation fails.
    pub async fn run(&mut self, query: &Query) -> Result<CrawlReport, HarvestError> {
        self.state = CrawlState::new();
        self.stats = CrawlStats::started(Utc::now());
        tracing::info!("Starting crawl for '{}' (key {})", query, query.key());

        self.submit_query(query).await?;
        self.expand_page_size().await?;

        let mut records = Vec::new();
        let mut seen = HashSet::new();
        loop {
            let listing = self.load_listing().await?;

            self.state.transition(EngineState::ItemLoop)?;
            for row in &listing.rows {
                // The registry can list an item again on a later page
                if !seen.insert(row.item.item_id.clone()) {
                    tracing::debug!("Item {} already handled in this run", row.item.item_id);
                    continue;
                }
                if let Some(record) = self.process_item(query.key(), row).await? {
                    records.push(record);
                }
            }
            self.state.mark_page_processed();
            tracing::info!(
                "Page {} done ({} items)",
                self.state.page(),
                listing.rows.len()
            );

            self.state.transition(EngineState::Paginating)?;
            if listing.is_empty() || self.reached_last_page().await? {
                self.state.transition(EngineState::Done)?;
                break;
            }
            self.next_page().await?;
        }

        let artifact = self.store.finalize_query(query.key(), &records)?;
        self.stats.finish(Utc::now());
        tracing::info!(
            "Crawl for '{}' complete: {} items ({} captured, {} skipped)",
            query,
            records.len(),
            self.stats.items_captured,
            self.stats.items_skipped
        );

        Ok(CrawlReport {
            query_key: query.key().clone(),
            artifact,
            records,
            stats: self.stats.clone(),
        })
    }

    /// Init -> QuerySubmitted
    async fn submit_query(&mut self, query: &Query) -> Result<(), HarvestError> {
        let policy = self.policies.submit;
        let query = query.clone();
        policy
            .execute(
                "query submission",
                self,
                move |engine| {
                    let query = query.clone();
                    Box::pin(async move { engine.open_and_search(&query).await })
                },
                no_recovery,
            )
            .await
            .inspect_err(|err| tracing::error!("{}", err))?;
        self.state.transition(EngineState::QuerySubmitted)
    }

    async fn open_and_search(&mut self, query: &Query) -> StepResult<()> {
        self.navigator.open_entry().await?;
        sleep(self.short_settle).await;
        self.navigator.submit_query(query).await?;
        sleep(self.long_settle).await;
        Ok(())
    }

    /// QuerySubmitted -> PageSizeExpanded, tolerating failure
    async fn expand_page_size(&mut self) -> Result<(), HarvestError> {
        let policy = self.policies.expand;
        let expanded = policy
            .execute(
                "page size expansion",
                self,
                |engine| Box::pin(engine.request_page_size()),
                no_recovery,
            )
            .await;

        if let Err(err) = expanded {
            tracing::warn!("{}; continuing with the default page size", err);
            self.stats.expansion_failed = true;
        }
        self.state.transition(EngineState::PageSizeExpanded)
    }

    async fn request_page_size(&mut self) -> StepResult<()> {
        self.navigator.expand_page_size().await?;
        sleep(self.long_settle).await;
        Ok(())
    }

    /// -> PageLoaded
    async fn load_listing(&mut self) -> Result<ListingPage, HarvestError> {
        self.state.transition(EngineState::PageLoaded)?;

        let policy = self.policies.listing;
        let step = format!("listing page {}", self.state.page());
        let listing = policy
            .execute(
                &step,
                self,
                |engine| Box::pin(engine.read_listing()),
                no_recovery,
            )
            .await
            .inspect_err(|err| tracing::error!("{}", err))?;

        if let Some(total) = listing.reported_total {
            self.state.record_total(total);
        }
        self.stats.pages_visited += 1;
        tracing::info!(
            "Listing page {}: {} items (total {})",
            self.state.page(),
            listing.rows.len(),
            self.state
                .total_items()
                .map_or_else(|| "unknown".to_string(), |t| t.to_string())
        );
        Ok(listing)
    }

    async fn read_listing(&mut self) -> StepResult<ListingPage> {
        let page = self.navigator.snapshot().await?;
        self.reader.read_listing(&page)
    }

    /// Captures one listing row unless it is already on disk
    ///
    /// # Returns
    ///
    /// The item's record, or `None` for an item on disk that could not be
    /// read back.
    async fn process_item(
        &mut self,
        query_key: &QueryKey,
        row: &ListingRow,
    ) -> Result<Option<ItemRecord>, HarvestError> {
        let key = ItemKey::new(query_key, &row.item.item_id);

        let record = if self.store.exists(&key) {
            tracing::debug!("Item {} already captured, skipping", key);
            self.stats.items_skipped += 1;
            match self.store.load_item(&key) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!("Item {} on disk but unreadable: {}", key, err);
                    None
                }
            }
        } else {
            let policy = self.policies.item;
            let step = format!("item {}", row.item.item_id);
            let query_key = query_key.clone();
            let row = row.clone();
            let record = policy
                .execute(
                    &step,
                    self,
                    move |engine| {
                        let query_key = query_key.clone();
                        let row = row.clone();
                        Box::pin(async move { engine.capture_item(&query_key, &row).await })
                    },
                    |engine| {
                        Box::pin(async move {
                            engine.stats.item_retries += 1;
                            engine.leave_detail_view().await;
                        })
                    },
                )
                .await
                .inspect_err(|err| tracing::error!("{}", err))?;
            self.stats.items_captured += 1;
            tracing::debug!("Item {} captured", key);
            Some(record)
        };

        self.leave_detail_view().await;
        Ok(record)
    }

    /// One attempt at capturing an item and its company
    async fn capture_item(&mut self, query_key: &QueryKey, row: &ListingRow) -> StepResult<ItemRecord> {
        let item = &row.item;
        self.navigator.open_item(item).await?;
        sleep(self.short_settle).await;
        let page = self.navigator.snapshot().await?;
        let detail = self.reader.read_item(&page)?;
        if detail.item_id != item.item_id {
            return Err(StepError::shape(format!(
                "opened item {} but the detail page shows {}",
                item.item_id, detail.item_id
            )));
        }

        self.navigator.open_company().await?;
        sleep(self.short_settle).await;
        let page = self.navigator.snapshot().await?;
        let company = self.reader.read_company(&page)?;

        let captured_at = Utc::now();
        let company = CompanyRecord::capture(query_key, &detail.item_id, company, captured_at);
        let record = ItemRecord::capture(query_key, detail, &company.registration_id, captured_at)
            .with_listing(row.fields.clone());

        // The item file marks completion, so it goes last
        self.store.put_company(&company)?;
        self.store.put_item(&record)?;
        Ok(record)
    }

    /// Best-effort return to the listing
    async fn leave_detail_view(&mut self) {
        if let Err(err) = self.navigator.return_to_listing().await {
            tracing::debug!("Return to listing failed: {}", err);
        }
    }

    async fn reached_last_page(&mut self) -> Result<bool, HarvestError> {
        let policy = self.policies.pagination;
        let step = format!("page-link window of page {}", self.state.page());
        let window = policy
            .execute(
                &step,
                self,
                |engine| Box::pin(engine.read_page_window()),
                no_recovery,
            )
            .await
            .inspect_err(|err| tracing::error!("{}", err))?;
        Ok(is_last_page(&window, self.state.page()))
    }

    async fn read_page_window(&mut self) -> StepResult<PageWindow> {
        let page = self.navigator.snapshot().await?;
        self.reader.read_page_window(&page)
    }

    /// Paginating -> (next page)
    async fn next_page(&mut self) -> Result<(), HarvestError> {
        let target = next_page_target(self.state.total_items(), self.state.page());
        let policy = self.policies.pagination;
        let step = format!("pagination to page {}", self.state.page() + 1);
        policy
            .execute(
                &step,
                self,
                move |engine| Box::pin(engine.follow_page_link(target)),
                no_recovery,
            )
            .await
            .inspect_err(|err| tracing::error!("{}", err))?;

        self.state.advance_page();
        tracing::info!("Moved to page {}", self.state.page());
        Ok(())
    }

    async fn follow_page_link(&mut self, target: PageTarget) -> StepResult<()> {
        self.navigator.go_to_page(target).await?;
        sleep(self.long_settle).await;
        Ok(())
    }
}
