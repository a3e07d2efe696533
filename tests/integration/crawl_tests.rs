//! Integration tests for the crawl engine
//!
//! These tests drive the full state machine with scripted collaborators and a
//! real file-tree store in a temporary directory.

use crate::support::{record_files, CountingStore, Pages, ScriptedNavigator, ScriptedReader};
use registry_harvester::config::Config;
use registry_harvester::crawler::{CrawlEngine, PageTarget};
use registry_harvester::storage::{ConsolidatedArtifact, FsRecordStore, RecordKind};
use registry_harvester::{HarvestError, Query};
use std::path::Path;

fn two_pages() -> Pages {
    vec![vec!["1", "2", "3"], vec!["4", "5", "6"]]
}

fn query() -> Query {
    Query::new("과자").unwrap()
}

fn engine(
    root: &Path,
    navigator: ScriptedNavigator,
    pages: Pages,
    config: &Config,
) -> CrawlEngine<ScriptedNavigator, ScriptedReader, CountingStore<FsRecordStore>> {
    let store = FsRecordStore::open(root).unwrap();
    CrawlEngine::new(
        navigator,
        ScriptedReader::new(pages),
        CountingStore::new(store),
        config,
    )
}

#[tokio::test(start_paused = true)]
async fn test_two_pages_with_flaky_item() {
    let tmp = tempfile::tempdir().unwrap();
    let navigator = ScriptedNavigator::new().failing("4", 2);
    let mut engine = engine(tmp.path(), navigator, two_pages(), &Config::default());

    let report = engine.run(&query()).await.unwrap();

    assert_eq!(report.records.len(), 6);
    assert_eq!(report.stats.items_captured, 6);
    assert_eq!(report.stats.item_retries, 2);
    assert_eq!(report.stats.pages_visited, 2);

    let calls = &engine.navigator().calls;
    assert_eq!(calls.opens_of("4"), 3);
    for id in ["1", "2", "3", "5", "6"] {
        assert_eq!(calls.opens_of(id), 1, "item {}", id);
    }
    assert_eq!(calls.go_to_page, vec![PageTarget::Numbered { slot: 3 }]);
    assert_eq!(calls.open_entry, 1);
    assert_eq!(calls.submit_query, 1);

    let store = FsRecordStore::open(tmp.path()).unwrap();
    for id in ["1", "2", "3", "4", "5", "6"] {
        let path = store
            .layout()
            .record_path(RecordKind::Item, &format!("gwaja_{}", id));
        assert!(path.exists(), "missing {}", path.display());
        let company = store
            .layout()
            .record_path(RecordKind::Company, &format!("gwaja_{}_C{}", id, id));
        assert!(company.exists(), "missing {}", company.display());
    }
    // Only even items list ingredients
    assert!(store
        .layout()
        .record_path(RecordKind::Ingredient, "gwaja_2")
        .exists());
    assert!(!store
        .layout()
        .record_path(RecordKind::Ingredient, "gwaja_3")
        .exists());

    assert_eq!(report.artifact, tmp.path().join("gwaja.sqlite"));
    let artifact = ConsolidatedArtifact::open(&report.artifact).unwrap();
    let items = artifact.load_items().unwrap();
    assert_eq!(items.len(), 6);
    assert_eq!(items[3].item_id, "4");
    assert_eq!(items[3].company_id, "C4");
    assert_eq!(artifact.run().unwrap().unwrap().item_count, 6);
}

#[tokio::test(start_paused = true)]
async fn test_rerun_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let mut first = engine(
        tmp.path(),
        ScriptedNavigator::new(),
        two_pages(),
        &Config::default(),
    );
    first.run(&query()).await.unwrap();
    let before = record_files(tmp.path());
    assert!(!before.is_empty());

    let mut second = engine(
        tmp.path(),
        ScriptedNavigator::new(),
        two_pages(),
        &Config::default(),
    );
    let report = second.run(&query()).await.unwrap();

    assert_eq!(second.navigator().calls.total_opens(), 0);
    assert_eq!(second.navigator().calls.open_company, 0);
    assert!(second.store().item_puts.is_empty());
    assert_eq!(report.stats.items_skipped, 6);
    assert_eq!(report.records.len(), 6);
    assert_eq!(record_files(tmp.path()), before);

    let artifact = ConsolidatedArtifact::open(&report.artifact).unwrap();
    assert_eq!(artifact.load_items().unwrap().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_resume_after_fatal_item() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.retry.item_attempts = 3;
    config.retry.item_short_delay_threshold = 2;

    let navigator = ScriptedNavigator::new().failing("5", u32::MAX);
    let mut first = engine(tmp.path(), navigator, two_pages(), &config);
    let err = first.run(&query()).await.unwrap_err();

    assert!(err.to_string().contains("item 5"), "{}", err);
    assert_eq!(first.navigator().calls.opens_of("5"), 3);
    assert_eq!(first.navigator().calls.opens_of("6"), 0);
    assert!(!tmp.path().join("gwaja.sqlite").exists());

    let mut second = engine(tmp.path(), ScriptedNavigator::new(), two_pages(), &config);
    let report = second.run(&query()).await.unwrap();

    let calls = &second.navigator().calls;
    for id in ["1", "2", "3", "4"] {
        assert_eq!(calls.opens_of(id), 0, "item {}", id);
    }
    assert_eq!(calls.opens_of("5"), 1);
    assert_eq!(calls.opens_of("6"), 1);
    assert_eq!(report.stats.items_skipped, 4);
    assert_eq!(report.stats.items_captured, 2);
    assert_eq!(report.records.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_items_put_at_most_once() {
    let tmp = tempfile::tempdir().unwrap();
    // Item 2 shows up on both pages
    let pages = vec![vec!["1", "2"], vec!["2", "3"]];
    let navigator = ScriptedNavigator::new().failing("1", 3).failing("3", 1);
    let mut engine = engine(tmp.path(), navigator, pages, &Config::default());

    let report = engine.run(&query()).await.unwrap();

    let puts = &engine.store().item_puts;
    assert_eq!(puts.len(), 3);
    assert!(puts.values().all(|&count| count == 1), "{:?}", puts);
    assert_eq!(engine.store().company_puts, 3);
    assert_eq!(engine.navigator().calls.opens_of("2"), 1);
    assert_eq!(report.stats.items_skipped, 0);
    assert_eq!(report.stats.item_retries, 4);

    let ids: Vec<_> = report.records.iter().map(|r| r.item_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(report.stats.items_total(), 3);
    let artifact = ConsolidatedArtifact::open(&report.artifact).unwrap();
    assert_eq!(artifact.load_items().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_listing_exhaustion_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.retry.listing_attempts = 4;
    let navigator = ScriptedNavigator::new().with_broken_listing();
    let mut engine = engine(tmp.path(), navigator, two_pages(), &config);

    let err = engine.run(&query()).await.unwrap_err();

    match err {
        HarvestError::Exhausted(exhausted) => {
            assert_eq!(exhausted.step, "listing page 1");
            assert_eq!(exhausted.attempts, 4);
            assert_eq!(exhausted.last_error.category(), "extraction-shape");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(engine.navigator().calls.total_opens(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_every_item_followed_by_return() {
    let tmp = tempfile::tempdir().unwrap();
    let navigator = ScriptedNavigator::new().failing("2", 1);
    let mut engine = engine(
        tmp.path(),
        navigator,
        vec![vec!["1", "2", "3"]],
        &Config::default(),
    );

    engine.run(&query()).await.unwrap();

    // One trailing return per item plus one recovery for the retry
    assert_eq!(engine.navigator().calls.returns, 3 + 1);
}

#[tokio::test(start_paused = true)]
async fn test_listing_columns_kept_on_record() {
    let tmp = tempfile::tempdir().unwrap();
    let mut engine = engine(
        tmp.path(),
        ScriptedNavigator::new(),
        vec![vec!["1"]],
        &Config::default(),
    );

    let report = engine.run(&query()).await.unwrap();

    let record = &report.records[0];
    assert_eq!(
        record.listing.get("품목보고번호").map(String::as_str),
        Some("1")
    );
    let artifact = ConsolidatedArtifact::open(&report.artifact).unwrap();
    assert_eq!(artifact.load_items().unwrap()[0].listing, record.listing);
}

fn engine_with_failing_puts(
    root: &Path,
    pages: Pages,
    failing_puts: u32,
    config: &Config,
) -> CrawlEngine<ScriptedNavigator, ScriptedReader, CountingStore<FsRecordStore>> {
    let store = FsRecordStore::open(root).unwrap();
    CrawlEngine::new(
        ScriptedNavigator::new(),
        ScriptedReader::new(pages),
        CountingStore::new(store).with_failing_puts(failing_puts),
        config,
    )
}

#[tokio::test(start_paused = true)]
async fn test_failed_write_retries_item() {
    let tmp = tempfile::tempdir().unwrap();
    let mut engine =
        engine_with_failing_puts(tmp.path(), vec![vec!["1", "2"]], 2, &Config::default());

    let report = engine.run(&query()).await.unwrap();

    assert_eq!(report.stats.items_captured, 2);
    assert_eq!(report.stats.item_retries, 2);
    assert_eq!(engine.navigator().calls.opens_of("1"), 3);
    assert_eq!(engine.navigator().calls.opens_of("2"), 1);
    assert_eq!(engine.store().item_puts.get("1"), Some(&1));
    // The company is written again on every attempt
    assert_eq!(engine.store().company_puts, 3 + 1);
}

#[tokio::test(start_paused = true)]
async fn test_write_exhaustion_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.retry.item_attempts = 3;
    config.retry.item_short_delay_threshold = 2;
    let mut engine = engine_with_failing_puts(tmp.path(), two_pages(), u32::MAX, &config);

    let err = engine.run(&query()).await.unwrap_err();

    match err {
        HarvestError::Exhausted(exhausted) => {
            assert_eq!(exhausted.step, "item 1");
            assert_eq!(exhausted.attempts, 3);
            assert_eq!(exhausted.last_error.category(), "persistence");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(engine.navigator().calls.opens_of("1"), 3);
    assert_eq!(engine.navigator().calls.opens_of("2"), 0);

    let store = FsRecordStore::open(tmp.path()).unwrap();
    assert!(!store
        .layout()
        .record_path(RecordKind::Item, "gwaja_1")
        .exists());
    assert!(!tmp.path().join("gwaja.sqlite").exists());
}
