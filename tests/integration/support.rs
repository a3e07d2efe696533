//! Scripted collaborators for driving the engine without a browser

use registry_harvester::crawler::{
    ItemRef, LinkSlot, ListingPage, ListingRow, Navigator, PageReader, PageSnapshot, PageTarget,
    PageWindow,
};
use registry_harvester::query::{Query, QueryKey};
use registry_harvester::record::{CompanyDetail, CompanyRecord, FieldMap, ItemDetail, ItemRecord, Table};
use registry_harvester::storage::{ItemKey, RecordStore, StorageError, StorageResult};
use registry_harvester::{StepError, StepResult};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Item ids per listing page
pub type Pages = Vec<Vec<&'static str>>;

/// What the navigator was asked to do
#[derive(Debug, Default)]
pub struct CallLog {
    pub open_entry: u32,
    pub submit_query: u32,
    pub open_item: HashMap<String, u32>,
    pub open_company: u32,
    pub returns: u32,
    pub go_to_page: Vec<PageTarget>,
}

impl CallLog {
    pub fn opens_of(&self, item_id: &str) -> u32 {
        self.open_item.get(item_id).copied().unwrap_or(0)
    }

    pub fn total_opens(&self) -> u32 {
        self.open_item.values().sum()
    }
}

/// Navigator over an imaginary registry; snapshots describe where it is
#[derive(Debug, Default)]
pub struct ScriptedNavigator {
    page: u32,
    view: String,
    /// Remaining `open_item` failures per item id
    failures: HashMap<String, u32>,
    broken_listing: bool,
    pub calls: CallLog,
}

impl ScriptedNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes opening `item_id` fail `times` times
    pub fn failing(mut self, item_id: &str, times: u32) -> Self {
        self.failures.insert(item_id.to_string(), times);
        self
    }

    /// Makes every listing snapshot unreadable
    pub fn with_broken_listing(mut self) -> Self {
        self.broken_listing = true;
        self
    }
}

impl Navigator for ScriptedNavigator {
    async fn open_entry(&mut self) -> StepResult<()> {
        self.calls.open_entry += 1;
        self.page = 1;
        self.view = "search".to_string();
        Ok(())
    }

    async fn submit_query(&mut self, _query: &Query) -> StepResult<()> {
        self.calls.submit_query += 1;
        self.view = "listing".to_string();
        Ok(())
    }

    async fn expand_page_size(&mut self) -> StepResult<()> {
        Ok(())
    }

    async fn open_item(&mut self, item: &ItemRef) -> StepResult<()> {
        *self.calls.open_item.entry(item.item_id.clone()).or_default() += 1;
        if let Some(left) = self.failures.get_mut(&item.item_id) {
            if *left > 0 {
                *left -= 1;
                return Err(StepError::navigation(format!(
                    "element {} not interactable",
                    item.handle
                )));
            }
        }
        self.view = format!("item:{}", item.item_id);
        Ok(())
    }

    async fn open_company(&mut self) -> StepResult<()> {
        self.calls.open_company += 1;
        let Some(id) = self.view.strip_prefix("item:") else {
            return Err(StepError::navigation("no company link on this page"));
        };
        self.view = format!("company:{}", id);
        Ok(())
    }

    async fn return_to_listing(&mut self) -> StepResult<()> {
        self.calls.returns += 1;
        self.view = "listing".to_string();
        Ok(())
    }

    async fn go_to_page(&mut self, target: PageTarget) -> StepResult<()> {
        self.calls.go_to_page.push(target);
        self.page += 1;
        Ok(())
    }

    async fn snapshot(&mut self) -> StepResult<PageSnapshot> {
        let html = if self.broken_listing && self.view == "listing" {
            "<html>maintenance</html>".to_string()
        } else {
            self.view.clone()
        };
        Ok(PageSnapshot::new(format!("page:{}", self.page), html))
    }
}

/// Reader serving `pages` and deterministic detail data
pub struct ScriptedReader {
    pages: Pages,
}

impl ScriptedReader {
    pub fn new(pages: Pages) -> Self {
        Self { pages }
    }

    fn page_number(snapshot: &PageSnapshot) -> StepResult<usize> {
        snapshot
            .url
            .strip_prefix("page:")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| StepError::shape("not a listing url"))
    }

    fn total(&self) -> u32 {
        self.pages.iter().map(|p| p.len() as u32).sum()
    }
}

impl PageReader for ScriptedReader {
    fn read_listing(&self, page: &PageSnapshot) -> StepResult<ListingPage> {
        if page.html != "listing" {
            return Err(StepError::shape("listing table not found"));
        }
        let number = Self::page_number(page)?;
        let ids = self
            .pages
            .get(number - 1)
            .ok_or_else(|| StepError::shape("page out of range"))?;

        let rows = ids
            .iter()
            .map(|id| {
                let mut fields = FieldMap::new();
                fields.insert("품목보고번호".to_string(), id.to_string());
                ListingRow {
                    item: ItemRef {
                        handle: format!("prd_{}", id),
                        item_id: id.to_string(),
                    },
                    fields,
                }
            })
            .collect();
        Ok(ListingPage {
            rows,
            reported_total: Some(self.total()),
        })
    }

    fn read_item(&self, page: &PageSnapshot) -> StepResult<ItemDetail> {
        let id = page
            .html
            .strip_prefix("item:")
            .ok_or_else(|| StepError::shape("expected 2 item info tables, found 0"))?;

        let mut fields = FieldMap::new();
        fields.insert("품목보고번호".to_string(), id.to_string());
        fields.insert("제품명".to_string(), format!("product {}", id));

        let mut authorizations = Table::new(vec!["인허가일자".to_string()]);
        authorizations.rows.push(vec!["2020-01-01".to_string()]);
        let ingredients = id.ends_with(['2', '4', '6', '8', '0']).then(|| {
            let mut table = Table::new(vec!["원재료".to_string()]);
            table.rows.push(vec!["소맥분".to_string()]);
            table
        });

        Ok(ItemDetail {
            item_id: id.to_string(),
            fields,
            authorizations,
            collections: Table::new(vec!["수거일자".to_string()]),
            ingredients,
        })
    }

    fn read_company(&self, page: &PageSnapshot) -> StepResult<CompanyDetail> {
        let id = page
            .html
            .strip_prefix("company:")
            .ok_or_else(|| StepError::shape("expected 1 company info table, found 0"))?;

        let mut fields = FieldMap::new();
        fields.insert("인허가번호".to_string(), format!("C{}", id));
        Ok(CompanyDetail {
            registration_id: format!("C{}", id),
            fields,
            haccp: None,
            authorizations: Table::new(vec!["인허가일자".to_string()]),
            enforcements: Table::new(vec!["처분일자".to_string()]),
            products: Table::new(vec!["제품명".to_string()]),
        })
    }

    fn read_page_window(&self, page: &PageSnapshot) -> StepResult<PageWindow> {
        let number = Self::page_number(page)?;
        let current_slot = if number <= 5 { number + 2 } else { 6 };
        let last = number == self.pages.len();
        let slots = (1..=7)
            .map(|slot| {
                if last && slot == current_slot {
                    LinkSlot::Label
                } else {
                    LinkSlot::Link
                }
            })
            .collect();
        Ok(PageWindow::new(slots))
    }
}

/// Store wrapper counting successful writes per item
pub struct CountingStore<S> {
    inner: S,
    /// Remaining `put_item` calls to fail before writing
    failing_puts: u32,
    pub item_puts: HashMap<String, u32>,
    pub company_puts: u32,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing_puts: 0,
            item_puts: HashMap::new(),
            company_puts: 0,
        }
    }

    /// Makes the next `times` item writes fail without touching disk
    pub fn with_failing_puts(mut self, times: u32) -> Self {
        self.failing_puts = times;
        self
    }
}

impl<S: RecordStore> RecordStore for CountingStore<S> {
    fn exists(&self, key: &ItemKey) -> bool {
        self.inner.exists(key)
    }

    fn put_company(&mut self, record: &CompanyRecord) -> StorageResult<()> {
        self.company_puts += 1;
        self.inner.put_company(record)
    }

    fn put_item(&mut self, record: &ItemRecord) -> StorageResult<()> {
        if self.failing_puts > 0 {
            self.failing_puts -= 1;
            return Err(StorageError::Io(std::io::Error::other("no space left on device")));
        }
        *self.item_puts.entry(record.item_id.clone()).or_default() += 1;
        self.inner.put_item(record)
    }

    fn load_item(&self, key: &ItemKey) -> StorageResult<ItemRecord> {
        self.inner.load_item(key)
    }

    fn finalize_query(
        &mut self,
        query_key: &QueryKey,
        records: &[ItemRecord],
    ) -> StorageResult<PathBuf> {
        self.inner.finalize_query(query_key, records)
    }
}

/// Contents of every per-record file under `root`
pub fn record_files(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut dirs = vec![root.to_path_buf()];
    while let Some(dir) = dirs.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                dirs.push(path);
            } else if path.extension().is_some_and(|ext| ext == "json") {
                files.insert(path.clone(), std::fs::read(&path).unwrap());
            }
        }
    }
    files
}
