//! Collaborator contracts of the crawl engine
//!
//! The engine never touches markup or the browser directly. A `Navigator`
//! moves the single browser session around; a `PageReader` turns a snapshot of
//! the rendered page into structured data. Supporting another site means
//! writing new implementations of these two traits.

use crate::query::Query;
use crate::record::{CompanyDetail, FieldMap, ItemDetail};
use crate::StepResult;

/// The rendered page at one moment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Handle on one item of a listing page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemRef {
    /// Opaque element handle of the item's link in the listing
    pub handle: String,
    /// Stable report number
    pub item_id: String,
}

/// One row of a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub item: ItemRef,
    /// Columns shown in the listing itself
    pub fields: FieldMap,
}

/// Items of the listing page currently rendered, in listing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub rows: Vec<ListingRow>,
    /// Total result count, when the page exposes it
    pub reported_total: Option<u32>,
}

impl ListingPage {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How one position of the page-link widget renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSlot {
    /// A clickable link
    Link,
    /// A static, non-clickable label
    Label,
}

/// The visible positions of the page-link widget, first position is 1
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageWindow {
    slots: Vec<LinkSlot>,
}

impl PageWindow {
    pub fn new(slots: Vec<LinkSlot>) -> Self {
        Self { slots }
    }

    /// Slot at a 1-based position
    pub fn slot(&self, position: usize) -> Option<LinkSlot> {
        position
            .checked_sub(1)
            .and_then(|index| self.slots.get(index))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Which control of the page-link widget leads to the next page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget {
    /// A numbered page link at the given 1-based position
    Numbered { slot: usize },
    /// The "next page" control at the given 1-based position
    NextControl { slot: usize },
}

impl PageTarget {
    pub fn slot(&self) -> usize {
        match self {
            Self::Numbered { slot } | Self::NextControl { slot } => *slot,
        }
    }
}

/// Drives the browser session
///
/// Implementations own the one live session; every method leaves it on the
/// page it navigated to. Failures are `StepError::Navigation`.
#[allow(async_fn_in_trait)]
pub trait Navigator {
    /// Opens the search page
    async fn open_entry(&mut self) -> StepResult<()>;

    /// Types the query and starts the search
    async fn submit_query(&mut self, query: &Query) -> StepResult<()>;

    /// Switches the listing to its largest page size
    async fn expand_page_size(&mut self) -> StepResult<()>;

    /// Opens an item's detail page from the listing
    async fn open_item(&mut self, item: &ItemRef) -> StepResult<()>;

    /// Opens the company page linked from the current item page
    async fn open_company(&mut self) -> StepResult<()>;

    /// Closes detail views and returns to the listing
    async fn return_to_listing(&mut self) -> StepResult<()>;

    /// Clicks a control of the page-link widget
    async fn go_to_page(&mut self, target: PageTarget) -> StepResult<()>;

    /// Captures the currently rendered page
    async fn snapshot(&mut self) -> StepResult<PageSnapshot>;
}

/// Extracts structured data from a rendered page
///
/// Failures are `StepError::ExtractionShape`.
pub trait PageReader {
    fn read_listing(&self, page: &PageSnapshot) -> StepResult<ListingPage>;

    fn read_item(&self, page: &PageSnapshot) -> StepResult<ItemDetail>;

    fn read_company(&self, page: &PageSnapshot) -> StepResult<CompanyDetail>;

    fn read_page_window(&self, page: &PageSnapshot) -> StepResult<PageWindow>;
}
