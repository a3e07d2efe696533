//! Page reader for the food-safety product registry
//!
//! Turns rendered registry pages into structured data:
//! - Listing rows (`#tbl_prd_list`) with their link handles
//! - Item detail tables (`table.mb-table`, `table.col.table-sm`)
//! - Company tables (`table.mb-table.table-sm`, `div.responsive-table`)
//! - The page-link widget under the listing
//!
//! Any deviation from the expected layout is an extraction-shape error, which
//! the engine retries like a navigation failure.

mod tables;

use crate::crawler::traits::{
    ItemRef, LinkSlot, ListingPage, ListingRow, PageReader, PageSnapshot, PageWindow,
};
use crate::record::{CompanyDetail, FieldMap, ItemDetail};
use crate::{StepError, StepResult};
use scraper::{ElementRef, Html};
use tables::{collect_fields, column_table, selector, text_of};

/// Listing column holding the item's report number
pub const ITEM_ID_FIELD: &str = "품목보고번호";

/// Listing column holding the row number
pub const ROW_NUMBER_FIELD: &str = "번호";

/// Company page field holding the registration number
pub const REGISTRATION_ID_FIELD: &str = "인허가번호";

/// Item field holding the company's status, taken from the company link
pub const COMPANY_STATUS_FIELD: &str = "회사상태";

/// Item field holding the company's address
pub const COMPANY_ADDRESS_FIELD: &str = "회사주소";

/// Row text of a listing without results
const NO_RESULTS: &str = "조회된 데이터가 없습니다.";

const LISTING_ROWS: &str = "table#tbl_prd_list tr";
const PAGE_LINKS: &str =
    "#contents > main > section > div:nth-of-type(2) > div:nth-of-type(3) > div > ul > li";

/// Scraper-based reader of registry pages
#[derive(Debug, Clone, Default)]
pub struct RegistryPageReader;

impl RegistryPageReader {
    pub fn new() -> Self {
        Self
    }
}

impl PageReader for RegistryPageReader {
    fn read_listing(&self, page: &PageSnapshot) -> StepResult<ListingPage> {
        let document = Html::parse_document(&page.html);
        let tr = selector(LISTING_ROWS)?;
        let td = selector("td")?;
        let span = selector("span")?;
        let link = selector("a[id]")?;

        let mut rows = document.select(&tr).peekable();
        if rows.peek().is_none() {
            return Err(StepError::shape("listing table not found"));
        }

        let mut listing = ListingPage::default();
        // First row is the header
        for row in rows.skip(1) {
            if text_of(row) == NO_RESULTS {
                return Ok(ListingPage::default());
            }

            let mut fields = FieldMap::new();
            for cell in row.select(&td) {
                let mut spans = cell.select(&span).map(text_of);
                match (spans.next(), spans.next()) {
                    (Some(key), Some(value)) => {
                        fields.insert(key, value);
                    }
                    _ => return Err(StepError::shape("listing cell without label/value spans")),
                }
            }

            let handle = row
                .select(&link)
                .next()
                .and_then(|a| a.value().attr("id"))
                .ok_or_else(|| StepError::shape("listing row without item link"))?
                .to_string();
            let item_id = fields
                .get(ITEM_ID_FIELD)
                .filter(|id| !id.is_empty())
                .cloned()
                .ok_or_else(|| StepError::shape(format!("listing row without {}", ITEM_ID_FIELD)))?;

            if let Some(number) = fields
                .get(ROW_NUMBER_FIELD)
                .and_then(|n| n.replace(',', "").parse::<u32>().ok())
            {
                listing.reported_total = listing.reported_total.max(Some(number));
            }

            listing.rows.push(ListingRow {
                item: ItemRef { handle, item_id },
                fields,
            });
        }
        Ok(listing)
    }

    fn read_item(&self, page: &PageSnapshot) -> StepResult<ItemDetail> {
        let document = Html::parse_document(&page.html);

        let info_tables: Vec<_> = document.select(&selector("table.mb-table")?).collect();
        if info_tables.len() != 2 {
            return Err(StepError::shape(format!(
                "expected 2 item info tables, found {}",
                info_tables.len()
            )));
        }

        let mut fields = company_summary(info_tables[0])?;
        collect_fields(info_tables[1], &mut fields)?;
        let item_id = fields
            .get(ITEM_ID_FIELD)
            .filter(|id| !id.is_empty())
            .cloned()
            .ok_or_else(|| StepError::shape(format!("item page without {}", ITEM_ID_FIELD)))?;

        let sub_tables: Vec<_> = document
            .select(&selector("table.col.table-sm")?)
            .collect();
        let (authorizations, collections, ingredients) = match sub_tables.as_slice() {
            [authorization, collection] => {
                (column_table(*authorization)?, column_table(*collection)?, None)
            }
            [authorization, collection, ingredient] => (
                column_table(*authorization)?,
                column_table(*collection)?,
                Some(column_table(*ingredient)?),
            ),
            other => {
                return Err(StepError::shape(format!(
                    "expected 2 or 3 item sub-tables, found {}",
                    other.len()
                )))
            }
        };

        Ok(ItemDetail {
            item_id,
            fields,
            authorizations,
            collections,
            ingredients,
        })
    }

    fn read_company(&self, page: &PageSnapshot) -> StepResult<CompanyDetail> {
        let document = Html::parse_document(&page.html);

        let info_tables: Vec<_> = document
            .select(&selector("table.mb-table.table-sm")?)
            .collect();
        let [info] = info_tables.as_slice() else {
            return Err(StepError::shape(format!(
                "expected 1 company info table, found {}",
                info_tables.len()
            )));
        };

        let mut fields = FieldMap::new();
        collect_fields(*info, &mut fields)?;
        let registration_id = fields
            .get(REGISTRATION_ID_FIELD)
            .filter(|id| !id.is_empty())
            .cloned()
            .ok_or_else(|| {
                StepError::shape(format!("company page without {}", REGISTRATION_ID_FIELD))
            })?;

        let containers: Vec<_> = document
            .select(&selector("div.responsive-table")?)
            .collect();
        let (haccp, rest) = match containers.len() {
            3 => (None, &containers[..]),
            4 => (Some(column_table(containers[0])?), &containers[1..]),
            n => {
                return Err(StepError::shape(format!(
                    "expected 3 or 4 company tables, found {}",
                    n
                )))
            }
        };

        Ok(CompanyDetail {
            registration_id,
            fields,
            haccp,
            authorizations: column_table(rest[0])?,
            enforcements: column_table(rest[1])?,
            products: column_table(rest[2])?,
        })
    }

    fn read_page_window(&self, page: &PageSnapshot) -> StepResult<PageWindow> {
        let document = Html::parse_document(&page.html);
        let slots = document
            .select(&selector(PAGE_LINKS)?)
            .map(|li| {
                let label_only = li
                    .children()
                    .filter_map(ElementRef::wrap)
                    .all(|child| child.value().name() != "a");
                let has_span = li
                    .children()
                    .filter_map(ElementRef::wrap)
                    .any(|child| child.value().name() == "span");
                if label_only && has_span {
                    LinkSlot::Label
                } else {
                    LinkSlot::Link
                }
            })
            .collect();
        Ok(PageWindow::new(slots))
    }
}

/// Company status and address from the first item info table
///
/// The company link carries its status as the second argument of its
/// `onclick` handler, e.g. `fnCompanyView('123', 'Y')`.
fn company_summary(table: ElementRef<'_>) -> StepResult<FieldMap> {
    let row = table
        .select(&selector("tr")?)
        .next()
        .ok_or_else(|| StepError::shape("company summary table is empty"))?;
    let cells: Vec<_> = row.select(&selector("td")?).collect();
    if cells.len() < 2 {
        return Err(StepError::shape("company summary row has fewer than 2 cells"));
    }

    let onclick = cells[0]
        .select(&selector("a")?)
        .next()
        .and_then(|a| a.value().attr("onclick"))
        .ok_or_else(|| StepError::shape("company link without onclick"))?;
    let status = onclick_arguments(onclick)
        .get(1)
        .cloned()
        .ok_or_else(|| StepError::shape(format!("unexpected company link {:?}", onclick)))?;

    let mut fields = FieldMap::new();
    fields.insert(COMPANY_STATUS_FIELD.to_string(), status);
    fields.insert(COMPANY_ADDRESS_FIELD.to_string(), text_of(cells[1]));
    Ok(fields)
}

/// Arguments of a JavaScript call like `fn('a', 'b')`, quotes removed
fn onclick_arguments(onclick: &str) -> Vec<String> {
    let Some(open) = onclick.find('(') else {
        return Vec::new();
    };
    let Some(close) = onclick[open..].find(')') else {
        return Vec::new();
    };
    onclick[open + 1..open + close]
        .split(',')
        .map(|arg| arg.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|arg| !arg.is_empty())
        .collect()
}
