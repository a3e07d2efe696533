//! Structured records produced by a crawl
//!
//! Detail types (`ItemDetail`, `CompanyDetail`) are what a page reader
//! extracts from one rendered page. Records (`ItemRecord`, `CompanyRecord`)
//! are details stamped with their query key, identifiers, and capture time,
//! ready to be persisted.

use crate::query::QueryKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name to value mapping scraped from a key/value table
pub type FieldMap = BTreeMap<String, String>;

/// A header row plus data rows, as scraped from a column table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Everything extracted from an item's detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDetail {
    /// Report number shown on the detail page
    pub item_id: String,
    pub fields: FieldMap,
    pub authorizations: Table,
    pub collections: Table,
    /// Present only for items listing their ingredients
    pub ingredients: Option<Table>,
}

/// Everything extracted from a company page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyDetail {
    /// Company registration (licence) number
    pub registration_id: String,
    pub fields: FieldMap,
    pub haccp: Option<Table>,
    pub authorizations: Table,
    pub enforcements: Table,
    pub products: Table,
}

/// Full captured result for one item
///
/// Never edited after capture; a later crawl writes a fresh record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub query_key: String,
    pub item_id: String,
    pub company_id: String,
    /// Columns of the item's row in the search listing
    #[serde(default)]
    pub listing: FieldMap,
    pub fields: FieldMap,
    pub authorizations: Table,
    pub collections: Table,
    pub ingredients: Option<Table>,
    pub captured_at: DateTime<Utc>,
}

impl ItemRecord {
    pub fn capture(
        query_key: &QueryKey,
        detail: ItemDetail,
        company_id: &str,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            query_key: query_key.as_str().to_string(),
            item_id: detail.item_id,
            company_id: company_id.to_string(),
            listing: FieldMap::new(),
            fields: detail.fields,
            authorizations: detail.authorizations,
            collections: detail.collections,
            ingredients: detail.ingredients,
            captured_at,
        }
    }

    pub fn with_listing(mut self, listing: FieldMap) -> Self {
        self.listing = listing;
        self
    }
}

/// Captured company data, keyed by the item that referred to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub query_key: String,
    pub referring_item_id: String,
    pub registration_id: String,
    pub fields: FieldMap,
    pub haccp: Option<Table>,
    pub authorizations: Table,
    pub enforcements: Table,
    pub products: Table,
    pub captured_at: DateTime<Utc>,
}

impl CompanyRecord {
    pub fn capture(
        query_key: &QueryKey,
        referring_item_id: &str,
        detail: CompanyDetail,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            query_key: query_key.as_str().to_string(),
            referring_item_id: referring_item_id.to_string(),
            registration_id: detail.registration_id,
            fields: detail.fields,
            haccp: detail.haccp,
            authorizations: detail.authorizations,
            enforcements: detail.enforcements,
            products: detail.products,
            captured_at,
        }
    }
}
