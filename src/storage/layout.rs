//! On-disk layout of a collection run
//!
//! One directory per record kind under the collect path, one JSON file per
//! record, and one consolidated SQLite file per query at the root.

use crate::query::QueryKey;
use std::path::{Path, PathBuf};

/// File stem `{queryKey}_{itemID}`
pub fn item_stem(query_key: &str, item_id: &str) -> String {
    format!("{}_{}", query_key, stem_part(item_id))
}

/// File stem `{queryKey}_{itemID}_{companyID}`
pub fn company_stem(query_key: &str, item_id: &str, company_id: &str) -> String {
    format!(
        "{}_{}_{}",
        query_key,
        stem_part(item_id),
        stem_part(company_id)
    )
}

/// Makes a scraped id usable inside a single file name
///
/// Path separators and characters Windows rejects become `_`, so a stem can
/// never name a file outside its partition directory.
fn stem_part(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Partition a persisted file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Item,
    Authorization,
    Collection,
    Ingredient,
    Company,
    CompanyHaccp,
    CompanyAuthorization,
    CompanyEnforcement,
    CompanyProduct,
}

impl RecordKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Authorization => "authorization",
            Self::Collection => "collection",
            Self::Ingredient => "ingredient",
            Self::Company => "company",
            Self::CompanyHaccp => "company_haccp",
            Self::CompanyAuthorization => "company_authorization",
            Self::CompanyEnforcement => "company_enforcement",
            Self::CompanyProduct => "company_product",
        }
    }

    pub fn all() -> [Self; 9] {
        [
            Self::Item,
            Self::Authorization,
            Self::Collection,
            Self::Ingredient,
            Self::Company,
            Self::CompanyHaccp,
            Self::CompanyAuthorization,
            Self::CompanyEnforcement,
            Self::CompanyProduct,
        ]
    }
}

/// Paths of every file a collection run writes
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, kind: RecordKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Path of the record file with the given stem
    pub fn record_path(&self, kind: RecordKind, stem: &str) -> PathBuf {
        self.dir(kind).join(format!("{}.json", stem))
    }

    /// Path of the consolidated artifact of a query
    pub fn consolidated_path(&self, query_key: &QueryKey) -> PathBuf {
        self.root.join(format!("{}.sqlite", query_key))
    }

    /// Creates the root and every partition directory
    pub fn create_dirs(&self) -> std::io::Result<()> {
        for kind in RecordKind::all() {
            std::fs::create_dir_all(self.dir(kind))?;
        }
        Ok(())
    }
}
