//! Table helpers shared by the registry page parsers

use crate::record::{FieldMap, Table};
use crate::{StepError, StepResult};
use scraper::{ElementRef, Selector};

/// Parses a CSS selector, reporting a bad one as a shape error
pub(crate) fn selector(css: &str) -> StepResult<Selector> {
    Selector::parse(css).map_err(|e| StepError::shape(format!("bad selector {:?}: {:?}", css, e)))
}

/// Trimmed text content of an element
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Cell text with tabs and newlines dropped
fn cell_text(element: ElementRef<'_>) -> String {
    text_of(element).replace(['\t', '\n'], "")
}

/// Adds `th`/`td` pairs from every row of `container` to `fields`
///
/// Headers and values pair up positionally within a row; a row with more of
/// one than the other keeps only the complete pairs.
///
/// # Errors
///
/// A field name seen twice is a shape error.
pub(crate) fn collect_fields(container: ElementRef<'_>, fields: &mut FieldMap) -> StepResult<()> {
    let tr = selector("tr")?;
    let th = selector("th")?;
    let td = selector("td")?;

    for row in container.select(&tr) {
        let keys = row.select(&th).map(text_of);
        let values = row.select(&td).map(text_of);
        for (key, value) in keys.zip(values) {
            if fields.contains_key(&key) {
                return Err(StepError::shape(format!("duplicate field {:?}", key)));
            }
            fields.insert(key, value);
        }
    }
    Ok(())
}

/// Reads a column table: `th` cells of the first row as header, `td` cells of
/// every following row as data
pub(crate) fn column_table(container: ElementRef<'_>) -> StepResult<Table> {
    let tr = selector("tr")?;
    let th = selector("th")?;
    let td = selector("td")?;

    let mut rows = container.select(&tr);
    let header = rows
        .next()
        .ok_or_else(|| StepError::shape("table without a header row"))?;

    let mut table = Table::new(header.select(&th).map(text_of).collect());
    for row in rows {
        table.rows.push(row.select(&td).map(cell_text).collect());
    }
    Ok(table)
}
