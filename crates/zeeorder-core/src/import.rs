//! Column mapping for the CSV and spreadsheet importers.
//!
//! Both sources arrive as a table of strings whose first row is a header.
//! Headers are normalized, the required `SKUCode`/`Remark` columns are
//! located, and each following row becomes a [`ProductUpsert`] or is counted
//! as skipped.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::products::{parse_leading_int, ProductUpsert};

pub const SKU_COLUMN: &str = "skucode";
pub const NAME_COLUMN: &str = "remark";

/// Human-readable description of the expected header row.
pub const EXPECTED_COLUMNS: &str = "required: SKUCode, Remark; optional: BrandName, MRP, \
     Category, StockQty, MinQty, ImagePath, Code, ItemName, SuppName";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("missing required columns ({})", EXPECTED_COLUMNS)]
    MissingRequiredColumns,
    #[error("the CSV has no data rows")]
    EmptyCsv,
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Normalize a header cell: lowercase ASCII letters and digits only.
///
/// `"SKU Code"`, `"sku_code"` and `"SKUCode"` all normalize to `skucode`.
#[must_use]
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolved column positions for one header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    sku: usize,
    name: usize,
    brand: Option<usize>,
    price: Option<usize>,
    category: Option<usize>,
    stock: Option<usize>,
    min_qty: Option<usize>,
    image_url: Option<usize>,
    code: Option<usize>,
    item_name: Option<usize>,
    supplier_name: Option<usize>,
}

impl ColumnMap {
    /// Locate known columns in `headers`. The first matching header wins.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::MissingRequiredColumns`] if either the SKU or
    /// the name column is absent.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self, ImportError> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| normalize_header(h.as_ref()))
            .collect();
        let find = |name: &str| normalized.iter().position(|h| h == name);

        let (Some(sku), Some(name)) = (find(SKU_COLUMN), find(NAME_COLUMN)) else {
            return Err(ImportError::MissingRequiredColumns);
        };

        Ok(Self {
            sku,
            name,
            brand: find("brandname"),
            price: find("mrp"),
            category: find("category"),
            stock: find("stockqty"),
            min_qty: find("minqty"),
            image_url: find("imagepath"),
            code: find("code"),
            item_name: find("itemname"),
            supplier_name: find("suppname"),
        })
    }

    /// Map one data row. Returns `None` when the SKU or name cell is blank.
    #[must_use]
    pub fn map_row<S: AsRef<str>>(&self, row: &[S]) -> Option<ProductUpsert> {
        let cell = |idx: usize| row.get(idx).map_or("", |c| c.as_ref().trim());
        let text = |idx: Option<usize>| {
            idx.map(cell)
                .filter(|v| !v.is_empty())
                .map(ToOwned::to_owned)
        };
        let int = |idx: Option<usize>| {
            idx.map(cell)
                .and_then(parse_leading_int)
                .and_then(|v| i32::try_from(v).ok())
        };

        let sku = cell(self.sku);
        let name = cell(self.name);
        if sku.is_empty() || name.is_empty() {
            return None;
        }

        Some(ProductUpsert {
            sku: sku.to_owned(),
            name: name.to_owned(),
            brand: text(self.brand),
            category: text(self.category),
            code: text(self.code),
            item_name: text(self.item_name),
            supplier_name: text(self.supplier_name),
            price: self.price.map(cell).and_then(clean_price),
            stock: int(self.stock),
            min_qty: int(self.min_qty),
            image_url: text(self.image_url),
        })
    }
}

/// Rows ready to upsert plus the number of rows that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub rows: Vec<ProductUpsert>,
    pub skipped: usize,
}

impl ImportPlan {
    #[must_use]
    pub fn imported(&self) -> usize {
        self.rows.len()
    }
}

/// Turn a header-first table into an [`ImportPlan`].
///
/// An empty table yields an empty plan. Rows where every cell is blank are
/// ignored outright; rows with a blank SKU or name are counted as skipped.
///
/// # Errors
///
/// Returns [`ImportError::MissingRequiredColumns`] if the header row lacks
/// the SKU or name column.
pub fn plan_import<S: AsRef<str>>(table: &[Vec<S>]) -> Result<ImportPlan, ImportError> {
    let Some((headers, body)) = table.split_first() else {
        return Ok(ImportPlan::default());
    };
    let columns = ColumnMap::from_headers(headers)?;

    let mut plan = ImportPlan::default();
    for row in body {
        if row.iter().all(|c| c.as_ref().trim().is_empty()) {
            continue;
        }
        match columns.map_row(row) {
            Some(product) => plan.rows.push(product),
            None => plan.skipped += 1,
        }
    }
    Ok(plan)
}

/// Parse CSV text into a table of trimmed cells.
///
/// Handles quoted fields, doubled quotes, CRLF line endings, ragged rows and
/// a leading UTF-8 BOM. Blank lines are dropped.
///
/// # Errors
///
/// - [`ImportError::EmptyCsv`] if fewer than two non-blank lines remain.
/// - [`ImportError::Csv`] if the input cannot be tokenized.
pub fn read_csv(text: &str) -> Result<Vec<Vec<String>>, ImportError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut table = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        table.push(record.iter().map(ToOwned::to_owned).collect());
    }

    if table.len() < 2 {
        return Err(ImportError::EmptyCsv);
    }
    Ok(table)
}

/// Strip currency symbols and thousands separators from a price cell.
///
/// Largest price, in paise, the `products.price NUMERIC(12, 2)` column holds.
const MAX_PRICE_PAISE: i64 = 999_999_999_999;

/// Keeps digits and `.` only, then parses as a decimal rounded to two places.
/// Blank, unparseable or out-of-range cells yield `None`.
#[must_use]
pub fn clean_price(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .ok()
        .map(|d| d.round_dp(2))
        .filter(|d| *d <= Decimal::new(MAX_PRICE_PAISE, 2))
}
