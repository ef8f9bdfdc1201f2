use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

/// One product as produced by an importer, ready to be upserted by SKU.
///
/// `None` on an optional field means "not supplied by this import"; the
/// upsert keeps whatever value is already stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpsert {
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub code: Option<String>,
    pub item_name: Option<String>,
    pub supplier_name: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub min_qty: Option<i32>,
    pub image_url: Option<String>,
}

/// Normalized pagination for the product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build from raw query-string values.
    ///
    /// Values are read like a lenient integer parse (`"3abc"` is 3);
    /// unparseable values fall back to the defaults. `page` is at least 1 and
    /// `page_size` is clamped to `1..=200`.
    #[must_use]
    pub fn from_raw(page: Option<&str>, page_size: Option<&str>) -> Self {
        let page = page
            .and_then(parse_leading_int)
            .unwrap_or(1)
            .max(1);
        let page_size = page_size
            .and_then(parse_leading_int)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// Parse the leading integer of `raw`, ignoring surrounding whitespace and
/// any trailing non-digit characters.
///
/// Returns `None` when no digits are present or the value overflows `i64`.
#[must_use]
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let value: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -value } else { value })
}
