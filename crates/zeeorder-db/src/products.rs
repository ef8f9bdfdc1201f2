//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use zeeorder_core::{PageRequest, ProductUpsert};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub code: Option<String>,
    pub item_name: Option<String>,
    pub supplier_name: Option<String>,
    /// `NUMERIC(12,2)`; `NULL` when no import has supplied a price yet.
    pub price: Option<Decimal>,
    pub currency: String,
    pub stock: Option<i32>,
    pub min_qty: Option<i32>,
    /// Relative pointer such as `/uploads/<file>`, or whatever the import sheet carried.
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters for the product search.
///
/// Both filters are applied only when non-empty after trimming.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductSearch<'a> {
    /// Case-insensitive substring over sku, name, brand, code and item name.
    pub query: Option<&'a str>,
    /// Case-insensitive exact brand match.
    pub brand: Option<&'a str>,
}

impl<'a> ProductSearch<'a> {
    fn pattern(&self) -> Option<String> {
        non_blank(self.query).map(|q| format!("%{}%", escape_like(q)))
    }

    fn brand(&self) -> Option<&'a str> {
        non_blank(self.brand)
    }
}

/// Result of a bulk upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub upserted: usize,
    pub batches: usize,
}

const PRODUCT_COLUMNS: &str = "id, sku, name, brand, category, code, item_name, supplier_name, \
     price, currency, stock, min_qty, image_url, created_at, updated_at";

const SEARCH_PREDICATE: &str = "($1::TEXT IS NULL \
          OR sku ILIKE $1 ESCAPE '\\' \
          OR name ILIKE $1 ESCAPE '\\' \
          OR brand ILIKE $1 ESCAPE '\\' \
          OR code ILIKE $1 ESCAPE '\\' \
          OR item_name ILIKE $1 ESCAPE '\\') \
     AND ($2::TEXT IS NULL OR LOWER(brand) = LOWER($2))";

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Escape `ILIKE` metacharacters so user input matches literally.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns one page of products matching `search`, most recently updated first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_products(
    pool: &PgPool,
    search: ProductSearch<'_>,
    page: PageRequest,
) -> Result<Vec<ProductRow>, DbError> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE {SEARCH_PREDICATE} \
         ORDER BY updated_at DESC, id DESC \
         LIMIT $3 OFFSET $4"
    );
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(search.pattern())
        .bind(search.brand())
        .bind(page.page_size)
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Counts every product matching `search`, ignoring pagination.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_products(pool: &PgPool, search: ProductSearch<'_>) -> Result<i64, DbError> {
    let sql = format!("SELECT COUNT(*) FROM products WHERE {SEARCH_PREDICATE}");
    let total = sqlx::query_scalar::<_, i64>(&sql)
        .bind(search.pattern())
        .bind(search.brand())
        .fetch_one(pool)
        .await?;

    Ok(total)
}

/// Returns distinct non-blank brand names in ascending order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_brands(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let brands = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT brand FROM products \
         WHERE brand IS NOT NULL AND btrim(brand) <> '' \
         ORDER BY brand ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(brands)
}

/// Returns a single product by id, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Option<ProductRow>, DbError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Points a product at a new image and bumps `updated_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_product_image(pool: &PgPool, id: Uuid, image_url: &str) -> Result<(), DbError> {
    let rows_affected =
        sqlx::query("UPDATE products SET image_url = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(image_url)
            .execute(pool)
            .await?
            .rows_affected();

    if rows_affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Bulk upsert
// ---------------------------------------------------------------------------

/// Inserts or updates products by SKU in batches of `batch_size`.
///
/// Each batch runs in its own transaction. A failing batch is rolled back,
/// but batches committed before it stay committed; the error reports how many
/// rows were already persisted. On conflict `name` is always replaced while
/// optional columns only change when the incoming value is non-null.
///
/// # Errors
///
/// Returns [`DbError::BatchFailed`] if any statement in a batch fails, or
/// [`DbError::Sqlx`] if a transaction cannot be opened.
pub async fn upsert_products(
    pool: &PgPool,
    rows: &[ProductUpsert],
    batch_size: usize,
) -> Result<UpsertOutcome, DbError> {
    let mut outcome = UpsertOutcome::default();

    for (batch_idx, chunk) in rows.chunks(batch_size.max(1)).enumerate() {
        let mut tx = pool.begin().await?;
        for row in chunk {
            if let Err(source) = upsert_one(&mut tx, row).await {
                tracing::error!(
                    batch = batch_idx,
                    sku = %row.sku,
                    error = %source,
                    "product upsert failed; rolling back batch"
                );
                return Err(DbError::BatchFailed {
                    batch: batch_idx,
                    committed: outcome.upserted,
                    source,
                });
            }
        }
        tx.commit().await.map_err(|source| DbError::BatchFailed {
            batch: batch_idx,
            committed: outcome.upserted,
            source,
        })?;

        outcome.upserted += chunk.len();
        outcome.batches += 1;
        tracing::debug!(batch = batch_idx, rows = chunk.len(), "import batch committed");
    }

    Ok(outcome)
}

async fn upsert_one(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    row: &ProductUpsert,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO products \
             (sku, name, brand, category, code, item_name, supplier_name, \
              price, stock, min_qty, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (sku) DO UPDATE SET \
             name          = EXCLUDED.name, \
             brand         = COALESCE(EXCLUDED.brand, products.brand), \
             category      = COALESCE(EXCLUDED.category, products.category), \
             code          = COALESCE(EXCLUDED.code, products.code), \
             item_name     = COALESCE(EXCLUDED.item_name, products.item_name), \
             supplier_name = COALESCE(EXCLUDED.supplier_name, products.supplier_name), \
             price         = COALESCE(EXCLUDED.price, products.price), \
             stock         = COALESCE(EXCLUDED.stock, products.stock), \
             min_qty       = COALESCE(EXCLUDED.min_qty, products.min_qty), \
             image_url     = COALESCE(EXCLUDED.image_url, products.image_url), \
             updated_at    = NOW()",
    )
    .bind(&row.sku)
    .bind(&row.name)
    .bind(&row.brand)
    .bind(&row.category)
    .bind(&row.code)
    .bind(&row.item_name)
    .bind(&row.supplier_name)
    .bind(row.price)
    .bind(row.stock)
    .bind(row.min_qty)
    .bind(&row.image_url)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
