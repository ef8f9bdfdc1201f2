use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeeorder_core::PageRequest;
use zeeorder_db::{ProductRow, ProductSearch};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductItem {
    id: Uuid,
    sku: String,
    name: String,
    brand: Option<String>,
    category: Option<String>,
    code: Option<String>,
    item_name: Option<String>,
    supplier_name: Option<String>,
    price: Option<Decimal>,
    currency: String,
    stock: Option<i32>,
    min_qty: Option<i32>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductItem {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            sku: row.sku,
            name: row.name,
            brand: row.brand,
            category: row.category,
            code: row.code,
            item_name: row.item_name,
            supplier_name: row.supplier_name,
            price: row.price,
            currency: row.currency,
            stock: row.stock,
            min_qty: row.min_qty,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductPage {
    items: Vec<ProductItem>,
    total: i64,
    page: i64,
    page_size: i64,
}

/// Raw query values; paging is parsed leniently so `?page=abc` falls back to
/// the defaults instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub q: Option<String>,
    pub brand: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<ProductPage>>, ApiError> {
    let page = PageRequest::from_raw(query.page.as_deref(), query.page_size.as_deref());
    let search = ProductSearch {
        query: query.q.as_deref(),
        brand: query.brand.as_deref(),
    };

    let (rows, total) = tokio::try_join!(
        zeeorder_db::search_products(&state.pool, search, page),
        zeeorder_db::count_products(&state.pool, search),
    )
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = ProductPage {
        items: rows.into_iter().map(ProductItem::from).collect(),
        total,
        page: page.page,
        page_size: page.page_size,
    };

    Ok(ApiResponse::new(data, req_id.0))
}
