//! PDF export of a client-built order.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use zeeorder_core::OrderExport;
use zeeorder_export::{attachment_header, render_order, ExportError, ImageStore};

use crate::middleware::RequestId;

use super::{ApiError, AppState};

pub(super) async fn export_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<OrderExport>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(order) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "rejected export payload");
        ApiError::bad_request(req_id.0.clone(), "Invalid order payload")
    })?;
    if order.items.is_empty() {
        return Err(ApiError::bad_request(req_id.0, ExportError::NoItems.to_string()));
    }
    if order.grand_total().is_none() {
        return Err(ApiError::bad_request(req_id.0, ExportError::Amount.to_string()));
    }

    let order_ref = order.order_ref();
    let item_count = order.items.len();
    let images = ImageStore::new(state.config.uploads_dir.clone());
    let generated_at = chrono::Local::now().fixed_offset();

    let rendered =
        tokio::task::spawn_blocking(move || render_order(&order, &images, generated_at)).await;

    let bytes = match rendered {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e @ (ExportError::NoItems | ExportError::Amount))) => {
            return Err(ApiError::bad_request(req_id.0, e.to_string()));
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, order_ref = %order_ref, "order export failed");
            return Err(ApiError::internal(req_id.0, "Failed to generate PDF"));
        }
        Err(e) => {
            tracing::error!(error = %e, order_ref = %order_ref, "order export task panicked");
            return Err(ApiError::internal(req_id.0, "Failed to generate PDF"));
        }
    };

    tracing::info!(order_ref = %order_ref, items = item_count, bytes = bytes.len(), "order exported");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, attachment_header(&order_ref)),
        ],
        bytes,
    )
        .into_response())
}
