//! Product image uploads.

use std::path::Path;

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;
use zeeorder_export::images::UPLOADS_URL_PREFIX;

use crate::middleware::RequestId;

use super::{map_db_error, map_multipart_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UploadResult {
    success: bool,
    image_url: String,
}

struct UploadedFile {
    file_name: Option<String>,
    bytes: axum::body::Bytes,
}

pub(super) async fn upload_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResult>>, ApiError> {
    let mut file = None;
    let mut product_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multipart_error(req_id.0.clone(), &e))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(ToOwned::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| map_multipart_error(req_id.0.clone(), &e))?;
                file = Some(UploadedFile { file_name, bytes });
            }
            Some("productId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| map_multipart_error(req_id.0.clone(), &e))?;
                product_id = Some(text.trim().to_string()).filter(|id| !id.is_empty());
            }
            _ => {}
        }
    }

    let (Some(file), Some(product_id)) = (file, product_id) else {
        return Err(ApiError::bad_request(req_id.0, "Missing file or product ID"));
    };
    let Ok(product_id) = Uuid::parse_str(&product_id) else {
        return Err(ApiError::bad_request(req_id.0, "Invalid product ID"));
    };

    if zeeorder_db::get_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .is_none()
    {
        return Err(ApiError::new(req_id.0, "not_found", "Product not found"));
    }

    let file_name = stored_file_name(
        product_id,
        chrono::Utc::now().timestamp_millis(),
        file.file_name.as_deref(),
    );
    let uploads_dir = &state.config.uploads_dir;
    let write = async {
        tokio::fs::create_dir_all(uploads_dir).await?;
        tokio::fs::write(uploads_dir.join(&file_name), &file.bytes).await
    };
    if let Err(e) = write.await {
        tracing::error!(error = %e, dir = %uploads_dir.display(), "failed to store upload");
        return Err(ApiError::internal(req_id.0, "Failed to store image"));
    }

    let image_url = format!("{UPLOADS_URL_PREFIX}{file_name}");
    zeeorder_db::set_product_image(&state.pool, product_id, &image_url)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(%product_id, bytes = file.bytes.len(), image_url = %image_url, "product image updated");
    Ok(ApiResponse::new(
        UploadResult {
            success: true,
            image_url,
        },
        req_id.0,
    ))
}

/// `<product id>-<millis>.<ext>`, keeping only ASCII alphanumerics of the
/// client's extension so the name can never escape the uploads directory.
fn stored_file_name(product_id: Uuid, millis: i64, original: Option<&str>) -> String {
    let ext: String = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(8)
        .collect();
    let ext = if ext.is_empty() { "bin".to_string() } else { ext };
    format!("{product_id}-{millis}.{ext}")
}
