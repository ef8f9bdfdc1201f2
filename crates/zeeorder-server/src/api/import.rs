//! Catalog imports from an uploaded CSV file or a Google spreadsheet.

use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use zeeorder_core::{plan_import, read_csv, ImportError};
use zeeorder_sheets::{SheetTarget, SheetsError};

use crate::middleware::RequestId;

use super::{map_db_error, map_multipart_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ImportSummary {
    imported: usize,
    skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spreadsheet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SheetsImportRequest {
    spreadsheet_id: Option<String>,
    range: Option<String>,
}

pub(super) async fn import_csv(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multipart_error(req_id.0.clone(), &e))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| map_multipart_error(req_id.0.clone(), &e))?;
            upload = Some(bytes);
            break;
        }
    }

    let Some(bytes) = upload else {
        return Err(ApiError::bad_request(req_id.0, "No file uploaded"));
    };

    let text = String::from_utf8_lossy(&bytes);
    let table = read_csv(&text).map_err(|e| import_error(req_id.0.clone(), &e))?;
    let (imported, skipped) = persist(&state, &req_id, &table).await?;

    tracing::info!(imported, skipped, "csv import finished");
    let summary = ImportSummary {
        imported,
        skipped,
        message: Some(format!("Imported {imported} products, skipped {skipped}.")),
        spreadsheet_id: None,
        range: None,
    };
    Ok(ApiResponse::new(summary, req_id.0))
}

pub(super) async fn import_sheets(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<SheetsImportRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let target = SheetTarget::resolve(
        &state.config.sheets,
        request.spreadsheet_id.as_deref(),
        request.range.as_deref(),
    )
    .map_err(|e| sheets_error(req_id.0.clone(), &e))?;

    let table = zeeorder_sheets::fetch_table(&state.config.sheets, &target)
        .await
        .map_err(|e| sheets_error(req_id.0.clone(), &e))?;

    if table.len() < 2 {
        let summary = ImportSummary {
            imported: 0,
            skipped: 0,
            message: Some("No rows to import.".to_string()),
            spreadsheet_id: None,
            range: None,
        };
        return Ok(ApiResponse::new(summary, req_id.0));
    }

    let (imported, skipped) = persist(&state, &req_id, &table).await?;
    tracing::info!(
        imported,
        skipped,
        spreadsheet_id = %target.spreadsheet_id,
        range = %target.range,
        "sheet import finished"
    );

    let summary = ImportSummary {
        imported,
        skipped,
        message: None,
        spreadsheet_id: Some(target.spreadsheet_id),
        range: Some(target.range),
    };
    Ok(ApiResponse::new(summary, req_id.0))
}

/// Map a header-first table and upsert it in configured batch sizes.
async fn persist(
    state: &AppState,
    req_id: &RequestId,
    table: &[Vec<String>],
) -> Result<(usize, usize), ApiError> {
    let plan = plan_import(table).map_err(|e| import_error(req_id.0.clone(), &e))?;
    zeeorder_db::upsert_products(&state.pool, &plan.rows, state.config.import_batch_size)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok((plan.imported(), plan.skipped))
}

fn import_error(request_id: String, error: &ImportError) -> ApiError {
    match error {
        ImportError::EmptyCsv => ApiError::bad_request(request_id, "Empty CSV"),
        ImportError::MissingRequiredColumns => ApiError::bad_request(
            request_id,
            format!("File must have header columns: {}", zeeorder_core::import::EXPECTED_COLUMNS),
        ),
        ImportError::Csv(_) => ApiError::bad_request(request_id, error.to_string()),
    }
}

fn sheets_error(request_id: String, error: &SheetsError) -> ApiError {
    match error {
        SheetsError::MissingSpreadsheetId => ApiError::bad_request(request_id, error.to_string()),
        e if e.is_configuration() => {
            tracing::error!(error = %e, "sheet import misconfigured");
            ApiError::internal(request_id, e.to_string())
        }
        e => {
            tracing::error!(error = %e, "sheet fetch failed");
            ApiError::new(request_id, "upstream_error", "Failed to read spreadsheet.")
        }
    }
}
