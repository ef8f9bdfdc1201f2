//! Admin sign-in, sign-out and credential recovery.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use zeeorder_core::auth::{is_owner_email, verify_admin_credentials};

use crate::mailer::recovery_notice;
use crate::middleware::{clearing_cookie, session_cookie, RequestId};

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Default, Deserialize)]
pub(super) struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ForgotRequest {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Serialize)]
pub(super) struct Ack {
    ok: bool,
}

pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Some(admin) = state.config.admin.as_ref() else {
        tracing::error!("login attempted but admin auth is not configured");
        return Err(ApiError::internal(
            req_id.0,
            "Admin auth is not configured on this server.",
        ));
    };

    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request(req_id.0, "Missing email or password."));
    }

    if !verify_admin_credentials(Some(admin), email, &request.password) {
        tracing::warn!(email, "admin sign-in rejected");
        return Err(ApiError::new(req_id.0, "unauthorized", "Invalid credentials."));
    }

    tracing::info!("admin signed in");
    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie())]),
        ApiResponse::new(Ack { ok: true }, req_id.0),
    )
        .into_response())
}

pub(super) async fn logout(Extension(req_id): Extension<RequestId>) -> Response {
    (
        AppendHeaders([(SET_COOKIE, clearing_cookie())]),
        ApiResponse::new(Ack { ok: true }, req_id.0),
    )
        .into_response()
}

pub(super) async fn forgot(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<ForgotRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Ack>>, ApiError> {
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let email = request.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::bad_request(req_id.0, "Missing email."));
    }

    let config = &state.config;
    let Some(owner) = config
        .owner_email
        .as_deref()
        .filter(|owner| is_owner_email(Some(owner), &email))
    else {
        tracing::warn!(email = %email, "credential recovery requested by non-owner");
        return Err(ApiError::new(
            req_id.0,
            "forbidden",
            "This email is not authorized for admin reset.",
        ));
    };

    let Some(admin) = config.admin.as_ref() else {
        return Err(ApiError::internal(
            req_id.0,
            "Admin credentials are not configured on the server.",
        ));
    };
    let Some(smtp) = config.smtp.as_ref() else {
        return Err(ApiError::internal(
            req_id.0,
            "SMTP is not configured on the server (SMTP_HOST/USER/PASS).",
        ));
    };

    if let Err(e) = state
        .mailer
        .send(smtp, recovery_notice(owner, &admin.email))
        .await
    {
        tracing::error!(error = %e, "failed to send recovery notice");
        return Err(ApiError::internal(req_id.0, "Failed to send recovery email."));
    }

    Ok(ApiResponse::new(Ack { ok: true }, req_id.0))
}
