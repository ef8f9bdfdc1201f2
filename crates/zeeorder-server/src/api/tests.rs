use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use zeeorder_core::{AdminCredentials, AppConfig, Environment, SheetsConfig, SmtpConfig};

use super::*;
use crate::mailer::testing::RecordingMailer;
use crate::mailer::SmtpMailer;

const SESSION: &str = "zee_admin=test-session";
const BOUNDARY: &str = "zeeorder-test-boundary";

fn test_config(uploads_dir: &Path) -> AppConfig {
    AppConfig {
        database_url: "postgres://zeeorder@127.0.0.1:1/zeeorder".to_string(),
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().expect("bind addr"),
        log_level: "info".to_string(),
        uploads_dir: uploads_dir.to_path_buf(),
        db_max_connections: 2,
        db_min_connections: 0,
        db_acquire_timeout_secs: 1,
        import_batch_size: 2,
        max_upload_bytes: 1024 * 1024,
        admin: Some(AdminCredentials {
            email: "admin@zee.example".to_string(),
            password: "s3cret-Pass".to_string(),
        }),
        owner_email: Some("owner@zee.example".to_string()),
        smtp: Some(SmtpConfig {
            host: "smtp.zee.example".to_string(),
            port: 587,
            user: "mailer".to_string(),
            pass: "mail-pass".to_string(),
            from: "Zee Ordering <no-reply@zee.example>".to_string(),
        }),
        sheets: SheetsConfig {
            range: "Products!A1:Z".to_string(),
            ..SheetsConfig::default()
        },
    }
}

/// Pool that never connects unless a handler actually touches it.
fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://zeeorder@127.0.0.1:1/zeeorder")
        .expect("lazy pool")
}

fn app_with(pool: PgPool, config: AppConfig) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config),
        mailer: Arc::new(SmtpMailer),
    };
    build_app(state, default_rate_limit_state())
}

fn offline_app(uploads_dir: &Path) -> Router {
    app_with(lazy_pool(), test_config(uploads_dir))
}

fn json_post(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, SESSION)
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get_with_session(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, SESSION)
        .body(Body::empty())
        .expect("request")
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_post(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::COOKIE, SESSION)
        .body(Body::from(body))
        .expect("request")
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

fn set_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie header")
        .to_string()
}

// -------------------------------------------------------------------------
// Session gate
// -------------------------------------------------------------------------

#[tokio::test]
async fn protected_routes_redirect_to_login_without_cookie() {
    let dir = tempfile::tempdir().expect("tempdir");
    let response = offline_app(dir.path())
        .oneshot(
            Request::builder()
                .uri("/api/v1/products?q=bolt")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        "/login?next=%2Fapi%2Fv1%2Fproducts"
    );
}

#[tokio::test]
async fn login_page_is_public() {
    let dir = tempfile::tempdir().expect("tempdir");
    let response = offline_app(dir.path())
        .oneshot(
            Request::builder()
                .uri("/login?next=%2F")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let html = String::from_utf8(body.to_vec()).expect("utf8");
    assert!(html.contains("/api/v1/auth/login"));
    assert!(html.contains(r##"<a href="#" id="forgot">"##));
    assert!(html.trim_end().ends_with("</html>"), "page is served whole");
}

#[tokio::test]
async fn health_is_public_and_reports_degraded_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let response = offline_app(dir.path())
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().contains_key("x-request-id"));
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "degraded");
    assert_eq!(json["data"]["database"], "unavailable");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let response = offline_app(dir.path())
        .oneshot(
            Request::builder()
                .uri("/api/v1/nope")
                .header(header::COOKIE, SESSION)
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("x-request-id").expect("header"),
        "req-42"
    );
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "not_found");
    assert_eq!(json["meta"]["request_id"], "req-42");
}

// -------------------------------------------------------------------------
// Auth
// -------------------------------------------------------------------------

#[tokio::test]
async fn login_with_valid_credentials_sets_session_cookie() {
    let dir = tempfile::tempdir().expect("tempdir");
    let response = offline_app(dir.path())
        .oneshot(json_post(
            "/api/v1/auth/login",
            &serde_json::json!({ "email": " Admin@Zee.example ", "password": "s3cret-Pass" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("zee_admin="));
    assert!(cookie.contains("HttpOnly"));
    let json = json_body(response).await;
    assert_eq!(json["data"]["ok"], true);
}

#[tokio::test]
async fn login_rejects_wrong_and_missing_credentials() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = offline_app(dir.path());

    let wrong = app
        .clone()
        .oneshot(json_post(
            "/api/v1/auth/login",
            &serde_json::json!({ "email": "admin@zee.example", "password": "S3CRET-PASS" }),
        ))
        .await
        .expect("response");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(wrong.headers().get(header::SET_COOKIE).is_none());

    let missing = app
        .clone()
        .oneshot(json_post(
            "/api/v1/auth/login",
            &serde_json::json!({ "email": "admin@zee.example" }),
        ))
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let garbage = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_without_configured_admin_is_server_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(dir.path());
    config.admin = None;

    let response = app_with(lazy_pool(), config)
        .oneshot(json_post(
            "/api/v1/auth/login",
            &serde_json::json!({ "email": "admin@zee.example", "password": "s3cret-Pass" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let dir = tempfile::tempdir().expect("tempdir");
    let response = offline_app(dir.path())
        .oneshot(json_post("/api/v1/auth/logout", &serde_json::json!({})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).contains("Max-Age=0"));
}

#[tokio::test]
async fn auth_routes_are_rate_limited() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = AppState {
        pool: lazy_pool(),
        config: Arc::new(test_config(dir.path())),
        mailer: Arc::new(SmtpMailer),
    };
    let app = build_app(state, RateLimitState::new(2, Duration::from_secs(60)));
    let body = serde_json::json!({ "email": "admin@zee.example", "password": "nope" });

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(json_post("/api/v1/auth/login", &body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let limited = app
        .oneshot(json_post("/api/v1/auth/login", &body))
        .await
        .expect("response");
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn forgot_sends_notice_to_owner_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState {
        pool: lazy_pool(),
        config: Arc::new(test_config(dir.path())),
        mailer: Arc::clone(&mailer) as Arc<dyn Mailer>,
    };
    let app = build_app(state, default_rate_limit_state());

    let stranger = app
        .clone()
        .oneshot(json_post(
            "/api/v1/auth/forgot",
            &serde_json::json!({ "email": "someone@else.example" }),
        ))
        .await
        .expect("response");
    assert_eq!(stranger.status(), StatusCode::FORBIDDEN);

    let empty = app
        .clone()
        .oneshot(json_post("/api/v1/auth/forgot", &serde_json::json!({})))
        .await
        .expect("response");
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let owner = app
        .oneshot(json_post(
            "/api/v1/auth/forgot",
            &serde_json::json!({ "email": "OWNER@zee.example" }),
        ))
        .await
        .expect("response");
    assert_eq!(owner.status(), StatusCode::OK);

    let sent = mailer.sent.lock().expect("lock");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "owner@zee.example");
    assert!(sent[0].body.contains("admin@zee.example"));
    assert!(!sent[0].body.contains("s3cret-Pass"));
}

#[tokio::test]
async fn forgot_without_smtp_is_server_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(dir.path());
    config.smtp = None;

    let response = app_with(lazy_pool(), config)
        .oneshot(json_post(
            "/api/v1/auth/forgot",
            &serde_json::json!({ "email": "owner@zee.example" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// -------------------------------------------------------------------------
// Export
// -------------------------------------------------------------------------

#[tokio::test]
async fn export_returns_pdf_attachment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let response = offline_app(dir.path())
        .oneshot(json_post(
            "/api/v1/export/order",
            &serde_json::json!({
                "orderNumber": "1042",
                "customerName": "Ravi Traders",
                "items": [
                    { "sku": "A-1", "name": "Alpha", "brand": "Acme", "unitPrice": 12.5, "qty": 2 },
                    { "name": "Beta", "unitPrice": "3.25", "qty": 4, "imageUrl": "/uploads/missing.png" }
                ]
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).expect("type"),
        "application/pdf"
    );
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .expect("disposition"),
        "attachment; filename=\"ZeeReOrder-1042.pdf\""
    );
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    assert!(body.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn export_rejects_empty_and_malformed_orders() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = offline_app(dir.path());

    let empty = app
        .clone()
        .oneshot(json_post("/api/v1/export/order", &serde_json::json!({ "items": [] })))
        .await
        .expect("response");
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    let json = json_body(empty).await;
    assert_eq!(json["error"]["message"], "No items to export");

    let malformed = app
        .oneshot(json_post(
            "/api/v1/export/order",
            &serde_json::json!({ "items": [{ "qty": 1 }] }),
        ))
        .await
        .expect("response");
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn export_rejects_out_of_range_totals() {
    let dir = tempfile::tempdir().expect("tempdir");
    let response = offline_app(dir.path())
        .oneshot(json_post(
            "/api/v1/export/order",
            &serde_json::json!({
                "items": [
                    { "name": "Huge", "unitPrice": "79228162514264337593543950335", "qty": 2 }
                ]
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["message"], "Order total is out of range");
}

// -------------------------------------------------------------------------
// Import and upload validation (no database reached)
// -------------------------------------------------------------------------

#[tokio::test]
async fn csv_import_validates_upload_before_touching_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = offline_app(dir.path());

    let no_file = app
        .clone()
        .oneshot(multipart_post(
            "/api/v1/import/csv",
            &[Part::Text("note", "hello")],
        ))
        .await
        .expect("response");
    assert_eq!(no_file.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(no_file).await["error"]["message"], "No file uploaded");

    let empty = app
        .clone()
        .oneshot(multipart_post(
            "/api/v1/import/csv",
            &[Part::File("file", "p.csv", b"SKUCode,Remark\n")],
        ))
        .await
        .expect("response");
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(empty).await["error"]["message"], "Empty CSV");

    let wrong_headers = app
        .oneshot(multipart_post(
            "/api/v1/import/csv",
            &[Part::File("file", "p.csv", b"Sku,Title\nA-1,Alpha\n")],
        ))
        .await
        .expect("response");
    assert_eq!(wrong_headers.status(), StatusCode::BAD_REQUEST);
    let json = json_body(wrong_headers).await;
    assert!(json["error"]["message"]
        .as_str()
        .expect("message")
        .contains("SKUCode"));
}

#[tokio::test]
async fn sheets_import_without_spreadsheet_id_is_bad_request() {
    let dir = tempfile::tempdir().expect("tempdir");
    let response = offline_app(dir.path())
        .oneshot(json_post("/api/v1/import/sheets", &serde_json::json!({})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sheets_import_without_credentials_is_server_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let response = offline_app(dir.path())
        .oneshot(json_post(
            "/api/v1/import/sheets",
            &serde_json::json!({ "spreadsheetId": "sheet-123" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn upload_requires_file_and_valid_product_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = offline_app(dir.path());

    let missing = app
        .clone()
        .oneshot(multipart_post(
            "/api/v1/upload/image",
            &[Part::File("file", "a.png", b"png")],
        ))
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(missing).await["error"]["message"],
        "Missing file or product ID"
    );

    let invalid = app
        .oneshot(multipart_post(
            "/api/v1/upload/image",
            &[
                Part::File("file", "a.png", b"png"),
                Part::Text("productId", "not-a-uuid"),
            ],
        ))
        .await
        .expect("response");
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(dir.path());
    config.max_upload_bytes = 64;
    let payload = vec![b'x'; 4096];

    let response = app_with(lazy_pool(), config)
        .oneshot(multipart_post(
            "/api/v1/import/csv",
            &[Part::File("file", "big.csv", &payload)],
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// -------------------------------------------------------------------------
// Catalog against a live database
// -------------------------------------------------------------------------

const CATALOG_CSV: &[u8] = b"SKU Code,Remark,Brand Name,MRP,Stock Qty\n\
A-1,Alpha Bolt,Acme,\"1,250\",10\n\
B-2,Beta Nut,Bolt Co,99.5,3\n\
,Missing Sku,Acme,1,1\n\
C-3,Gamma Washer,acme,,\n";

#[sqlx::test(migrations = "../../migrations")]
async fn csv_import_then_search_and_brands(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_with(pool, test_config(dir.path()));

    let import = app
        .clone()
        .oneshot(multipart_post(
            "/api/v1/import/csv",
            &[Part::File("file", "catalog.csv", CATALOG_CSV)],
        ))
        .await
        .expect("response");
    assert_eq!(import.status(), StatusCode::OK);
    let json = json_body(import).await;
    assert_eq!(json["data"]["imported"], 3);
    assert_eq!(json["data"]["skipped"], 1);

    let search = app
        .clone()
        .oneshot(get_with_session("/api/v1/products?q=bolt&pageSize=10"))
        .await
        .expect("response");
    assert_eq!(search.status(), StatusCode::OK);
    let json = json_body(search).await;
    assert_eq!(json["data"]["total"], 2, "name and brand both match");
    assert_eq!(json["data"]["pageSize"], 10);

    let by_brand = app
        .clone()
        .oneshot(get_with_session("/api/v1/products?brand=ACME"))
        .await
        .expect("response");
    let json = json_body(by_brand).await;
    let skus: Vec<&str> = json["data"]["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|item| item["sku"].as_str())
        .collect();
    assert_eq!(skus.len(), 2);
    assert!(skus.contains(&"A-1") && skus.contains(&"C-3"));

    let brands = app
        .oneshot(get_with_session("/api/v1/brands"))
        .await
        .expect("response");
    let json = json_body(brands).await;
    let brands: Vec<&str> = json["data"]["brands"]
        .as_array()
        .expect("brands")
        .iter()
        .filter_map(|b| b.as_str())
        .collect();
    assert_eq!(brands.len(), 3, "brands are distinct by exact spelling");
    for brand in ["Acme", "acme", "Bolt Co"] {
        assert!(brands.contains(&brand), "missing {brand}");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_page_defaults_and_lenient_paging(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_with(pool, test_config(dir.path()));

    let response = app
        .oneshot(get_with_session("/api/v1/products?page=abc&pageSize=1000"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["page"], 1);
    assert_eq!(json["data"]["pageSize"], 200);
    assert_eq!(json["data"]["total"], 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn image_upload_stores_file_and_updates_product(pool: PgPool) {
    let id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO products (sku, name) VALUES ('IMG-1', 'Pictured') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .expect("insert product");

    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_with(pool.clone(), test_config(dir.path()));
    let product_id = id.to_string();

    let response = app
        .oneshot(multipart_post(
            "/api/v1/upload/image",
            &[
                Part::Text("productId", &product_id),
                Part::File("file", "shot.PNG", b"not really a png"),
            ],
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["data"]["success"], true);
    let image_url = json["data"]["imageUrl"].as_str().expect("imageUrl");
    assert!(image_url.starts_with(&format!("/uploads/{id}-")));
    assert!(image_url.ends_with(".png"));

    let file_name = image_url.trim_start_matches("/uploads/");
    let stored = std::fs::read(dir.path().join(file_name)).expect("stored file");
    assert_eq!(stored, b"not really a png");

    let row = zeeorder_db::get_product(&pool, id)
        .await
        .expect("query")
        .expect("product");
    assert_eq!(row.image_url.as_deref(), Some(image_url));
}

#[sqlx::test(migrations = "../../migrations")]
async fn image_upload_for_unknown_product_is_not_found(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app_with(pool, test_config(dir.path()));
    let product_id = uuid::Uuid::new_v4().to_string();

    let response = app
        .oneshot(multipart_post(
            "/api/v1/upload/image",
            &[
                Part::Text("productId", &product_id),
                Part::File("file", "a.jpg", b"jpg"),
            ],
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(std::fs::read_dir(dir.path()).expect("dir").count(), 0);
}
