//! Integration tests for `SheetsClient` using wiremock HTTP mocks.

use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zeeorder_core::plan_import;
use zeeorder_sheets::{ServiceAccountKey, SheetsClient, SheetsError};

const TEST_KEY_PEM: &str = include_str!("fixtures/test_key.pem");

fn test_client(server: &MockServer) -> SheetsClient {
    let key = ServiceAccountKey {
        client_email: "importer@zee.iam.gserviceaccount.com".to_string(),
        private_key: TEST_KEY_PEM.to_string(),
        token_uri: None,
    };
    let token_url = format!("{}/token", server.uri());
    SheetsClient::with_base_urls(key, 30, &token_url, &server.uri())
        .expect("client construction should not fail")
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.test-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_values_returns_string_table() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-123/values/.+$"))
        .and(header("authorization", "Bearer ya29.test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "range": "Products!A1:Z3",
            "majorDimension": "ROWS",
            "values": [
                ["SKU Code", "Remark", "Brand Name", "MRP"],
                ["A-1", "Alpha", "Acme", "1,250.00"],
                ["", "Missing sku"]
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let table = client
        .fetch_values("sheet-123", "Products!A1:Z")
        .await
        .expect("should fetch values");

    assert_eq!(table.len(), 3);
    assert_eq!(table[0][0], "SKU Code");
    assert_eq!(table[2].len(), 2, "ragged rows are preserved");

    let plan = plan_import(&table).expect("plan");
    assert_eq!(plan.imported(), 1);
    assert_eq!(plan.skipped, 1);
    assert_eq!(plan.rows[0].brand.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn empty_range_yields_empty_table() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/empty/values/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "range": "Products!A1:Z1000",
            "majorDimension": "ROWS"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let table = client
        .fetch_values("empty", "Products!A1:Z")
        .await
        .expect("should fetch values");
    assert!(table.is_empty());
}

#[tokio::test]
async fn rejected_token_exchange_surfaces_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .fetch_values("sheet-123", "Products!A1:Z")
        .await
        .expect_err("token exchange must fail");

    match err {
        SheetsError::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("invalid_grant"), "got: {message}");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_spreadsheet_surfaces_google_message() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/missing/values/.+$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND"
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .fetch_values("missing", "Products!A1:Z")
        .await
        .expect_err("must fail");

    assert!(
        matches!(err, SheetsError::Api { status: 404, ref message } if message == "Requested entity was not found."),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn malformed_values_body_is_a_deserialize_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/bad/values/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .fetch_values("bad", "Products!A1:Z")
        .await
        .expect_err("must fail");
    assert!(matches!(err, SheetsError::Deserialize { .. }));
}
