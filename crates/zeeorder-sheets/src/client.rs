//! HTTP client for the Google Sheets v4 values API.
//!
//! Authenticates as a service account: a short-lived RS256 assertion is
//! exchanged for a bearer token, which is then used to read a single range.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::credentials::ServiceAccountKey;
use crate::error::SheetsError;

const DEFAULT_API_BASE_URL: &str = "https://sheets.googleapis.com/";
const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Everything except RFC 3986 unreserved characters is escaped in a path
/// segment, so `Products!A1:Z` becomes `Products%21A1%3AZ`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Client for reading spreadsheet ranges with service-account credentials.
///
/// Use [`SheetsClient::new`] for production or [`SheetsClient::with_base_urls`]
/// to point both the token endpoint and the API at a mock server in tests.
pub struct SheetsClient {
    client: Client,
    key: ServiceAccountKey,
    token_url: Url,
    api_base_url: Url,
}

impl SheetsClient {
    /// Creates a client using the key's `token_uri` and the public Sheets API.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SheetsError::InvalidCredentials`] if the key's `token_uri` is not
    /// a valid URL.
    pub fn new(key: ServiceAccountKey, timeout_secs: u64) -> Result<Self, SheetsError> {
        let token_url = key.token_uri().to_owned();
        Self::with_base_urls(key, timeout_secs, &token_url, DEFAULT_API_BASE_URL)
    }

    /// Creates a client with explicit token and API endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SheetsError::InvalidCredentials`] if either URL does not parse.
    pub fn with_base_urls(
        key: ServiceAccountKey,
        timeout_secs: u64,
        token_url: &str,
        api_base_url: &str,
    ) -> Result<Self, SheetsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("zeeorder/0.1 (catalog-import)")
            .build()?;

        let token_url = Url::parse(token_url).map_err(|e| {
            SheetsError::InvalidCredentials(format!("invalid token URL '{token_url}': {e}"))
        })?;
        let normalised = format!("{}/", api_base_url.trim_end_matches('/'));
        let api_base_url = Url::parse(&normalised).map_err(|e| {
            SheetsError::InvalidCredentials(format!("invalid API URL '{api_base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            key,
            token_url,
            api_base_url,
        })
    }

    /// Reads `range` from `spreadsheet_id` as a table of display strings.
    ///
    /// Non-string cells are rendered with their JSON text; `null` becomes an
    /// empty cell. A range with no values yields an empty table.
    ///
    /// # Errors
    ///
    /// - [`SheetsError::Jwt`] if the assertion cannot be signed.
    /// - [`SheetsError::Api`] if either endpoint answers with a non-2xx status.
    /// - [`SheetsError::Http`] on network failure.
    /// - [`SheetsError::Deserialize`] if a response has an unexpected shape.
    pub async fn fetch_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let token = self.access_token().await?;
        let url = self.values_url(spreadsheet_id, range)?;

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let body = Self::read_body(response).await?;
        let parsed: ValueRange =
            serde_json::from_str(&body).map_err(|e| SheetsError::Deserialize {
                context: format!("values.get(range={range})"),
                source: e,
            })?;

        tracing::debug!(
            spreadsheet_id,
            range,
            rows = parsed.values.len(),
            "fetched sheet values"
        );

        Ok(parsed
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    /// Exchanges a freshly signed assertion for a bearer token.
    ///
    /// # Errors
    ///
    /// See [`SheetsClient::fetch_values`].
    pub async fn access_token(&self) -> Result<String, SheetsError> {
        let assertion = self.sign_assertion()?;
        let response = self
            .client
            .post(self.token_url.clone())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| SheetsError::Deserialize {
                context: "token exchange".to_string(),
                source: e,
            })?;
        Ok(token.access_token)
    }

    fn sign_assertion(&self) -> Result<String, SheetsError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: READONLY_SCOPE,
            aud: self.token_url.as_str(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, SheetsError> {
        let path = format!(
            "v4/spreadsheets/{}/values/{}",
            utf8_percent_encode(spreadsheet_id, PATH_SEGMENT),
            utf8_percent_encode(range, PATH_SEGMENT),
        );
        self.api_base_url
            .join(&path)
            .map_err(|e| SheetsError::Api {
                status: 0,
                message: format!("cannot build values URL: {e}"),
            })
    }

    /// Returns the body of a 2xx response, or maps the Google error envelope
    /// (`{"error": {"message"}}` or `{"error", "error_description"}`) into
    /// [`SheetsError::Api`].
    async fn read_body(response: reqwest::Response) -> Result<String, SheetsError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| api_error_message(&v))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        Err(SheetsError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn api_error_message(body: &serde_json::Value) -> Option<String> {
    let error = body.get("error")?;
    if let Some(message) = error.get("message").and_then(serde_json::Value::as_str) {
        return Some(message.to_string());
    }
    let code = error.as_str()?;
    match body
        .get("error_description")
        .and_then(serde_json::Value::as_str)
    {
        Some(description) => Some(format!("{code}: {description}")),
        None => Some(code.to_string()),
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
