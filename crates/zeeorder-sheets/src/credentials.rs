//! Service-account key material.

use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use zeeorder_core::SheetsConfig;

use crate::error::SheetsError;

pub(crate) const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The fields of a Google service-account JSON file the importer needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[redacted]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parse a service-account JSON document.
    ///
    /// Keys pasted into a single-line env var often carry literal `\n`
    /// sequences; those are turned back into newlines.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::InvalidCredentials`] if the text is not JSON or
    /// `client_email`/`private_key` are missing or blank.
    pub fn from_json(text: &str) -> Result<Self, SheetsError> {
        let mut key: Self = serde_json::from_str(text).map_err(|e| {
            SheetsError::InvalidCredentials(format!("service account JSON: {e}"))
        })?;

        if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
            return Err(SheetsError::InvalidCredentials(
                "missing client_email/private_key".to_string(),
            ));
        }
        if key.private_key.contains("\\n") {
            key.private_key = key.private_key.replace("\\n", "\n");
        }
        Ok(key)
    }

    /// Decode a base64-wrapped service-account JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::InvalidCredentials`] if the text is not valid
    /// base64, not UTF-8, or fails [`ServiceAccountKey::from_json`].
    pub fn from_base64(encoded: &str) -> Result<Self, SheetsError> {
        let bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| SheetsError::InvalidCredentials(format!("base64: {e}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| SheetsError::InvalidCredentials(format!("utf-8: {e}")))?;
        Self::from_json(&text)
    }

    /// Resolve credentials from configuration. Raw JSON wins over base64.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::MissingCredentials`] when neither source is set,
    /// or the parse error of the chosen source.
    pub fn from_config(config: &SheetsConfig) -> Result<Self, SheetsError> {
        if let Some(json) = config.service_account_json.as_deref() {
            return Self::from_json(json);
        }
        if let Some(encoded) = config.service_account_json_base64.as_deref() {
            return Self::from_base64(encoded);
        }
        Err(SheetsError::MissingCredentials)
    }

    pub(crate) fn token_uri(&self) -> &str {
        self.token_uri
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(DEFAULT_TOKEN_URI)
    }
}
