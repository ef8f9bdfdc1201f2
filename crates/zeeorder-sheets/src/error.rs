use thiserror::Error;

/// Errors returned by the spreadsheet import client.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// No service-account JSON was configured.
    #[error(
        "missing GOOGLE_SERVICE_ACCOUNT_JSON or GOOGLE_SERVICE_ACCOUNT_JSON_BASE64 env var"
    )]
    MissingCredentials,

    /// The service-account JSON was present but unusable.
    #[error("invalid service account credentials: {0}")]
    InvalidCredentials(String),

    /// Neither the request nor the configuration named a spreadsheet.
    #[error("missing spreadsheetId (request body or GOOGLE_SHEETS_SPREADSHEET_ID)")]
    MissingSpreadsheetId,

    /// The signed assertion could not be produced.
    #[error("failed to sign service account assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Google answered with a non-2xx status.
    #[error("Google API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SheetsError {
    /// `true` for failures caused by server-side configuration rather than
    /// the caller's request or the remote API.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials | Self::InvalidCredentials(_) | Self::Jwt(_)
        )
    }
}
