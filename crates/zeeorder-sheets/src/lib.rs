//! Spreadsheet source for the catalog importer.

pub mod client;
pub mod credentials;
pub mod error;

pub use client::SheetsClient;
pub use credentials::ServiceAccountKey;
pub use error::SheetsError;

use zeeorder_core::SheetsConfig;

/// Request timeout for both the token exchange and the values read.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The spreadsheet and range an import reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTarget {
    pub spreadsheet_id: String,
    pub range: String,
}

impl SheetTarget {
    /// Combine per-request overrides with configured defaults.
    ///
    /// Blank overrides fall through to the configuration. The configured
    /// range already carries its own default.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::MissingSpreadsheetId`] if neither source names a
    /// spreadsheet.
    pub fn resolve(
        config: &SheetsConfig,
        spreadsheet_id: Option<&str>,
        range: Option<&str>,
    ) -> Result<Self, SheetsError> {
        let pick = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToOwned::to_owned)
        };

        let spreadsheet_id = pick(spreadsheet_id)
            .or_else(|| pick(config.spreadsheet_id.as_deref()))
            .ok_or(SheetsError::MissingSpreadsheetId)?;
        let range = pick(range).unwrap_or_else(|| config.range.clone());

        Ok(Self {
            spreadsheet_id,
            range,
        })
    }
}

/// Read the target range using credentials from `config`.
///
/// # Errors
///
/// Returns any [`SheetsError`] from credential loading or the client.
pub async fn fetch_table(
    config: &SheetsConfig,
    target: &SheetTarget,
) -> Result<Vec<Vec<String>>, SheetsError> {
    let key = ServiceAccountKey::from_config(config)?;
    let client = SheetsClient::new(key, DEFAULT_TIMEOUT_SECS)?;
    client
        .fetch_values(&target.spreadsheet_id, &target.range)
        .await
}
