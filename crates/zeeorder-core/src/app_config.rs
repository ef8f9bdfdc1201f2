use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// The single admin identity allowed to sign in.
///
/// Only constructed when both `ADMIN_EMAIL` and `ADMIN_PASSWORD` are set and
/// non-empty, so holding one means auth is configured.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Outbound mail settings for the credential-recovery notice.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl SmtpConfig {
    /// Port 465 speaks implicit TLS; everything else upgrades with STARTTLS.
    #[must_use]
    pub fn implicit_tls(&self) -> bool {
        self.port == 465
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("pass", &"[redacted]")
            .field("from", &self.from)
            .finish()
    }
}

/// Google Sheets import defaults and service-account material.
///
/// The service account is kept as raw text here; decoding and validation
/// happen in `zeeorder-sheets` when an import actually runs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SheetsConfig {
    pub service_account_json: Option<String>,
    pub service_account_json_base64: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub range: String,
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field(
                "service_account_json",
                &self.service_account_json.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "service_account_json_base64",
                &self.service_account_json_base64.as_ref().map(|_| "[redacted]"),
            )
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("range", &self.range)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub uploads_dir: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub import_batch_size: usize,
    pub max_upload_bytes: usize,
    pub admin: Option<AdminCredentials>,
    pub owner_email: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub sheets: SheetsConfig,
}

impl AppConfig {
    #[must_use]
    pub fn is_auth_configured(&self) -> bool {
        self.admin.is_some()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("uploads_dir", &self.uploads_dir)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("import_batch_size", &self.import_batch_size)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("admin", &self.admin)
            .field("owner_email", &self.owner_email)
            .field("smtp", &self.smtp)
            .field("sheets", &self.sheets)
            .finish()
    }
}
