use crate::app_config::{AdminCredentials, AppConfig, Environment, SheetsConfig, SmtpConfig};
use crate::ConfigError;

const DEFAULT_SHEETS_RANGE: &str = "Products!A1:Z";
const DEFAULT_SMTP_FROM: &str = "Zee Ordering <no-reply@example.com>";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`
/// lookup instead of `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset; deployments often template blank values.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let narrow = |var: &str, value: u64| -> Result<u32, ConfigError> {
        u32::try_from(value).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let to_usize = |var: &str, value: u64| -> Result<usize, ConfigError> {
        usize::try_from(value).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("ZEE_ENV", "development"))?;

    let bind_raw = or_default("ZEE_BIND_ADDR", "0.0.0.0:3000");
    let bind_addr =
        bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: "ZEE_BIND_ADDR".to_string(),
                reason: e.to_string(),
            })?;

    let log_level = or_default("ZEE_LOG_LEVEL", "info");
    let uploads_dir = PathBuf::from(or_default("ZEE_UPLOADS_DIR", "./public/uploads"));

    let db_max_connections = narrow(
        "ZEE_DB_MAX_CONNECTIONS",
        parse_num("ZEE_DB_MAX_CONNECTIONS", "10")?,
    )?;
    let db_min_connections = narrow(
        "ZEE_DB_MIN_CONNECTIONS",
        parse_num("ZEE_DB_MIN_CONNECTIONS", "1")?,
    )?;
    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "ZEE_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        });
    }
    let db_acquire_timeout_secs = parse_num("ZEE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let import_batch_size = to_usize(
        "ZEE_IMPORT_BATCH_SIZE",
        parse_num("ZEE_IMPORT_BATCH_SIZE", "250")?,
    )?;
    if import_batch_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "ZEE_IMPORT_BATCH_SIZE".to_string(),
            reason: "batch size must be at least 1".to_string(),
        });
    }
    let max_upload_bytes = to_usize(
        "ZEE_MAX_UPLOAD_BYTES",
        parse_num("ZEE_MAX_UPLOAD_BYTES", "10485760")?,
    )?;

    let admin = match (optional("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD").ok()) {
        (Some(email), Some(password)) if !password.is_empty() => {
            Some(AdminCredentials { email, password })
        }
        _ => None,
    };
    let owner_email = optional("OWNER_EMAIL");

    let smtp_port = u16::try_from(parse_num("SMTP_PORT", "587")?).map_err(|e| {
        ConfigError::InvalidEnvVar {
            var: "SMTP_PORT".to_string(),
            reason: e.to_string(),
        }
    })?;
    let smtp = match (
        optional("SMTP_HOST"),
        optional("SMTP_USER"),
        lookup("SMTP_PASS").ok().filter(|p| !p.is_empty()),
    ) {
        (Some(host), Some(user), Some(pass)) => Some(SmtpConfig {
            host,
            port: smtp_port,
            user,
            pass,
            from: optional("SMTP_FROM").unwrap_or_else(|| DEFAULT_SMTP_FROM.to_string()),
        }),
        _ => None,
    };

    let sheets = SheetsConfig {
        service_account_json: optional("GOOGLE_SERVICE_ACCOUNT_JSON"),
        service_account_json_base64: optional("GOOGLE_SERVICE_ACCOUNT_JSON_BASE64"),
        spreadsheet_id: optional("GOOGLE_SHEETS_SPREADSHEET_ID"),
        range: optional("GOOGLE_SHEETS_RANGE").unwrap_or_else(|| DEFAULT_SHEETS_RANGE.to_string()),
    };

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        uploads_dir,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        import_batch_size,
        max_upload_bytes,
        admin,
        owner_email,
        smtp,
        sheets,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values are rejected so a typo like `producton` cannot
/// silently start the server in development mode.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s.trim() {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ZEE_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
