pub mod app_config;
pub mod auth;
pub mod config;
pub mod import;
pub mod order;
pub mod products;

pub use app_config::{AdminCredentials, AppConfig, Environment, SheetsConfig, SmtpConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use import::{plan_import, read_csv, ColumnMap, ImportError, ImportPlan};
pub use order::{Cart, CartLine, CartProduct, LineItem, OrderExport};
pub use products::{PageRequest, ProductUpsert};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
