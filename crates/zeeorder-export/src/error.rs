use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No items to export")]
    NoItems,
    #[error("Order total is out of range")]
    Amount,
    #[error("pdf rendering failed: {0}")]
    Pdf(String),
}
