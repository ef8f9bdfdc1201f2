//! Printable order sheets.
//!
//! [`layout`] decides where every row and the summary box land; [`render`]
//! turns that plan into PDF bytes.

pub mod error;
pub mod images;
pub mod layout;
pub mod money;
pub mod render;

pub use error::ExportError;
pub use images::ImageStore;
pub use render::render_order;

/// `Content-Disposition` value for a rendered order.
#[must_use]
pub fn attachment_header(order_ref: &str) -> String {
    let safe: String = order_ref
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    format!("attachment; filename=\"{safe}.pdf\"")
}
