//! Offline order rendering.

use std::path::{Path, PathBuf};

use anyhow::Context;
use zeeorder_core::OrderExport;
use zeeorder_export::{render_order, ImageStore};

/// Render the order JSON at `input` and write the PDF.
///
/// Returns the path written. Without `out` the file is named after the
/// order reference in the current directory.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed, the order has no
/// items, or the output cannot be written.
pub(crate) fn run_export_order(
    input: &Path,
    out: Option<&Path>,
    uploads_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let order: OrderExport = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid order", input.display()))?;

    let images = ImageStore::new(uploads_dir);
    let bytes = render_order(&order, &images, chrono::Local::now().fixed_offset())?;

    let target = out.map_or_else(
        || PathBuf::from(format!("{}.pdf", order.order_ref())),
        Path::to_path_buf,
    );
    std::fs::write(&target, &bytes)
        .with_context(|| format!("failed to write {}", target.display()))?;

    tracing::info!(
        order_ref = %order.order_ref(),
        items = order.items.len(),
        bytes = bytes.len(),
        "order rendered"
    );
    Ok(target)
}
