//! Product image lookup under the uploads root.

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use printpdf::image_crate::{self, DynamicImage};

/// URL prefix the server mounts the uploads directory under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads/";

/// Resolves stored `image_url` values to files inside one directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an `image_url` to a path under the root.
    ///
    /// Accepts `/uploads/<name>` as well as bare relative names. Returns
    /// `None` for remote URLs, absolute paths, and anything that would step
    /// outside the root.
    #[must_use]
    pub fn resolve(&self, image_url: &str) -> Option<PathBuf> {
        let decoded = percent_decode_str(image_url.trim()).decode_utf8().ok()?;
        if decoded.contains("://") {
            return None;
        }

        let relative = decoded
            .strip_prefix(UPLOADS_URL_PREFIX)
            .or_else(|| decoded.strip_prefix("uploads/"))
            .unwrap_or(&decoded)
            .trim_start_matches('/');
        if relative.is_empty() || relative.contains('\\') {
            return None;
        }

        let relative = Path::new(relative);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// Read and decode the image behind `image_url`, flattened to RGB.
    ///
    /// Failures are logged and yield `None` so the caller can draw a
    /// placeholder instead.
    #[must_use]
    pub fn load(&self, image_url: &str) -> Option<DynamicImage> {
        let Some(path) = self.resolve(image_url) else {
            tracing::warn!(image_url, "image path rejected");
            return None;
        };

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(image_url, path = %path.display(), error = %e, "media unavailable");
                return None;
            }
        };

        match image_crate::load_from_memory(&bytes) {
            Ok(image) => Some(DynamicImage::ImageRgb8(image.to_rgb8())),
            Err(e) => {
                tracing::warn!(image_url, error = %e, "image decode failed");
                None
            }
        }
    }
}
