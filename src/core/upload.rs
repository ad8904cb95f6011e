//! Image uploads for menu items.
//!
//! Files are written under the upload directory with a random name and served
//! back statically from `/uploads`.

use crate::errors::{Error, Result};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Public URL prefix under which uploads are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// File extension for an accepted image content type.
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Stores an uploaded image in `dir` and returns its public URL path.
///
/// # Errors
/// Returns `Validation` for an empty or oversized file or an unsupported
/// content type, and `Io` if the file cannot be written.
pub async fn store_image(dir: &Path, content_type: &str, bytes: &[u8]) -> Result<String> {
    let ext = extension_for(content_type).ok_or_else(|| {
        Error::validation("Only JPEG, PNG, WebP and GIF images are allowed")
    })?;
    if bytes.is_empty() {
        return Err(Error::validation("No file uploaded"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(Error::validation("Image must be 5 MB or smaller"));
    }

    tokio::fs::create_dir_all(dir).await?;
    let file_name = format!("{}.{ext}", Uuid::new_v4());
    let temp_path = dir.join(format!(".{file_name}.tmp"));
    tokio::fs::write(&temp_path, bytes).await?;
    tokio::fs::rename(&temp_path, dir.join(&file_name)).await?;

    info!(file = %file_name, size = bytes.len(), "Stored upload");
    Ok(format!("{PUBLIC_PREFIX}/{file_name}"))
}
