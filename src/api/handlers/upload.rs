//! `/api/upload` - image upload for menu items.

use crate::{
    api::{AppState, extract::AdminUser},
    core::upload,
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use serde_json::{Value, json};

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

fn multipart_error(e: MultipartError) -> Error {
    Error::validation(e.body_text())
}

/// Stores the `image` field and returns its public URL.
pub async fn upload_image(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>)> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        let url = upload::store_image(&state.upload_dir, &content_type, &bytes).await?;
        return Ok((StatusCode::CREATED, Json(json!({ "url": url }))));
    }
    Err(Error::validation("No file uploaded"))
}
