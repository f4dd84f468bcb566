//! Media uploads. Files land on disk under the configured uploads directory
//! with a generated name; the original name, size, and type are recorded in
//! the media table.

use std::path::Path as FsPath;

use axum::{
    extract::{Multipart, State},
    Json,
};
use echhapa_shared::media_store::NewMediaInput;
use echhapa_shared::user_store::Role;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::AuthSession,
    config::{ALLOWED_FILE_TYPES, MAX_FILE_SIZE},
    error::{ApiError, ApiResult},
    state::AppState,
};

/// `POST /api/admin/upload` — multipart form with a single `file` part.
///
/// The extension allow-list and size cap are the only gates; content is not
/// sniffed. Stored names are random, so uploads can never clobber each other
/// or smuggle path components.
pub async fn upload(
    session: AuthSession,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    session.require(Role::Author)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation(format!("malformed multipart body: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| ApiError::validation("file part has no filename"))?;
        let mime_type = field.content_type().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::validation(format!("failed to read upload: {err}")))?;

        let extension = validate_upload(&original_name, data.len())?;

        let stored_name = format!("{}.{extension}", Uuid::new_v4());
        let uploads_dir = &state.config.uploads_dir;
        tokio::fs::create_dir_all(uploads_dir)
            .await
            .map_err(|err| anyhow::anyhow!("failed to create uploads dir: {err}"))?;
        let disk_path = uploads_dir.join(&stored_name);
        tokio::fs::write(&disk_path, &data)
            .await
            .map_err(|err| anyhow::anyhow!("failed to write upload: {err}"))?;

        let file_path = format!("uploads/{stored_name}");
        let file_id = state.media.record_upload(NewMediaInput {
            filename: stored_name.clone(),
            original_name,
            file_path: file_path.clone(),
            file_type: mime_type,
            file_size: Some(data.len() as i64),
            uploaded_by: Some(session.user_id),
        })?;

        let file_url = format!("{}/{file_path}", state.config.site_url.trim_end_matches('/'));
        return Ok(Json(json!({
            "success": true,
            "file_id": file_id,
            "filename": stored_name,
            "file_path": file_path,
            "file_url": file_url,
        })));
    }

    Err(ApiError::validation("no file part in request"))
}

/// Gate an upload by name and size; returns the lowercased extension the
/// stored filename will carry.
fn validate_upload(original_name: &str, size: usize) -> Result<String, ApiError> {
    let extension = extension_of(original_name)
        .ok_or_else(|| ApiError::validation("file has no extension"))?;
    if !ALLOWED_FILE_TYPES.contains(&extension.as_str()) {
        return Err(ApiError::validation(format!(
            "file type .{extension} is not allowed"
        )));
    }
    if size > MAX_FILE_SIZE {
        return Err(ApiError::validation("file exceeds the 10MB limit"));
    }
    if size == 0 {
        return Err(ApiError::validation("file is empty"));
    }
    Ok(extension)
}

fn extension_of(filename: &str) -> Option<String> {
    FsPath::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
