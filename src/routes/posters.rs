use std::path::Path as FsPath;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::helpers::json_response;
use crate::models::movie::movie_exists;
use crate::models::poster::upsert_poster;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_poster(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> ApiResult<Response> {
    let (bytes, content_type) = state.posters.get(&imdb_id).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

#[axum::debug_handler]
pub async fn add_poster(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    if !movie_exists(&state.db, &imdb_id).await? {
        return Err(ApiError::Validation("Invalid IMDb ID.".to_string()));
    }

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(err.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let extension = field
            .file_name()
            .and_then(|name| FsPath::new(name).extension())
            .and_then(|ext| ext.to_str())
            .unwrap_or("png")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::Validation(err.to_string()))?;
        upload = Some((extension, bytes.to_vec()));
        break;
    }

    let Some((extension, bytes)) = upload else {
        return Err(ApiError::Validation(
            "Multipart field 'image' is required.".to_string(),
        ));
    };

    let file_name = state.posters.put(&imdb_id, &extension, &bytes).await?;
    let record = upsert_poster(&state.db, &imdb_id, &format!("posters/{}", file_name)).await?;

    Ok(json_response!(StatusCode::OK, {
        "success": true,
        "data": record
    }))
}
