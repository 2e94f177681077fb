use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::helpers::json_response;
use crate::models::movie::{movie_detail, search_movies, Pagination};
use crate::AppState;

#[derive(Deserialize)]
pub struct SearchQuery {
    page: Option<i64>,
    #[serde(rename = "perPage")]
    per_page: Option<i64>,
}

#[axum::debug_handler]
pub async fn search(
    State(state): State<AppState>,
    Path(title): Path<String>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Response> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).max(1);

    let (rows, total) = search_movies(&state.db, &title, page, per_page).await?;
    let pagination = Pagination::new(total, page, per_page, rows.len() as i64);

    Ok(json_response!(StatusCode::OK, {
        "success": true,
        "data": rows,
        "pagination": pagination
    }))
}

#[axum::debug_handler]
pub async fn detail(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> ApiResult<Response> {
    let movie = movie_detail(&state.db, &imdb_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Movie not found".to_string()))?;

    Ok(json_response!(StatusCode::OK, {
        "success": true,
        "data": movie
    }))
}
